//! Greenlight fuel cell test station CSV exports.
//!
//! Comma-delimited with decimal points and a fixed layout: 13 metadata
//! lines, then a unit row and a name row at lines 17 and 18. The raw
//! file-mark column is removed from the table and its first value kept in
//! the header under `File Mark`.

use super::{FormatAdapter, FormatKind};
use crate::body::{BodyLayout, ColumnHeader, RawBody};
use crate::constants::greenlight;
use crate::error::{EchemError, Result};
use crate::header::decode_fixed_length;
use crate::models::{HeaderOrder, RawHeader};
use crate::reader::TextEncoding;
use std::path::Path;

const LAYOUT: BodyLayout = BodyLayout {
    delimiter: greenlight::DELIMITER,
    decimal: greenlight::DECIMAL,
    column_header: ColumnHeader::TwoRow(HeaderOrder::UnitMajor),
};

#[derive(Debug, Clone, Copy, Default)]
pub struct GreenlightFormat;

impl FormatAdapter for GreenlightFormat {
    fn kind(&self) -> FormatKind {
        FormatKind::Greenlight
    }

    fn encoding(&self) -> TextEncoding {
        TextEncoding::Latin1
    }

    fn file_extension(&self) -> &'static str {
        greenlight::FILE_EXTENSION
    }

    fn canonical_names(&self) -> &'static [(&'static str, &'static str)] {
        greenlight::NAMES
    }

    fn decode_header(&self, lines: &[String], _path: &Path) -> Result<(RawHeader, usize)> {
        Ok(decode_fixed_length(
            lines,
            greenlight::HEADER_LENGTH,
            greenlight::DELIMITER,
        ))
    }

    fn decode_raw_body(
        &self,
        lines: &[String],
        header: &mut RawHeader,
        header_length: usize,
        path: &Path,
    ) -> Result<RawBody> {
        if header_length < greenlight::HEADER_LENGTH {
            return Err(EchemError::decode(
                path,
                format!(
                    "expected {} header lines, file has {}",
                    greenlight::HEADER_LENGTH,
                    header_length
                ),
            ));
        }

        let mut body = RawBody::parse(lines, greenlight::COLUMN_HEADER_ROW, &LAYOUT, path)?;
        for (_, cells) in body.remove_columns(&[greenlight::FILE_MARK_COLUMN]) {
            if let Some(mark) = cells.into_iter().next() {
                header.insert(greenlight::FILE_MARK_KEY, vec![mark]);
            }
        }
        Ok(body)
    }
}
