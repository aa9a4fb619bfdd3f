//! Gamry Framework `.DTA` files.
//!
//! Tab-delimited with decimal commas. The header runs to the `CURVE` line;
//! the table below it has a name row followed by a unit row, and its first
//! two columns (a blank label column and the `Pt` index) are dropped.

use super::{FormatAdapter, FormatKind};
use crate::body::{BodyLayout, ColumnHeader, RawBody};
use crate::constants::dta;
use crate::error::Result;
use crate::header::decode_until_sentinel;
use crate::models::{HeaderOrder, RawHeader};
use crate::reader::TextEncoding;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::path::Path;

const LAYOUT: BodyLayout = BodyLayout {
    delimiter: dta::DELIMITER,
    decimal: dta::DECIMAL,
    column_header: ColumnHeader::TwoRow(HeaderOrder::NameMajor),
};

const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%d.%m.%Y", "%Y-%m-%d"];

#[derive(Debug, Clone, Copy, Default)]
pub struct DtaFormat;

impl FormatAdapter for DtaFormat {
    fn kind(&self) -> FormatKind {
        FormatKind::Dta
    }

    fn encoding(&self) -> TextEncoding {
        TextEncoding::Utf8
    }

    fn file_extension(&self) -> &'static str {
        dta::FILE_EXTENSION
    }

    fn canonical_names(&self) -> &'static [(&'static str, &'static str)] {
        dta::NAMES
    }

    fn decode_header(&self, lines: &[String], _path: &Path) -> Result<(RawHeader, usize)> {
        Ok(decode_until_sentinel(lines, dta::HEADER_SENTINEL, dta::DELIMITER))
    }

    fn decode_raw_body(
        &self,
        lines: &[String],
        _header: &mut RawHeader,
        header_length: usize,
        path: &Path,
    ) -> Result<RawBody> {
        let mut body = RawBody::parse(lines, header_length, &LAYOUT, path)?;
        body.remove_columns(dta::DROPPED_COLUMNS);
        Ok(body)
    }

    /// `DATE` and `TIME` entries are `LABEL<TAB>value<TAB>description`
    fn acquisition_time(&self, header: &RawHeader) -> Option<NaiveDateTime> {
        let date = header.get(dta::DATE_KEY)?.get(1)?;
        let time = header.get(dta::TIME_KEY)?.get(1)?;

        let date = DATE_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(date, format).ok())?;
        let time = NaiveTime::parse_from_str(time, "%H:%M:%S").ok()?;
        Some(date.and_time(time))
    }
}
