//! BioLogic EC-Lab ASCII exports.
//!
//! Latin-1, tab-delimited, decimal commas. Line 2 declares the header
//! length; the last declared line holds `name/unit` column titles.

use super::{FormatAdapter, FormatKind};
use crate::body::{BodyLayout, ColumnHeader, RawBody};
use crate::constants::eclab;
use crate::error::Result;
use crate::header::decode_declared_length;
use crate::models::RawHeader;
use crate::reader::TextEncoding;
use chrono::NaiveDateTime;
use std::path::Path;

const LAYOUT: BodyLayout = BodyLayout {
    delimiter: eclab::DELIMITER,
    decimal: eclab::DECIMAL,
    column_header: ColumnHeader::Combined {
        separator: eclab::UNIT_SEPARATOR,
    },
};

const TIMESTAMP_FORMATS: &[&str] = &["%m/%d/%Y %H:%M:%S%.f", "%m/%d/%Y %H:%M:%S"];

#[derive(Debug, Clone, Copy, Default)]
pub struct EcLabFormat;

impl FormatAdapter for EcLabFormat {
    fn kind(&self) -> FormatKind {
        FormatKind::EcLab
    }

    fn encoding(&self) -> TextEncoding {
        TextEncoding::Latin1
    }

    fn file_extension(&self) -> &'static str {
        eclab::FILE_EXTENSION
    }

    fn canonical_names(&self) -> &'static [(&'static str, &'static str)] {
        eclab::NAMES
    }

    fn decode_header(&self, lines: &[String], path: &Path) -> Result<(RawHeader, usize)> {
        decode_declared_length(lines, path)
    }

    fn decode_raw_body(
        &self,
        lines: &[String],
        _header: &mut RawHeader,
        header_length: usize,
        path: &Path,
    ) -> Result<RawBody> {
        RawBody::parse(lines, header_length, &LAYOUT, path)
    }

    fn acquisition_time(&self, header: &RawHeader) -> Option<NaiveDateTime> {
        let value = header.first(eclab::ACQUISITION_KEY)?;
        TIMESTAMP_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
    }
}
