//! Per-experiment info files.
//!
//! A tab-delimited `info.txt` next to the data folder names the series
//! variable and how to find its values:
//! ```text
//! NAME	Pump Speed
//! UNIT	rpm
//! BOUNDS	ps	_
//! IDENTIFIER	files
//! ELECTRODE SURFACE AREA	1,8	cm^2
//! TABLE
//! ps10_	10
//! ps50_	50
//! ```
//! Rows after `TABLE` form a lookup table; when present they take
//! precedence over `BOUNDS`. Without either, the variable is internal.

use crate::constants::{DEFAULT_ELECTRODE_AREA_NAME, info};
use crate::correlation::{Identifier, VariableSpec};
use crate::error::{EchemError, Result};
use crate::header::decode_until_sentinel;
use crate::models::{ElectrodeArea, RawHeader};
use crate::reader::{LineSource, TextEncoding, read_lines};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct InfoFile {
    path: PathBuf,
    header: RawHeader,
    table: Vec<(String, f64)>,
}

impl InfoFile {
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let source = LineSource::from(path.as_ref());
        let lines = read_lines(&source, TextEncoding::Utf8)?;
        Self::parse(&lines, path.as_ref())
    }

    pub fn parse(lines: &[String], path: &Path) -> Result<Self> {
        let (header, consumed) = decode_until_sentinel(lines, info::HEADER_SENTINEL, info::DELIMITER);

        let mut table = Vec::new();
        for (index, line) in lines.iter().enumerate().skip(consumed) {
            let line = line.trim();
            if line.is_empty() || line.starts_with(crate::constants::COMMENT_MARKER) {
                continue;
            }
            let (key, value) = line.split_once(info::DELIMITER).ok_or_else(|| {
                EchemError::decode(
                    path,
                    format!("line {}: expected name and value separated by a tab", index + 1),
                )
            })?;
            let value = parse_number(value).ok_or_else(|| {
                EchemError::decode(
                    path,
                    format!("line {}: '{}' is not a number", index + 1, value.trim()),
                )
            })?;
            table.push((key.trim().to_string(), value));
        }

        debug!(
            "Read info file {}: {} header keys, {} table rows",
            path.display(),
            header.len(),
            table.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            header,
            table,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &RawHeader {
        &self.header
    }

    pub fn table(&self) -> &[(String, f64)] {
        &self.table
    }

    /// Variable named by the file
    pub fn variable_spec(&self) -> Result<VariableSpec> {
        let name = self.header.first(info::NAME).ok_or_else(|| {
            EchemError::configuration(format!(
                "{} has no {} entry",
                self.path.display(),
                info::NAME
            ))
        })?;
        let unit = self.header.first(info::UNIT).map(str::to_string);

        if !self.table.is_empty() {
            let mut spec = VariableSpec::table(name, "", self.table.clone());
            spec.unit = unit;
            return Ok(spec);
        }

        if let Some(bounds) = self.header.get(info::BOUNDS) {
            let left = bounds.first().map(String::as_str).unwrap_or_default();
            let right = bounds.get(1).map(String::as_str).unwrap_or_default();
            let mut spec = VariableSpec::bounds(name, "", left, right)
                .with_identifier(self.identifier()?);
            spec.unit = unit;
            return Ok(spec);
        }

        let mut spec = VariableSpec::internal(name);
        spec.unit = unit;
        Ok(spec)
    }

    /// Electrode area given as `ELECTRODE SURFACE AREA<TAB>value<TAB>unit`
    pub fn electrode_area(&self) -> Result<Option<ElectrodeArea>> {
        let Some(fields) = self.header.get(info::ELECTRODE_AREA) else {
            return Ok(None);
        };
        let value = fields
            .first()
            .and_then(|value| parse_number(value))
            .ok_or_else(|| {
                EchemError::configuration(format!(
                    "{} in {} needs a numeric value",
                    info::ELECTRODE_AREA,
                    self.path.display()
                ))
            })?;
        let unit = fields.get(1).cloned().unwrap_or_default();
        Ok(Some(ElectrodeArea::new(
            DEFAULT_ELECTRODE_AREA_NAME,
            value,
            unit,
        )))
    }

    fn identifier(&self) -> Result<Identifier> {
        match self.header.first(info::IDENTIFIER) {
            None => Ok(Identifier::default()),
            Some(value) if value.eq_ignore_ascii_case("files") => Ok(Identifier::Files),
            Some(value) if value.eq_ignore_ascii_case("folders") => Ok(Identifier::Folders),
            Some(other) => Err(EchemError::configuration(format!(
                "{} must be 'files' or 'folders', got '{}'",
                info::IDENTIFIER,
                other
            ))),
        }
    }
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().replace(',', ".").parse().ok()
}
