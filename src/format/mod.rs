//! Instrument format adapters.
//!
//! Each supported instrument has one [`FormatAdapter`] implementation that
//! knows its encoding, header convention, body layout and canonical column
//! names. Adapters are looked up by an explicit format token; there is no
//! sniffing by extension and no fallback parser.

pub mod dta;
pub mod eclab;
pub mod greenlight;

use crate::body::RawBody;
use crate::density::compute_current_density;
use crate::error::{EchemError, Result};
use crate::models::{ElectrodeArea, RawHeader, UnitMap};
use crate::reader::TextEncoding;
use crate::schema::apply_canonical_names;
use chrono::NaiveDateTime;
use clap::ValueEnum;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub use dta::DtaFormat;
pub use eclab::EcLabFormat;
pub use greenlight::GreenlightFormat;

/// Supported instrument formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum FormatKind {
    /// Gamry Framework `.DTA`
    #[value(name = "DTA")]
    Dta,
    /// BioLogic EC-Lab ASCII export
    #[value(name = "EC-Lab", alias = "ECLab")]
    EcLab,
    /// Greenlight fuel cell test station CSV
    #[value(name = "Greenlight")]
    Greenlight,
}

impl FormatKind {
    pub const ALL: [FormatKind; 3] = [FormatKind::Dta, FormatKind::EcLab, FormatKind::Greenlight];

    /// The adapter implementing this format
    pub fn adapter(&self) -> &'static dyn FormatAdapter {
        match self {
            FormatKind::Dta => &DtaFormat,
            FormatKind::EcLab => &EcLabFormat,
            FormatKind::Greenlight => &GreenlightFormat,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            FormatKind::Dta => "DTA",
            FormatKind::EcLab => "EC-Lab",
            FormatKind::Greenlight => "Greenlight",
        }
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for FormatKind {
    type Err = EchemError;

    fn from_str(token: &str) -> Result<Self> {
        match token.trim() {
            "DTA" => Ok(FormatKind::Dta),
            "EC-Lab" | "ECLab" => Ok(FormatKind::EcLab),
            "Greenlight" => Ok(FormatKind::Greenlight),
            other => Err(EchemError::UnsupportedFormat {
                token: other.to_string(),
            }),
        }
    }
}

/// Look up the adapter registered for a format token
pub fn adapter_for(token: &str) -> Result<&'static dyn FormatAdapter> {
    Ok(token.parse::<FormatKind>()?.adapter())
}

/// Header, table and units decoded from one file
#[derive(Debug, Clone)]
pub struct Decoded {
    pub header: RawHeader,
    pub header_length: usize,
    pub table: DataFrame,
    pub units: UnitMap,
}

/// Capabilities of one instrument format
pub trait FormatAdapter: fmt::Debug + Send + Sync {
    fn kind(&self) -> FormatKind;

    fn encoding(&self) -> TextEncoding;

    /// Extension of files written by the instrument, without the dot
    fn file_extension(&self) -> &'static str;

    /// Raw → canonical column names
    fn canonical_names(&self) -> &'static [(&'static str, &'static str)];

    /// Decode the header, returning it with the number of lines consumed
    fn decode_header(&self, lines: &[String], path: &Path) -> Result<(RawHeader, usize)>;

    /// Parse the body into raw cells and drop the format's pruned columns.
    ///
    /// May record values of pruned columns in `header`.
    fn decode_raw_body(
        &self,
        lines: &[String],
        header: &mut RawHeader,
        header_length: usize,
        path: &Path,
    ) -> Result<RawBody>;

    /// Acquisition start recorded in the header, when the format has one
    fn acquisition_time(&self, _header: &RawHeader) -> Option<NaiveDateTime> {
        None
    }

    /// Decode the body into a table with canonical column names
    fn decode_body(
        &self,
        lines: &[String],
        header: &mut RawHeader,
        header_length: usize,
        path: &Path,
    ) -> Result<(DataFrame, UnitMap)> {
        let raw = self.decode_raw_body(lines, header, header_length, path)?;
        let (mut table, mut units) = raw.into_table()?;
        apply_canonical_names(&mut table, &mut units, self.canonical_names(), path)?;
        Ok((table, units))
    }

    /// Decode a whole file; fails without partial results
    fn decode(&self, lines: &[String], path: &Path) -> Result<Decoded> {
        let (mut header, header_length) = self.decode_header(lines, path)?;
        let (table, units) = self.decode_body(lines, &mut header, header_length, path)?;
        Ok(Decoded {
            header,
            header_length,
            table,
            units,
        })
    }

    fn derive_current_density(
        &self,
        table: &mut DataFrame,
        units: &mut UnitMap,
        area: &ElectrodeArea,
    ) -> Result<()> {
        compute_current_density(table, units, area)
    }
}
