//! A single decoded instrument file.

use crate::correlation::CorrelationSubject;
use crate::error::{EchemError, Result};
use crate::format::{FormatAdapter, FormatKind};
use crate::models::{ElectrodeArea, RawHeader, UnitMap, Variable};
use crate::reader::{LineSource, read_lines};
use crate::table;
use chrono::NaiveDateTime;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Header, table and units of one instrument file, plus the variable value
/// correlated with it once it belongs to a curve.
///
/// Construction either decodes the whole file or fails.
#[derive(Debug, Clone)]
pub struct InstrumentFile {
    path: PathBuf,
    file_name: String,
    format: FormatKind,
    header: RawHeader,
    table: DataFrame,
    units: UnitMap,
    variable: Option<Variable>,
    experiment_dir: Option<PathBuf>,
}

impl InstrumentFile {
    /// Read and decode the file at `path`
    pub fn open(path: impl AsRef<Path>, format: FormatKind) -> Result<Self> {
        Self::from_source(LineSource::from(path.as_ref()), format)
    }

    /// Read and decode a file whose format is given as a token (`DTA`, ...)
    pub fn open_as(path: impl AsRef<Path>, format_token: &str) -> Result<Self> {
        Self::open(path, format_token.parse()?)
    }

    /// Decode a file from a path or in-memory lines
    pub fn from_source(source: LineSource, format: FormatKind) -> Result<Self> {
        let adapter = format.adapter();
        let lines = read_lines(&source, adapter.encoding())?;
        let path = source.path().to_path_buf();
        let decoded = adapter.decode(&lines, &path)?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        debug!(
            "Decoded {} file {}: {} header lines, {} columns x {} rows",
            format,
            file_name,
            decoded.header_length,
            decoded.table.width(),
            decoded.table.height()
        );

        Ok(Self {
            path,
            file_name,
            format,
            header: decoded.header,
            table: decoded.table,
            units: decoded.units,
            variable: None,
            experiment_dir: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Name of the experiment directory once the file belongs to a curve,
    /// otherwise of the directory holding the file
    pub fn folder_name(&self) -> Option<String> {
        let folder = match (&self.experiment_dir, self.path.parent()) {
            (Some(dir), _) => dir.clone(),
            (None, Some(parent)) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => std::path::absolute(&self.path)
                .ok()?
                .parent()?
                .to_path_buf(),
        };
        folder
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    }

    pub(crate) fn set_experiment_dir(&mut self, dir: PathBuf) {
        self.experiment_dir = Some(dir);
    }

    pub fn format(&self) -> FormatKind {
        self.format
    }

    pub fn header(&self) -> &RawHeader {
        &self.header
    }

    pub fn table(&self) -> &DataFrame {
        &self.table
    }

    pub fn units(&self) -> &UnitMap {
        &self.units
    }

    pub fn unit(&self, column: &str) -> Option<&str> {
        self.units.get(column).map(String::as_str)
    }

    pub fn variable(&self) -> Option<&Variable> {
        self.variable.as_ref()
    }

    pub(crate) fn set_variable(&mut self, variable: Variable) {
        self.variable = Some(variable);
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.table.get_column_index(name).is_some()
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.table
            .column(name)
            .map_err(|_| EchemError::MissingColumn {
                column: name.to_string(),
                context: format!("not present in {}", self.file_name),
            })
    }

    /// `length` rows starting at `offset`; a negative offset counts from the end
    pub fn rows(&self, offset: i64, length: usize) -> DataFrame {
        self.table.slice(offset, length)
    }

    /// Rows ordered ascending by `column`
    pub fn sorted_by(&self, column: &str) -> Result<DataFrame> {
        table::sort_by(&self.table, column)
    }

    /// Mean of a numeric column over every row
    pub fn column_mean(&self, name: &str) -> Option<f64> {
        table::column_mean(&self.table, name)
    }

    /// Mean of each numeric column over the last `points` rows (all if `0`)
    pub fn mean_row(&self, points: usize) -> Vec<(String, Option<f64>)> {
        table::mean_row(&self.table, points)
    }

    pub fn acquisition_time(&self) -> Option<NaiveDateTime> {
        self.format.adapter().acquisition_time(&self.header)
    }

    /// Add a `Current Density` column.
    ///
    /// Returns `false`, after logging the reason, when the table has no
    /// usable current column; the table is then unchanged.
    pub fn calculate_current_density(&mut self, area: &ElectrodeArea) -> Result<bool> {
        match self
            .format
            .adapter()
            .derive_current_density(&mut self.table, &mut self.units, area)
        {
            Ok(()) => Ok(true),
            Err(error @ EchemError::MissingColumn { .. }) => {
                warn!(
                    "Current density not calculated for {}: {}",
                    self.file_name, error
                );
                Ok(false)
            }
            Err(error) => Err(error),
        }
    }
}

impl CorrelationSubject for InstrumentFile {
    fn identifier(&self) -> &str {
        &self.file_name
    }

    fn folder_name(&self) -> Option<String> {
        InstrumentFile::folder_name(self)
    }

    fn has_column(&self, name: &str) -> bool {
        InstrumentFile::has_column(self, name)
    }

    fn column_mean(&self, name: &str) -> Option<f64> {
        InstrumentFile::column_mean(self, name)
    }

    fn column_unit(&self, name: &str) -> Option<String> {
        self.unit(name).map(str::to_string)
    }
}
