//! Columnar body decoding shared by all formats.
//!
//! The body starts at a column header (one `name/unit` row, or a name row
//! and a unit row in either order) followed by delimited data rows. Cells
//! are kept as text until the table is built, so formats can prune raw
//! columns first (index columns, file marks).

use crate::constants::DIMENSIONLESS_UNIT;
use crate::error::{EchemError, Result};
use crate::models::{HeaderOrder, UnitMap};
use polars::prelude::*;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

/// How the column header of a body is laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnHeader {
    /// Two rows, one with names and one with units
    TwoRow(HeaderOrder),
    /// One row of `name<sep>unit` titles
    Combined { separator: char },
}

impl ColumnHeader {
    fn rows(&self) -> usize {
        match self {
            ColumnHeader::TwoRow(_) => 2,
            ColumnHeader::Combined { .. } => 1,
        }
    }
}

/// Delimiter, decimal separator and column header layout of a body
#[derive(Debug, Clone, Copy)]
pub struct BodyLayout {
    pub delimiter: char,
    pub decimal: char,
    pub column_header: ColumnHeader,
}

/// Body cells before type inference, one vector per column
#[derive(Debug, Clone, Default)]
pub struct RawBody {
    pub names: Vec<String>,
    pub units: UnitMap,
    pub columns: Vec<Vec<String>>,
}

impl RawBody {
    /// Parse the body whose column header starts at line index `header_row`.
    ///
    /// A header that swallowed the whole file leaves nothing to parse and
    /// yields an empty body.
    pub fn parse(
        lines: &[String],
        header_row: usize,
        layout: &BodyLayout,
        path: &Path,
    ) -> Result<Self> {
        if header_row == lines.len() {
            warn!(
                "No column header after the header in {}; table is empty",
                path.display()
            );
            return Ok(Self::default());
        }

        let header_rows = layout.column_header.rows();
        let Some(rest) = lines.get(header_row..) else {
            return Err(EchemError::decode(
                path,
                format!(
                    "column header expected at line {}, file has {} lines",
                    header_row + 1,
                    lines.len()
                ),
            ));
        };
        let records = read_records(rest, header_row, layout, path)?;
        if records.len() < header_rows {
            return Err(EchemError::decode(
                path,
                format!(
                    "expected {} column header row(s) at line {}, file has {} lines",
                    header_rows,
                    header_row + 1,
                    lines.len()
                ),
            ));
        }
        let (header_records, data_records) = records.split_at(header_rows);

        let header_cells: Vec<Vec<&str>> = header_records
            .iter()
            .map(|(_, cells)| cells.iter().map(String::as_str).collect())
            .collect();

        let (names, units) = match layout.column_header {
            ColumnHeader::TwoRow(order) => {
                decompose_two_row_header(&header_cells[0], &header_cells[1], order)
                    .map_err(|reason| EchemError::decode(path, reason))?
            }
            ColumnHeader::Combined { separator } => {
                split_combined_titles(&header_cells[0], separator)
            }
        };

        let width = names.len();
        let mut columns: Vec<Vec<String>> = vec![Vec::new(); width];

        for (line_number, cells) in data_records {
            if cells.iter().all(String::is_empty) {
                continue;
            }
            let excess_is_blank = cells.iter().skip(width).all(String::is_empty);
            if cells.len() < width || !excess_is_blank {
                return Err(EchemError::decode(
                    path,
                    format!(
                        "line {} has {} fields, column header declares {}",
                        line_number,
                        cells.len(),
                        width
                    ),
                ));
            }
            for (column, cell) in columns.iter_mut().zip(cells) {
                column.push(normalise_decimal(cell, layout.decimal));
            }
        }

        debug!(
            "Parsed body of {}: {} columns, {} rows",
            path.display(),
            width,
            columns.first().map_or(0, Vec::len)
        );

        Ok(Self {
            names,
            units,
            columns,
        })
    }

    /// Remove the raw columns at `positions`, returning them with their cells
    pub fn remove_columns(&mut self, positions: &[usize]) -> Vec<(String, Vec<String>)> {
        let mut removed = Vec::new();
        let mut positions: Vec<usize> = positions
            .iter()
            .copied()
            .filter(|&p| p < self.names.len())
            .collect();
        positions.sort_unstable();
        positions.dedup();

        for position in positions.into_iter().rev() {
            let name = self.names.remove(position);
            let cells = self.columns.remove(position);
            self.units.remove(&name);
            removed.push((name, cells));
        }
        removed.reverse();
        removed
    }

    /// Build the table: all-numeric columns become `Float64`, others `String`
    pub fn into_table(self) -> Result<(DataFrame, UnitMap)> {
        let columns: Vec<Column> = self
            .names
            .iter()
            .zip(&self.columns)
            .map(|(name, cells)| typed_column(name, cells))
            .collect();

        let table = if columns.is_empty() {
            DataFrame::empty()
        } else {
            DataFrame::new(columns)?
        };
        Ok((table, self.units))
    }
}

/// Split a two-level column header into resolved names and their units.
///
/// Duplicate names get positional `.1`, `.2` suffixes; blank names become
/// `Unnamed: <position>`.
pub fn decompose_two_row_header(
    first: &[&str],
    second: &[&str],
    order: HeaderOrder,
) -> std::result::Result<(Vec<String>, UnitMap), String> {
    if first.len() != second.len() {
        return Err(format!(
            "column header rows differ in width ({} vs {})",
            first.len(),
            second.len()
        ));
    }

    let (name_row, unit_row) = match order {
        HeaderOrder::NameMajor => (first, second),
        HeaderOrder::UnitMajor => (second, first),
    };

    let names = resolve_names(name_row.iter().copied());
    let units = names
        .iter()
        .zip(unit_row)
        .map(|(name, unit)| (name.clone(), unit.to_string()))
        .collect();
    Ok((names, units))
}

fn split_combined_titles(titles: &[&str], separator: char) -> (Vec<String>, UnitMap) {
    let mut raw_names = Vec::with_capacity(titles.len());
    let mut raw_units = Vec::with_capacity(titles.len());
    for title in titles {
        let mut parts = title.split(separator);
        raw_names.push(parts.next().unwrap_or_default().trim());
        raw_units.push(
            parts
                .next()
                .map(str::trim)
                .unwrap_or(DIMENSIONLESS_UNIT)
                .to_string(),
        );
    }

    let names = resolve_names(raw_names.into_iter());
    let units = names.iter().cloned().zip(raw_units).collect();
    (names, units)
}

fn resolve_names<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.enumerate()
        .map(|(position, name)| {
            let base = if name.is_empty() {
                format!("Unnamed: {}", position)
            } else {
                name.to_string()
            };
            let mut resolved = base.clone();
            let mut suffix = 1;
            while !seen.insert(resolved.clone()) {
                resolved = format!("{}.{}", base, suffix);
                suffix += 1;
            }
            resolved
        })
        .collect()
}

/// Delimited records of `lines`, each with its 1-based line number in the
/// file. Quoted fields may contain the delimiter; blank lines are skipped.
fn read_records(
    lines: &[String],
    first_line: usize,
    layout: &BodyLayout,
    path: &Path,
) -> Result<Vec<(usize, Vec<String>)>> {
    let delimiter = u8::try_from(layout.delimiter).map_err(|_| {
        EchemError::configuration(format!(
            "delimiter {:?} is not a single-byte character",
            layout.delimiter
        ))
    })?;
    let text = lines.join("\n");
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| {
            EchemError::decode(path, format!("unreadable row after line {}: {}", first_line, e))
        })?;
        let line_number = first_line + record.position().map_or(0, |p| p.line() as usize);
        records.push((line_number, record.iter().map(str::to_string).collect()));
    }
    Ok(records)
}

fn normalise_decimal(cell: &str, decimal: char) -> String {
    if decimal == '.' {
        cell.to_string()
    } else {
        cell.replace(decimal, ".")
    }
}

/// `Float64` when every non-empty cell parses as a number, `String` otherwise
fn typed_column(name: &str, cells: &[String]) -> Column {
    let text: Vec<Option<&str>> = cells
        .iter()
        .map(|cell| (!cell.is_empty()).then_some(cell.as_str()))
        .collect();
    let series = Series::new(name.into(), text);
    match series.strict_cast(&DataType::Float64) {
        Ok(numbers) => numbers.into_column(),
        Err(_) => series.into_column(),
    }
}
