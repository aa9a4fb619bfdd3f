//! Mean reduction and merging of a file series with its correlation table.

use crate::constants::columns::FILE_NAME;
use crate::correlation::{CorrelationMode, CorrelationTable};
use crate::error::{EchemError, Result};
use crate::instrument::InstrumentFile;
use polars::prelude::*;
use tracing::debug;

/// One file reduced to column means and tagged with its variable value(s)
#[derive(Debug, Clone, PartialEq)]
pub struct ReducedRow {
    pub file_name: String,
    /// Value of the outer variable when rows of several curves are stacked
    pub group: Option<f64>,
    pub value: f64,
    pub means: Vec<(String, Option<f64>)>,
}

/// Reduced rows of a series, ascending by variable value
#[derive(Debug, Clone)]
pub struct MeanTable {
    group: Option<String>,
    variable: String,
    rows: Vec<ReducedRow>,
}

impl MeanTable {
    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// Name of the outer variable of stacked tables
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn rows(&self) -> &[ReducedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Stack the tables of several curves, each tagged with its value of
    /// `group`; rows are ordered by group value, then variable value
    pub fn stack(group: impl Into<String>, parts: Vec<(f64, MeanTable)>) -> Result<MeanTable> {
        let group = group.into();
        let variable = match parts.first() {
            Some((_, table)) => table.variable.clone(),
            None => {
                return Err(EchemError::configuration(format!(
                    "no curves to stack for '{}'",
                    group
                )));
            }
        };

        let mut rows = Vec::new();
        for (group_value, table) in parts {
            if table.variable != variable {
                return Err(EchemError::configuration(format!(
                    "cannot stack curves over '{}' and '{}'",
                    variable, table.variable
                )));
            }
            rows.extend(table.rows.into_iter().map(|mut row| {
                row.group = Some(group_value);
                row.means.retain(|(name, _)| *name != group);
                row
            }));
        }
        rows.sort_by(|a, b| {
            let a_group = a.group.unwrap_or(f64::NAN);
            let b_group = b.group.unwrap_or(f64::NAN);
            a_group
                .total_cmp(&b_group)
                .then_with(|| a.value.total_cmp(&b.value))
        });

        Ok(MeanTable {
            group: Some(group),
            variable,
            rows,
        })
    }

    /// `File Name`, the outer variable if stacked, the variable, then the
    /// mean of every numeric column in first-seen order
    pub fn to_frame(&self) -> Result<DataFrame> {
        let mut mean_names: Vec<&str> = Vec::new();
        for row in &self.rows {
            for (name, _) in &row.means {
                if !mean_names.contains(&name.as_str()) {
                    mean_names.push(name);
                }
            }
        }

        let file_names: Vec<&str> = self.rows.iter().map(|r| r.file_name.as_str()).collect();
        let mut frame_columns = vec![Column::new(FILE_NAME.into(), file_names)];
        if let Some(group) = &self.group {
            let values: Vec<Option<f64>> = self.rows.iter().map(|r| r.group).collect();
            frame_columns.push(Column::new(group.as_str().into(), values));
        }
        let values: Vec<f64> = self.rows.iter().map(|r| r.value).collect();
        frame_columns.push(Column::new(self.variable.as_str().into(), values));

        for name in mean_names {
            let values: Vec<Option<f64>> = self
                .rows
                .iter()
                .map(|row| {
                    row.means
                        .iter()
                        .find(|(n, _)| n == name)
                        .and_then(|(_, mean)| *mean)
                })
                .collect();
            frame_columns.push(Column::new(name.into(), values));
        }

        Ok(DataFrame::new(frame_columns)?)
    }
}

/// Reduce each file to the means of its last `points` rows (all rows for
/// `0`) and attach the correlated variable value.
///
/// In internal mode the variable is itself a reduced column, so no merge is
/// needed; otherwise each file name is matched against the table's keys.
pub fn reduce_and_merge(
    files: &[InstrumentFile],
    table: &CorrelationTable,
    points: usize,
) -> Result<MeanTable> {
    let variable = table.variable();
    let matcher = match table.mode() {
        CorrelationMode::Internal => None,
        _ => Some(table.matcher()?),
    };

    let mut rows = Vec::with_capacity(files.len());
    for file in files {
        let mut means = file.mean_row(points);
        let value = match &matcher {
            None => {
                let position = means.iter().position(|(name, _)| name == variable);
                position
                    .and_then(|index| means.remove(index).1)
                    .ok_or_else(|| EchemError::VariableNotFound {
                        variable: variable.to_string(),
                        identifier: file.file_name().to_string(),
                        detail: "no numeric values to average".to_string(),
                    })?
            }
            Some(matcher) => {
                means.retain(|(name, _)| name != variable);
                matcher.resolve(file.file_name())?.value
            }
        };
        rows.push(ReducedRow {
            file_name: file.file_name().to_string(),
            group: None,
            value,
            means,
        });
    }
    rows.sort_by(|a, b| a.value.total_cmp(&b.value));

    debug!(
        "Reduced {} files over '{}' (points = {})",
        rows.len(),
        variable,
        points
    );
    Ok(MeanTable {
        group: None,
        variable: variable.to_string(),
        rows,
    })
}
