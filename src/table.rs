//! Row slicing, reduction and ordering helpers over decoded tables.

use crate::error::{EchemError, Result};
use polars::prelude::*;

/// The last `points` rows; `0` or a count beyond the height means all rows
pub fn last_rows(table: &DataFrame, points: usize) -> DataFrame {
    if points == 0 || points >= table.height() {
        table.clone()
    } else {
        table.tail(Some(points))
    }
}

/// Whether a column holds numbers that can be averaged
pub fn is_numeric(column: &Column) -> bool {
    matches!(
        column.dtype(),
        DataType::Float64
            | DataType::Float32
            | DataType::Int64
            | DataType::Int32
            | DataType::UInt64
            | DataType::UInt32
    )
}

/// Column values as `f64`, or `None` for non-numeric columns
pub fn numeric_values(column: &Column) -> Result<Option<Vec<Option<f64>>>> {
    if !is_numeric(column) {
        return Ok(None);
    }
    let series = column.as_materialized_series().cast(&DataType::Float64)?;
    Ok(Some(series.f64()?.into_iter().collect()))
}

/// Arithmetic mean of a numeric column over the whole table
pub fn column_mean(table: &DataFrame, name: &str) -> Option<f64> {
    let column = table.column(name).ok()?;
    if !is_numeric(column) {
        return None;
    }
    column.as_materialized_series().mean()
}

/// Mean of every numeric column over the last `points` rows, in column order
pub fn mean_row(table: &DataFrame, points: usize) -> Vec<(String, Option<f64>)> {
    let rows = last_rows(table, points);
    rows.get_columns()
        .iter()
        .filter(|column| is_numeric(column))
        .map(|column| {
            (
                column.name().to_string(),
                column.as_materialized_series().mean(),
            )
        })
        .collect()
}

/// Rows ordered ascending by `column`
pub fn sort_by(table: &DataFrame, column: &str) -> Result<DataFrame> {
    if table.get_column_index(column).is_none() {
        return Err(EchemError::MissingColumn {
            column: column.to_string(),
            context: "cannot sort by a column the table does not have".to_string(),
        });
    }
    Ok(table.sort([column], SortMultipleOptions::default())?)
}
