//! Canonical schema mapping.
//!
//! Renames format-specific column names (`Vf`, `Ewe`, ...) to the canonical
//! names downstream consumers use, on the table and its unit map together.
//! Names missing from the format's table pass through unchanged.

use crate::error::{EchemError, Result};
use crate::models::UnitMap;
use polars::prelude::*;
use std::path::Path;
use tracing::debug;

/// Apply a raw → canonical name table to `table` and `units` in lock-step
pub fn apply_canonical_names(
    table: &mut DataFrame,
    units: &mut UnitMap,
    names: &[(&str, &str)],
    path: &Path,
) -> Result<()> {
    for &(raw, canonical) in names {
        if table.get_column_index(raw).is_some() {
            if table.get_column_index(canonical).is_some() {
                return Err(EchemError::decode(
                    path,
                    format!(
                        "column '{}' cannot be renamed to '{}', which already exists",
                        raw, canonical
                    ),
                ));
            }
            table.rename(raw, canonical.into())?;
            debug!("Renamed column '{}' to '{}'", raw, canonical);
        }
        if let Some(unit) = units.remove(raw) {
            units.insert(canonical.to_string(), unit);
        }
    }
    Ok(())
}
