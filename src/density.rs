//! Current density derivation and electrode area resolution.
//!
//! `Current Density` is `|Current / area|` with unit `<current unit>/<area
//! unit>`. A missing area is resolved through an [`AreaProvider`], so the
//! interactive prompt of the command-line driver stays out of the library
//! path; the default provider fails fast.

use crate::constants::columns::{CURRENT, CURRENT_DENSITY};
use crate::error::{EchemError, Result};
use crate::models::{ElectrodeArea, UnitMap};
use crate::table::numeric_values;
use polars::prelude::*;
use std::io::{BufRead, Write};
use tracing::debug;

/// Add `Current Density` to `table` and its unit to `units`.
///
/// Fails with `MissingColumn` when `Current` or its unit is absent, leaving
/// both untouched.
pub fn compute_current_density(
    table: &mut DataFrame,
    units: &mut UnitMap,
    area: &ElectrodeArea,
) -> Result<()> {
    if !(area.value.is_finite() && area.value != 0.0) {
        return Err(EchemError::configuration(format!(
            "electrode area '{}' must be a finite, non-zero value, got {}",
            area.name, area.value
        )));
    }

    let current_unit = units
        .get(CURRENT)
        .cloned()
        .ok_or_else(|| missing_current("no unit recorded for the current column"))?;

    let current = table
        .column(CURRENT)
        .map_err(|_| missing_current("table has no current column"))?;
    let values = numeric_values(current)?
        .ok_or_else(|| missing_current("current column is not numeric"))?;

    let density: Vec<Option<f64>> = values
        .into_iter()
        .map(|value| value.map(|v| (v / area.value).abs()))
        .collect();

    table.with_column(Column::new(CURRENT_DENSITY.into(), density))?;
    units.insert(
        CURRENT_DENSITY.to_string(),
        format!("{}/{}", current_unit, area.unit),
    );
    debug!("Derived current density using {} = {}", area.name, area.value);
    Ok(())
}

fn missing_current(context: &str) -> EchemError {
    EchemError::MissingColumn {
        column: CURRENT.to_string(),
        context: context.to_string(),
    }
}

/// Supplies an electrode area when neither configuration nor metadata has one
pub trait AreaProvider {
    fn electrode_area(&self) -> Result<ElectrodeArea>;
}

/// Refuses to invent an area; for non-interactive use
#[derive(Debug, Default, Clone, Copy)]
pub struct FailFast;

impl AreaProvider for FailFast {
    fn electrode_area(&self) -> Result<ElectrodeArea> {
        Err(EchemError::MissingElectrodeArea {
            reason: "not configured and not found in the info file".to_string(),
        })
    }
}

/// Asks for the area on standard input
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinPrompt;

impl AreaProvider for StdinPrompt {
    fn electrode_area(&self) -> Result<ElectrodeArea> {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        prompt_area(&mut stdin.lock(), &mut stdout)
    }
}

/// Read an area value and unit from `input`, writing prompts to `output`
pub fn prompt_area(input: &mut impl BufRead, output: &mut impl Write) -> Result<ElectrodeArea> {
    let value_text = prompt_line(input, output, "Provide value for electrode surface area: ")?;
    let value = value_text
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|_| EchemError::MissingElectrodeArea {
            reason: format!("'{}' is not a number", value_text),
        })?;
    let unit = prompt_line(input, output, "Provide unit for electrode surface area: ")?;

    Ok(ElectrodeArea::new(
        crate::constants::DEFAULT_ELECTRODE_AREA_NAME,
        value,
        unit,
    ))
}

fn prompt_line(input: &mut impl BufRead, output: &mut impl Write, prompt: &str) -> Result<String> {
    write!(output, "{}", prompt)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(EchemError::MissingElectrodeArea {
            reason: "input closed before an area was entered".to_string(),
        });
    }
    Ok(line.trim().to_string())
}
