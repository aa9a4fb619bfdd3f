//! Variable correlation.
//!
//! Ties each file (or each curve) of an experiment series to one value of
//! the independent variable. Three strategies are supported:
//!
//! - internal: the variable is a column of every table; the value is its
//!   mean over the whole table
//! - bounds: the value sits between two literal markers in the file name
//!   (or the parent folder name)
//! - table: an explicit list of name substrings and values
//!
//! The result is a [`CorrelationTable`] sorted by value. Subjects are then
//! matched back to its rows by merge key.

use crate::constants::DIMENSIONLESS_UNIT;
use crate::error::{EchemError, Result};
use regex::{Regex, RegexSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Which name the bounds are searched in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Identifier {
    #[default]
    Files,
    Folders,
}

/// Where variable values come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableSource {
    /// Mean of the column named like the variable
    Internal,
    Bounds {
        left: String,
        right: String,
        #[serde(default)]
        identifier: Identifier,
    },
    /// Name substring and value pairs
    Table(Vec<(String, f64)>),
}

/// Name, unit and value source of an independent variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSpec {
    pub name: String,
    /// Taken from the data for internal variables when not given
    pub unit: Option<String>,
    pub source: VariableSource,
}

impl VariableSpec {
    pub fn internal(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: None,
            source: VariableSource::Internal,
        }
    }

    pub fn bounds(
        name: impl Into<String>,
        unit: impl Into<String>,
        left: impl Into<String>,
        right: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            unit: Some(unit.into()),
            source: VariableSource::Bounds {
                left: left.into(),
                right: right.into(),
                identifier: Identifier::Files,
            },
        }
    }

    /// Pairs of name substring and value; also accepts any map
    pub fn table<K: Into<String>>(
        name: impl Into<String>,
        unit: impl Into<String>,
        pairs: impl IntoIterator<Item = (K, f64)>,
    ) -> Self {
        Self {
            name: name.into(),
            unit: Some(unit.into()),
            source: VariableSource::Table(
                pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            ),
        }
    }

    /// Table from two parallel sequences of substrings and values
    pub fn table_from_columns<K: Into<String>>(
        name: impl Into<String>,
        unit: impl Into<String>,
        keys: Vec<K>,
        values: Vec<f64>,
    ) -> Result<Self> {
        let name = name.into();
        if keys.len() != values.len() {
            return Err(EchemError::configuration(format!(
                "table for variable '{}' has {} names but {} values",
                name,
                keys.len(),
                values.len()
            )));
        }
        Ok(Self::table(name, unit, keys.into_iter().zip(values)))
    }

    /// Search bounds in parent folder names instead of file names
    pub fn with_identifier(mut self, identifier: Identifier) -> Self {
        if let VariableSource::Bounds {
            identifier: ref mut current,
            ..
        } = self.source
        {
            *current = identifier;
        }
        self
    }
}

/// How a correlation table was built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrelationMode {
    Internal,
    Bounds,
    Table,
}

/// Something a variable value can be correlated with: a file or a curve
pub trait CorrelationSubject {
    /// Identity matched against merge keys
    fn identifier(&self) -> &str;

    /// Name of the enclosing folder, for folder-identified bounds
    fn folder_name(&self) -> Option<String>;

    fn has_column(&self, name: &str) -> bool;

    /// Mean of a column over all of the subject's data
    fn column_mean(&self, name: &str) -> Option<f64>;

    fn column_unit(&self, name: &str) -> Option<String>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationRow {
    pub merge_key: String,
    pub value: f64,
}

/// Merge keys and variable values, ascending by value
#[derive(Debug, Clone)]
pub struct CorrelationTable {
    variable: String,
    unit: String,
    mode: CorrelationMode,
    rows: Vec<CorrelationRow>,
}

impl CorrelationTable {
    pub fn new(
        variable: impl Into<String>,
        unit: impl Into<String>,
        mode: CorrelationMode,
        mut rows: Vec<CorrelationRow>,
    ) -> Self {
        rows.sort_by(|a, b| a.value.total_cmp(&b.value));
        Self {
            variable: variable.into(),
            unit: unit.into(),
            mode,
            rows,
        }
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn mode(&self) -> CorrelationMode {
        self.mode
    }

    pub fn rows(&self) -> &[CorrelationRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Matcher resolving identifiers to rows by merge-key substring
    pub fn matcher(&self) -> Result<KeyMatcher<'_>> {
        let patterns = self.rows.iter().map(|row| regex::escape(&row.merge_key));
        let set = RegexSet::new(patterns).map_err(|e| {
            EchemError::configuration(format!(
                "cannot build merge pattern for variable '{}': {}",
                self.variable, e
            ))
        })?;
        Ok(KeyMatcher { table: self, set })
    }
}

/// Resolves subject identifiers to correlation rows.
///
/// A key equal to the identifier wins outright. Otherwise exactly one key
/// must occur in the identifier: none, or several with different values,
/// is a `MergeAmbiguity`.
#[derive(Debug)]
pub struct KeyMatcher<'a> {
    table: &'a CorrelationTable,
    set: RegexSet,
}

impl<'a> KeyMatcher<'a> {
    pub fn resolve(&self, identifier: &str) -> Result<&'a CorrelationRow> {
        let rows = &self.table.rows;
        if let Some(row) = rows.iter().find(|row| row.merge_key == identifier) {
            return Ok(row);
        }

        let matched: Vec<&CorrelationRow> = self
            .set
            .matches(identifier)
            .into_iter()
            .map(|index| &rows[index])
            .collect();

        match matched.as_slice() {
            [] => Err(EchemError::MergeAmbiguity {
                identifier: identifier.to_string(),
                reason: format!(
                    "none of the {} merge keys for '{}' occur in it",
                    rows.len(),
                    self.table.variable
                ),
            }),
            [row] => Ok(*row),
            [first, rest @ ..] => {
                if rest.iter().all(|row| row.value == first.value) {
                    warn!(
                        "'{}' matches {} merge keys with the same value; using '{}'",
                        identifier,
                        matched.len(),
                        first.merge_key
                    );
                    Ok(*first)
                } else {
                    let keys: Vec<&str> = matched.iter().map(|r| r.merge_key.as_str()).collect();
                    Err(EchemError::MergeAmbiguity {
                        identifier: identifier.to_string(),
                        reason: format!("matches several merge keys: {}", keys.join(", ")),
                    })
                }
            }
        }
    }
}

/// Build the correlation table for `subjects` according to `spec`.
///
/// A variable present as a column in every subject is always internal,
/// whatever source `spec` names.
pub fn correlate<S: CorrelationSubject>(
    subjects: &[S],
    spec: &VariableSpec,
) -> Result<CorrelationTable> {
    let Some(first) = subjects.first() else {
        return Err(EchemError::configuration(format!(
            "no data to correlate variable '{}' with",
            spec.name
        )));
    };

    if subjects.iter().all(|s| s.has_column(&spec.name)) {
        let unit = spec
            .unit
            .clone()
            .or_else(|| first.column_unit(&spec.name))
            .unwrap_or_else(|| DIMENSIONLESS_UNIT.to_string());
        return correlate_internal(subjects, &spec.name, unit);
    }

    let unit = spec
        .unit
        .clone()
        .unwrap_or_else(|| DIMENSIONLESS_UNIT.to_string());

    match &spec.source {
        VariableSource::Internal => {
            let missing = subjects
                .iter()
                .find(|s| !s.has_column(&spec.name))
                .map_or_else(String::new, |s| s.identifier().to_string());
            Err(EchemError::VariableNotFound {
                variable: spec.name.clone(),
                identifier: missing,
                detail: "no column of that name".to_string(),
            })
        }
        VariableSource::Bounds {
            left,
            right,
            identifier,
        } => {
            if subjects.iter().any(|s| s.has_column(&spec.name)) {
                warn!(
                    "Variable '{}' is a column of some but not all files; using bounds",
                    spec.name
                );
            }
            correlate_bounds(subjects, &spec.name, unit, left, right, *identifier)
        }
        VariableSource::Table(pairs) => {
            let rows = pairs
                .iter()
                .map(|(key, value)| CorrelationRow {
                    merge_key: key.clone(),
                    value: *value,
                })
                .collect();
            debug!("Correlated '{}' from a table of {}", spec.name, pairs.len());
            Ok(CorrelationTable::new(
                &spec.name,
                unit,
                CorrelationMode::Table,
                rows,
            ))
        }
    }
}

fn correlate_internal<S: CorrelationSubject>(
    subjects: &[S],
    name: &str,
    unit: String,
) -> Result<CorrelationTable> {
    let rows = subjects
        .iter()
        .map(|subject| {
            let value = subject
                .column_mean(name)
                .ok_or_else(|| EchemError::VariableNotFound {
                    variable: name.to_string(),
                    identifier: subject.identifier().to_string(),
                    detail: "column has no numeric values to average".to_string(),
                })?;
            Ok(CorrelationRow {
                merge_key: subject.identifier().to_string(),
                value,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!("Correlated '{}' from column means of {} subjects", name, rows.len());
    Ok(CorrelationTable::new(
        name,
        unit,
        CorrelationMode::Internal,
        rows,
    ))
}

fn correlate_bounds<S: CorrelationSubject>(
    subjects: &[S],
    name: &str,
    unit: String,
    left: &str,
    right: &str,
    identifier: Identifier,
) -> Result<CorrelationTable> {
    let pattern = bounds_pattern(left, right)?;

    let rows = subjects
        .iter()
        .map(|subject| {
            let search_name = match identifier {
                Identifier::Files => subject.identifier().to_string(),
                Identifier::Folders => subject.folder_name().unwrap_or_default(),
            };
            let not_found = |detail: String| EchemError::VariableNotFound {
                variable: name.to_string(),
                identifier: search_name.clone(),
                detail,
            };

            let captured = pattern
                .captures(&search_name)
                .and_then(|captures| captures.get(1))
                .map(|m| m.as_str().trim())
                .ok_or_else(|| {
                    not_found(format!("bounds ('{}', '{}') do not match", left, right))
                })?;
            let value = captured.parse::<f64>().map_err(|_| {
                not_found(format!(
                    "'{}' between bounds ('{}', '{}') is not a number",
                    captured, left, right
                ))
            })?;

            Ok(CorrelationRow {
                merge_key: subject.identifier().to_string(),
                value,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!("Correlated '{}' from name bounds for {} subjects", name, rows.len());
    Ok(CorrelationTable::new(name, unit, CorrelationMode::Bounds, rows))
}

/// Text between the first `left` and the next `right` (the rest of the name
/// when `right` is empty). The capture is lazy so `ps50_run_2` yields `50`.
fn bounds_pattern(left: &str, right: &str) -> Result<Regex> {
    let capture = if right.is_empty() { "(.*)" } else { "(.*?)" };
    let pattern = format!("{}{}{}", regex::escape(left), capture, regex::escape(right));
    Regex::new(&pattern)
        .map_err(|e| EchemError::configuration(format!("invalid bounds pattern: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Named {
        name: String,
        folder: String,
        columns: HashMap<String, f64>,
    }

    impl Named {
        fn new(name: &str, folder: &str) -> Self {
            Self {
                name: name.to_string(),
                folder: folder.to_string(),
                columns: HashMap::new(),
            }
        }

        fn with_column(mut self, name: &str, mean: f64) -> Self {
            self.columns.insert(name.to_string(), mean);
            self
        }
    }

    impl CorrelationSubject for Named {
        fn identifier(&self) -> &str {
            &self.name
        }
        fn folder_name(&self) -> Option<String> {
            Some(self.folder.clone())
        }
        fn has_column(&self, name: &str) -> bool {
            self.columns.contains_key(name)
        }
        fn column_mean(&self, name: &str) -> Option<f64> {
            self.columns.get(name).copied()
        }
        fn column_unit(&self, _name: &str) -> Option<String> {
            Some("deg C".to_string())
        }
    }

    #[test]
    fn test_bounds_capture_up_to_next_right_marker() {
        let values = |names: &[&str], left: &str, right: &str| -> Vec<f64> {
            let files: Vec<Named> = names.iter().map(|n| Named::new(n, "d")).collect();
            let spec = VariableSpec::bounds("V", "-", left, right);
            correlate(&files, &spec)
                .unwrap()
                .rows()
                .iter()
                .map(|r| r.value)
                .collect()
        };

        assert_eq!(values(&["ps50_run_2.DTA"], "ps", "_"), vec![50.0]);
        assert_eq!(values(&["T80.5C.DTA"], "T", "C"), vec![80.5]);
        assert_eq!(values(&["run_T 42"], "T", ""), vec![42.0]);
        // Bounds are literal text
        assert_eq!(values(&["a.5.b"], ".", "."), vec![5.0]);
    }

    #[test]
    fn test_bounds_mode_sorted_by_value() {
        let files = vec![
            Named::new("ps200_run.DTA", "d"),
            Named::new("ps10_run.DTA", "d"),
            Named::new("ps50_run.DTA", "d"),
        ];
        let spec = VariableSpec::bounds("Pump Speed", "-", "ps", "_");

        let table = correlate(&files, &spec).unwrap();

        assert_eq!(table.mode(), CorrelationMode::Bounds);
        assert_eq!(table.unit(), "-");
        let values: Vec<f64> = table.rows().iter().map(|r| r.value).collect();
        assert_eq!(values, vec![10.0, 50.0, 200.0]);
        assert_eq!(table.rows()[0].merge_key, "ps10_run.DTA");
    }

    #[test]
    fn test_bounds_mode_missing_pattern_names_file() {
        let files = vec![Named::new("ps10_run.DTA", "d"), Named::new("baseline.DTA", "d")];
        let spec = VariableSpec::bounds("Pump Speed", "-", "ps", "_");

        match correlate(&files, &spec) {
            Err(EchemError::VariableNotFound {
                identifier, detail, ..
            }) => {
                assert_eq!(identifier, "baseline.DTA");
                assert!(detail.contains("('ps', '_')"));
            }
            other => panic!("Expected VariableNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_bounds_on_folder_names() {
        let files = vec![
            Named::new("a.DTA", "0k8V_zn16_paa1"),
            Named::new("b.DTA", "0k8V_zn8_paa1"),
        ];
        let spec = VariableSpec::bounds("Zinc Concentration", "vol-%", "zn", "_")
            .with_identifier(Identifier::Folders);

        let table = correlate(&files, &spec).unwrap();

        assert_eq!(table.rows()[0].merge_key, "b.DTA");
        assert_eq!(table.rows()[0].value, 8.0);
        assert_eq!(table.rows()[1].value, 16.0);
    }

    #[test]
    fn test_table_mode_forms() {
        let pairs = VariableSpec::table("Pump Speed", "-", [("ps100_", 100.0), ("ps10_", 10.0)]);
        let columns = VariableSpec::table_from_columns(
            "Pump Speed",
            "-",
            vec!["ps100_", "ps10_"],
            vec![100.0, 10.0],
        )
        .unwrap();
        let map: HashMap<String, f64> =
            [("ps100_".to_string(), 100.0), ("ps10_".to_string(), 10.0)].into();
        let mapped = VariableSpec::table("Pump Speed", "-", map);

        let files = vec![Named::new("ps10_x.DTA", "d")];
        for spec in [pairs, columns, mapped] {
            let table = correlate(&files, &spec).unwrap();
            assert_eq!(table.mode(), CorrelationMode::Table);
            assert_eq!(table.rows()[0].merge_key, "ps10_");
            assert_eq!(table.rows()[1].value, 100.0);
        }

        assert!(VariableSpec::table_from_columns("P", "-", vec!["a"], vec![1.0, 2.0]).is_err());
    }

    #[test]
    fn test_internal_mode_wins_when_column_everywhere() {
        let files = vec![
            Named::new("a.DTA", "d").with_column("Temperature", 60.0),
            Named::new("b.DTA", "d").with_column("Temperature", 40.0),
        ];
        let spec = VariableSpec::bounds("Temperature", "C", "T", "_");

        let table = correlate(&files, &spec).unwrap();

        assert_eq!(table.mode(), CorrelationMode::Internal);
        assert_eq!(table.rows()[0].merge_key, "b.DTA");
        assert_eq!(table.rows()[0].value, 40.0);
    }

    #[test]
    fn test_internal_unit_from_data() {
        let files = vec![Named::new("a.DTA", "d").with_column("Temperature", 60.0)];
        let table = correlate(&files, &VariableSpec::internal("Temperature")).unwrap();
        assert_eq!(table.unit(), "deg C");
    }

    #[test]
    fn test_internal_mode_missing_column() {
        let files = vec![
            Named::new("a.DTA", "d").with_column("Temperature", 60.0),
            Named::new("b.DTA", "d"),
        ];
        match correlate(&files, &VariableSpec::internal("Temperature")) {
            Err(EchemError::VariableNotFound { identifier, .. }) => {
                assert_eq!(identifier, "b.DTA")
            }
            other => panic!("Expected VariableNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_subjects() {
        let files: Vec<Named> = Vec::new();
        assert!(matches!(
            correlate(&files, &VariableSpec::internal("Temperature")),
            Err(EchemError::Configuration { .. })
        ));
    }

    #[test]
    fn test_matcher_resolves_substrings() {
        let table = CorrelationTable::new(
            "Pump Speed",
            "-",
            CorrelationMode::Table,
            vec![
                CorrelationRow {
                    merge_key: "ps10_".to_string(),
                    value: 10.0,
                },
                CorrelationRow {
                    merge_key: "ps100_".to_string(),
                    value: 100.0,
                },
            ],
        );
        let matcher = table.matcher().unwrap();

        assert_eq!(matcher.resolve("run_ps100_a.DTA").unwrap().value, 100.0);
        assert_eq!(matcher.resolve("run_ps10_a.DTA").unwrap().value, 10.0);

        match matcher.resolve("run_ps50_a.DTA") {
            Err(EchemError::MergeAmbiguity { identifier, .. }) => {
                assert_eq!(identifier, "run_ps50_a.DTA")
            }
            other => panic!("Expected MergeAmbiguity, got {:?}", other),
        }
    }

    #[test]
    fn test_matcher_rejects_conflicting_keys() {
        let table = CorrelationTable::new(
            "Zinc Concentration",
            "vol-%",
            CorrelationMode::Table,
            vec![
                CorrelationRow {
                    merge_key: "zn1".to_string(),
                    value: 1.0,
                },
                CorrelationRow {
                    merge_key: "zn16".to_string(),
                    value: 16.0,
                },
            ],
        );
        let matcher = table.matcher().unwrap();

        assert!(matches!(
            matcher.resolve("0k8V_zn16_paa1"),
            Err(EchemError::MergeAmbiguity { .. })
        ));
        assert_eq!(matcher.resolve("zn16").unwrap().value, 16.0);
    }

    #[test]
    fn test_identifier_only_applies_to_bounds() {
        let spec = VariableSpec::bounds("Pump Speed", "-", "ps", "_");
        assert_eq!(spec.clone().with_identifier(Identifier::Files), spec);
        assert_eq!(
            VariableSpec::internal("Temperature").with_identifier(Identifier::Folders),
            VariableSpec::internal("Temperature")
        );
    }
}
