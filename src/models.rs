//! Core data structures shared by the decoders, the correlator and curves.
//!
//! Defines the decoded header mapping, column units, the correlated
//! variable record and the electrode area used for current density.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Column name to unit string (`-` for dimensionless)
pub type UnitMap = HashMap<String, String>;

/// Header metadata: key to ordered fields, in first-seen key order.
///
/// A key seen twice keeps its original position but takes the later fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawHeader {
    entries: Vec<(String, Vec<String>)>,
}

impl RawHeader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, fields: Vec<String>) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = fields,
            None => self.entries.push((key, fields)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, fields)| fields.as_slice())
    }

    /// First field of `key`, the common case for single-valued entries
    pub fn first(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(|fields| fields.first())
            .map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Independent variable value correlated with one file or curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub unit: String,
    pub value: f64,
}

/// Electrode surface area used to derive current density
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectrodeArea {
    pub name: String,
    pub value: f64,
    pub unit: String,
}

impl ElectrodeArea {
    pub fn new(name: impl Into<String>, value: f64, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value,
            unit: unit.into(),
        }
    }
}

/// Which of the two column header rows carries the names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderOrder {
    /// Name row first, unit row second (Gamry DTA)
    NameMajor,
    /// Unit row first, name row second (Greenlight)
    UnitMajor,
}
