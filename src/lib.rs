//! Electrochemistry Processor Library
//!
//! Reads measurement files written by electrochemical test instruments
//! (Gamry `.DTA`, BioLogic EC-Lab ASCII, Greenlight test station CSV) into
//! polars tables with canonical column names and per-column units, and
//! correlates a series of such files with the independent variable of the
//! experiment.
//!
//! This library provides tools for:
//! - Decoding format-specific headers and multi-row column headers
//! - Mapping instrument column names to `Voltage`, `Current`, `Power`, ...
//! - Deriving current density from an electrode area
//! - Correlating files with a variable from their names, a lookup table or
//!   one of their own columns
//! - Reducing each file to mean values and ordering a series by its variable

pub mod aggregate;
pub mod body;
pub mod cli;
pub mod config;
pub mod constants;
pub mod correlation;
pub mod curve;
pub mod density;
pub mod discovery;
pub mod error;
pub mod format;
pub mod header;
pub mod info;
pub mod instrument;
pub mod models;
pub mod reader;
pub mod schema;
pub mod table;

// Re-export commonly used types
pub use aggregate::{MeanTable, reduce_and_merge};
pub use config::CurveConfig;
pub use correlation::{
    CorrelationMode, CorrelationTable, Identifier, VariableSource, VariableSpec, correlate,
};
pub use curve::{Curve, MultiCurve};
pub use density::{AreaProvider, FailFast, StdinPrompt, compute_current_density};
pub use error::{EchemError, Result};
pub use format::{FormatAdapter, FormatKind, adapter_for};
pub use info::InfoFile;
pub use instrument::InstrumentFile;
pub use models::{ElectrodeArea, RawHeader, UnitMap, Variable};
pub use reader::LineSource;
