//! Application constants for the electrochemistry processor
//!
//! This module contains the format conventions (sentinels, fixed line numbers,
//! delimiters), canonical column names and header keys used throughout the
//! crate.

// =============================================================================
// Canonical Column Names
// =============================================================================

/// Format-independent column names seen by every downstream consumer
pub mod columns {
    pub const VOLTAGE: &str = "Voltage";
    pub const CURRENT: &str = "Current";
    pub const POWER: &str = "Power";
    pub const TEMPERATURE: &str = "Temperature";
    pub const TIME: &str = "Time";
    pub const CURRENT_DENSITY: &str = "Current Density";

    /// Identity column of reduced (mean) tables
    pub const FILE_NAME: &str = "File Name";
}

/// Unit recorded for columns whose title carries no unit
pub const DIMENSIONLESS_UNIT: &str = "-";

// =============================================================================
// Gamry DTA Format
// =============================================================================

pub mod dta {
    /// Header ends on the first line containing this marker
    pub const HEADER_SENTINEL: &str = "CURVE";
    pub const DELIMITER: char = '\t';
    pub const DECIMAL: char = ',';
    pub const FILE_EXTENSION: &str = "DTA";

    /// Blank label column and the `Pt` point index
    pub const DROPPED_COLUMNS: &[usize] = &[0, 1];

    pub const NAMES: &[(&str, &str)] = &[
        ("Vf", "Voltage"),
        ("Im", "Current"),
        ("Pwr", "Power"),
        ("Temp", "Temperature"),
        ("T", "Time"),
    ];

    pub const DATE_KEY: &str = "DATE";
    pub const TIME_KEY: &str = "TIME";
}

// =============================================================================
// BioLogic EC-Lab Format
// =============================================================================

pub mod eclab {
    /// 1-based line number holding `Nb header lines : N`
    pub const HEADER_LENGTH_LINE: usize = 2;
    pub const HEADER_LENGTH_SEPARATOR: char = ':';

    /// Declared header length includes the column title row
    pub const HEADER_LENGTH_OFFSET: usize = 1;

    pub const DELIMITER: char = '\t';
    pub const DECIMAL: char = ',';
    pub const FILE_EXTENSION: &str = "txt";

    /// Column titles are `name/unit`
    pub const UNIT_SEPARATOR: char = '/';

    pub const NAMES: &[(&str, &str)] = &[
        ("Ewe", "Voltage"),
        ("I", "Current"),
        ("P", "Power"),
        ("time", "Time"),
    ];

    pub const ACQUISITION_KEY: &str = "Acquisition started on";
}

// =============================================================================
// Greenlight Test Station Format
// =============================================================================

pub mod greenlight {
    /// Fixed number of metadata lines at the top of the file
    pub const HEADER_LENGTH: usize = 13;

    /// 0-based line index of the unit row; the name row follows it
    pub const COLUMN_HEADER_ROW: usize = 16;

    pub const DELIMITER: char = ',';
    pub const DECIMAL: char = '.';
    pub const FILE_EXTENSION: &str = "csv";

    /// Raw position of the file-mark column
    pub const FILE_MARK_COLUMN: usize = 2;
    pub const FILE_MARK_KEY: &str = "File Mark";

    pub const NAMES: &[(&str, &str)] = &[];
}

// =============================================================================
// Info File
// =============================================================================

/// Keys of the per-experiment `info.txt` file
pub mod info {
    pub const FILE_NAME: &str = "info.txt";
    pub const HEADER_SENTINEL: &str = "TABLE";
    pub const DELIMITER: char = '\t';

    pub const NAME: &str = "NAME";
    pub const UNIT: &str = "UNIT";
    pub const BOUNDS: &str = "BOUNDS";
    pub const IDENTIFIER: &str = "IDENTIFIER";
    pub const ELECTRODE_AREA: &str = "ELECTRODE SURFACE AREA";
}

// =============================================================================
// Curve Defaults
// =============================================================================

/// Folder below an experiment directory holding the instrument files
pub const DEFAULT_DATA_FOLDER: &str = "Data";

/// Name given to an electrode area read from an info file
pub const DEFAULT_ELECTRODE_AREA_NAME: &str = "Electrode Surface Area";

/// Lines starting with this marker are skipped in headers
pub const COMMENT_MARKER: char = '#';
