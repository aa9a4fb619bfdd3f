//! Configuration for building curves from experiment directories.
//!
//! Provides the folder layout, mean-reduction window and electrode area
//! settings shared by [`Curve`](crate::curve::Curve) and
//! [`MultiCurve`](crate::curve::MultiCurve) construction.

use crate::constants::{DEFAULT_DATA_FOLDER, info};
use crate::error::{EchemError, Result};
use crate::models::ElectrodeArea;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Settings for curve construction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveConfig {
    /// Folder below each experiment directory holding the instrument files
    pub data_folder: String,

    /// Rows averaged from the end of each table (0 = all rows)
    pub points: usize,

    /// Electrode area; takes precedence over the info file
    pub electrode_area: Option<ElectrodeArea>,

    /// Add a `Current Density` column to every file
    pub derive_current_density: bool,

    /// Info file to read; defaults to `info.txt` in the experiment directory
    pub info_file: Option<PathBuf>,
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            data_folder: DEFAULT_DATA_FOLDER.to_string(),
            points: 0,
            electrode_area: None,
            derive_current_density: true,
            info_file: None,
        }
    }
}

impl CurveConfig {
    pub fn with_data_folder(mut self, data_folder: impl Into<String>) -> Self {
        self.data_folder = data_folder.into();
        self
    }

    pub fn with_points(mut self, points: usize) -> Self {
        self.points = points;
        self
    }

    pub fn with_electrode_area(mut self, area: ElectrodeArea) -> Self {
        self.electrode_area = Some(area);
        self
    }

    pub fn with_current_density(mut self, enabled: bool) -> Self {
        self.derive_current_density = enabled;
        self
    }

    pub fn with_info_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.info_file = Some(path.into());
        self
    }

    /// Directory holding the instrument files of the experiment at `base`
    pub fn data_dir(&self, base: &Path) -> PathBuf {
        if self.data_folder.is_empty() {
            base.to_path_buf()
        } else {
            base.join(&self.data_folder)
        }
    }

    /// Info file for the experiment at `base`, if one is configured or present
    pub fn info_path(&self, base: &Path) -> Option<PathBuf> {
        match &self.info_file {
            Some(path) => Some(path.clone()),
            None => {
                let candidate = base.join(info::FILE_NAME);
                candidate.is_file().then_some(candidate)
            }
        }
    }

    /// Whether `path` is an experiment info file rather than instrument data
    pub fn is_info_file(&self, path: &Path) -> bool {
        let default_name = path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().eq_ignore_ascii_case(info::FILE_NAME));
        let configured = self.info_file.as_deref().is_some_and(|info_file| {
            info_file == path
                || matches!(
                    (info_file.canonicalize(), path.canonicalize()),
                    (Ok(a), Ok(b)) if a == b
                )
        });
        default_name || configured
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if let Some(area) = &self.electrode_area {
            if !area.value.is_finite() || area.value == 0.0 {
                return Err(EchemError::configuration(format!(
                    "electrode area must be a finite non-zero number, got {}",
                    area.value
                )));
            }
        }
        if let Some(path) = &self.info_file {
            if !path.is_file() {
                return Err(EchemError::NotFound { path: path.clone() });
            }
        }

        debug!("Configuration validated successfully");
        Ok(())
    }
}
