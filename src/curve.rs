//! Experiment series.
//!
//! A [`Curve`] is every instrument file of one experiment directory,
//! correlated with one independent variable and ordered by its value. A
//! [`MultiCurve`] groups several curves by a second, coarser variable, one
//! value per directory.

use crate::aggregate::{MeanTable, reduce_and_merge};
use crate::config::CurveConfig;
use crate::correlation::{CorrelationSubject, CorrelationTable, VariableSpec, correlate};
use crate::density::{AreaProvider, FailFast};
use crate::discovery::{discover_files, discover_subdirectories};
use crate::error::{EchemError, Result};
use crate::format::FormatKind;
use crate::info::InfoFile;
use crate::instrument::InstrumentFile;
use crate::models::{ElectrodeArea, Variable};
use crate::table::numeric_values;
use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Files of one experiment series, ascending by variable value
#[derive(Debug, Clone)]
pub struct Curve {
    identifier: String,
    directory: Option<PathBuf>,
    files: Vec<InstrumentFile>,
    correlation: CorrelationTable,
    points: usize,
}

impl Curve {
    /// Build from already decoded files.
    ///
    /// Current density uses the configured electrode area; without one it
    /// fails unless disabled in `config`.
    pub fn new(
        mut files: Vec<InstrumentFile>,
        spec: &VariableSpec,
        config: &CurveConfig,
    ) -> Result<Self> {
        let area = resolve_area(config, None, &FailFast)?;
        for file in &mut files {
            if let Some(dir) = experiment_dir(file.path(), config) {
                file.set_experiment_dir(dir);
            }
        }
        let directory = files
            .first()
            .and_then(|file| experiment_dir(file.path(), config));
        let identifier = directory
            .as_deref()
            .map(dir_name)
            .unwrap_or_else(|| spec.name.clone());
        Self::build(identifier, directory, files, spec, area.as_ref(), config.points)
    }

    /// Build from the instrument files in `<base>/<data folder>`
    pub fn from_dir(
        base: impl AsRef<Path>,
        format: FormatKind,
        spec: &VariableSpec,
        config: &CurveConfig,
    ) -> Result<Self> {
        Self::from_dir_with(base, format, spec, config, &FailFast)
    }

    /// Like [`Curve::from_dir`], asking `provider` for an electrode area that
    /// neither the configuration nor the info file gives
    pub fn from_dir_with(
        base: impl AsRef<Path>,
        format: FormatKind,
        spec: &VariableSpec,
        config: &CurveConfig,
        provider: &dyn AreaProvider,
    ) -> Result<Self> {
        let base = base.as_ref();
        config.validate()?;

        let data_dir = config.data_dir(base);
        let mut paths = discover_files(&data_dir, format.adapter().file_extension())?;
        paths.retain(|path| !config.is_info_file(path));
        if paths.is_empty() {
            return Err(EchemError::configuration(format!(
                "no .{} files in {}",
                format.adapter().file_extension(),
                data_dir.display()
            )));
        }

        let files = paths
            .iter()
            .map(|path| {
                let mut file = InstrumentFile::open(path, format)?;
                file.set_experiment_dir(base.to_path_buf());
                Ok(file)
            })
            .collect::<Result<Vec<_>>>()?;

        let info = config.info_path(base).map(InfoFile::read).transpose()?;
        let area = resolve_area(config, info.as_ref(), provider)?;

        info!(
            "Loaded {} {} files from {}",
            files.len(),
            format,
            data_dir.display()
        );
        Self::build(
            dir_name(base),
            Some(base.to_path_buf()),
            files,
            spec,
            area.as_ref(),
            config.points,
        )
    }

    fn build(
        identifier: String,
        directory: Option<PathBuf>,
        mut files: Vec<InstrumentFile>,
        spec: &VariableSpec,
        area: Option<&ElectrodeArea>,
        points: usize,
    ) -> Result<Self> {
        if let Some(area) = area {
            for file in &mut files {
                file.calculate_current_density(area)?;
            }
        }

        let correlation = correlate(&files, spec)?;
        let matcher = correlation.matcher()?;

        let mut tagged = files
            .into_iter()
            .map(|file| Ok((matcher.resolve(file.file_name())?.value, file)))
            .collect::<Result<Vec<_>>>()?;
        tagged.sort_by(|a, b| a.0.total_cmp(&b.0));

        let files = tagged
            .into_iter()
            .map(|(value, mut file)| {
                file.set_variable(Variable {
                    name: correlation.variable().to_string(),
                    unit: correlation.unit().to_string(),
                    value,
                });
                file
            })
            .collect();

        debug!(
            "Built curve '{}' over '{}' ({:?} mode)",
            identifier,
            correlation.variable(),
            correlation.mode()
        );
        Ok(Self {
            identifier,
            directory,
            files,
            correlation,
            points,
        })
    }

    /// Name of the experiment directory
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    pub fn files(&self) -> &[InstrumentFile] {
        &self.files
    }

    pub fn file(&self, file_name: &str) -> Option<&InstrumentFile> {
        self.files.iter().find(|file| file.file_name() == file_name)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn variable_name(&self) -> &str {
        self.correlation.variable()
    }

    pub fn variable_unit(&self) -> &str {
        self.correlation.unit()
    }

    pub fn correlation(&self) -> &CorrelationTable {
        &self.correlation
    }

    /// Correlated values in file order
    pub fn values(&self) -> Vec<f64> {
        self.files
            .iter()
            .filter_map(|file| file.variable().map(|v| v.value))
            .collect()
    }

    pub fn mean_table(&self, points: usize) -> Result<MeanTable> {
        reduce_and_merge(&self.files, &self.correlation, points)
    }

    /// Rows averaged by [`Curve::mean_values`], from the configuration
    pub fn points(&self) -> usize {
        self.points
    }

    /// Mean values over the configured number of trailing rows
    pub fn mean_values(&self) -> Result<DataFrame> {
        self.mean_values_over(self.points)
    }

    /// One row per file: name, variable value and the mean of every numeric
    /// column over the last `points` rows (all rows for `0`)
    pub fn mean_values_over(&self, points: usize) -> Result<DataFrame> {
        self.mean_table(points)?.to_frame()
    }
}

impl CorrelationSubject for Curve {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn folder_name(&self) -> Option<String> {
        self.directory
            .as_deref()
            .and_then(Path::parent)
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
    }

    fn has_column(&self, name: &str) -> bool {
        !self.files.is_empty() && self.files.iter().all(|file| file.has_column(name))
    }

    /// Mean over the rows of all files together
    fn column_mean(&self, name: &str) -> Option<f64> {
        let mut sum = 0.0;
        let mut count = 0usize;
        for file in &self.files {
            let values = numeric_values(file.column(name).ok()?).ok()??;
            for value in values.into_iter().flatten() {
                sum += value;
                count += 1;
            }
        }
        (count > 0).then(|| sum / count as f64)
    }

    fn column_unit(&self, name: &str) -> Option<String> {
        self.files
            .first()
            .and_then(|file| file.unit(name))
            .map(str::to_string)
    }
}

/// Curves ascending by a per-curve variable
#[derive(Debug, Clone)]
pub struct MultiCurve {
    curves: Vec<Curve>,
    values: Vec<f64>,
    correlation: CorrelationTable,
}

impl MultiCurve {
    pub fn new(curves: Vec<Curve>, spec: &VariableSpec) -> Result<Self> {
        let correlation = correlate(&curves, spec)?;
        let matcher = correlation.matcher()?;

        let mut tagged = curves
            .into_iter()
            .map(|curve| Ok((matcher.resolve(curve.identifier())?.value, curve)))
            .collect::<Result<Vec<_>>>()?;
        tagged.sort_by(|a, b| a.0.total_cmp(&b.0));
        let (values, curves) = tagged.into_iter().unzip();

        Ok(Self {
            curves,
            values,
            correlation,
        })
    }

    /// One curve per directory, all sharing `curve_spec`
    pub fn from_dirs<P: AsRef<Path>>(
        dirs: &[P],
        format: FormatKind,
        curve_spec: &VariableSpec,
        multi_spec: &VariableSpec,
        config: &CurveConfig,
    ) -> Result<Self> {
        Self::from_dirs_with(dirs, format, curve_spec, multi_spec, config, &FailFast)
    }

    pub fn from_dirs_with<P: AsRef<Path>>(
        dirs: &[P],
        format: FormatKind,
        curve_spec: &VariableSpec,
        multi_spec: &VariableSpec,
        config: &CurveConfig,
        provider: &dyn AreaProvider,
    ) -> Result<Self> {
        if dirs.is_empty() {
            return Err(EchemError::configuration(format!(
                "no experiment directories for '{}'",
                multi_spec.name
            )));
        }
        let curves = dirs
            .iter()
            .map(|dir| Curve::from_dir_with(dir, format, curve_spec, config, provider))
            .collect::<Result<Vec<_>>>()?;
        Self::new(curves, multi_spec)
    }

    /// One curve per sub-directory of `base`
    pub fn from_base(
        base: impl AsRef<Path>,
        format: FormatKind,
        curve_spec: &VariableSpec,
        multi_spec: &VariableSpec,
        config: &CurveConfig,
    ) -> Result<Self> {
        Self::from_base_with(base, format, curve_spec, multi_spec, config, &FailFast)
    }

    pub fn from_base_with(
        base: impl AsRef<Path>,
        format: FormatKind,
        curve_spec: &VariableSpec,
        multi_spec: &VariableSpec,
        config: &CurveConfig,
        provider: &dyn AreaProvider,
    ) -> Result<Self> {
        let dirs = discover_subdirectories(base.as_ref())?;
        Self::from_dirs_with(&dirs, format, curve_spec, multi_spec, config, provider)
    }

    pub fn curves(&self) -> &[Curve] {
        &self.curves
    }

    /// Correlated values in curve order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn variable_name(&self) -> &str {
        self.correlation.variable()
    }

    pub fn variable_unit(&self) -> &str {
        self.correlation.unit()
    }

    pub fn correlation(&self) -> &CorrelationTable {
        &self.correlation
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    /// Mean values of every curve over its configured trailing rows
    pub fn mean_values(&self) -> Result<DataFrame> {
        self.stacked_means(|curve| curve.points())
    }

    /// Mean values of every curve with a column for the curve's value,
    /// ordered by that value and then by the file variable
    pub fn mean_values_over(&self, points: usize) -> Result<DataFrame> {
        self.stacked_means(|_| points)
    }

    fn stacked_means(&self, points: impl Fn(&Curve) -> usize) -> Result<DataFrame> {
        let parts = self
            .values
            .iter()
            .zip(&self.curves)
            .map(|(value, curve)| Ok((*value, curve.mean_table(points(curve))?)))
            .collect::<Result<Vec<_>>>()?;
        MeanTable::stack(self.correlation.variable(), parts)?.to_frame()
    }
}

/// Electrode area from the configuration, the info file, then `provider`;
/// `None` when current density is disabled
pub fn resolve_area(
    config: &CurveConfig,
    info: Option<&InfoFile>,
    provider: &dyn AreaProvider,
) -> Result<Option<ElectrodeArea>> {
    if !config.derive_current_density {
        return Ok(None);
    }
    if let Some(area) = &config.electrode_area {
        return Ok(Some(area.clone()));
    }
    if let Some(area) = info.map(InfoFile::electrode_area).transpose()?.flatten() {
        debug!("Electrode area {} {} from info file", area.value, area.unit);
        return Ok(Some(area));
    }
    provider.electrode_area().map(Some)
}

/// Experiment directory of a file: the parent of the data folder, or the
/// file's own folder when it is not in one
fn experiment_dir(path: &Path, config: &CurveConfig) -> Option<PathBuf> {
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty())?;
    let in_data_folder = !config.data_folder.is_empty()
        && parent.file_name().is_some_and(|name| name == config.data_folder.as_str());
    match (in_data_folder, parent.parent()) {
        (true, Some(base)) if !base.as_os_str().is_empty() => Some(base.to_path_buf()),
        _ => Some(parent.to_path_buf()),
    }
}

fn dir_name(dir: &Path) -> String {
    dir.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.to_string_lossy().into_owned())
}
