//! Command-line interface components.

use crate::config::CurveConfig;
use crate::constants::{DEFAULT_DATA_FOLDER, info};
use crate::correlation::VariableSpec;
use crate::curve::{Curve, MultiCurve};
use crate::density::{AreaProvider, FailFast, StdinPrompt};
use crate::discovery::discover_subdirectories;
use crate::format::FormatKind;
use crate::info::InfoFile;
use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "echem")]
#[command(about = "Correlate electrochemical measurement series with their independent variable")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// Experiment directory (or, with --multi, a directory of experiments)
    #[arg(value_name = "BASE_DIR")]
    pub base_dir: PathBuf,

    /// Instrument file format
    #[arg(short, long, value_enum, default_value_t = FormatKind::Dta)]
    pub format: FormatKind,

    /// Rows averaged from the end of each file (0 = all rows)
    #[arg(short, long, default_value_t = 0)]
    pub points: usize,

    /// Info file describing the variable (default: BASE_DIR/info.txt)
    #[arg(short, long, value_name = "FILE")]
    pub info: Option<PathBuf>,

    /// Info file describing the per-file variable of each experiment in
    /// --multi mode (default: info.txt of the first experiment)
    #[arg(long, value_name = "FILE")]
    pub curve_info: Option<PathBuf>,

    /// Folder holding the instrument files inside each experiment
    #[arg(long, default_value = DEFAULT_DATA_FOLDER)]
    pub data_folder: String,

    /// Treat every sub-directory of BASE_DIR as one experiment series
    #[arg(long)]
    pub multi: bool,

    /// Skip the current density column
    #[arg(long)]
    pub no_current_density: bool,

    /// Ask for the electrode area on stdin when no info file gives one
    #[arg(long)]
    pub interactive: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn get_log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn curve_config(&self) -> CurveConfig {
        CurveConfig::default()
            .with_data_folder(self.data_folder.clone())
            .with_points(self.points)
            .with_current_density(!self.no_current_density)
    }

    fn area_provider(&self) -> &'static dyn AreaProvider {
        if self.interactive {
            &StdinPrompt
        } else {
            &FailFast
        }
    }
}

/// Set up structured logging on stderr
pub fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("echem_processor={}", log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .init();

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Build the requested curve(s) and print their mean values
pub fn run(args: &Args) -> Result<()> {
    if args.multi {
        run_multi(args, args.format)
    } else {
        run_single(args, args.format)
    }
}

fn run_single(args: &Args, format: FormatKind) -> Result<()> {
    let info_path = info_path(args.info.as_deref(), &args.base_dir)?;
    let config = args.curve_config().with_info_file(&info_path);
    let spec = read_spec(&info_path)?;

    let curve = Curve::from_dir_with(&args.base_dir, format, &spec, &config, args.area_provider())
        .with_context(|| format!("Failed to build curve from {}", args.base_dir.display()))?;

    print_heading(&format!(
        "{} ({} files) over {} [{}]",
        curve.identifier(),
        curve.len(),
        curve.variable_name(),
        curve.variable_unit()
    ));
    print_table(&curve.mean_values()?);
    Ok(())
}

fn run_multi(args: &Args, format: FormatKind) -> Result<()> {
    let dirs = discover_subdirectories(&args.base_dir)
        .with_context(|| format!("Failed to list {}", args.base_dir.display()))?;
    let first = dirs
        .first()
        .with_context(|| format!("No experiment directories in {}", args.base_dir.display()))?;

    let multi_spec = read_spec(&info_path(args.info.as_deref(), &args.base_dir)?)?;
    let curve_spec = read_spec(&info_path(args.curve_info.as_deref(), first)?)?;

    let multi = MultiCurve::from_dirs_with(
        &dirs,
        format,
        &curve_spec,
        &multi_spec,
        &args.curve_config(),
        args.area_provider(),
    )
    .with_context(|| format!("Failed to build curves from {}", args.base_dir.display()))?;

    print_heading(&format!(
        "{} curves over {} [{}]",
        multi.len(),
        multi.variable_name(),
        multi.variable_unit()
    ));
    print_table(&multi.mean_values()?);
    Ok(())
}

fn info_path(explicit: Option<&Path>, dir: &Path) -> Result<PathBuf> {
    let path = explicit.map_or_else(|| dir.join(info::FILE_NAME), Path::to_path_buf);
    if !path.is_file() {
        anyhow::bail!(
            "Info file not found at {}. Use --info to point at one.",
            path.display()
        );
    }
    Ok(path)
}

fn read_spec(path: &Path) -> Result<VariableSpec> {
    let info = InfoFile::read(path)
        .with_context(|| format!("Failed to read info file {}", path.display()))?;
    Ok(info.variable_spec()?)
}

fn print_heading(text: &str) {
    println!();
    println!("{}", text.bright_green().bold());
}

fn print_table(table: &DataFrame) {
    println!("{}", table);
}
