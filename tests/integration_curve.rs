//! End-to-end tests: instrument files on disk to ordered mean-value tables

use echem_processor::{
    Curve, CurveConfig, EchemError, ElectrodeArea, FormatKind, Identifier, InfoFile,
    InstrumentFile, MultiCurve, VariableSpec,
};
use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Minimal Gamry chronoamperometry file with the given current values
fn dta_content(currents: &[f64]) -> String {
    let mut lines = vec![
        "EXPLAIN".to_string(),
        "TAG\tCHRONOA".to_string(),
        "TITLE\tLABEL\tChronoamperometry Scan\tTest &Identifier".to_string(),
        "DATE\tLABEL\t11/12/2018\tDate".to_string(),
        "TIME\tLABEL\t14:01:53\tTime".to_string(),
        "CURVE\tTABLE\t3".to_string(),
        "\tPt\tT\tVf\tIm\tTemp".to_string(),
        "\t#\ts\tV vs. Ref.\tA\tdeg C".to_string(),
    ];
    for (i, current) in currents.iter().enumerate() {
        let current = current.to_string().replace('.', ",");
        lines.push(format!("\t{}\t{},0\t8,0E-001\t{}\t25,0", i, i, current));
    }
    lines.join("\r\n")
}

/// Experiment directory `<root>/<name>/Data` holding DTA files
fn create_experiment(root: &Path, name: &str, files: &[(&str, &[f64])]) -> PathBuf {
    let base = root.join(name);
    let data = base.join("Data");
    fs::create_dir_all(&data).unwrap();
    for (file_name, currents) in files {
        fs::write(data.join(file_name), dta_content(currents)).unwrap();
    }
    base
}

/// EC-Lab ASCII export with currents in mA
fn eclab_content(currents: &[f64]) -> String {
    let mut lines = vec![
        "EC-Lab ASCII FILE".to_string(),
        "Nb header lines : 6".to_string(),
        String::new(),
        "Chronoamperometry / Chronocoulometry".to_string(),
        "Acquisition started on : 01/25/2019 14:22:02.000".to_string(),
        "mode\ttime/s\tEwe/V\tI/mA".to_string(),
    ];
    for (i, current) in currents.iter().enumerate() {
        let current = current.to_string().replace('.', ",");
        lines.push(format!("2\t{},0\t0,80\t{}", i, current));
    }
    lines.join("\r\n")
}

/// Greenlight export; each row carries a quoted free-text note
fn greenlight_content(currents: &[f64]) -> String {
    let mut lines: Vec<String> = (0..13).map(|i| format!("Key {},value {}", i, i)).collect();
    lines.push("Test Name,maxcoat-80ti-ast".to_string());
    lines.push(String::new());
    lines.push(String::new());
    lines.push("s,A,,V,".to_string());
    lines.push("elapsed,current,file_mark,cell_voltage_001,note".to_string());
    for (i, current) in currents.iter().enumerate() {
        lines.push(format!("{}.0,{},M1,0.71,\"stable, ok\"", i, current));
    }
    lines.join("\n")
}

fn f64_column(frame: &DataFrame, name: &str) -> Vec<Option<f64>> {
    frame
        .column(name)
        .unwrap()
        .as_materialized_series()
        .f64()
        .unwrap()
        .into_iter()
        .collect()
}

fn pump_speed() -> VariableSpec {
    VariableSpec::bounds("Pump Speed", "-", "ps", "_")
}

fn no_density() -> CurveConfig {
    CurveConfig::default().with_current_density(false)
}

#[test]
fn test_bounds_curve_orders_files_and_merges_means() {
    let temp_dir = TempDir::new().unwrap();
    let base = create_experiment(
        temp_dir.path(),
        "pump_series",
        &[
            ("ps200_run.DTA", &[-3.0, -3.0]),
            ("ps10_run.DTA", &[-1.0, -1.0]),
            ("ps50_run.DTA", &[-2.0, -2.0]),
        ],
    );

    let curve = Curve::from_dir(&base, FormatKind::Dta, &pump_speed(), &no_density()).unwrap();

    let order: Vec<&str> = curve.files().iter().map(|f| f.file_name()).collect();
    assert_eq!(order, vec!["ps10_run.DTA", "ps50_run.DTA", "ps200_run.DTA"]);
    assert_eq!(curve.values(), vec![10.0, 50.0, 200.0]);
    assert_eq!(curve.identifier(), "pump_series");

    let means = curve.mean_values().unwrap();
    assert_eq!(means.height(), 3);
    assert_eq!(
        f64_column(&means, "Pump Speed"),
        vec![Some(10.0), Some(50.0), Some(200.0)]
    );
    assert_eq!(
        f64_column(&means, "Current"),
        vec![Some(-1.0), Some(-2.0), Some(-3.0)]
    );
    let file_names: Vec<Option<&str>> = means
        .column("File Name")
        .unwrap()
        .as_materialized_series()
        .str()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(file_names[0], Some("ps10_run.DTA"));
}

#[test]
fn test_mean_over_last_points() {
    let temp_dir = TempDir::new().unwrap();
    let base = create_experiment(
        temp_dir.path(),
        "exp",
        &[("ps10_run.DTA", &[-10.0, -10.0, -1.0, -3.0])],
    );

    let config = no_density().with_points(2);
    let curve = Curve::from_dir(&base, FormatKind::Dta, &pump_speed(), &config).unwrap();

    assert_eq!(f64_column(&curve.mean_values().unwrap(), "Current"), vec![Some(-2.0)]);
    assert_eq!(f64_column(&curve.mean_values_over(0).unwrap(), "Current"), vec![Some(-6.0)]);
    assert_eq!(f64_column(&curve.mean_values_over(50).unwrap(), "Current"), vec![Some(-6.0)]);
}

#[test]
fn test_info_file_supplies_area_and_table() {
    let temp_dir = TempDir::new().unwrap();
    let base = create_experiment(
        temp_dir.path(),
        "exp",
        &[("fast_run.DTA", &[-2.0, 4.0]), ("slow_run.DTA", &[-1.0])],
    );
    fs::write(
        base.join("info.txt"),
        "NAME\tPump Speed\nUNIT\trpm\nELECTRODE SURFACE AREA\t2,0\tcm^2\nTABLE\nslow_\t10\nfast_\t100\n",
    )
    .unwrap();

    let info = InfoFile::read(base.join("info.txt")).unwrap();
    let spec = info.variable_spec().unwrap();
    let curve = Curve::from_dir(&base, FormatKind::Dta, &spec, &CurveConfig::default()).unwrap();

    assert_eq!(curve.variable_unit(), "rpm");
    assert_eq!(curve.files()[0].file_name(), "slow_run.DTA");
    let fast = curve.file("fast_run.DTA").unwrap();
    assert_eq!(fast.unit("Current Density"), Some("A/cm^2"));
    assert_eq!(fast.column_mean("Current Density"), Some(1.5));
}

#[test]
fn test_configured_area_overrides_info_file() {
    let temp_dir = TempDir::new().unwrap();
    let base = create_experiment(temp_dir.path(), "exp", &[("ps10_run.DTA", &[-4.0])]);
    fs::write(
        base.join("info.txt"),
        "NAME\tPump Speed\nELECTRODE SURFACE AREA\t2\tcm^2\n",
    )
    .unwrap();
    let config = CurveConfig::default().with_electrode_area(ElectrodeArea::new("area", 4.0, "mm^2"));

    let curve = Curve::from_dir(&base, FormatKind::Dta, &pump_speed(), &config).unwrap();

    let file = &curve.files()[0];
    assert_eq!(file.unit("Current Density"), Some("A/mm^2"));
    assert_eq!(file.column_mean("Current Density"), Some(1.0));
}

#[test]
fn test_construction_failures() {
    let temp_dir = TempDir::new().unwrap();

    // Missing electrode area with the default fail-fast provider
    let base = create_experiment(temp_dir.path(), "exp", &[("ps10_run.DTA", &[-1.0])]);
    assert!(matches!(
        Curve::from_dir(&base, FormatKind::Dta, &pump_speed(), &CurveConfig::default()),
        Err(EchemError::MissingElectrodeArea { .. })
    ));

    // File without the bounds pattern
    fs::write(base.join("Data").join("baseline.DTA"), dta_content(&[-1.0])).unwrap();
    match Curve::from_dir(&base, FormatKind::Dta, &pump_speed(), &no_density()) {
        Err(EchemError::VariableNotFound { identifier, .. }) => {
            assert_eq!(identifier, "baseline.DTA")
        }
        other => panic!("Expected VariableNotFound, got {:?}", other),
    }

    // No files of the requested format
    assert!(matches!(
        Curve::from_dir(&base, FormatKind::Greenlight, &pump_speed(), &no_density()),
        Err(EchemError::Configuration { .. })
    ));

    // Missing experiment directory
    assert!(matches!(
        Curve::from_dir(
            temp_dir.path().join("absent"),
            FormatKind::Dta,
            &pump_speed(),
            &no_density()
        ),
        Err(EchemError::NotFound { .. })
    ));
}

#[test]
fn test_broken_file_aborts_curve() {
    let temp_dir = TempDir::new().unwrap();
    let base = create_experiment(temp_dir.path(), "exp", &[("ps10_run.DTA", &[-1.0])]);
    let mut broken = dta_content(&[-1.0]);
    broken.push_str("\r\n\t1\t1,0\t0,8");
    fs::write(base.join("Data").join("ps50_run.DTA"), broken).unwrap();

    match Curve::from_dir(&base, FormatKind::Dta, &pump_speed(), &no_density()) {
        Err(EchemError::Decode { path, reason }) => {
            assert!(path.ends_with("ps50_run.DTA"));
            assert!(reason.contains("line 10"));
        }
        other => panic!("Expected Decode error, got {:?}", other),
    }
}

#[test]
fn test_multicurve_from_base() {
    let temp_dir = TempDir::new().unwrap();
    let study = temp_dir.path().join("study");
    create_experiment(
        &study,
        "zn16_paa1",
        &[("ps10_run.DTA", &[-4.0]), ("ps50_run.DTA", &[-5.0])],
    );
    create_experiment(
        &study,
        "zn8_paa1",
        &[("ps10_run.DTA", &[-1.0]), ("ps50_run.DTA", &[-2.0])],
    );

    let multi = MultiCurve::from_base(
        &study,
        FormatKind::Dta,
        &pump_speed(),
        &VariableSpec::bounds("Zinc Concentration", "vol-%", "zn", "_"),
        &no_density(),
    )
    .unwrap();

    assert_eq!(multi.values(), &[8.0, 16.0]);
    assert_eq!(multi.curves()[0].identifier(), "zn8_paa1");

    let means = multi.mean_values().unwrap();
    let names: Vec<&str> = means.get_columns().iter().map(|c| c.name().as_str()).collect();
    assert_eq!(&names[..3], &["File Name", "Zinc Concentration", "Pump Speed"]);
    assert_eq!(
        f64_column(&means, "Zinc Concentration"),
        vec![Some(8.0), Some(8.0), Some(16.0), Some(16.0)]
    );
    assert_eq!(
        f64_column(&means, "Current"),
        vec![Some(-1.0), Some(-2.0), Some(-4.0), Some(-5.0)]
    );
}

#[test]
fn test_multicurve_internal_variable_over_curves() {
    let temp_dir = TempDir::new().unwrap();
    let study = temp_dir.path().join("study");
    let hot = create_experiment(&study, "hot", &[("ps10_run.DTA", &[-1.0])]);
    let cold = create_experiment(&study, "cold", &[("ps10_run.DTA", &[-1.0])]);
    fs::write(
        hot.join("Data").join("ps10_run.DTA"),
        dta_content(&[-1.0]).replace("25,0", "80,0"),
    )
    .unwrap();

    let multi = MultiCurve::from_dirs(
        &[hot, cold],
        FormatKind::Dta,
        &pump_speed(),
        &VariableSpec::internal("Temperature"),
        &no_density(),
    )
    .unwrap();

    assert_eq!(multi.values(), &[25.0, 80.0]);
    assert_eq!(multi.curves()[0].identifier(), "cold");
    assert_eq!(multi.variable_unit(), "deg C");
}

#[test]
fn test_single_file_access() {
    let temp_dir = TempDir::new().unwrap();
    let base = create_experiment(temp_dir.path(), "exp", &[("ps10_run.DTA", &[-1.0, -2.0, -3.0])]);

    let file = InstrumentFile::open(base.join("Data").join("ps10_run.DTA"), FormatKind::Dta).unwrap();

    assert_eq!(file.column("Voltage").unwrap().len(), 3);
    assert_eq!(file.unit("Voltage"), Some("V vs. Ref."));
    assert_eq!(file.rows(-1, 1).height(), 1);
    assert_eq!(
        file.acquisition_time().unwrap().to_string(),
        "2018-11-12 14:01:53"
    );
}

#[test]
fn test_folder_bounds_from_experiment_directory() {
    let temp_dir = TempDir::new().unwrap();
    let base = create_experiment(
        temp_dir.path(),
        "0k8V_zn16_paa1_20181112",
        &[("run_a.DTA", &[-1.0]), ("run_b.DTA", &[-2.0])],
    );
    let spec = VariableSpec::bounds("Zinc", "vol-%", "zn", "_").with_identifier(Identifier::Folders);

    let curve = Curve::from_dir(&base, FormatKind::Dta, &spec, &no_density()).unwrap();

    assert_eq!(curve.values(), vec![16.0, 16.0]);
    assert_eq!(
        f64_column(&curve.mean_values().unwrap(), "Zinc"),
        vec![Some(16.0), Some(16.0)]
    );
}

#[test]
fn test_eclab_curve_in_flat_directory_with_info_file() {
    let temp_dir = TempDir::new().unwrap();
    let base = temp_dir.path().join("exp");
    fs::create_dir_all(&base).unwrap();
    fs::write(base.join("ps50_run.txt"), eclab_content(&[-2.0, -4.0])).unwrap();
    fs::write(base.join("ps10_run.txt"), eclab_content(&[-1.0, -1.0])).unwrap();
    fs::write(
        base.join("info.txt"),
        "NAME\tPump Speed\nBOUNDS\tps\t_\nELECTRODE SURFACE AREA\t2\tcm^2\n",
    )
    .unwrap();

    let spec = InfoFile::read(base.join("info.txt")).unwrap().variable_spec().unwrap();
    let config = CurveConfig::default().with_data_folder("");
    let curve = Curve::from_dir(&base, FormatKind::EcLab, &spec, &config).unwrap();

    assert_eq!(curve.len(), 2);
    assert_eq!(curve.values(), vec![10.0, 50.0]);
    let fast = &curve.files()[1];
    assert_eq!(fast.unit("Current"), Some("mA"));
    assert_eq!(fast.unit("Current Density"), Some("mA/cm^2"));
    assert_eq!(fast.column_mean("Current Density"), Some(1.5));
    assert_eq!(
        fast.acquisition_time().unwrap().to_string(),
        "2019-01-25 14:22:02"
    );
}

#[test]
fn test_greenlight_curve_with_quoted_fields() {
    let temp_dir = TempDir::new().unwrap();
    let base = temp_dir.path().join("station");
    let data = base.join("Data");
    fs::create_dir_all(&data).unwrap();
    fs::write(data.join("ps10_run.csv"), greenlight_content(&[1.5, 2.5])).unwrap();
    fs::write(data.join("ps50_run.csv"), greenlight_content(&[3.0])).unwrap();

    let curve =
        Curve::from_dir(&base, FormatKind::Greenlight, &pump_speed(), &no_density()).unwrap();

    let file = curve.file("ps10_run.csv").unwrap();
    assert_eq!(file.column_mean("current"), Some(2.0));
    assert_eq!(file.header().first("File Mark"), Some("M1"));
    let notes: Vec<Option<&str>> = file
        .column("note")
        .unwrap()
        .as_materialized_series()
        .str()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(notes, vec![Some("stable, ok"), Some("stable, ok")]);

    let means = curve.mean_values().unwrap();
    assert_eq!(f64_column(&means, "current"), vec![Some(2.0), Some(3.0)]);
}

#[test]
fn test_table_mode_file_without_key_fails() {
    let temp_dir = TempDir::new().unwrap();
    let base = create_experiment(
        temp_dir.path(),
        "exp",
        &[("slow_run.DTA", &[-1.0]), ("medium_run.DTA", &[-2.0])],
    );
    let spec = VariableSpec::table("Pump Speed", "rpm", [("slow_", 10.0), ("fast_", 100.0)]);

    match Curve::from_dir(&base, FormatKind::Dta, &spec, &no_density()) {
        Err(EchemError::MergeAmbiguity { identifier, .. }) => {
            assert_eq!(identifier, "medium_run.DTA")
        }
        other => panic!("Expected MergeAmbiguity, got {:?}", other),
    }
}
