#[allow(dead_code)]
mod common;

use approx::assert_abs_diff_eq;
use ndarray::Array3;
use tempfile::TempDir;

use xrdmerge_core::consts::AVERAGED_DATASET;
use xrdmerge_core::error::MergeError;
use xrdmerge_core::io::container::{read_result, write_result, ContainerFormat, WriteOptions};
use xrdmerge_core::io::loader::FrameSource;
use xrdmerge_core::io::naming::FileSelection;
use xrdmerge_core::merge::{Merged, ReductionResult};
use xrdmerge_core::pipeline::config::MergeConfig;
use xrdmerge_core::pipeline::{plan_input, run_merge, run_merge_reported, InputPlan, MergeStage};

use common::{write_tiff_series, RecordingReporter};

fn npz_config(input: &TempDir, output: &TempDir, basename: &str, ext: &str) -> MergeConfig {
    let mut config = MergeConfig::new(input.path(), basename, ext);
    config.output.directory = output.path().to_path_buf();
    config.output.format = Some(ContainerFormat::Npz);
    config
}

#[test]
fn test_pipeline_tiff_series_to_npz() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_tiff_series(input.path(), "LaB6", '_', 1, &[2.0, 4.0, 8.0], (6, 5));

    let mut config = npz_config(&input, &output, "LaB6", "tif");
    config.selection = FileSelection::range(1, 3);

    let reporter = RecordingReporter::default();
    let report = run_merge_reported(&config, &reporter).unwrap();

    assert_eq!(report.output, output.path().join("LaB6_1-3.npz"));
    assert_eq!(report.frames_merged, 3);
    assert_eq!(report.windows, None);
    assert_eq!(report.frame_shape, (6, 5));

    let stored = read_result(&report.output).unwrap();
    assert_eq!(stored.averaged.shape(), &[6, 5]);
    // ((2 + 4) / 2 + 8) / 2
    assert_abs_diff_eq!(stored.averaged[[0, 0]], 5.5, epsilon = 1e-9);
    assert_abs_diff_eq!(stored.summed[[5, 4]], 14.0, epsilon = 1e-9);

    assert_eq!(
        *reporter.stages.lock().unwrap(),
        vec![
            MergeStage::Discovering,
            MergeStage::Loading,
            MergeStage::Merging,
            MergeStage::Writing
        ]
    );
}

#[test]
fn test_pipeline_discovers_dash_separator_and_windows() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let values: Vec<f64> = (0..5).map(|i| i as f64).collect();
    write_tiff_series(input.path(), "CeO2", '-', 10, &values, (3, 3));

    let mut config = npz_config(&input, &output, "CeO2", "tif");
    config.selection = FileSelection {
        start: Some(10),
        count: Some(5),
        ..Default::default()
    };
    config.window = Some(2);
    config.assembly.parallel = true;

    let reporter = RecordingReporter::default();
    let report = run_merge_reported(&config, &reporter).unwrap();
    assert_eq!(report.windows, Some(3));
    assert_eq!(*reporter.partial_windows.lock().unwrap(), vec![(1, 2)]);

    let stored = read_result(&report.output).unwrap();
    assert_eq!(stored.summed.shape(), &[3, 3, 3]);
    assert_abs_diff_eq!(stored.summed[[0, 0, 0]], 1.0, epsilon = 1e-9);
    assert_abs_diff_eq!(stored.summed[[1, 1, 1]], 5.0, epsilon = 1e-9);
    assert_abs_diff_eq!(stored.averaged[[2, 2, 2]], 4.0, epsilon = 1e-9);
}

#[test]
fn test_pipeline_exclude_and_include() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_tiff_series(input.path(), "scan", '_', 0, &[1.0, 100.0, 3.0, 5.0], (2, 2));

    let mut config = npz_config(&input, &output, "scan", "tif");
    config.selection = FileSelection {
        exclude: vec![1],
        include: vec![3],
        ..FileSelection::range(0, 2)
    };

    let report = run_merge(&config).unwrap();
    assert_eq!(report.output, output.path().join("scan_0-3.npz"));
    let stored = read_result(&report.output).unwrap();
    assert_abs_diff_eq!(stored.summed[[0, 0]], 9.0, epsilon = 1e-9);
}

#[test]
fn test_pipeline_missing_files_report_candidates() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let mut config = npz_config(&input, &output, "ghost", "tif");
    config.selection = FileSelection::range(1, 2);

    let err = run_merge(&config).unwrap_err();
    assert!(matches!(err, MergeError::SeparatorDiscovery { .. }));
    assert!(std::fs::read_dir(output.path()).unwrap().next().is_none());
}

#[test]
fn test_pipeline_gap_in_series_is_file_access() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_tiff_series(input.path(), "scan", '_', 0, &[1.0, 2.0], (2, 2));

    let mut config = npz_config(&input, &output, "scan", "tif");
    config.selection = FileSelection::range(0, 2);
    let err = run_merge(&config).unwrap_err();
    assert!(matches!(err, MergeError::FileAccess { .. }));
}

#[test]
fn test_pipeline_container_input_with_reversed_bounds() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();

    // an earlier windowed merge serves as a frame stack
    let stack = Array3::from_shape_fn((5, 2, 2), |(i, _, _)| (i * 2) as f64);
    write_result(
        &input.path().join("stack_00007.npz"),
        &ReductionResult::Windowed(Merged {
            average: stack.clone(),
            sum: stack,
        }),
        &WriteOptions::default(),
    )
    .unwrap();

    let mut config = npz_config(&input, &output, "stack", "npz");
    config.selection = FileSelection::list(vec![7]);
    config.dataset.path = Some(AVERAGED_DATASET.to_string());
    config.dataset.start = Some(3);
    config.dataset.end = Some(1);

    let report = run_merge(&config).unwrap();
    assert_eq!(report.output, output.path().join("stack_7_frames3-1.npz"));
    assert_eq!(report.frames_merged, 3);

    // frames 6, 4, 2 -> ((6 + 4) / 2 + 2) / 2
    let stored = read_result(&report.output).unwrap();
    assert_abs_diff_eq!(stored.averaged[[0, 0]], 3.5, epsilon = 1e-9);
    assert_abs_diff_eq!(stored.summed[[1, 1]], 12.0, epsilon = 1e-9);
}

#[test]
fn test_pipeline_bounds_out_of_range() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_tiff_series(input.path(), "scan", '_', 0, &[1.0, 2.0], (2, 2));

    let mut config = npz_config(&input, &output, "scan", "tif");
    config.selection = FileSelection::range(0, 1);
    config.dataset.end = Some(5);
    assert!(matches!(
        run_merge(&config),
        Err(MergeError::FrameIndexOutOfRange { index: 5, total: 2 })
    ));
}

#[test]
fn test_plan_input_kinds() {
    let mut config = MergeConfig::new("/data", "scan", "h5");
    config.dataset.path = Some("entry/data/data".into());

    match plan_input(&config, &[4], '_') {
        InputPlan::Container { path, dataset } => {
            assert!(path.ends_with("scan_00004.h5"));
            assert_eq!(dataset.as_deref(), Some("entry/data/data"));
        }
        other => panic!("expected a container plan, got {other:?}"),
    }

    match plan_input(&config, &[4, 5], '_') {
        InputPlan::Files(sources) => {
            assert_eq!(sources.len(), 2);
            assert!(matches!(sources[1], FrameSource::Dataset { .. }));
        }
        other => panic!("expected a file plan, got {other:?}"),
    }

    let tiffs = MergeConfig::new("/data", "scan", "tif");
    assert!(matches!(
        plan_input(&tiffs, &[1], '-'),
        InputPlan::Files(ref s) if s.len() == 1
    ));
}
