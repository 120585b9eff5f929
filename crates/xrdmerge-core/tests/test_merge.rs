#[allow(dead_code)]
mod common;

use approx::assert_abs_diff_eq;
use ndarray::{s, Array2, Array3};

use xrdmerge_core::error::MergeError;
use xrdmerge_core::frame::{Bounds, Sequence};
use xrdmerge_core::merge::{
    reduce, reduce_range, reduce_windowed, traversal_order, ReductionResult, WindowPlan,
};
use xrdmerge_core::pipeline::NoOpReporter;

use common::{sequence_of_constants, RecordingReporter};

fn all_close(a: &Array2<f64>, value: f64) -> bool {
    a.iter().all(|&v| (v - value).abs() < 1e-12)
}

// ---------------------------------------------------------------------------
// Whole-range merge
// ---------------------------------------------------------------------------

#[test]
fn test_single_frame_average_and_sum_equal_frame() {
    let seq = sequence_of_constants(4, 5, &[7.5]);
    let merged = reduce_range(&seq, None, &NoOpReporter).unwrap();
    assert!(all_close(&merged.average, 7.5));
    assert!(all_close(&merged.sum, 7.5));
    assert_eq!(merged.average.dim(), (4, 5));
}

#[test]
fn test_two_frames_average_is_midpoint() {
    let seq = sequence_of_constants(3, 3, &[2.0, 10.0]);
    let merged = reduce_range(&seq, None, &NoOpReporter).unwrap();
    assert!(all_close(&merged.average, 6.0));
    assert!(all_close(&merged.sum, 12.0));
}

#[test]
fn test_three_frames_average_decays_not_arithmetic_mean() {
    let (a, b, c) = (1.0, 3.0, 8.0);
    let seq = sequence_of_constants(2, 2, &[a, b, c]);
    let merged = reduce_range(&seq, None, &NoOpReporter).unwrap();

    let decay = ((a + b) / 2.0 + c) / 2.0;
    let mean = (a + b + c) / 3.0;
    assert_abs_diff_eq!(merged.average[[0, 0]], decay, epsilon = 1e-12);
    assert!((merged.average[[0, 0]] - mean).abs() > 1e-6);
    assert_abs_diff_eq!(merged.sum[[1, 1]], a + b + c, epsilon = 1e-12);
}

#[test]
fn test_per_pixel_independence() {
    let mut data = Array3::<f64>::zeros((2, 2, 2));
    data.slice_mut(s![0, .., ..]).assign(&ndarray::arr2(&[[1.0, 2.0], [3.0, 4.0]]));
    data.slice_mut(s![1, .., ..]).assign(&ndarray::arr2(&[[5.0, 6.0], [7.0, 8.0]]));
    let seq = Sequence::from_array(data).unwrap();

    let merged = reduce_range(&seq, None, &NoOpReporter).unwrap();
    assert_eq!(merged.average, ndarray::arr2(&[[3.0, 4.0], [5.0, 6.0]]));
    assert_eq!(merged.sum, ndarray::arr2(&[[6.0, 8.0], [10.0, 12.0]]));
}

#[test]
fn test_large_counts_are_not_truncated() {
    // 32-bit detector counts well beyond the 16-bit range
    let seq = sequence_of_constants(1, 1, &[4_000_000_000.0, 4_000_000_001.0]);
    let merged = reduce_range(&seq, None, &NoOpReporter).unwrap();
    assert_abs_diff_eq!(merged.sum[[0, 0]], 8_000_000_001.0, epsilon = 1e-3);
    assert_abs_diff_eq!(merged.average[[0, 0]], 4_000_000_000.5, epsilon = 1e-3);
}

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

#[test]
fn test_bounds_are_inclusive() {
    let seq = sequence_of_constants(1, 1, &[1.0, 2.0, 4.0, 8.0, 16.0]);
    let merged = reduce_range(&seq, Some(Bounds::new(1, 3)), &NoOpReporter).unwrap();
    assert_abs_diff_eq!(merged.sum[[0, 0]], 14.0, epsilon = 1e-12);
    assert_abs_diff_eq!(merged.average[[0, 0]], 5.5, epsilon = 1e-12);
}

#[test]
fn test_reversed_bounds_change_average_not_sum() {
    let seq = sequence_of_constants(2, 2, &[1.0, 3.0, 8.0]);
    let forward = reduce_range(&seq, Some(Bounds::new(0, 2)), &NoOpReporter).unwrap();
    let backward = reduce_range(&seq, Some(Bounds::new(2, 0)), &NoOpReporter).unwrap();

    assert_abs_diff_eq!(forward.average[[0, 0]], 5.0, epsilon = 1e-12);
    assert_abs_diff_eq!(backward.average[[0, 0]], 3.25, epsilon = 1e-12);
    assert_eq!(forward.sum, backward.sum);
}

#[test]
fn test_equal_bounds_select_one_frame() {
    let seq = sequence_of_constants(1, 1, &[1.0, 3.0, 8.0]);
    let merged = reduce_range(&seq, Some(Bounds::new(1, 1)), &NoOpReporter).unwrap();
    assert_abs_diff_eq!(merged.average[[0, 0]], 3.0, epsilon = 1e-12);
    assert_abs_diff_eq!(merged.sum[[0, 0]], 3.0, epsilon = 1e-12);
}

#[test]
fn test_traversal_order_reversed() {
    let seq = sequence_of_constants(1, 1, &[0.0; 6]);
    assert_eq!(traversal_order(&seq, Some(Bounds::new(4, 1))).unwrap(), vec![4, 3, 2, 1]);
    assert_eq!(traversal_order(&seq, None).unwrap(), vec![0, 1, 2, 3, 4, 5]);
}

#[test]
fn test_out_of_range_bounds_rejected() {
    let seq = sequence_of_constants(1, 1, &[1.0, 2.0, 3.0]);
    let err = reduce_range(&seq, Some(Bounds::new(0, 3)), &NoOpReporter).unwrap_err();
    assert!(matches!(
        err,
        MergeError::FrameIndexOutOfRange { index: 3, total: 3 }
    ));
}

// ---------------------------------------------------------------------------
// Windowed merge
// ---------------------------------------------------------------------------

#[test]
fn test_window_plan_counts() {
    let plan = WindowPlan::new(10, 3).unwrap();
    assert_eq!(plan.full_windows, 3);
    assert_eq!(plan.leftover, 1);
    assert!(plan.has_partial());
    assert_eq!(plan.total_windows(), 4);
}

#[test]
fn test_ten_frames_window_three_keeps_partial_tail() {
    let values: Vec<f64> = (0..10).map(|i| i as f64).collect();
    let seq = sequence_of_constants(2, 3, &values);
    let reporter = RecordingReporter::default();

    let merged = reduce_windowed(&seq, 3, None, &reporter).unwrap();
    assert_eq!(merged.average.dim(), (4, 2, 3));
    assert_eq!(merged.sum.dim(), (4, 2, 3));

    // first window: ((0+1)/2 + 2)/2 = 1.25
    assert_abs_diff_eq!(merged.average[[0, 0, 0]], 1.25, epsilon = 1e-12);
    assert_abs_diff_eq!(merged.sum[[0, 0, 0]], 3.0, epsilon = 1e-12);
    // tail window holds frame 9 alone
    assert_abs_diff_eq!(merged.average[[3, 1, 2]], 9.0, epsilon = 1e-12);
    assert_abs_diff_eq!(merged.sum[[3, 1, 2]], 9.0, epsilon = 1e-12);

    assert_eq!(*reporter.partial_windows.lock().unwrap(), vec![(1, 3)]);
}

#[test]
fn test_nine_frames_window_three_has_no_partial_notice() {
    let values: Vec<f64> = (0..9).map(|i| i as f64).collect();
    let seq = sequence_of_constants(1, 1, &values);
    let reporter = RecordingReporter::default();

    let merged = reduce_windowed(&seq, 3, None, &reporter).unwrap();
    assert_eq!(merged.average.dim(), (3, 1, 1));
    assert!(reporter.partial_windows.lock().unwrap().is_empty());
}

#[test]
fn test_window_one_is_per_frame() {
    let seq = sequence_of_constants(2, 3, &[1.0, 3.0, 8.0]);
    let reporter = RecordingReporter::default();

    let merged = reduce_windowed(&seq, 1, None, &reporter).unwrap();
    assert_eq!(merged.average.dim(), (3, 2, 3));
    assert_eq!(merged.sum.dim(), (3, 2, 3));

    for i in 0..seq.len() {
        let frame = seq.frame(i).unwrap();
        assert_eq!(merged.average.slice(s![i, .., ..]), frame);
        assert_eq!(merged.sum.slice(s![i, .., ..]), frame);
    }
    assert!(reporter.partial_windows.lock().unwrap().is_empty());
}

#[test]
fn test_window_matches_independent_range_merges() {
    let values = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0];
    let seq = sequence_of_constants(2, 2, &values);
    let windowed = reduce_windowed(&seq, 3, None, &NoOpReporter).unwrap();

    for (w, (start, end)) in [(0, 2), (3, 5), (6, 6)].into_iter().enumerate() {
        let single = reduce_range(&seq, Some(Bounds::new(start, end)), &NoOpReporter).unwrap();
        assert_eq!(windowed.average.slice(s![w, .., ..]), single.average);
        assert_eq!(windowed.sum.slice(s![w, .., ..]), single.sum);
    }
}

#[test]
fn test_window_larger_than_sequence_is_one_partial_window() {
    let seq = sequence_of_constants(1, 1, &[2.0, 4.0]);
    let reporter = RecordingReporter::default();
    let merged = reduce_windowed(&seq, 5, None, &reporter).unwrap();
    assert_eq!(merged.average.dim(), (1, 1, 1));
    assert_abs_diff_eq!(merged.average[[0, 0, 0]], 3.0, epsilon = 1e-12);
    assert_eq!(*reporter.partial_windows.lock().unwrap(), vec![(2, 5)]);
}

#[test]
fn test_windows_tile_reversed_bounds() {
    let values: Vec<f64> = (0..6).map(|i| i as f64).collect();
    let seq = sequence_of_constants(1, 1, &values);
    // traversal 5, 4, 3, 2 -> windows [5, 4] and [3, 2]
    let merged = reduce_windowed(&seq, 2, Some(Bounds::new(5, 2)), &NoOpReporter).unwrap();
    assert_eq!(merged.sum.dim(), (2, 1, 1));
    assert_abs_diff_eq!(merged.sum[[0, 0, 0]], 9.0, epsilon = 1e-12);
    assert_abs_diff_eq!(merged.sum[[1, 0, 0]], 5.0, epsilon = 1e-12);
    assert_abs_diff_eq!(merged.average[[1, 0, 0]], 2.5, epsilon = 1e-12);
}

#[test]
fn test_zero_window_rejected() {
    let seq = sequence_of_constants(1, 1, &[1.0, 2.0]);
    let err = reduce_windowed(&seq, 0, None, &NoOpReporter).unwrap_err();
    assert!(matches!(err, MergeError::InvalidOption(_)));
}

#[test]
fn test_progress_counts_across_windows() {
    let seq = sequence_of_constants(1, 1, &[1.0; 5]);
    let reporter = RecordingReporter::default();
    reduce_windowed(&seq, 2, None, &reporter).unwrap();
    assert_eq!(*reporter.advances.lock().unwrap(), vec![1, 2, 3, 4, 5]);
}

// ---------------------------------------------------------------------------
// reduce dispatch
// ---------------------------------------------------------------------------

#[test]
fn test_reduce_without_window_is_whole() {
    let seq = sequence_of_constants(2, 2, &[1.0, 2.0, 3.0]);
    let result = reduce(&seq, None, None, &NoOpReporter).unwrap();
    assert!(matches!(result, ReductionResult::Whole(_)));
    assert_eq!(result.shape(), vec![2, 2]);
    assert_eq!(result.window_count(), None);
}

#[test]
fn test_reduce_with_window_is_stacked() {
    let seq = sequence_of_constants(2, 2, &[1.0, 2.0, 3.0]);
    let result = reduce(&seq, None, Some(2), &NoOpReporter).unwrap();
    assert_eq!(result.shape(), vec![2, 2, 2]);
    assert_eq!(result.window_count(), Some(2));
    assert_eq!(result.average().shape(), result.sum().shape());
}
