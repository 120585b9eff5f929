use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ndarray::{Array2, Array3};

use xrdmerge_core::frame::{Frame, SampleType, Sequence};
use xrdmerge_core::io::image_io::save_tiff;
use xrdmerge_core::pipeline::{MergeStage, ProgressReporter};

/// A frame filled with a single value.
pub fn constant_frame(rows: usize, columns: usize, value: f64) -> Frame {
    Frame::new(Array2::from_elem((rows, columns), value), SampleType::F64)
}

/// A frame whose pixel (r, c) holds `offset + r * columns + c`.
pub fn ramp_frame(rows: usize, columns: usize, offset: f64) -> Frame {
    let data = Array2::from_shape_fn((rows, columns), |(r, c)| {
        offset + (r * columns + c) as f64
    });
    Frame::new(data, SampleType::F64)
}

/// A sequence where frame `i` is filled with `values[i]`.
pub fn sequence_of_constants(rows: usize, columns: usize, values: &[f64]) -> Sequence {
    let data = Array3::from_shape_fn((values.len(), rows, columns), |(i, _, _)| values[i]);
    Sequence::from_array(data).expect("non-empty sequence")
}

/// Write one TIFF per value as `{dir}/{basename}{sep}{number:05}.tif`,
/// numbered from `first`. Returns the written paths.
pub fn write_tiff_series(
    dir: &Path,
    basename: &str,
    separator: char,
    first: u32,
    values: &[f64],
    shape: (usize, usize),
) -> Vec<PathBuf> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let path = dir.join(format!("{basename}{separator}{:05}.tif", first + i as u32));
            save_tiff(&constant_frame(shape.0, shape.1, v), &path).expect("write tiff");
            path
        })
        .collect()
}

/// Records every progress notification for later inspection.
#[derive(Default)]
pub struct RecordingReporter {
    pub stages: Mutex<Vec<MergeStage>>,
    pub advances: Mutex<Vec<usize>>,
    pub partial_windows: Mutex<Vec<(usize, usize)>>,
}

impl ProgressReporter for RecordingReporter {
    fn begin_stage(&self, stage: MergeStage, _total_items: Option<usize>) {
        self.stages.lock().unwrap().push(stage);
    }

    fn advance(&self, items_done: usize) {
        self.advances.lock().unwrap().push(items_done);
    }

    fn partial_window(&self, leftover: usize, window: usize) {
        self.partial_windows.lock().unwrap().push((leftover, window));
    }
}
