use std::path::PathBuf;

use ndarray::{Array2, Array3, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{MergeError, Result};

/// A single 2-D detector frame.
/// Pixel values are promoted to f64 regardless of the on-disk sample type.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Pixel data, row-major, shape = (rows, columns)
    pub data: Array2<f64>,
    pub metadata: FrameMetadata,
}

impl Frame {
    pub fn new(data: Array2<f64>, sample_type: SampleType) -> Self {
        Self {
            data,
            metadata: FrameMetadata {
                source: None,
                sample_type,
            },
        }
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.metadata.source = Some(source.into());
        self
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn columns(&self) -> usize {
        self.data.ncols()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }
}

#[derive(Clone, Debug)]
pub struct FrameMetadata {
    pub source: Option<PathBuf>,
    /// Sample type the frame was stored as before promotion.
    pub sample_type: SampleType,
}

/// On-disk numeric type of a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleType {
    U8,
    U16,
    U32,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl std::fmt::Display for SampleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::U8 => "uint8",
            Self::U16 => "uint16",
            Self::U32 => "uint32",
            Self::I16 => "int16",
            Self::I32 => "int32",
            Self::I64 => "int64",
            Self::F32 => "float32",
            Self::F64 => "float64",
        };
        write!(f, "{}", name)
    }
}

/// Ordered stack of same-shaped frames, shape = (frames, rows, columns).
#[derive(Clone, Debug)]
pub struct Sequence {
    data: Array3<f64>,
}

impl Sequence {
    /// Wrap an existing 3-D array. Fails on an empty stack.
    pub fn from_array(data: Array3<f64>) -> Result<Self> {
        if data.len_of(Axis(0)) == 0 {
            return Err(MergeError::EmptyInput);
        }
        Ok(Self { data })
    }

    /// Stack frames in order, checking every frame against the first one's shape.
    pub fn from_frames(frames: &[Frame]) -> Result<Self> {
        let first = frames.first().ok_or(MergeError::EmptyInput)?;
        let expected = first.shape();
        let mut data = Array3::<f64>::zeros((frames.len(), expected.0, expected.1));

        for (index, frame) in frames.iter().enumerate() {
            if frame.shape() != expected {
                return Err(MergeError::ShapeMismatch {
                    index,
                    expected,
                    found: frame.shape(),
                });
            }
            data.index_axis_mut(Axis(0), index).assign(&frame.data);
        }

        Ok(Self { data })
    }

    pub fn len(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// (rows, columns) shared by every frame.
    pub fn frame_shape(&self) -> (usize, usize) {
        let (_, rows, columns) = self.data.dim();
        (rows, columns)
    }

    pub fn frame(&self, index: usize) -> Result<ArrayView2<'_, f64>> {
        if index >= self.len() {
            return Err(MergeError::FrameIndexOutOfRange {
                index,
                total: self.len(),
            });
        }
        Ok(self.data.index_axis(Axis(0), index))
    }

    pub fn data(&self) -> &Array3<f64> {
        &self.data
    }

    pub fn into_inner(self) -> Array3<f64> {
        self.data
    }
}

/// Inclusive index range over a sequence. `start > end` walks backwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub start: usize,
    pub end: usize,
}

impl Bounds {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn is_reversed(&self) -> bool {
        self.start > self.end
    }

    /// Number of frames covered. Never zero since both ends are inclusive.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.start.abs_diff(self.end) + 1
    }

    /// Frame indices in traversal order.
    pub fn indices(&self) -> Vec<usize> {
        if self.is_reversed() {
            (self.end..=self.start).rev().collect()
        } else {
            (self.start..=self.end).collect()
        }
    }
}

impl std::fmt::Display for Bounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
