use std::path::{Path, PathBuf};

use ndarray::{Axis, Ix2, Ix3};

use crate::consts::{AVERAGED_DATASET, DEFAULT_INPUT_DATASET, HDF_EXTENSIONS, NPY_EXTENSION, NPZ_EXTENSION};
use crate::error::{MergeError, Result};
use crate::frame::{Frame, Sequence};

use super::container::read_dataset;
use super::image_io::load_image;
use super::npy::{read_npy_file, NpyArray};

/// Where a single frame comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameSource {
    /// An image or array file; the format follows from the extension.
    File(PathBuf),
    /// A named dataset inside a structured container.
    Dataset { container: PathBuf, dataset: String },
}

impl FrameSource {
    pub fn path(&self) -> &Path {
        match self {
            Self::File(p) => p,
            Self::Dataset { container, .. } => container,
        }
    }
}

impl std::fmt::Display for FrameSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(p) => write!(f, "{}", p.display()),
            Self::Dataset { container, dataset } => {
                write!(f, "{}:{}", container.display(), dataset)
            }
        }
    }
}

/// Kind of input file, decided from its extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    /// Raster detector image (TIFF, PNG, ...).
    Image,
    Npy,
    Npz,
    Hdf5,
}

impl InputKind {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        Self::from_extension(&ext)
    }

    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        if ext == NPY_EXTENSION {
            Self::Npy
        } else if ext == NPZ_EXTENSION {
            Self::Npz
        } else if HDF_EXTENSIONS.contains(&ext.as_str()) {
            Self::Hdf5
        } else {
            Self::Image
        }
    }

    /// Whether one file can hold a whole stack of frames.
    pub fn is_container(&self) -> bool {
        !matches!(self, Self::Image)
    }
}

/// Decodes one frame from a [`FrameSource`].
pub trait FrameLoader: Send + Sync {
    fn load(&self, source: &FrameSource) -> Result<Frame>;
}

/// Loader for every format the crate understands.
///
/// `dataset` names the dataset read from container files that are passed as
/// plain [`FrameSource::File`]s.
#[derive(Clone, Debug, Default)]
pub struct DefaultLoader {
    pub dataset: Option<String>,
}

impl DefaultLoader {
    pub fn with_dataset(dataset: Option<String>) -> Self {
        Self { dataset }
    }
}

impl FrameLoader for DefaultLoader {
    fn load(&self, source: &FrameSource) -> Result<Frame> {
        let path = source.path();
        if !path.is_file() {
            return Err(MergeError::file_access(path, "no such file"));
        }

        match source {
            FrameSource::File(path) => match InputKind::from_path(path) {
                InputKind::Image => load_image(path),
                _ => {
                    let array = read_array(path, self.dataset.as_deref())?;
                    frame_from_array(array, path)
                }
            },
            FrameSource::Dataset { container, dataset } => {
                let array = read_array(container, Some(dataset))?;
                frame_from_array(array, container)
            }
        }
    }
}

/// Read a container's dataset (or a bare `.npy` array) as f64.
fn read_array(path: &Path, dataset: Option<&str>) -> Result<NpyArray> {
    match InputKind::from_path(path) {
        InputKind::Npy => read_npy_file(path),
        InputKind::Npz => read_dataset(path, dataset.unwrap_or(AVERAGED_DATASET)),
        InputKind::Hdf5 => read_dataset(path, dataset.unwrap_or(DEFAULT_INPUT_DATASET)),
        InputKind::Image => Err(MergeError::UnsupportedFormat(format!(
            "{} is an image, not a container",
            path.display()
        ))),
    }
}

/// Accept 2-D arrays, or 3-D arrays holding exactly one frame.
fn frame_from_array(array: NpyArray, path: &Path) -> Result<Frame> {
    let NpyArray { data, sample_type } = array;
    let data = match data.ndim() {
        2 => data.into_dimensionality::<Ix2>(),
        3 if data.len_of(Axis(0)) == 1 => data.index_axis_move(Axis(0), 0).into_dimensionality::<Ix2>(),
        _ => {
            return Err(MergeError::UnsupportedFormat(format!(
                "{}: expected a single 2-D frame, found shape {:?}",
                path.display(),
                data.shape()
            )))
        }
    }
    .map_err(|e| MergeError::UnsupportedFormat(e.to_string()))?;

    Ok(Frame::new(data, sample_type).with_source(path))
}

/// Load a whole stack of frames stored in one container.
///
/// A 3-D dataset becomes a sequence of its leading-axis slices; a 2-D
/// dataset becomes a one-frame sequence.
pub fn load_stack(container: &Path, dataset: Option<&str>) -> Result<Sequence> {
    if !container.is_file() {
        return Err(MergeError::file_access(container, "no such file"));
    }

    let NpyArray { data, .. } = read_array(container, dataset)?;
    let stack = match data.ndim() {
        2 => data.insert_axis(Axis(0)).into_dimensionality::<Ix3>(),
        3 => data.into_dimensionality::<Ix3>(),
        _ => {
            return Err(MergeError::UnsupportedFormat(format!(
                "{}: expected a 2-D or 3-D dataset, found shape {:?}",
                container.display(),
                data.shape()
            )))
        }
    }
    .map_err(|e| MergeError::UnsupportedFormat(e.to_string()))?;

    Sequence::from_array(stack)
}
