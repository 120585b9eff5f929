use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot access {}: {reason}", .path.display())]
    FileAccess { path: PathBuf, reason: String },

    #[error("Frame {index} has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        index: usize,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Empty frame sequence")]
    EmptyInput,

    #[error("Frame index {index} out of range (total: {total})")]
    FrameIndexOutOfRange { index: usize, total: usize },

    #[error(
        "Could not find any of the files:\n{}\n\nCannot determine the character which separates filename from the frame index",
        display_paths(.candidates)
    )]
    SeparatorDiscovery { candidates: Vec<PathBuf> },

    #[error("Cannot write {}: {reason}", .path.display())]
    Write { path: PathBuf, reason: String },

    #[error("Invalid option: {0}")]
    InvalidOption(String),

    #[error("No image source provided")]
    SourceNotFound,

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid NPY data: {0}")]
    InvalidNpy(String),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[cfg(feature = "hdf5")]
    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),
}

impl MergeError {
    pub(crate) fn file_access(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::FileAccess {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Write {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

pub type Result<T> = std::result::Result<T, MergeError>;
