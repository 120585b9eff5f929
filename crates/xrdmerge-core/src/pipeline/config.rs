use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::assemble::AssemblyOptions;
use crate::consts::{DEFAULT_DEFLATE_LEVEL, DEFAULT_ZERO_FILL};
use crate::error::{MergeError, Result};
use crate::frame::Bounds;
use crate::io::container::{ContainerFormat, WriteOptions};
use crate::io::naming::FileSelection;

/// Everything a merge run needs, loadable from TOML.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MergeConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub selection: FileSelection,
    /// Window width; `None` merges the whole range into one frame pair.
    #[serde(default)]
    pub window: Option<usize>,
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub assembly: AssemblyOptions,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InputConfig {
    pub directory: PathBuf,
    pub basename: String,
    /// File extension without the dot, e.g. `tif`.
    pub extension: String,
    #[serde(default = "default_zero_fill")]
    pub zero_fill: usize,
    /// Separator between basename and file number; probed on disk when unset.
    #[serde(default)]
    pub separator: Option<char>,
}

fn default_zero_fill() -> usize {
    DEFAULT_ZERO_FILL
}

/// Frame selection inside structured containers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Dataset path inside HDF5/NPZ inputs.
    #[serde(default)]
    pub path: Option<String>,
    /// First frame to merge. Merging runs backwards when `start > end`.
    #[serde(default)]
    pub start: Option<usize>,
    /// Last frame to merge (inclusive).
    #[serde(default)]
    pub end: Option<usize>,
}

impl DatasetConfig {
    /// Bounds over a sequence of `frames` frames, if either end was given.
    /// A missing start defaults to the first frame, a missing end to the last.
    pub fn bounds(&self, frames: usize) -> Option<Bounds> {
        if self.start.is_none() && self.end.is_none() {
            return None;
        }
        let last = frames.saturating_sub(1);
        Some(Bounds::new(
            self.start.unwrap_or(0),
            self.end.unwrap_or(last),
        ))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputConfig {
    pub directory: PathBuf,
    /// Container format; the build's default when unset.
    #[serde(default)]
    pub format: Option<ContainerFormat>,
    #[serde(default = "default_compress")]
    pub compress: bool,
    #[serde(default = "default_deflate_level")]
    pub deflate_level: u8,
}

fn default_compress() -> bool {
    true
}

fn default_deflate_level() -> u8 {
    DEFAULT_DEFLATE_LEVEL
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            format: None,
            compress: true,
            deflate_level: DEFAULT_DEFLATE_LEVEL,
        }
    }
}

impl OutputConfig {
    pub fn resolved_format(&self) -> ContainerFormat {
        self.format.unwrap_or_default()
    }

    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            format: Some(self.resolved_format()),
            compress: self.compress,
            deflate_level: self.deflate_level,
        }
    }
}

impl MergeConfig {
    /// Config for `{basename}{sep}{number}.{extension}` files in `directory`.
    pub fn new(directory: impl Into<PathBuf>, basename: &str, extension: &str) -> Self {
        Self {
            input: InputConfig {
                directory: directory.into(),
                basename: basename.to_string(),
                extension: extension.trim_start_matches('.').to_string(),
                zero_fill: DEFAULT_ZERO_FILL,
                separator: None,
            },
            selection: FileSelection::default(),
            window: None,
            dataset: DatasetConfig::default(),
            output: OutputConfig::default(),
            assembly: AssemblyOptions::default(),
        }
    }

    /// Reject settings that can never produce a merge.
    pub fn validate(&self) -> Result<()> {
        if self.input.basename.is_empty() {
            return Err(MergeError::InvalidOption("basename must not be empty".into()));
        }
        if self.input.extension.is_empty() {
            return Err(MergeError::InvalidOption("file extension must not be empty".into()));
        }
        if self.window == Some(0) {
            return Err(MergeError::InvalidOption(
                "window size must be at least 1".into(),
            ));
        }
        if self.output.deflate_level > 9 {
            return Err(MergeError::InvalidOption(format!(
                "deflate level must be 0-9, got {}",
                self.output.deflate_level
            )));
        }
        let format = self.output.resolved_format();
        if !format.is_available() {
            return Err(MergeError::InvalidOption(format!(
                "{format} output is not available in this build"
            )));
        }
        Ok(())
    }
}
