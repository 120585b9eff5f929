use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::consts::FRAME_SEPARATORS;
use crate::error::{MergeError, Result};
use crate::frame::Bounds;

/// `{dir}/{basename}{separator}{number:0>zero_fill}.{ext}`
pub fn build_file_path(
    dir: &Path,
    basename: &str,
    number: u32,
    ext: &str,
    separator: char,
    zero_fill: usize,
) -> PathBuf {
    let ext = ext.trim_start_matches('.');
    dir.join(format!(
        "{basename}{separator}{number:0>width$}.{ext}",
        width = zero_fill
    ))
}

/// Find which separator the files on disk use between basename and number.
///
/// Candidates are probed in order against the file for `number`. Fails with
/// every probed path when none exists.
pub fn discover_separator(
    dir: &Path,
    basename: &str,
    number: u32,
    ext: &str,
    zero_fill: usize,
) -> Result<char> {
    let mut candidates = Vec::with_capacity(FRAME_SEPARATORS.len());
    for sep in FRAME_SEPARATORS {
        let path = build_file_path(dir, basename, number, ext, sep, zero_fill);
        if path.exists() {
            debug!(separator = %sep, path = %path.display(), "Found frame separator");
            return Ok(sep);
        }
        candidates.push(path);
    }
    Err(MergeError::SeparatorDiscovery { candidates })
}

/// Which file numbers make up an acquisition.
///
/// Either an explicit `list`, or exactly two of `start`, `finish` and
/// `count` (`finish` is inclusive). `exclude` then drops numbers and
/// `include` appends extra ones.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSelection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub list: Vec<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<u32>,
}

impl FileSelection {
    pub fn range(start: u32, finish: u32) -> Self {
        Self {
            start: Some(start),
            finish: Some(finish),
            ..Default::default()
        }
    }

    pub fn list(numbers: Vec<u32>) -> Self {
        Self {
            list: numbers,
            ..Default::default()
        }
    }

    /// Resolve to the ordered list of file numbers.
    pub fn resolve(&self) -> Result<Vec<u32>> {
        let given = [self.start, self.finish, self.count]
            .iter()
            .filter(|v| v.is_some())
            .count();

        let mut numbers: Vec<u32> = if !self.list.is_empty() {
            if given != 0 {
                return Err(MergeError::InvalidOption(
                    "give either a list of file numbers or a start/finish/number range, not both"
                        .into(),
                ));
            }
            self.list.clone()
        } else {
            if given != 2 {
                return Err(MergeError::InvalidOption(
                    "please specify exactly two of --start-at, --finish-at and --number".into(),
                ));
            }
            let (start, end_exclusive) = self.range_limits()?;
            (start..end_exclusive).collect()
        };

        for nr in &self.exclude {
            let pos = numbers.iter().position(|n| n == nr).ok_or_else(|| {
                MergeError::InvalidOption(format!("cannot exclude {nr}: it is not selected"))
            })?;
            numbers.remove(pos);
        }

        for &nr in &self.include {
            if !numbers.contains(&nr) {
                numbers.push(nr);
            }
        }

        if numbers.is_empty() {
            return Err(MergeError::EmptyInput);
        }
        Ok(numbers)
    }

    fn range_limits(&self) -> Result<(u32, u32)> {
        match (self.start, self.finish, self.count) {
            (Some(start), Some(finish), None) => {
                if finish < start {
                    return Err(MergeError::InvalidOption(format!(
                        "finish ({finish}) is before start ({start})"
                    )));
                }
                Ok((start, finish.saturating_add(1)))
            }
            (Some(start), None, Some(count)) => start
                .checked_add(count)
                .map(|end| (start, end))
                .ok_or_else(|| MergeError::InvalidOption("file number range overflows".into())),
            (None, Some(finish), Some(count)) => {
                let end = finish.saturating_add(1);
                end.checked_sub(count)
                    .map(|start| (start, end))
                    .ok_or_else(|| {
                        MergeError::InvalidOption(format!(
                            "cannot take {count} files ending at {finish}"
                        ))
                    })
            }
            _ => Err(MergeError::InvalidOption(
                "could not determine file numbers to merge".into(),
            )),
        }
    }
}

/// Output container name: `{basename}_{first}[-{last}][_frames{start}-{end}].{ext}`.
pub fn output_file_name(
    basename: &str,
    numbers: &[u32],
    frame_bounds: Option<Bounds>,
    ext: &str,
) -> String {
    let mut name = basename.to_string();
    if let Some(first) = numbers.first() {
        name.push_str(&format!("_{first}"));
    }
    if numbers.len() > 1 {
        if let Some(last) = numbers.last() {
            name.push_str(&format!("-{last}"));
        }
    }
    if let Some(bounds) = frame_bounds {
        name.push_str(&format!("_frames{bounds}"));
    }
    format!("{name}.{}", ext.trim_start_matches('.'))
}
