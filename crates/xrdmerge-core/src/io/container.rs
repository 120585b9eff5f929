use std::fs::File;
use std::io::{BufReader, BufWriter, Read};
use std::path::Path;

use ndarray::ArrayD;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::consts::{
    AVERAGED_DATASET, DEFAULT_DEFLATE_LEVEL, HDF_EXTENSIONS, NPZ_EXTENSION, SUMMED_DATASET,
};
use crate::error::{MergeError, Result};
use crate::merge::ReductionResult;

use super::npy::{read_npy, write_npy, NpyArray};

const ZIP_MAGIC: &[u8; 4] = b"PK\x03\x04";
const HDF5_MAGIC: &[u8; 8] = b"\x89HDF\r\n\x1a\n";

/// On-disk layout of an output container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    /// Zipped NumPy arrays, readable with `numpy.load`.
    Npz,
    /// HDF5 file; needs the `hdf5` feature.
    Hdf5,
}

impl Default for ContainerFormat {
    fn default() -> Self {
        if cfg!(feature = "hdf5") {
            Self::Hdf5
        } else {
            Self::Npz
        }
    }
}

impl std::fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Npz => write!(f, "NPZ"),
            Self::Hdf5 => write!(f, "HDF5"),
        }
    }
}

impl ContainerFormat {
    /// Infer the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        if ext == NPZ_EXTENSION {
            Some(Self::Npz)
        } else if HDF_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Hdf5)
        } else {
            None
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Npz => NPZ_EXTENSION,
            Self::Hdf5 => "hdf",
        }
    }

    /// Whether this build can read and write the format.
    pub fn is_available(&self) -> bool {
        match self {
            Self::Npz => true,
            Self::Hdf5 => cfg!(feature = "hdf5"),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct WriteOptions {
    /// Explicit format; inferred from the output extension when `None`.
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

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            format: None,
            compress: true,
            deflate_level: DEFAULT_DEFLATE_LEVEL,
        }
    }
}

/// Backend that writes both merged datasets into a fresh file at `path`.
///
/// Implementations may assume `path` is a private staging location:
/// [`write_result`] renames it into place once `write_to` succeeds.
pub trait ContainerWriter {
    fn write_to(&self, path: &Path, result: &ReductionResult) -> Result<()>;
}

/// Writes `data/averaged.npy` and `data/summed.npy` into a zip archive.
#[derive(Clone, Copy, Debug)]
pub struct NpzWriter {
    pub compress: bool,
    pub level: u8,
}

impl ContainerWriter for NpzWriter {
    fn write_to(&self, path: &Path, result: &ReductionResult) -> Result<()> {
        let file = File::create(path).map_err(|e| MergeError::write(path, e))?;
        let mut zip = ZipWriter::new(BufWriter::new(file));

        let options = if self.compress {
            SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(self.level as i64))
        } else {
            SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
        };

        for (name, data) in [
            (AVERAGED_DATASET, result.average()),
            (SUMMED_DATASET, result.sum()),
        ] {
            zip.start_file(format!("{name}.npy"), options)
                .map_err(|e| MergeError::write(path, e))?;
            write_npy(&mut zip, &data)?;
            debug!(dataset = name, shape = ?data.shape(), "Wrote NPZ member");
        }

        zip.finish().map_err(|e| MergeError::write(path, e))?;
        Ok(())
    }
}

/// Write a merge result to `path` as a single container.
///
/// Both datasets are written into a temporary file next to `path`, which is
/// renamed over `path` only once everything succeeded. A failed write never
/// leaves a half-written container behind.
pub fn write_result(path: &Path, result: &ReductionResult, options: &WriteOptions) -> Result<()> {
    let format = options
        .format
        .or_else(|| ContainerFormat::from_path(path))
        .unwrap_or_default();

    let writer: Box<dyn ContainerWriter> = match format {
        ContainerFormat::Npz => Box::new(NpzWriter {
            compress: options.compress,
            level: options.deflate_level,
        }),
        ContainerFormat::Hdf5 => hdf5_writer(options)?,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let staged = tempfile::Builder::new()
        .prefix(".xrdmerge-")
        .suffix(".part")
        .tempfile_in(dir)
        .map_err(|e| MergeError::write(path, e))?
        .into_temp_path();

    writer.write_to(&staged, result)?;
    staged
        .persist(path)
        .map_err(|e| MergeError::write(path, e.error))?;

    info!(
        path = %path.display(),
        format = %format,
        shape = ?result.shape(),
        "Wrote merged container"
    );
    Ok(())
}

#[cfg(feature = "hdf5")]
fn hdf5_writer(options: &WriteOptions) -> Result<Box<dyn ContainerWriter>> {
    Ok(Box::new(super::hdf::Hdf5Writer {
        deflate: options.compress.then_some(options.deflate_level),
    }))
}

#[cfg(not(feature = "hdf5"))]
fn hdf5_writer(_options: &WriteOptions) -> Result<Box<dyn ContainerWriter>> {
    Err(MergeError::UnsupportedFormat(
        "HDF5 output requires building with the `hdf5` feature".into(),
    ))
}

/// Both datasets of a container, as read back from disk.
#[derive(Clone, Debug)]
pub struct StoredResult {
    pub averaged: ArrayD<f64>,
    pub summed: ArrayD<f64>,
}

/// Read `data/averaged` and `data/summed` back from a container.
pub fn read_result(path: &Path) -> Result<StoredResult> {
    Ok(StoredResult {
        averaged: read_dataset(path, AVERAGED_DATASET)?.data,
        summed: read_dataset(path, SUMMED_DATASET)?.data,
    })
}

/// Read one named dataset from a container, sniffing its format.
pub fn read_dataset(path: &Path, dataset: &str) -> Result<NpyArray> {
    match sniff_format(path)? {
        ContainerFormat::Npz => read_npz_member(path, dataset),
        ContainerFormat::Hdf5 => read_hdf5_dataset(path, dataset),
    }
}

fn sniff_format(path: &Path) -> Result<ContainerFormat> {
    let mut file = File::open(path).map_err(|e| MergeError::file_access(path, e))?;
    let mut magic = [0u8; 8];
    let read = file.read(&mut magic)?;
    if read >= 4 && &magic[..4] == ZIP_MAGIC {
        Ok(ContainerFormat::Npz)
    } else if read == 8 && &magic == HDF5_MAGIC {
        Ok(ContainerFormat::Hdf5)
    } else {
        Err(MergeError::UnsupportedFormat(format!(
            "{} is neither an NPZ nor an HDF5 container",
            path.display()
        )))
    }
}

fn read_npz_member(path: &Path, dataset: &str) -> Result<NpyArray> {
    let file = File::open(path).map_err(|e| MergeError::file_access(path, e))?;
    let mut archive = ZipArchive::new(BufReader::new(file))
        .map_err(|e| MergeError::UnsupportedFormat(format!("{}: {}", path.display(), e)))?;

    let name = format!("{}.npy", dataset.trim_start_matches('/'));
    let mut member = archive.by_name(&name).map_err(|_| {
        MergeError::file_access(path, format!("no dataset {dataset:?} in container"))
    })?;
    read_npy(&mut member)
}

#[cfg(feature = "hdf5")]
fn read_hdf5_dataset(path: &Path, dataset: &str) -> Result<NpyArray> {
    super::hdf::read_dataset(path, dataset)
}

#[cfg(not(feature = "hdf5"))]
fn read_hdf5_dataset(path: &Path, _dataset: &str) -> Result<NpyArray> {
    Err(MergeError::UnsupportedFormat(format!(
        "{}: reading HDF5 requires building with the `hdf5` feature",
        path.display()
    )))
}
