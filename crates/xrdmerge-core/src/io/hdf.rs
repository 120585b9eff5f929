use std::path::Path;

use ndarray::{ArrayD, ArrayViewD, IxDyn};

use crate::error::{MergeError, Result};
use crate::frame::SampleType;
use crate::merge::ReductionResult;

use super::container::ContainerWriter;
use super::npy::NpyArray;

/// Writes both datasets into a `data` group of a new HDF5 file.
#[derive(Clone, Copy, Debug)]
pub struct Hdf5Writer {
    /// Deflate level, or `None` for uncompressed chunks.
    pub deflate: Option<u8>,
}

impl ContainerWriter for Hdf5Writer {
    fn write_to(&self, path: &Path, result: &ReductionResult) -> Result<()> {
        let to_write_err = |e: hdf5::Error| MergeError::write(path, e);

        let file = hdf5::File::create(path).map_err(to_write_err)?;
        let group = file.create_group("data").map_err(to_write_err)?;

        self.write_dataset(&group, "averaged", &result.average())
            .map_err(to_write_err)?;
        self.write_dataset(&group, "summed", &result.sum())
            .map_err(to_write_err)?;

        file.flush().map_err(to_write_err)?;
        Ok(())
    }
}

impl Hdf5Writer {
    fn write_dataset(
        &self,
        group: &hdf5::Group,
        name: &str,
        data: &ArrayViewD<'_, f64>,
    ) -> hdf5::Result<()> {
        let shape = data.shape().to_vec();
        // one chunk per frame
        let mut chunk = shape.clone();
        if chunk.len() == 3 {
            chunk[0] = 1;
        }

        let builder = group.new_dataset::<f64>().shape(shape).chunk(chunk);
        let builder = match self.deflate {
            Some(level) => builder.deflate(level),
            None => builder,
        };
        let dataset = builder.create(name)?;

        let values: Vec<f64> = data.iter().copied().collect();
        dataset.write_raw(values.as_slice())
    }
}

/// Read an HDF5 dataset, letting the library convert samples to f64.
pub fn read_dataset(path: &Path, dataset: &str) -> Result<NpyArray> {
    let file = hdf5::File::open(path).map_err(|e| MergeError::file_access(path, e))?;
    let ds = file
        .dataset(dataset)
        .map_err(|e| MergeError::file_access(path, format!("dataset {dataset:?}: {e}")))?;

    let shape = ds.shape();
    let values = ds.read_raw::<f64>()?;
    let data = ArrayD::from_shape_vec(IxDyn(&shape), values)
        .map_err(|e| MergeError::UnsupportedFormat(format!("{dataset}: {e}")))?;

    Ok(NpyArray {
        data,
        sample_type: SampleType::F64,
    })
}
