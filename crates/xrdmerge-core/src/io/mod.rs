pub mod container;
#[cfg(feature = "hdf5")]
pub mod hdf;
pub mod image_io;
pub mod loader;
pub mod naming;
pub mod npy;
