/// Logical path of the averaged dataset inside an output container.
pub const AVERAGED_DATASET: &str = "data/averaged";

/// Logical path of the summed dataset inside an output container.
pub const SUMMED_DATASET: &str = "data/summed";

/// Dataset read from an HDF5/NeXus input when none is given explicitly.
pub const DEFAULT_INPUT_DATASET: &str = "entry/data/data";

/// Number of digits the frame number is zero-padded to in file names.
pub const DEFAULT_ZERO_FILL: usize = 5;

/// Characters probed, in order, between basename and frame number.
pub const FRAME_SEPARATORS: [char; 2] = ['_', '-'];

/// Extensions handled as structured containers rather than single images.
pub const HDF_EXTENSIONS: [&str; 4] = ["h5", "hdf", "hdf5", "nxs"];

/// Extension of NumPy array files.
pub const NPY_EXTENSION: &str = "npy";

/// Extension of zipped NumPy containers.
pub const NPZ_EXTENSION: &str = "npz";

/// Extensions picked up when rendering a whole directory.
pub const RENDER_DIRECTORY_EXTENSIONS: [&str; 2] = ["tif", "tiff"];

/// Number of histogram bins for automatic colour limits.
pub const HISTOGRAM_BINS: usize = 256;

/// Default outlier threshold, in percent of the most populated bin.
pub const DEFAULT_OUTLIER_PERCENT: f64 = 0.005;

/// Pixel spacing between axis ticks on rendered figures.
pub const DEFAULT_TICK_SPACING: usize = 500;

/// Margin (in pixels) around the plot area of a rendered figure.
pub const FIGURE_MARGIN: u32 = 24;

/// Length of an axis tick mark in pixels.
pub const TICK_LENGTH: u32 = 8;

/// Width of the colour bar in pixels.
pub const COLORBAR_WIDTH: u32 = 24;

/// Gap between the plot area and the colour bar.
pub const COLORBAR_GAP: u32 = 16;

/// Default deflate level for compressed containers.
pub const DEFAULT_DEFLATE_LEVEL: u8 = 4;
