pub mod colormap;
pub mod histogram;

use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::consts::{
    COLORBAR_GAP, COLORBAR_WIDTH, DEFAULT_OUTLIER_PERCENT, DEFAULT_TICK_SPACING, FIGURE_MARGIN,
    RENDER_DIRECTORY_EXTENSIONS, TICK_LENGTH,
};
use crate::error::{MergeError, Result};
use crate::frame::Frame;
use crate::io::image_io::save_png;
use crate::io::loader::{FrameLoader, FrameSource};

pub use colormap::Colormap;
pub use histogram::{histogram_limits, Histogram};

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const INK: Rgb<u8> = Rgb([0, 0, 0]);
const COLORBAR_TICKS: u32 = 5;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Bins below this percentage of the most populated bin are outliers.
    pub outlier_percent: f64,
    /// Explicit (min, max) colour limits; skips the histogram when set.
    pub limits: Option<(f64, f64)>,
    pub colormap: Colormap,
    /// Pixels between axis ticks.
    pub tick_spacing: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            outlier_percent: DEFAULT_OUTLIER_PERCENT,
            limits: None,
            colormap: Colormap::default(),
            tick_spacing: DEFAULT_TICK_SPACING,
        }
    }
}

/// Colour limits for `frame`: the explicit ones, or histogram-derived.
pub fn color_limits(frame: &Frame, options: &RenderOptions) -> Result<(f64, f64)> {
    match options.limits {
        Some((lo, hi)) => {
            if !(lo.is_finite() && hi.is_finite()) || lo > hi {
                return Err(MergeError::InvalidOption(format!(
                    "invalid histogram limits ({lo}, {hi})"
                )));
            }
            Ok((lo, hi))
        }
        None => histogram_limits(frame.data.view(), options.outlier_percent),
    }
}

/// Render a frame as a false-colour figure.
///
/// The frame is drawn one pixel per detector pixel inside a black frame,
/// with tick marks every `tick_spacing` pixels along the left and bottom
/// edges and a colour bar spanning the limits on the right.
pub fn render_frame(frame: &Frame, options: &RenderOptions) -> Result<(RgbImage, (f64, f64))> {
    let (lo, hi) = color_limits(frame, options)?;
    let (rows, columns) = frame.shape();
    if rows == 0 || columns == 0 {
        return Err(MergeError::EmptyInput);
    }
    let (w, h) = (columns as u32, rows as u32);

    let plot_x = FIGURE_MARGIN;
    let plot_y = FIGURE_MARGIN;
    let bar_x = plot_x + w + COLORBAR_GAP;
    let width = bar_x + COLORBAR_WIDTH + TICK_LENGTH + FIGURE_MARGIN;
    let height = plot_y + h + TICK_LENGTH + FIGURE_MARGIN;

    let mut img = RgbImage::from_pixel(width, height, BACKGROUND);
    let normalize = |v: f64| if hi > lo { (v - lo) / (hi - lo) } else if v > lo { 1.0 } else { 0.0 };

    for ((row, col), &value) in frame.data.indexed_iter() {
        img.put_pixel(
            plot_x + col as u32,
            plot_y + row as u32,
            options.colormap.map(normalize(value)),
        );
    }
    draw_border(&mut img, plot_x, plot_y, w, h);

    // axis ticks, one every `tick_spacing` pixels from the origin
    let spacing = options.tick_spacing.max(1) as u32;
    for x in (0..w).step_by(spacing as usize) {
        for dy in 0..TICK_LENGTH {
            img.put_pixel(plot_x + x, plot_y + h + dy, INK);
        }
    }
    for y in (0..h).step_by(spacing as usize) {
        for dx in 1..=TICK_LENGTH.min(plot_x) {
            img.put_pixel(plot_x - dx, plot_y + y, INK);
        }
    }

    // colour bar, high limit at the top
    for y in 0..h {
        let t = if h > 1 { 1.0 - y as f64 / (h - 1) as f64 } else { 1.0 };
        let color = options.colormap.map(t);
        for x in 0..COLORBAR_WIDTH {
            img.put_pixel(bar_x + x, plot_y + y, color);
        }
    }
    draw_border(&mut img, bar_x, plot_y, COLORBAR_WIDTH, h);
    for i in 0..COLORBAR_TICKS {
        let y = plot_y + (h - 1) * i / (COLORBAR_TICKS - 1);
        for dx in 0..TICK_LENGTH {
            img.put_pixel(bar_x + COLORBAR_WIDTH + dx, y, INK);
        }
    }

    Ok((img, (lo, hi)))
}

/// One-pixel outline just outside the `w` x `h` box at (x, y).
fn draw_border(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32) {
    let (left, top) = (x - 1, y - 1);
    let (right, bottom) = (x + w, y + h);
    for cx in left..=right {
        img.put_pixel(cx, top, INK);
        img.put_pixel(cx, bottom, INK);
    }
    for cy in top..=bottom {
        img.put_pixel(left, cy, INK);
        img.put_pixel(right, cy, INK);
    }
}

/// Load `input`, render it and save the figure as PNG at `output`.
/// Returns the colour limits used.
pub fn render_to_file(
    loader: &dyn FrameLoader,
    input: &Path,
    output: &Path,
    options: &RenderOptions,
) -> Result<(f64, f64)> {
    let frame = loader.load(&FrameSource::File(input.to_path_buf()))?;
    let (img, limits) = render_frame(&frame, options)?;
    info!(
        input = %input.display(),
        output = %output.display(),
        min = limits.0,
        max = limits.1,
        "Saving figure"
    );
    save_png(&img, output)?;
    Ok(limits)
}

/// Where frames to render come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderSource {
    File(PathBuf),
    List(Vec<PathBuf>),
    /// Every TIFF directly inside the directory.
    Directory(PathBuf),
}

impl RenderSource {
    /// Pick the source from optional CLI inputs, in file, list, directory order.
    pub fn from_options(
        file: Option<PathBuf>,
        list: Option<Vec<PathBuf>>,
        directory: Option<PathBuf>,
    ) -> Result<Self> {
        match (file, list, directory) {
            (Some(f), _, _) => Ok(Self::File(f)),
            (None, Some(l), _) if !l.is_empty() => Ok(Self::List(l)),
            (None, _, Some(d)) => Ok(Self::Directory(d)),
            _ => Err(MergeError::SourceNotFound),
        }
    }

    /// Expand to the list of files to render.
    pub fn resolve(&self) -> Result<Vec<PathBuf>> {
        match self {
            Self::File(path) => {
                ensure_file(path)?;
                Ok(vec![path.clone()])
            }
            Self::List(paths) => {
                if paths.is_empty() {
                    return Err(MergeError::SourceNotFound);
                }
                for path in paths {
                    ensure_file(path)?;
                }
                Ok(paths.clone())
            }
            Self::Directory(dir) => {
                let entries =
                    std::fs::read_dir(dir).map_err(|e| MergeError::file_access(dir, e))?;
                let mut files: Vec<PathBuf> = entries
                    .filter_map(|entry| entry.ok().map(|e| e.path()))
                    .filter(|p| p.is_file() && has_render_extension(p))
                    .collect();
                if files.is_empty() {
                    return Err(MergeError::SourceNotFound);
                }
                files.sort();
                Ok(files)
            }
        }
    }
}

fn ensure_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(MergeError::file_access(path, "cannot find file"))
    }
}

fn has_render_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| RENDER_DIRECTORY_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// `input` with a `.png` extension, optionally moved into `out_dir`.
pub fn figure_path(input: &Path, out_dir: Option<&Path>) -> PathBuf {
    let png = input.with_extension("png");
    match (out_dir, png.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => png,
    }
}
