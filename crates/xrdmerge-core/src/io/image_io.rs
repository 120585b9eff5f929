use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use image::{DynamicImage, ImageError, ImageFormat, RgbImage};
use ndarray::Array2;
use num_traits::AsPrimitive;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{colortype, TiffEncoder};
use tiff::ColorType;

use crate::error::{MergeError, Result};
use crate::frame::{Frame, SampleType};

/// Load a detector image into a Frame, keeping raw sample values.
///
/// Grayscale TIFFs go through the TIFF decoder directly so 32-bit integer
/// and floating point detector images keep their counts. Everything else is
/// decoded by `image` and reduced to a single luminance channel.
pub fn load_image(path: &Path) -> Result<Frame> {
    if !path.is_file() {
        return Err(MergeError::file_access(path, "no such file"));
    }

    let is_tiff = matches!(
        ImageFormat::from_path(path),
        Ok(ImageFormat::Tiff)
    );
    if is_tiff {
        if let Some(frame) = load_gray_tiff(path)? {
            return Ok(frame.with_source(path));
        }
    }

    let img = image::open(path).map_err(|e| match e {
        ImageError::IoError(io) => MergeError::file_access(path, io),
        other => MergeError::ImageError(other),
    })?;

    let (data, sample_type) = match &img {
        DynamicImage::ImageLuma8(buf) => (
            pixels_to_array(buf.width(), buf.height(), buf.as_raw())?,
            SampleType::U8,
        ),
        DynamicImage::ImageLuma16(buf) => (
            pixels_to_array(buf.width(), buf.height(), buf.as_raw())?,
            SampleType::U16,
        ),
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
            (luminance(&img, 1.0)?, SampleType::F32)
        }
        DynamicImage::ImageLumaA8(_) | DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => {
            (luminance(&img, u8::MAX as f64)?, SampleType::U8)
        }
        _ => (luminance(&img, u16::MAX as f64)?, SampleType::U16),
    };

    Ok(Frame::new(data, sample_type).with_source(path))
}

/// Decode a single-channel TIFF. Returns `None` for colour TIFFs.
fn load_gray_tiff(path: &Path) -> Result<Option<Frame>> {
    let file = File::open(path).map_err(|e| MergeError::file_access(path, e))?;
    let mut decoder = Decoder::new(BufReader::new(file))
        .map_err(|e| MergeError::UnsupportedFormat(format!("{}: {}", path.display(), e)))?;
    let tiff_err = |e: tiff::TiffError| MergeError::UnsupportedFormat(format!("{}: {}", path.display(), e));

    if !matches!(decoder.colortype().map_err(tiff_err)?, ColorType::Gray(_)) {
        return Ok(None);
    }

    let (width, height) = decoder.dimensions().map_err(tiff_err)?;
    let (data, sample_type) = match decoder.read_image().map_err(tiff_err)? {
        DecodingResult::U8(v) => (pixels_to_array(width, height, &v)?, SampleType::U8),
        DecodingResult::U16(v) => (pixels_to_array(width, height, &v)?, SampleType::U16),
        DecodingResult::U32(v) => (pixels_to_array(width, height, &v)?, SampleType::U32),
        DecodingResult::I16(v) => (pixels_to_array(width, height, &v)?, SampleType::I16),
        DecodingResult::I32(v) => (pixels_to_array(width, height, &v)?, SampleType::I32),
        DecodingResult::I64(v) => (pixels_to_array(width, height, &v)?, SampleType::I64),
        DecodingResult::F32(v) => (pixels_to_array(width, height, &v)?, SampleType::F32),
        DecodingResult::F64(v) => (pixels_to_array(width, height, &v)?, SampleType::F64),
        _ => {
            return Err(MergeError::UnsupportedFormat(format!(
                "{}: unsupported TIFF sample format",
                path.display()
            )))
        }
    };

    Ok(Some(Frame::new(data, sample_type)))
}

/// Luminance of a multi-channel image in the source's own sample units.
///
/// `to_luma32f` normalizes integer samples to [0, 1]; `full_scale` maps them
/// back to counts.
fn luminance(img: &DynamicImage, full_scale: f64) -> Result<Array2<f64>> {
    let gray = img.to_luma32f();
    let mut data = pixels_to_array(gray.width(), gray.height(), gray.as_raw())?;
    if full_scale != 1.0 {
        data.mapv_inplace(|v| (v * full_scale).round());
    }
    Ok(data)
}

fn pixels_to_array<T: AsPrimitive<f64>>(width: u32, height: u32, raw: &[T]) -> Result<Array2<f64>> {
    let values: Vec<f64> = raw.iter().map(|v| v.as_()).collect();
    Array2::from_shape_vec((height as usize, width as usize), values).map_err(|e| {
        MergeError::UnsupportedFormat(format!("pixel buffer does not match {width}x{height}: {e}"))
    })
}

/// Save a frame as a 32-bit floating point grayscale TIFF.
pub fn save_tiff(frame: &Frame, path: &Path) -> Result<()> {
    let (rows, columns) = frame.shape();
    let pixels: Vec<f32> = frame.data.iter().map(|&v| v as f32).collect();

    let file = File::create(path)?;
    let mut encoder = TiffEncoder::new(BufWriter::new(file))
        .map_err(|e| MergeError::write(path, e))?;
    encoder
        .write_image::<colortype::Gray32Float>(columns as u32, rows as u32, &pixels)
        .map_err(|e| MergeError::write(path, e))?;
    Ok(())
}

/// Save an RGB raster as PNG.
pub fn save_png(img: &RgbImage, path: &Path) -> Result<()> {
    img.save_with_format(path, ImageFormat::Png)
        .map_err(|e| MergeError::write(path, e))
}
