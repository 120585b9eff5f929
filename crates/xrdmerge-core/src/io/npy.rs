//! NumPy `.npy` encoding, used on its own for frame/stack inputs and as the
//! member format of `.npz` containers.

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use ndarray::{ArrayD, ArrayViewD, IxDyn};

use crate::error::{MergeError, Result};
use crate::frame::SampleType;

const NPY_MAGIC: &[u8; 6] = b"\x93NUMPY";

/// Upper bound on the header dict length; numpy writes a few hundred bytes.
const MAX_HEADER_LEN: usize = 64 * 1024;

/// A decoded `.npy` array, promoted to f64.
#[derive(Clone, Debug)]
pub struct NpyArray {
    pub data: ArrayD<f64>,
    pub sample_type: SampleType,
}

/// Write an array as NPY v1.0, `<f8`, C order.
pub fn write_npy<W: Write>(w: &mut W, array: &ArrayViewD<'_, f64>) -> Result<()> {
    let dims: Vec<String> = array.shape().iter().map(|d| d.to_string()).collect();
    let shape = match dims.len() {
        1 => format!("({},)", dims[0]),
        _ => format!("({})", dims.join(", ")),
    };
    let dict = format!("{{'descr': '<f8', 'fortran_order': False, 'shape': {}, }}", shape);

    // magic + version + u16 length + dict + newline, padded to 64 bytes
    let unpadded = NPY_MAGIC.len() + 2 + 2 + dict.len() + 1;
    let pad = (64 - unpadded % 64) % 64;
    let header = format!("{}{}\n", dict, " ".repeat(pad));

    w.write_all(NPY_MAGIC)?;
    w.write_all(&[1, 0])?;
    w.write_u16::<LittleEndian>(header.len() as u16)?;
    w.write_all(header.as_bytes())?;

    // iter() walks logical (C) order regardless of memory layout
    for &value in array.iter() {
        w.write_f64::<LittleEndian>(value)?;
    }
    Ok(())
}

/// Read an NPY stream of any supported numeric dtype.
pub fn read_npy<R: Read>(r: &mut R) -> Result<NpyArray> {
    let mut magic = [0u8; 6];
    r.read_exact(&mut magic)?;
    if &magic != NPY_MAGIC {
        return Err(MergeError::InvalidNpy("missing \\x93NUMPY magic".into()));
    }

    let major = r.read_u8()?;
    let _minor = r.read_u8()?;
    let header_len = match major {
        1 => r.read_u16::<LittleEndian>()? as usize,
        2 | 3 => r.read_u32::<LittleEndian>()? as usize,
        v => return Err(MergeError::InvalidNpy(format!("unsupported version {v}"))),
    };
    if header_len > MAX_HEADER_LEN {
        return Err(MergeError::InvalidNpy(format!(
            "header length {header_len} exceeds {MAX_HEADER_LEN} bytes"
        )));
    }

    let mut header = vec![0u8; header_len];
    r.read_exact(&mut header)?;
    let header = String::from_utf8_lossy(&header);
    let header = parse_header(&header)?;

    let count = header
        .shape
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| MergeError::InvalidNpy("shape overflows".into()))?;
    let mut raw = Vec::new();
    r.read_to_end(&mut raw)?;

    let (sample_type, values) = decode_samples(&header.descr, &raw, count)?;

    let data = if header.fortran_order {
        let reversed: Vec<usize> = header.shape.iter().rev().copied().collect();
        ArrayD::from_shape_vec(IxDyn(&reversed), values)
            .map_err(|e| MergeError::InvalidNpy(e.to_string()))?
            .reversed_axes()
            .as_standard_layout()
            .into_owned()
    } else {
        ArrayD::from_shape_vec(IxDyn(&header.shape), values)
            .map_err(|e| MergeError::InvalidNpy(e.to_string()))?
    };

    Ok(NpyArray { data, sample_type })
}

/// Read a `.npy` file from disk.
pub fn read_npy_file(path: &Path) -> Result<NpyArray> {
    let file = File::open(path).map_err(|e| MergeError::file_access(path, e))?;
    read_npy(&mut BufReader::new(file))
}

#[derive(Debug, PartialEq)]
struct NpyHeader {
    descr: String,
    fortran_order: bool,
    shape: Vec<usize>,
}

fn parse_header(header: &str) -> Result<NpyHeader> {
    let invalid = |what: &str| MergeError::InvalidNpy(format!("{what} in header {header:?}"));

    let descr = value_after(header, "'descr'")
        .and_then(|rest| {
            let rest = rest.strip_prefix('\'')?;
            rest.split('\'').next()
        })
        .ok_or_else(|| invalid("missing descr"))?
        .to_string();

    let fortran_order = value_after(header, "'fortran_order'")
        .map(|rest| rest.starts_with("True"))
        .ok_or_else(|| invalid("missing fortran_order"))?;

    let shape_str = value_after(header, "'shape'")
        .and_then(|rest| {
            let rest = rest.strip_prefix('(')?;
            rest.split(')').next()
        })
        .ok_or_else(|| invalid("missing shape"))?;
    let shape = shape_str
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<usize>().map_err(|_| invalid("bad shape")))
        .collect::<Result<Vec<_>>>()?;

    Ok(NpyHeader {
        descr,
        fortran_order,
        shape,
    })
}

/// Text following `key:` with leading whitespace removed.
fn value_after<'a>(header: &'a str, key: &str) -> Option<&'a str> {
    let at = header.find(key)? + key.len();
    let rest = header[at..].trim_start().strip_prefix(':')?;
    Some(rest.trim_start())
}

fn decode_samples(descr: &str, raw: &[u8], count: usize) -> Result<(SampleType, Vec<f64>)> {
    if descr.len() < 2 || !descr.is_ascii() {
        return Err(MergeError::InvalidNpy(format!("unsupported dtype {descr:?}")));
    }
    let (order, kind) = descr.split_at(1);
    match order {
        "<" | "|" | "=" => decode_with::<LittleEndian>(kind, raw, count),
        ">" => decode_with::<BigEndian>(kind, raw, count),
        _ => Err(MergeError::InvalidNpy(format!("unsupported dtype {descr:?}"))),
    }
}

fn decode_with<B: ByteOrder>(kind: &str, raw: &[u8], count: usize) -> Result<(SampleType, Vec<f64>)> {
    let (sample_type, width) = match kind {
        "u1" => (SampleType::U8, 1),
        "u2" => (SampleType::U16, 2),
        "u4" => (SampleType::U32, 4),
        "i2" => (SampleType::I16, 2),
        "i4" => (SampleType::I32, 4),
        "i8" => (SampleType::I64, 8),
        "f4" => (SampleType::F32, 4),
        "f8" => (SampleType::F64, 8),
        other => return Err(MergeError::InvalidNpy(format!("unsupported dtype {other:?}"))),
    };

    let expected = count
        .checked_mul(width)
        .ok_or_else(|| MergeError::InvalidNpy("shape overflows".into()))?;
    if raw.len() < expected {
        return Err(MergeError::InvalidNpy(format!(
            "truncated data: expected {expected} bytes, got {}",
            raw.len()
        )));
    }

    let values = raw[..expected]
        .chunks_exact(width)
        .map(|b| match sample_type {
            SampleType::U8 => b[0] as f64,
            SampleType::U16 => B::read_u16(b) as f64,
            SampleType::U32 => B::read_u32(b) as f64,
            SampleType::I16 => B::read_i16(b) as f64,
            SampleType::I32 => B::read_i32(b) as f64,
            SampleType::I64 => B::read_i64(b) as f64,
            SampleType::F32 => B::read_f32(b) as f64,
            SampleType::F64 => B::read_f64(b),
        })
        .collect();

    Ok((sample_type, values))
}
