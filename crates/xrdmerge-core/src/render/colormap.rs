use image::Rgb;
use serde::{Deserialize, Serialize};

/// ColorBrewer "Blues", light to dark.
const BLUES: [[u8; 3]; 9] = [
    [247, 251, 255],
    [222, 235, 247],
    [198, 219, 239],
    [158, 202, 225],
    [107, 174, 214],
    [66, 146, 198],
    [33, 113, 181],
    [8, 81, 156],
    [8, 48, 107],
];

/// Palette used to false-colour a frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Colormap {
    /// Reversed Blues: dark navy at the low limit, near-white at the high one.
    #[default]
    BluesR,
    Gray,
}

impl std::fmt::Display for Colormap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BluesR => write!(f, "Blues_r"),
            Self::Gray => write!(f, "Gray"),
        }
    }
}

impl Colormap {
    /// Colour for a normalized value; `t` is clamped to [0, 1], NaN maps to 0.
    pub fn map(&self, t: f64) -> Rgb<u8> {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Self::BluesR => interpolate(&BLUES, 1.0 - t),
            Self::Gray => {
                let v = (t * 255.0).round() as u8;
                Rgb([v, v, v])
            }
        }
    }
}

fn interpolate(anchors: &[[u8; 3]], t: f64) -> Rgb<u8> {
    let last = anchors.len() - 1;
    let pos = t * last as f64;
    let i = (pos.floor() as usize).min(last - 1);
    let frac = pos - i as f64;

    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
    let (a, b) = (anchors[i], anchors[i + 1]);
    Rgb([lerp(a[0], b[0]), lerp(a[1], b[1]), lerp(a[2], b[2])])
}
