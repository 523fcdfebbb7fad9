use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CropError {
    #[error("bounding box is not finite")]
    NonFinite,
    #[error("degenerate crop ({x1},{y1},{x2},{y2}) after clamping")]
    Degenerate { x1: i64, y1: i64, x2: i64, y2: i64 },
}

/// Face bounding box in source-image pixel coordinates, `[x1, y1, x2, y2]`.
///
/// Coordinates come straight from the detector and may fall outside the
/// image; clamping happens when converting to a [`PixelRect`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Integer corners, truncated toward zero.
    pub fn truncated(&self) -> (i64, i64, i64, i64) {
        (
            self.x1 as i64,
            self.y1 as i64,
            self.x2 as i64,
            self.y2 as i64,
        )
    }

    /// Center of the truncated box.
    pub fn center(&self) -> (f64, f64) {
        let (x1, y1, x2, y2) = self.truncated();
        ((x1 + x2) as f64 / 2.0, (y1 + y2) as f64 / 2.0)
    }

    /// Pixel area of the truncated box; zero when inverted.
    pub fn area(&self) -> f64 {
        let (x1, y1, x2, y2) = self.truncated();
        ((x2 - x1).max(0) * (y2 - y1).max(0)) as f64
    }

    /// Truncates, clamps to `[0, width] x [0, height]` and rejects empty
    /// results.
    pub fn to_pixel_rect(&self, width: u32, height: u32) -> Result<PixelRect, CropError> {
        if ![self.x1, self.y1, self.x2, self.y2]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(CropError::NonFinite);
        }
        let (x1, y1, x2, y2) = self.truncated();
        let w = width as i64;
        let h = height as i64;
        let x1 = x1.clamp(0, w);
        let y1 = y1.clamp(0, h);
        let x2 = x2.clamp(0, w);
        let y2 = y2.clamp(0, h);
        if x2 <= x1 || y2 <= y1 {
            return Err(CropError::Degenerate { x1, y1, x2, y2 });
        }
        Ok(PixelRect {
            x1: x1 as u32,
            y1: y1 as u32,
            x2: x2 as u32,
            y2: y2 as u32,
        })
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// Non-empty rectangle guaranteed to lie within some image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl PixelRect {
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }
}
