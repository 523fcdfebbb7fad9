//! Per-face quality scoring used to rank thumbnail candidates.
//!
//! Each metric is normalized to `[0, 1]` and combined with configurable
//! [`QualityWeights`]. Metric failures surface as [`ScoringError`]; callers
//! that need a plain number use [`QualityScorer::score_or_default`].

use std::f64::consts::PI;

use ndarray::Array2;
use thiserror::Error;

use crate::quality::domain::quality_weights::QualityWeights;
use crate::shared::bounding_box::{BoundingBox, CropError};
use crate::shared::face_observation::FaceObservation;
use crate::shared::frame::Frame;

/// Laplacian variance mapped to a sharpness of 1.0.
const SHARPNESS_REFERENCE: f64 = 100.0;
/// Intensity standard deviation mapped to a contrast of 1.0.
const CONTRAST_REFERENCE: f64 = 64.0;
/// Face area (px²) mapped to an area score of 1.0.
const AREA_REFERENCE: f64 = 10_000.0;
const MID_GRAY: f64 = 128.0;
/// Eye-line tilt at which pose quality bottoms out.
const MAX_EYE_ANGLE: f64 = PI / 6.0;
const MIN_POSE_QUALITY: f64 = 0.1;
const NEUTRAL_CENTEREDNESS: f64 = 0.5;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("source image is empty")]
    EmptyImage,
    #[error("face crop is empty: {0}")]
    EmptyCrop(#[from] CropError),
}

/// Individual metric values and their weighted total.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityBreakdown {
    pub centeredness: f64,
    pub sharpness: f64,
    pub brightness: f64,
    pub contrast: f64,
    pub pose: f64,
    pub confidence: f64,
    pub area: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Default)]
pub struct QualityScorer {
    weights: QualityWeights,
}

impl QualityScorer {
    pub fn new(weights: QualityWeights) -> Self {
        Self { weights }
    }

    pub fn score(
        &self,
        face: &FaceObservation,
        image: &Frame,
    ) -> Result<QualityBreakdown, ScoringError> {
        if image.is_empty() {
            return Err(ScoringError::EmptyImage);
        }
        let rect = face.bbox.to_pixel_rect(image.width(), image.height())?;
        let gray = image.crop(&rect).to_grayscale();
        let (mean, std) = mean_and_std(&gray);

        let centeredness = centeredness(&face.bbox, image.width(), image.height());
        let sharpness = (laplacian_variance(&gray) / SHARPNESS_REFERENCE).min(1.0);
        let brightness = 1.0 - (mean - MID_GRAY).abs() / MID_GRAY;
        let contrast = (std / CONTRAST_REFERENCE).min(1.0);
        let pose = pose_quality(face);
        let confidence = if face.detection_confidence.is_finite() {
            face.detection_confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let area = (face.bbox.area() / AREA_REFERENCE).min(1.0);

        let w = &self.weights;
        let total = centeredness * w.centeredness
            + sharpness * w.sharpness
            + pose * w.pose
            + confidence * w.confidence
            + area * w.area
            + contrast * w.contrast
            + brightness * w.brightness;

        Ok(QualityBreakdown {
            centeredness,
            sharpness,
            brightness,
            contrast,
            pose,
            confidence,
            area,
            total,
        })
    }

    /// Total score, or `0.0` when any metric cannot be computed.
    pub fn score_or_default(&self, face: &FaceObservation, image: &Frame) -> f64 {
        match self.score(face, image) {
            Ok(breakdown) => breakdown.total,
            Err(e) => {
                log::debug!("Quality scoring fell back to 0: {e}");
                0.0
            }
        }
    }
}

/// 1.0 when the face center sits on the image center, falling linearly to
/// 0.0 at a corner.
pub fn centeredness(bbox: &BoundingBox, width: u32, height: u32) -> f64 {
    let (fx, fy) = bbox.center();
    let cx = width as f64 / 2.0;
    let cy = height as f64 / 2.0;
    let max_distance = cx.hypot(cy);
    if max_distance <= 0.0 {
        return NEUTRAL_CENTEREDNESS;
    }
    let distance = (fx - cx).hypot(fy - cy);
    (1.0 - distance / max_distance).clamp(0.0, 1.0)
}

/// Variance of the 4-neighbour Laplacian with reflect-101 borders.
pub fn laplacian_variance(gray: &Array2<f64>) -> f64 {
    let (h, w) = gray.dim();
    if h == 0 || w == 0 {
        return 0.0;
    }
    let at = |y: isize, x: isize| gray[[reflect_101(y, h), reflect_101(x, w)]];
    let response = Array2::from_shape_fn((h, w), |(y, x)| {
        let (y, x) = (y as isize, x as isize);
        at(y - 1, x) + at(y + 1, x) + at(y, x - 1) + at(y, x + 1) - 4.0 * at(y, x)
    });
    response.var(0.0)
}

/// Population mean and standard deviation of the intensities.
pub fn mean_and_std(gray: &Array2<f64>) -> (f64, f64) {
    match gray.mean() {
        Some(mean) => (mean, gray.std(0.0)),
        None => (0.0, 0.0),
    }
}

/// Penalizes a tilted eye line; faces without landmarks score 1.0.
pub fn pose_quality(face: &FaceObservation) -> f64 {
    let Some((left, right)) = face.eyes() else {
        return 1.0;
    };
    let angle = (right.1 - left.1).atan2(right.0 - left.0).abs();
    if !angle.is_finite() {
        return MIN_POSE_QUALITY;
    }
    (1.0 - angle / MAX_EYE_ANGLE).max(MIN_POSE_QUALITY)
}

fn reflect_101(i: isize, n: usize) -> usize {
    let n = n as isize;
    if n == 1 {
        return 0;
    }
    let mut i = i;
    if i < 0 {
        i = -i;
    }
    if i >= n {
        i = 2 * n - 2 - i;
    }
    i.clamp(0, n - 1) as usize
}
