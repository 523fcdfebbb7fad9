use std::path::PathBuf;

use crate::shared::bounding_box::BoundingBox;
use crate::shared::embedding::Embedding;

/// One detected face as reported by the detector.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceObservation {
    pub bbox: BoundingBox,
    pub embedding: Embedding,
    /// Ordered landmark points; the first two are the left and right eye.
    pub landmarks: Option<Vec<(f64, f64)>>,
    pub detection_confidence: f64,
}

impl FaceObservation {
    pub fn new(bbox: BoundingBox, embedding: Embedding, detection_confidence: f64) -> Self {
        Self {
            bbox,
            embedding,
            landmarks: None,
            detection_confidence,
        }
    }

    pub fn with_landmarks(mut self, landmarks: Vec<(f64, f64)>) -> Self {
        self.landmarks = Some(landmarks);
        self
    }

    /// `(left_eye, right_eye)` when at least two landmarks are present.
    pub fn eyes(&self) -> Option<((f64, f64), (f64, f64))> {
        match self.landmarks.as_deref() {
            Some([left, right, ..]) => Some((*left, *right)),
            _ => None,
        }
    }
}

/// A face paired with the image it was found in.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceRecord {
    pub image: PathBuf,
    pub face: FaceObservation,
}

impl FaceRecord {
    pub fn new(image: impl Into<PathBuf>, face: FaceObservation) -> Self {
        Self {
            image: image.into(),
            face,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face() -> FaceObservation {
        FaceObservation::new(
            BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            Embedding::new(vec![1.0, 0.0]).unwrap(),
            0.9,
        )
    }

    #[test]
    fn test_eyes_require_two_landmarks() {
        assert!(face().eyes().is_none());
        assert!(face().with_landmarks(vec![(1.0, 2.0)]).eyes().is_none());
        let f = face().with_landmarks(vec![(1.0, 2.0), (5.0, 2.0), (3.0, 4.0)]);
        assert_eq!(f.eyes(), Some(((1.0, 2.0), (5.0, 2.0))));
    }

    #[test]
    fn test_record_keeps_source_path() {
        let r = FaceRecord::new("/photos/a.jpg", face());
        assert_eq!(r.image, PathBuf::from("/photos/a.jpg"));
    }
}
