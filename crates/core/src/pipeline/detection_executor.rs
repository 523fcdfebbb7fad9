use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::detection::domain::face_detector::{DetectorFactory, FaceDetector};
use crate::imaging::domain::image_reader::ImageReader;
use crate::shared::face_observation::FaceObservation;

/// Result of running detection on one image.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionOutcome {
    Faces(Vec<FaceObservation>),
    NoFaces,
    /// Unreadable image, detector error or timeout.
    Failed(String),
}

/// Abstracts how detection runs over a batch of images.
///
/// Implementations return exactly one outcome per input image, in input
/// order. Only detector construction failures abort the batch.
pub trait DetectionExecutor: Send {
    fn execute(
        &self,
        images: &[PathBuf],
        reader: Arc<dyn ImageReader>,
        factory: &DetectorFactory,
        on_progress: Option<&(dyn Fn(f64) + Send)>,
    ) -> Result<Vec<DetectionOutcome>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Reads one image and runs the detector on it, folding every failure into
/// [`DetectionOutcome::Failed`].
pub fn detect_image(
    path: &Path,
    reader: &dyn ImageReader,
    detector: &mut dyn FaceDetector,
) -> DetectionOutcome {
    let image = match reader.read(path) {
        Ok(image) => image,
        Err(e) => {
            log::warn!("Failed to read {}: {e}", path.display());
            return DetectionOutcome::Failed(e.to_string());
        }
    };
    match detector.detect(path, &image) {
        Ok(faces) if faces.is_empty() => DetectionOutcome::NoFaces,
        Ok(faces) => {
            log::debug!("{}: {} face(s)", path.display(), faces.len());
            DetectionOutcome::Faces(faces)
        }
        Err(e) => {
            log::warn!("Face detection failed for {}: {e}", path.display());
            DetectionOutcome::Failed(e.to_string())
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_detect_image_outcomes() {
        let f = factory(vec![("one.jpg", vec![face(vec![1.0, 0.0])])]);
        let mut detector = f().unwrap();
        let reader = StubReader;

        assert!(matches!(
            detect_image(Path::new("/in/one.jpg"), &reader, detector.as_mut()),
            DetectionOutcome::Faces(ref v) if v.len() == 1
        ));
        assert_eq!(
            detect_image(Path::new("/in/none.jpg"), &reader, detector.as_mut()),
            DetectionOutcome::NoFaces
        );
        assert!(matches!(
            detect_image(Path::new("/in/missing.jpg"), &reader, detector.as_mut()),
            DetectionOutcome::Failed(_)
        ));
        assert!(matches!(
            detect_image(Path::new("/in/broken.jpg"), &reader, detector.as_mut()),
            DetectionOutcome::Failed(ref msg) if msg == "model exploded"
        ));
    }
}
