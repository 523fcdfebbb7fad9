use std::path::Path;

use crate::shared::face_observation::FaceObservation;
use crate::shared::frame::Frame;

/// Domain interface for face detection and embedding.
///
/// Implementations may hold model state, hence `&mut self`. An instance is
/// not assumed to be safe for concurrent use: parallel executors build one
/// per worker through a [`DetectorFactory`].
pub trait FaceDetector: Send {
    /// Returns every face found in `image`, possibly none.
    fn detect(
        &mut self,
        path: &Path,
        image: &Frame,
    ) -> Result<Vec<FaceObservation>, Box<dyn std::error::Error>>;
}

/// Builds detector instances; called once per worker.
pub type DetectorFactory = Box<
    dyn Fn() -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error + Send + Sync>>
        + Send
        + Sync,
>;
