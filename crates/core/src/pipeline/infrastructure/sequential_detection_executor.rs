use std::path::PathBuf;
use std::sync::Arc;

use crate::detection::domain::face_detector::DetectorFactory;
use crate::imaging::domain::image_reader::ImageReader;
use crate::pipeline::detection_executor::{detect_image, DetectionExecutor, DetectionOutcome};

/// Runs detection on the calling thread with a single detector instance.
pub struct SequentialDetectionExecutor;

impl SequentialDetectionExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SequentialDetectionExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectionExecutor for SequentialDetectionExecutor {
    fn execute(
        &self,
        images: &[PathBuf],
        reader: Arc<dyn ImageReader>,
        factory: &DetectorFactory,
        on_progress: Option<&(dyn Fn(f64) + Send)>,
    ) -> Result<Vec<DetectionOutcome>, Box<dyn std::error::Error + Send + Sync>> {
        if images.is_empty() {
            return Ok(Vec::new());
        }
        let mut detector = factory()?;
        let total = images.len();
        let mut outcomes = Vec::with_capacity(total);
        for (i, path) in images.iter().enumerate() {
            outcomes.push(detect_image(path, reader.as_ref(), detector.as_mut()));
            if let Some(cb) = on_progress {
                cb((i + 1) as f64 / total as f64);
            }
        }
        Ok(outcomes)
    }
}
