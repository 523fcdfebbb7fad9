use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::constants::SIDECAR_SUFFIX;
use crate::shared::embedding::Embedding;
use crate::shared::face_observation::FaceObservation;
use crate::shared::frame::Frame;

const DEFAULT_DET_SCORE: f64 = 0.5;

#[derive(Error, Debug)]
pub enum DetectionLoadError {
    #[error("failed to read detections from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse detections in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// On-disk face record as written by an external detector.
#[derive(Debug, Deserialize)]
struct FaceJson {
    bbox: BoundingBox,
    embedding: Vec<f32>,
    #[serde(default)]
    landmarks: Option<Vec<(f64, f64)>>,
    #[serde(default = "default_det_score", alias = "detection_confidence")]
    det_score: f64,
}

fn default_det_score() -> f64 {
    DEFAULT_DET_SCORE
}

#[derive(Clone, Debug)]
enum Source {
    /// Faces keyed by full path or by file name.
    Manifest(Arc<HashMap<String, Vec<FaceObservation>>>),
    /// `<image>.faces.json` next to each image.
    Sidecar,
}

/// Replays face observations produced ahead of time by an external model.
///
/// Images without an entry have no faces. Faces whose embedding cannot be
/// normalized are dropped with a warning.
#[derive(Clone, Debug)]
pub struct JsonFaceDetector {
    source: Source,
}

impl JsonFaceDetector {
    /// Loads a manifest of the form `{"<file name or path>": [face, ...]}`.
    pub fn from_manifest(path: &Path) -> Result<Self, DetectionLoadError> {
        let text = fs::read_to_string(path).map_err(|source| DetectionLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: HashMap<String, Vec<FaceJson>> =
            serde_json::from_str(&text).map_err(|source| DetectionLoadError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let faces = raw
            .into_iter()
            .map(|(key, faces)| {
                let observations = to_observations(&key, faces);
                (key, observations)
            })
            .collect();
        Ok(Self {
            source: Source::Manifest(Arc::new(faces)),
        })
    }

    /// Reads `<image>.faces.json` beside each image on demand.
    pub fn sidecar() -> Self {
        Self {
            source: Source::Sidecar,
        }
    }

    pub fn sidecar_path(image: &Path) -> PathBuf {
        let mut name = OsString::from(image.as_os_str());
        name.push(".");
        name.push(SIDECAR_SUFFIX);
        PathBuf::from(name)
    }
}

impl FaceDetector for JsonFaceDetector {
    fn detect(
        &mut self,
        path: &Path,
        _image: &Frame,
    ) -> Result<Vec<FaceObservation>, Box<dyn std::error::Error>> {
        match &self.source {
            Source::Manifest(faces) => {
                let by_path = faces.get(path.to_string_lossy().as_ref());
                let by_name = path
                    .file_name()
                    .and_then(|name| faces.get(name.to_string_lossy().as_ref()));
                Ok(by_path.or(by_name).cloned().unwrap_or_default())
            }
            Source::Sidecar => {
                let sidecar = Self::sidecar_path(path);
                if !sidecar.exists() {
                    return Ok(Vec::new());
                }
                let text = fs::read_to_string(&sidecar).map_err(|source| {
                    DetectionLoadError::Read {
                        path: sidecar.clone(),
                        source,
                    }
                })?;
                let raw: Vec<FaceJson> =
                    serde_json::from_str(&text).map_err(|source| DetectionLoadError::Parse {
                        path: sidecar.clone(),
                        source,
                    })?;
                Ok(to_observations(&sidecar.to_string_lossy(), raw))
            }
        }
    }
}

fn to_observations(origin: &str, faces: Vec<FaceJson>) -> Vec<FaceObservation> {
    faces
        .into_iter()
        .enumerate()
        .filter_map(|(i, f)| match Embedding::new(f.embedding) {
            Ok(embedding) => Some(FaceObservation {
                bbox: f.bbox,
                embedding,
                landmarks: f.landmarks,
                detection_confidence: f.det_score,
            }),
            Err(e) => {
                log::warn!("Skipping face {i} in {origin}: {e}");
                None
            }
        })
        .collect()
}
