use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::clustering::domain::cluster::distinct_labels;
use crate::clustering::infrastructure::clusterer_factory::create_clusterer;
use crate::detection::domain::face_detector::DetectorFactory;
use crate::imaging::domain::image_reader::ImageReader;
use crate::imaging::domain::image_writer::ImageWriter;
use crate::pipeline::detection_executor::{DetectionExecutor, DetectionOutcome};
use crate::pipeline::group_organizer::{Group, GroupOrganizer};
use crate::quality::domain::quality_scorer::QualityScorer;
use crate::shared::embedding::Embedding;
use crate::shared::face_observation::{FaceObservation, FaceRecord};
use crate::shared::grouping_config::{ConfigError, GroupingConfig};
use crate::thumbnail::domain::thumbnail_selector::ThumbnailSelector;

#[derive(Error, Debug)]
pub enum GroupingError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("failed to create face detector: {0}")]
    Detector(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Result of a batch run.
#[derive(Debug, Clone)]
pub struct GroupingReport {
    pub groups: Vec<Group>,
    /// Images with zero faces or failed detection, in input order.
    pub no_face_images: Vec<PathBuf>,
}

impl GroupingReport {
    pub fn face_count(&self) -> usize {
        self.groups.iter().map(|g| g.members.len()).sum()
    }
}

/// Detects faces in a batch of images, clusters them by identity and writes
/// one folder per person.
pub struct GroupPhotosUseCase {
    config: GroupingConfig,
    detector_factory: DetectorFactory,
    reader: Arc<dyn ImageReader>,
    executor: Box<dyn DetectionExecutor>,
    organizer: GroupOrganizer,
    on_progress: Option<Box<dyn Fn(f64) + Send>>,
}

impl GroupPhotosUseCase {
    pub fn new(
        config: GroupingConfig,
        detector_factory: DetectorFactory,
        reader: Arc<dyn ImageReader>,
        writer: Box<dyn ImageWriter>,
        executor: Box<dyn DetectionExecutor>,
        on_progress: Option<Box<dyn Fn(f64) + Send>>,
    ) -> Self {
        let selector = ThumbnailSelector::new(
            QualityScorer::new(config.quality.clone()),
            config.thumbnail_size,
        );
        let organizer = GroupOrganizer::new(selector, Arc::clone(&reader), writer);
        Self {
            config,
            detector_factory,
            reader,
            executor,
            organizer,
            on_progress,
        }
    }

    pub fn execute(
        &self,
        images: &[PathBuf],
        output_dir: &Path,
    ) -> Result<GroupingReport, GroupingError> {
        self.config.validate()?;

        let outcomes = self
            .executor
            .execute(
                images,
                Arc::clone(&self.reader),
                &self.detector_factory,
                self.on_progress.as_deref(),
            )
            .map_err(GroupingError::Detector)?;

        let (records, no_face_images) = collect_faces(images, outcomes);
        log::info!(
            "Found {} faces in {} images ({} without faces)",
            records.len(),
            images.len(),
            no_face_images.len()
        );

        let embeddings: Vec<Embedding> = records.iter().map(|r| r.face.embedding.clone()).collect();
        let labels = if embeddings.is_empty() {
            Vec::new()
        } else {
            create_clusterer(&self.config.clustering).cluster(&embeddings)
        };
        log::info!("Clustering produced {} groups", distinct_labels(&labels));

        let groups = self
            .organizer
            .organize(&records, &labels, &no_face_images, output_dir);

        Ok(GroupingReport {
            groups,
            no_face_images,
        })
    }
}

/// Flattens detection outcomes into face records and no-face images.
///
/// The first face seen fixes the embedding dimension; faces with another
/// dimension are dropped, and an image left without faces counts as a
/// no-face image.
fn collect_faces(
    images: &[PathBuf],
    outcomes: Vec<DetectionOutcome>,
) -> (Vec<FaceRecord>, Vec<PathBuf>) {
    let mut records = Vec::new();
    let mut no_face_images = Vec::new();
    let mut dim: Option<usize> = None;

    for (image, outcome) in images.iter().zip(outcomes) {
        let faces: Vec<FaceObservation> = match outcome {
            DetectionOutcome::Faces(faces) => faces,
            DetectionOutcome::NoFaces => Vec::new(),
            DetectionOutcome::Failed(reason) => {
                log::warn!("Treating {} as faceless: {reason}", image.display());
                Vec::new()
            }
        };

        let before = records.len();
        for face in faces {
            let d = *dim.get_or_insert(face.embedding.dim());
            if face.embedding.dim() != d {
                log::warn!(
                    "Dropping face in {}: embedding dimension {} != {d}",
                    image.display(),
                    face.embedding.dim()
                );
                continue;
            }
            records.push(FaceRecord::new(image.clone(), face));
        }
        if records.len() == before {
            no_face_images.push(image.clone());
        }
    }
    (records, no_face_images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::infrastructure::image_file_reader::ImageFileReader;
    use crate::imaging::infrastructure::image_file_writer::ImageFileWriter;
    use crate::pipeline::detection_executor::test_support::{face, factory, failing_factory};
    use crate::pipeline::infrastructure::sequential_detection_executor::SequentialDetectionExecutor;
    use crate::pipeline::infrastructure::threaded_detection_executor::ThreadedDetectionExecutor;
    use crate::shared::constants::NO_FACES_DIR;
    use std::sync::Mutex;

    fn write_images(dir: &Path, names: &[&str]) -> Vec<PathBuf> {
        names
            .iter()
            .map(|name| {
                let path = dir.join(name);
                image::RgbImage::from_pixel(100, 100, image::Rgb([120, 110, 100]))
                    .save(&path)
                    .unwrap();
                path
            })
            .collect()
    }

    fn use_case(config: GroupingConfig, factory: DetectorFactory) -> GroupPhotosUseCase {
        GroupPhotosUseCase::new(
            config,
            factory,
            Arc::new(ImageFileReader::new()),
            Box::new(ImageFileWriter::new()),
            Box::new(SequentialDetectionExecutor::new()),
            None,
        )
    }

    #[test]
    fn test_groups_people_and_collects_faceless_images() {
        let input = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let images = write_images(input.path(), &["a.png", "b.png", "c.png", "d.png"]);
        let f = factory(vec![
            ("a.png", vec![face(vec![1.0, 0.0])]),
            ("b.png", vec![face(vec![0.99, 0.05])]),
            ("c.png", vec![face(vec![0.0, 1.0])]),
        ]);

        let report = use_case(GroupingConfig::default(), f)
            .execute(&images, out.path())
            .unwrap();

        assert_eq!(report.groups.len(), 2);
        assert_eq!(report.groups[0].members.len(), 2);
        assert_eq!(report.groups[1].members[0].image, images[2]);
        assert_eq!(report.no_face_images, vec![images[3].clone()]);
        assert_eq!(report.face_count(), 3);
        assert!(out.path().join("person_1").join("0_a.png").exists());
        assert!(out.path().join("person_1").join("1_b.png").exists());
        assert!(out.path().join("person_2").join("thumbnail.jpg").exists());
        assert!(out.path().join(NO_FACES_DIR).join("0_d.png").exists());
    }

    #[test]
    fn test_unreadable_image_is_faceless_and_batch_continues() {
        let input = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let mut images = write_images(input.path(), &["a.png"]);
        let broken = input.path().join("broken.png");
        std::fs::write(&broken, b"garbage").unwrap();
        images.push(broken.clone());
        let f = factory(vec![
            ("a.png", vec![face(vec![1.0, 0.0])]),
            ("broken.png", vec![face(vec![1.0, 0.0])]),
        ]);

        let report = use_case(GroupingConfig::default(), f)
            .execute(&images, out.path())
            .unwrap();

        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.no_face_images, vec![broken]);
        assert!(out.path().join(NO_FACES_DIR).join("0_broken.png").exists());
    }

    #[test]
    fn test_mismatched_embedding_dimension_dropped() {
        let input = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let images = write_images(input.path(), &["a.png", "b.png"]);
        let f = factory(vec![
            ("a.png", vec![face(vec![1.0, 0.0])]),
            ("b.png", vec![face(vec![1.0, 0.0, 0.0])]),
        ]);

        let report = use_case(GroupingConfig::default(), f)
            .execute(&images, out.path())
            .unwrap();

        assert_eq!(report.face_count(), 1);
        assert_eq!(report.no_face_images, vec![images[1].clone()]);
    }

    #[test]
    fn test_invalid_config_fails_before_any_output() {
        let root = tempfile::tempdir().unwrap();
        let out = root.path().join("out");
        let mut config = GroupingConfig::default();
        config.clustering.eps = 0.0;

        let result = use_case(config, factory(vec![])).execute(&[], &out);

        assert!(matches!(result, Err(GroupingError::InvalidConfig(_))));
        assert!(!out.exists());
    }

    #[test]
    fn test_detector_construction_failure_is_fatal() {
        let input = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let images = write_images(input.path(), &["a.png"]);

        let result = use_case(GroupingConfig::default(), failing_factory()).execute(&images, out.path());

        assert!(matches!(result, Err(GroupingError::Detector(_))));
    }

    #[test]
    fn test_empty_batch_creates_nothing() {
        let root = tempfile::tempdir().unwrap();
        let out = root.path().join("out");
        let report = use_case(GroupingConfig::default(), factory(vec![]))
            .execute(&[], &out)
            .unwrap();
        assert!(report.groups.is_empty());
        assert!(!out.exists());
    }

    #[test]
    fn test_threaded_run_reports_progress() {
        let input = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let images = write_images(input.path(), &["a.png", "b.png", "c.png"]);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);

        let use_case = GroupPhotosUseCase::new(
            GroupingConfig::default(),
            factory(vec![("b.png", vec![face(vec![1.0, 0.0])])]),
            Arc::new(ImageFileReader::new()),
            Box::new(ImageFileWriter::new()),
            Box::new(ThreadedDetectionExecutor::new(2, None)),
            Some(Box::new(move |p: f64| seen_clone.lock().unwrap().push(p))),
        );
        let report = use_case.execute(&images, out.path()).unwrap();

        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.no_face_images.len(), 2);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(*seen.last().unwrap(), 1.0);
    }
}
