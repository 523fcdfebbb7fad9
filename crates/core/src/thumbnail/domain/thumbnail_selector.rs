use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::imaging::domain::image_reader::ImageReader;
use crate::quality::domain::quality_scorer::QualityScorer;
use crate::shared::bounding_box::CropError;
use crate::shared::constants::DEFAULT_THUMBNAIL_SIZE;
use crate::shared::face_observation::{FaceObservation, FaceRecord};
use crate::shared::frame::Frame;

use super::placeholder::placeholder;

/// How a thumbnail was obtained, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailTier {
    /// Highest-scoring face crop in the group.
    Quality,
    /// First usable face crop, ignoring quality.
    Fallback,
    /// Synthesized marker image; no member could be cropped.
    Placeholder,
}

#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub frame: Frame,
    pub tier: ThumbnailTier,
    /// Image the crop came from; `None` for placeholders.
    pub source: Option<PathBuf>,
}

/// Picks a representative face crop for a group, always producing a frame
/// of exactly the configured size.
pub struct ThumbnailSelector {
    scorer: QualityScorer,
    size: (u32, u32),
}

impl ThumbnailSelector {
    pub fn new(scorer: QualityScorer, size: (u32, u32)) -> Self {
        Self { scorer, size }
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn select(&self, members: &[FaceRecord], reader: &dyn ImageReader) -> Thumbnail {
        let images = load_images(members, reader);

        if let Some(thumbnail) = self.best_quality(members, &images) {
            return thumbnail;
        }
        if !members.is_empty() {
            log::warn!("Quality-based thumbnail selection failed, trying fallback");
        }
        if let Some(thumbnail) = self.first_usable(members, &images) {
            return thumbnail;
        }
        log::warn!(
            "No usable face crop, creating {}x{} placeholder",
            self.size.0,
            self.size.1
        );
        Thumbnail {
            frame: placeholder(self.size.0, self.size.1),
            tier: ThumbnailTier::Placeholder,
            source: None,
        }
    }

    fn best_quality(
        &self,
        members: &[FaceRecord],
        images: &HashMap<&Path, Option<Frame>>,
    ) -> Option<Thumbnail> {
        let mut best: Option<(f64, &FaceRecord, &Frame)> = None;
        for record in members {
            let Some(image) = image_for(images, record) else {
                continue;
            };
            if let Err(e) = record.face.bbox.to_pixel_rect(image.width(), image.height()) {
                log::debug!("Skipping face in {}: {e}", record.image.display());
                continue;
            }
            let score = self.scorer.score_or_default(&record.face, image);
            log::debug!("Face in {} scored {score:.3}", record.image.display());
            if !score.is_finite() {
                continue;
            }
            if best.map_or(true, |(best_score, _, _)| score > best_score) {
                best = Some((score, record, image));
            }
        }

        let (score, record, image) = best?;
        let frame = self.crop(&record.face, image).ok()?;
        log::info!(
            "Created quality-based thumbnail ({}x{}) from {} (score: {score:.3})",
            self.size.0,
            self.size.1,
            display_name(&record.image)
        );
        Some(Thumbnail {
            frame,
            tier: ThumbnailTier::Quality,
            source: Some(record.image.clone()),
        })
    }

    fn first_usable(
        &self,
        members: &[FaceRecord],
        images: &HashMap<&Path, Option<Frame>>,
    ) -> Option<Thumbnail> {
        members.iter().find_map(|record| {
            let image = image_for(images, record)?;
            match self.crop(&record.face, image) {
                Ok(frame) => {
                    log::info!(
                        "Created fallback thumbnail from {}",
                        display_name(&record.image)
                    );
                    Some(Thumbnail {
                        frame,
                        tier: ThumbnailTier::Fallback,
                        source: Some(record.image.clone()),
                    })
                }
                Err(e) => {
                    log::warn!("Cannot crop face in {}: {e}", record.image.display());
                    None
                }
            }
        })
    }

    /// Bounding box truncated and clamped to the image, then resized to the
    /// target size without keeping the aspect ratio.
    fn crop(&self, face: &FaceObservation, image: &Frame) -> Result<Frame, CropError> {
        let rect = face.bbox.to_pixel_rect(image.width(), image.height())?;
        Ok(image.crop(&rect).resized(self.size.0, self.size.1))
    }
}

impl Default for ThumbnailSelector {
    fn default() -> Self {
        Self::new(QualityScorer::default(), DEFAULT_THUMBNAIL_SIZE)
    }
}

/// Decodes each distinct member image once; unreadable images map to `None`.
fn load_images<'a>(
    members: &'a [FaceRecord],
    reader: &dyn ImageReader,
) -> HashMap<&'a Path, Option<Frame>> {
    let mut images = HashMap::new();
    for record in members {
        images
            .entry(record.image.as_path())
            .or_insert_with(|| match reader.read(&record.image) {
                Ok(frame) if !frame.is_empty() => Some(frame),
                Ok(_) => {
                    log::warn!("Image {} is empty", record.image.display());
                    None
                }
                Err(e) => {
                    log::warn!("Failed to read {}: {e}", record.image.display());
                    None
                }
            });
    }
    images
}

fn image_for<'m>(
    images: &'m HashMap<&Path, Option<Frame>>,
    record: &FaceRecord,
) -> Option<&'m Frame> {
    images.get(record.image.as_path()).and_then(Option::as_ref)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::domain::quality_weights::QualityWeights;
    use crate::shared::bounding_box::BoundingBox;
    use crate::shared::embedding::Embedding;
    use rstest::rstest;
    use std::sync::Mutex;

    struct StubReader {
        images: HashMap<PathBuf, Frame>,
        reads: Mutex<Vec<PathBuf>>,
    }

    impl StubReader {
        fn new(images: Vec<(&str, Frame)>) -> Self {
            Self {
                images: images
                    .into_iter()
                    .map(|(p, f)| (PathBuf::from(p), f))
                    .collect(),
                reads: Mutex::new(Vec::new()),
            }
        }
    }

    impl ImageReader for StubReader {
        fn read(&self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
            self.reads.lock().unwrap().push(path.to_path_buf());
            self.images
                .get(path)
                .cloned()
                .ok_or_else(|| format!("cannot read {}", path.display()).into())
        }

        fn dimensions(&self, path: &Path) -> Result<(u32, u32), Box<dyn std::error::Error>> {
            Ok(self.read(path)?.dimensions())
        }
    }

    fn record(image: &str, bbox: [f64; 4]) -> FaceRecord {
        let face = FaceObservation::new(
            BoundingBox::from(bbox),
            Embedding::new(vec![1.0, 0.0]).unwrap(),
            0.9,
        );
        FaceRecord::new(image, face)
    }

    fn image() -> Frame {
        Frame::filled(200, 200, [90, 120, 150])
    }

    #[rstest]
    #[case((150, 150))]
    #[case((64, 48))]
    #[case((30, 200))]
    fn test_quality_tier_has_exact_size(#[case] size: (u32, u32)) {
        let reader = StubReader::new(vec![("a.jpg", image())]);
        let selector = ThumbnailSelector::new(QualityScorer::default(), size);
        let thumb = selector.select(&[record("a.jpg", [80.0, 80.0, 120.0, 130.0])], &reader);
        assert_eq!(thumb.tier, ThumbnailTier::Quality);
        assert_eq!(thumb.frame.dimensions(), size);
    }

    #[test]
    fn test_prefers_centered_larger_face() {
        let reader = StubReader::new(vec![("corner.jpg", image()), ("center.jpg", image())]);
        let members = vec![
            record("corner.jpg", [0.0, 0.0, 20.0, 20.0]),
            record("center.jpg", [70.0, 70.0, 130.0, 130.0]),
        ];
        let thumb = ThumbnailSelector::default().select(&members, &reader);
        assert_eq!(thumb.tier, ThumbnailTier::Quality);
        assert_eq!(thumb.source, Some(PathBuf::from("center.jpg")));
    }

    #[test]
    fn test_first_wins_on_equal_scores() {
        let reader = StubReader::new(vec![("a.jpg", image()), ("b.jpg", image())]);
        let members = vec![
            record("a.jpg", [50.0, 50.0, 150.0, 150.0]),
            record("b.jpg", [50.0, 50.0, 150.0, 150.0]),
        ];
        let thumb = ThumbnailSelector::default().select(&members, &reader);
        assert_eq!(thumb.source, Some(PathBuf::from("a.jpg")));
    }

    #[test]
    fn test_zero_scores_still_pick_quality_tier() {
        let weights = QualityWeights {
            centeredness: 0.0,
            sharpness: 0.0,
            brightness: 0.0,
            contrast: 0.0,
            pose: 0.0,
            confidence: 0.0,
            area: 0.0,
        };
        let selector = ThumbnailSelector::new(QualityScorer::new(weights), (150, 150));
        let reader = StubReader::new(vec![("a.jpg", image()), ("b.jpg", image())]);
        let members = vec![
            record("a.jpg", [0.0, 0.0, 20.0, 20.0]),
            record("b.jpg", [70.0, 70.0, 130.0, 130.0]),
        ];
        let thumb = selector.select(&members, &reader);
        assert_eq!(thumb.tier, ThumbnailTier::Quality);
        assert_eq!(thumb.source, Some(PathBuf::from("a.jpg")));
    }

    #[test]
    fn test_degenerate_face_does_not_block_quality_tier() {
        let reader = StubReader::new(vec![("a.jpg", image()), ("b.jpg", image())]);
        let members = vec![
            record("a.jpg", [40.0, 40.0, 40.0, 90.0]),
            record("b.jpg", [0.0, 0.0, 20.0, 20.0]),
        ];
        let thumb = ThumbnailSelector::default().select(&members, &reader);
        assert_eq!(thumb.tier, ThumbnailTier::Quality);
        assert_eq!(thumb.source, Some(PathBuf::from("b.jpg")));
    }

    #[test]
    fn test_unreadable_images_are_skipped() {
        let reader = StubReader::new(vec![("ok.jpg", image())]);
        let members = vec![
            record("missing.jpg", [70.0, 70.0, 130.0, 130.0]),
            record("ok.jpg", [0.0, 0.0, 20.0, 20.0]),
        ];
        let thumb = ThumbnailSelector::default().select(&members, &reader);
        assert_eq!(thumb.source, Some(PathBuf::from("ok.jpg")));
    }

    #[test]
    fn test_each_image_read_once() {
        let reader = StubReader::new(vec![("group.jpg", image())]);
        let members = vec![
            record("group.jpg", [0.0, 0.0, 50.0, 50.0]),
            record("group.jpg", [100.0, 100.0, 150.0, 150.0]),
        ];
        ThumbnailSelector::default().select(&members, &reader);
        assert_eq!(reader.reads.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_fallback_when_scores_are_unusable() {
        let weights = QualityWeights {
            centeredness: f64::NAN,
            ..QualityWeights::default()
        };
        let selector = ThumbnailSelector::new(QualityScorer::new(weights), (150, 150));
        let reader = StubReader::new(vec![("a.jpg", image()), ("b.jpg", image())]);
        let members = vec![
            record("a.jpg", [300.0, 300.0, 400.0, 400.0]),
            record("b.jpg", [10.0, 10.0, 60.0, 60.0]),
        ];
        let thumb = selector.select(&members, &reader);
        assert_eq!(thumb.tier, ThumbnailTier::Fallback);
        assert_eq!(thumb.source, Some(PathBuf::from("b.jpg")));
        assert_eq!(thumb.frame.dimensions(), (150, 150));
    }

    #[rstest]
    #[case((150, 150))]
    #[case((64, 48))]
    fn test_placeholder_when_no_image_readable(#[case] size: (u32, u32)) {
        let reader = StubReader::new(vec![]);
        let selector = ThumbnailSelector::new(QualityScorer::default(), size);
        let thumb = selector.select(&[record("gone.jpg", [0.0, 0.0, 10.0, 10.0])], &reader);
        assert_eq!(thumb.tier, ThumbnailTier::Placeholder);
        assert_eq!(thumb.source, None);
        assert_eq!(thumb.frame.dimensions(), size);
    }

    #[test]
    fn test_placeholder_when_every_crop_is_degenerate() {
        let reader = StubReader::new(vec![("a.jpg", image())]);
        let members = vec![
            record("a.jpg", [250.0, 250.0, 300.0, 300.0]),
            record("a.jpg", [40.0, 40.0, 40.0, 90.0]),
        ];
        let thumb = ThumbnailSelector::default().select(&members, &reader);
        assert_eq!(thumb.tier, ThumbnailTier::Placeholder);
        assert_eq!(thumb.frame.dimensions(), DEFAULT_THUMBNAIL_SIZE);
    }

    #[test]
    fn test_empty_group_gets_placeholder() {
        let thumb = ThumbnailSelector::default().select(&[], &StubReader::new(vec![]));
        assert_eq!(thumb.tier, ThumbnailTier::Placeholder);
    }
}
