use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::clustering::domain::cluster::{partition, Cluster};
use crate::imaging::domain::image_reader::ImageReader;
use crate::imaging::domain::image_writer::ImageWriter;
use crate::shared::constants::{GROUP_DIR_PREFIX, NO_FACES_DIR, THUMBNAIL_FILENAME};
use crate::shared::face_observation::FaceRecord;
use crate::thumbnail::domain::thumbnail_selector::{ThumbnailSelector, ThumbnailTier};

/// A persisted thumbnail and how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailOutcome {
    pub path: PathBuf,
    pub tier: ThumbnailTier,
    pub source: Option<PathBuf>,
    /// Whether the written file was read back at the configured size.
    pub verified: bool,
}

/// One output folder: the faces of one person.
#[derive(Debug, Clone)]
pub struct Group {
    /// 1-based; ascends as member count descends.
    pub ordinal: usize,
    pub label: i32,
    pub members: Vec<FaceRecord>,
    pub directory: PathBuf,
    /// `None` when the thumbnail could not be written.
    pub thumbnail: Option<ThumbnailOutcome>,
}

/// Lays groups out on disk: one `person_<n>` directory per group with copies
/// of the member images and a thumbnail, plus `no_faces_found` for images
/// without faces.
///
/// File system failures are logged and skipped; organizing never aborts.
pub struct GroupOrganizer {
    selector: ThumbnailSelector,
    reader: Arc<dyn ImageReader>,
    writer: Box<dyn ImageWriter>,
}

impl GroupOrganizer {
    pub fn new(
        selector: ThumbnailSelector,
        reader: Arc<dyn ImageReader>,
        writer: Box<dyn ImageWriter>,
    ) -> Self {
        Self {
            selector,
            reader,
            writer,
        }
    }

    pub fn organize(
        &self,
        records: &[FaceRecord],
        labels: &[i32],
        no_face_images: &[PathBuf],
        output_dir: &Path,
    ) -> Vec<Group> {
        if records.len() != labels.len() {
            log::warn!(
                "{} faces but {} labels; ignoring the excess",
                records.len(),
                labels.len()
            );
        }
        let n = records.len().min(labels.len());

        let groups: Vec<Group> = order_groups(&labels[..n])
            .into_iter()
            .enumerate()
            .map(|(i, cluster)| {
                let ordinal = i + 1;
                let members: Vec<FaceRecord> =
                    cluster.members.iter().map(|&m| records[m].clone()).collect();
                let directory = output_dir.join(format!("{GROUP_DIR_PREFIX}{ordinal}"));
                let thumbnail = self.write_group(&members, &directory);
                Group {
                    ordinal,
                    label: cluster.label,
                    members,
                    directory,
                    thumbnail,
                }
            })
            .collect();

        if !no_face_images.is_empty() {
            let dir = output_dir.join(NO_FACES_DIR);
            if ensure_dir(&dir) {
                for (i, image) in no_face_images.iter().enumerate() {
                    copy_indexed(image, &dir, i);
                }
            }
            log::info!(
                "Copied {} images without faces to {}",
                no_face_images.len(),
                dir.display()
            );
        }

        log::info!("Organized {} faces into {} groups", n, groups.len());
        groups
    }

    fn write_group(&self, members: &[FaceRecord], directory: &Path) -> Option<ThumbnailOutcome> {
        if ensure_dir(directory) {
            for (j, record) in members.iter().enumerate() {
                copy_indexed(&record.image, directory, j);
            }
        }

        let thumbnail = self.selector.select(members, self.reader.as_ref());
        let path = directory.join(THUMBNAIL_FILENAME);
        if let Err(e) = self.writer.write(&path, &thumbnail.frame) {
            log::error!("Failed to save thumbnail {}: {e}", path.display());
            return None;
        }

        let expected = self.selector.size();
        let verified = match self.reader.dimensions(&path) {
            Ok(actual) if actual == expected => true,
            Ok((w, h)) => {
                log::warn!(
                    "Thumbnail {} is {w}x{h}, expected {}x{}",
                    path.display(),
                    expected.0,
                    expected.1
                );
                false
            }
            Err(e) => {
                log::error!("Cannot read back thumbnail {}: {e}", path.display());
                false
            }
        };

        Some(ThumbnailOutcome {
            path,
            tier: thumbnail.tier,
            source: thumbnail.source,
            verified,
        })
    }
}

/// Partitions labels in order of first discovery, then stable-sorts by
/// descending size. Noise points form one group like any other label.
pub fn order_groups(labels: &[i32]) -> Vec<Cluster> {
    let mut clusters = partition(labels);
    clusters.sort_by(|a, b| b.len().cmp(&a.len()));
    clusters
}

fn ensure_dir(dir: &Path) -> bool {
    match fs::create_dir_all(dir) {
        Ok(()) => true,
        Err(e) => {
            log::error!("Failed to create {}: {e}", dir.display());
            false
        }
    }
}

/// Copies `src` into `dir` as `<index>_<file name>`.
fn copy_indexed(src: &Path, dir: &Path, index: usize) {
    let Some(name) = src.file_name() else {
        log::warn!("Skipping {}: no file name", src.display());
        return;
    };
    let dst = dir.join(format!("{index}_{}", name.to_string_lossy()));
    if let Err(e) = fs::copy(src, &dst) {
        log::warn!("Failed to copy image {}: {e}", src.display());
    }
}
