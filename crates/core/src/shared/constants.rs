pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

/// Cosine-distance neighbourhood radius for density clustering.
pub const DEFAULT_EPS: f64 = 0.6;
pub const DEFAULT_MIN_SAMPLES: usize = 1;
/// Centroid similarity at or above which two clusters are merged.
pub const DEFAULT_MERGE_THRESHOLD: f64 = 0.7;
/// Pairwise similarity used by threshold clustering.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.6;

pub const DEFAULT_THUMBNAIL_SIZE: (u32, u32) = (150, 150);

pub const NOISE_LABEL: i32 = -1;

pub const GROUP_DIR_PREFIX: &str = "person_";
pub const NO_FACES_DIR: &str = "no_faces_found";
pub const THUMBNAIL_FILENAME: &str = "thumbnail.jpg";

/// Suffix appended to an image path to locate its detection sidecar.
pub const SIDECAR_SUFFIX: &str = "faces.json";
