use std::path::Path;

use crate::shared::frame::Frame;

/// Decodes image files into RGB frames.
pub trait ImageReader: Send + Sync {
    fn read(&self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>>;

    /// Pixel dimensions without decoding the whole image where possible.
    fn dimensions(&self, path: &Path) -> Result<(u32, u32), Box<dyn std::error::Error>>;
}
