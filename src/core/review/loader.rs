//! Image loading seam for the review cache.

use crate::core::hasher::ImageDecoder;
use crate::error::HashError;
use image::DynamicImage;
use std::path::Path;

/// Loads full images for display
pub trait ImageLoader: Send + Sync + 'static {
    fn load(&self, path: &Path) -> Result<DynamicImage, HashError>;
}

impl ImageLoader for ImageDecoder {
    fn load(&self, path: &Path) -> Result<DynamicImage, HashError> {
        self.decode(path)
    }
}
