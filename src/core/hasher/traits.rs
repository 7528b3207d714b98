//! Trait definitions for the fingerprint primitive.

use crate::error::HashError;
use image::DynamicImage;

/// Opaque perceptual summary of an image.
///
/// Icons are compared by distance, never by equality.
#[derive(Debug, Clone, PartialEq)]
pub struct Icon {
    side: u32,
    channels: [Vec<f32>; 3],
}

impl Icon {
    /// Build an icon from three equally sized channel planes
    pub fn from_channels(side: u32, channels: [Vec<f32>; 3]) -> Result<Self, HashError> {
        let expected = (side * side) as usize;
        if side == 0 || channels.iter().any(|c| c.len() != expected) {
            return Err(HashError::ComputationFailed(format!(
                "icon channels must each hold {} values",
                expected
            )));
        }
        Ok(Self { side, channels })
    }

    /// Width (and height) of the icon in samples
    pub fn side(&self) -> u32 {
        self.side
    }

    /// Channel plane `index` (0..3)
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }
}

/// Component distances between two icons, one per channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IconDistance(pub f64, pub f64, pub f64);

impl IconDistance {
    /// Arithmetic mean of the three components
    pub fn mean(&self) -> f64 {
        (self.0 + self.1 + self.2) / 3.0
    }
}

/// A pure, deterministic fingerprint function and its distance metric.
///
/// Implementations must return identical results for identical inputs on
/// every call; the matcher relies on this to make re-runs reproducible.
pub trait HashPrimitive: Send + Sync {
    /// Compute the fingerprint of a decoded image
    fn fingerprint(&self, image: &DynamicImage) -> Result<Icon, HashError>;

    /// Distance between two fingerprints produced by this primitive
    fn distance(&self, a: &Icon, b: &Icon) -> IconDistance;
}
