//! Colour icon fingerprint.
//!
//! An icon is the image averaged down to a tiny square grid and expressed
//! in YCbCr. Two icons are compared channel by channel with a sum of squared
//! differences, so the distance is large for unrelated pictures and zero for
//! pixel-identical ones. Resizing and re-compression move the distance only a
//! little, which is what the confidence buckets are tuned for.

use super::fast_resize::FastResizer;
use super::traits::{HashPrimitive, Icon, IconDistance};
use crate::error::HashError;
use image::DynamicImage;

/// Default icon side length in samples
pub const DEFAULT_ICON_SIDE: u32 = 11;

/// Fingerprints images as small YCbCr icons
#[derive(Debug, Clone)]
pub struct IconHasher {
    side: u32,
}

impl IconHasher {
    /// Create an icon hasher with the given side length
    pub fn new(side: u32) -> Self {
        Self { side }
    }
}

impl Default for IconHasher {
    fn default() -> Self {
        Self::new(DEFAULT_ICON_SIDE)
    }
}

/// Full-range BT.601 conversion, as used by JPEG
fn to_ycbcr(r: f32, g: f32, b: f32) -> [f32; 3] {
    let y = 0.299 * r + 0.587 * g + 0.114 * b;
    let cb = 128.0 - 0.168_736 * r - 0.331_264 * g + 0.5 * b;
    let cr = 128.0 + 0.5 * r - 0.418_688 * g - 0.081_312 * b;
    [y, cb, cr]
}

fn squared_difference(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = (*x - *y) as f64;
            d * d
        })
        .sum()
}

impl HashPrimitive for IconHasher {
    fn fingerprint(&self, image: &DynamicImage) -> Result<Icon, HashError> {
        let mut resizer = FastResizer::new();
        let small = resizer.resize_to_rgb(image, self.side, self.side)?;

        let capacity = (self.side * self.side) as usize;
        let mut planes = [
            Vec::with_capacity(capacity),
            Vec::with_capacity(capacity),
            Vec::with_capacity(capacity),
        ];

        for pixel in small.pixels() {
            let [r, g, b] = pixel.0;
            let ycc = to_ycbcr(r as f32, g as f32, b as f32);
            for (plane, value) in planes.iter_mut().zip(ycc) {
                plane.push(value);
            }
        }

        Icon::from_channels(self.side, planes)
    }

    fn distance(&self, a: &Icon, b: &Icon) -> IconDistance {
        if a.side() != b.side() {
            return IconDistance(f64::INFINITY, f64::INFINITY, f64::INFINITY);
        }
        IconDistance(
            squared_difference(a.channel(0), b.channel(0)),
            squared_difference(a.channel(1), b.channel(1)),
            squared_difference(a.channel(2), b.channel(2)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn gradient_image(width: u32, height: u32) -> DynamicImage {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([
                (x * 255 / width) as u8,
                (y * 255 / height) as u8,
                ((x + y) * 127 / (width + height)) as u8,
            ])
        });
        DynamicImage::ImageRgb8(img)
    }

    fn checker_image(width: u32, height: u32) -> DynamicImage {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            if (x / 16 + y / 16) % 2 == 0 {
                Rgb([250, 20, 20])
            } else {
                Rgb([10, 10, 240])
            }
        });
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn identical_images_have_zero_distance() {
        let hasher = IconHasher::default();
        let image = gradient_image(120, 80);

        let a = hasher.fingerprint(&image).unwrap();
        let b = hasher.fingerprint(&image).unwrap();

        assert_eq!(hasher.distance(&a, &b), IconDistance(0.0, 0.0, 0.0));
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let hasher = IconHasher::default();
        let image = checker_image(64, 64);

        assert_eq!(
            hasher.fingerprint(&image).unwrap(),
            hasher.fingerprint(&image).unwrap()
        );
    }

    #[test]
    fn resized_copy_is_close() {
        let hasher = IconHasher::default();
        let original = gradient_image(220, 220);
        let smaller = DynamicImage::ImageRgb8(original.to_rgb8()).resize_exact(
            110,
            110,
            image::imageops::FilterType::Triangle,
        );

        let a = hasher.fingerprint(&original).unwrap();
        let b = hasher.fingerprint(&smaller).unwrap();

        assert!(hasher.distance(&a, &b).mean() < 2000.0);
    }

    #[test]
    fn unrelated_images_are_far_apart() {
        let hasher = IconHasher::default();
        let a = hasher.fingerprint(&gradient_image(64, 64)).unwrap();
        let b = hasher.fingerprint(&checker_image(64, 64)).unwrap();

        assert!(hasher.distance(&a, &b).mean() > 14000.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let hasher = IconHasher::default();
        let a = hasher.fingerprint(&gradient_image(64, 64)).unwrap();
        let b = hasher.fingerprint(&checker_image(64, 64)).unwrap();

        assert_eq!(hasher.distance(&a, &b), hasher.distance(&b, &a));
    }

    #[test]
    fn grey_maps_to_neutral_chroma() {
        let [y, cb, cr] = to_ycbcr(128.0, 128.0, 128.0);
        assert!((y - 128.0).abs() < 0.01);
        assert!((cb - 128.0).abs() < 0.01);
        assert!((cr - 128.0).abs() < 0.01);
    }
}
