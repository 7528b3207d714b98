//! # Hasher Module
//!
//! Decodes images and computes their perceptual fingerprints.
//!
//! ## How It Works
//! 1. Read the file (retrying transient open failures a bounded number of times)
//! 2. Decode into pixels (zune-jpeg for JPEG, image crate for PNG, platform tool for HEIC)
//! 3. Average the picture down to an 11x11 icon in YCbCr
//! 4. Compare icons channel by channel with a sum of squared differences
//!
//! ## Performance Optimizations
//! - Uses `zune-jpeg` for 1.5-2x faster JPEG decoding
//! - Uses `fast_image_resize` for 5-14x faster SIMD-accelerated resizing
//!
//! ## Example
//! ```rust,ignore
//! use dupe_pairs::core::hasher::{HashPrimitive, IconHasher, ImageDecoder};
//!
//! let image = ImageDecoder::default().decode(&path)?;
//! let hasher = IconHasher::default();
//! let icon = hasher.fingerprint(&image)?;
//! let mean = hasher.distance(&icon, &other_icon).mean();
//! ```

pub mod fast_decode;
pub mod fast_resize;
mod icon;
mod retry;
mod traits;

pub use fast_decode::ImageDecoder;
pub use icon::{IconHasher, DEFAULT_ICON_SIDE};
pub use retry::RetryPolicy;
pub use traits::{HashPrimitive, Icon, IconDistance};
