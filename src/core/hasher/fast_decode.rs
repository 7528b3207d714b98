//! Fast image decoding with format-specific optimizations.
//!
//! Uses zune-jpeg for JPEG files (1.5-2x faster than image crate),
//! falls back to image crate for other formats. HEIC files are converted
//! to JPEG by the platform tool first.

use super::retry::RetryPolicy;
use crate::core::scanner::ImageFormat;
use crate::error::HashError;
use image::{DynamicImage, ImageBuffer, Luma, Rgb, Rgba};
use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder;

/// Decodes image files into pixel data
#[derive(Debug, Clone, Default)]
pub struct ImageDecoder {
    retry: RetryPolicy,
}

impl ImageDecoder {
    /// Create a decoder with the given file-open retry policy
    pub fn new(retry: RetryPolicy) -> Self {
        Self { retry }
    }

    /// Decode an image from a file path using the fastest available decoder.
    ///
    /// - JPEG: zune-jpeg, falling back to the image crate
    /// - HEIC: converted by `sips` (macOS) or `heif-convert` (elsewhere)
    /// - PNG and others: image crate
    pub fn decode(&self, path: &Path) -> Result<DynamicImage, HashError> {
        match ImageFormat::from_path(path) {
            ImageFormat::Heic => self.decode_heic(path),
            ImageFormat::Jpeg => {
                let bytes = self.read(path)?;
                Self::decode_jpeg(path, &bytes).or_else(|_| Self::decode_memory(path, &bytes))
            }
            _ => {
                let bytes = self.read(path)?;
                Self::decode_memory(path, &bytes)
            }
        }
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, HashError> {
        let bytes = self
            .retry
            .run(|| fs::read(path))
            .map_err(|(source, attempts)| HashError::IoError {
                path: path.to_path_buf(),
                attempts,
                source,
            })?;

        if bytes.is_empty() {
            return Err(HashError::EmptyImage {
                path: path.to_path_buf(),
            });
        }
        Ok(bytes)
    }

    /// Fast JPEG decoding using zune-jpeg
    fn decode_jpeg(path: &Path, bytes: &[u8]) -> Result<DynamicImage, HashError> {
        let options = DecoderOptions::new_fast().jpeg_set_out_colorspace(ColorSpace::RGB);
        let mut decoder = JpegDecoder::new_with_options(bytes, options);

        let pixels = decoder.decode().map_err(|e| HashError::DecodeError {
            path: path.to_path_buf(),
            reason: format!("zune-jpeg decode failed: {:?}", e),
        })?;

        let info = decoder.info().ok_or_else(|| HashError::DecodeError {
            path: path.to_path_buf(),
            reason: "Failed to get image info".to_string(),
        })?;

        let width = info.width as u32;
        let height = info.height as u32;
        let buffer_error = || HashError::DecodeError {
            path: path.to_path_buf(),
            reason: "Decoded pixel buffer has the wrong size".to_string(),
        };

        let image = match decoder.get_output_colorspace().unwrap_or(ColorSpace::RGB) {
            ColorSpace::RGB => {
                let buffer: ImageBuffer<Rgb<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(width, height, pixels).ok_or_else(buffer_error)?;
                DynamicImage::ImageRgb8(buffer)
            }
            ColorSpace::RGBA => {
                let buffer: ImageBuffer<Rgba<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(width, height, pixels).ok_or_else(buffer_error)?;
                DynamicImage::ImageRgba8(buffer)
            }
            ColorSpace::Luma => {
                let buffer: ImageBuffer<Luma<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(width, height, pixels).ok_or_else(buffer_error)?;
                DynamicImage::ImageLuma8(buffer)
            }
            other => {
                return Err(HashError::DecodeError {
                    path: path.to_path_buf(),
                    reason: format!("unsupported JPEG colorspace {:?}", other),
                })
            }
        };

        Ok(image)
    }

    fn decode_memory(path: &Path, bytes: &[u8]) -> Result<DynamicImage, HashError> {
        image::load_from_memory(bytes).map_err(|e| HashError::DecodeError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// HEIC has no pure-Rust decoder in our stack, so the file is converted
    /// to a temporary JPEG with the platform's converter and decoded from there.
    fn decode_heic(&self, path: &Path) -> Result<DynamicImage, HashError> {
        if !path.exists() {
            return Err(HashError::IoError {
                path: path.to_path_buf(),
                attempts: 1,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
            });
        }

        // Only the path is kept, so no descriptor stays open on the temp file
        let converted = tempfile::Builder::new()
            .prefix("dupe_pairs_heic_")
            .suffix(".jpg")
            .tempfile()
            .map_err(|e| HashError::DecodeError {
                path: path.to_path_buf(),
                reason: format!("Failed to create temporary file: {}", e),
            })?
            .into_temp_path();

        // stderr is the only pipe held while the converter runs
        let output = heic_command(path, &converted)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .output()
            .map_err(|e| HashError::DecodeError {
                path: path.to_path_buf(),
                reason: format!("Failed to run {}: {}. {}", HEIC_TOOL, e, HEIC_HINT),
            })?;

        if !output.status.success() {
            return Err(HashError::DecodeError {
                path: path.to_path_buf(),
                reason: format!(
                    "{} conversion failed: {}",
                    HEIC_TOOL,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        let bytes = self.read(&converted)?;
        Self::decode_jpeg(path, &bytes).or_else(|_| Self::decode_memory(path, &bytes))
    }
}

#[cfg(target_os = "macos")]
const HEIC_TOOL: &str = "sips";
#[cfg(target_os = "macos")]
const HEIC_HINT: &str = "sips ships with macOS";

#[cfg(not(target_os = "macos"))]
const HEIC_TOOL: &str = "heif-convert";
#[cfg(not(target_os = "macos"))]
const HEIC_HINT: &str = "Install libheif (package libheif-examples) to read HEIC files";

#[cfg(target_os = "macos")]
fn heic_command(input: &Path, output: &Path) -> Command {
    let mut command = Command::new(HEIC_TOOL);
    command
        .args(["-s", "format", "jpeg"])
        .arg(input)
        .arg("--out")
        .arg(output);
    command
}

#[cfg(not(target_os = "macos"))]
fn heic_command(input: &Path, output: &Path) -> Command {
    let mut command = Command::new(HEIC_TOOL);
    command.args(["-q", "95"]).arg(input).arg(output);
    command
}
