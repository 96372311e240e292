//! Error types for scanning, still-image decoding, capture and field extraction

use std::path::PathBuf;

use thiserror::Error;

use crate::models::ScanRegion;

/// Hard failures of a single region scan.
///
/// A region with no QR code in it is not an error; these only cover input
/// the scanner cannot read at all.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// The source buffer has no pixels
    #[error("image buffer is empty ({width}x{height})")]
    EmptyImage {
        /// Buffer width
        width: u32,
        /// Buffer height
        height: u32,
    },
    /// The requested region covers no pixels once clamped to the buffer
    #[error("scan region {region} is empty inside a {width}x{height} buffer")]
    EmptyRegion {
        /// Region as requested
        region: ScanRegion,
        /// Buffer width
        width: u32,
        /// Buffer height
        height: u32,
    },
    /// Raw sample buffer is shorter than width x height x 4
    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSize {
        /// Expected byte count
        expected: usize,
        /// Actual byte count
        actual: usize,
    },
}

/// Failure of the still-image decoder
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Every region in the fallback chain was tried without a result
    #[error("Không tìm thấy mã QR. Vui lòng thử ảnh rõ nét hơn hoặc cắt sát vào mã QR. (no QR code found after {attempts} attempts; retake a clearer or closer photo)")]
    NotFound {
        /// Number of region attempts made
        attempts: usize,
    },
    /// The file could not be read or decoded as an image
    #[error("Lỗi tải ảnh {path}: {source}")]
    Load {
        /// Offending file
        path: PathBuf,
        /// Underlying image error
        #[source]
        source: image::ImageError,
    },
    /// The image itself is unreadable (zero-sized)
    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// Failure to acquire or drive a frame source
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Access to the device was refused
    #[error("Không thể truy cập camera. Vui lòng cấp quyền và thử lại. ({0})")]
    PermissionDenied(String),
    /// The device cannot satisfy the requested constraints
    #[error("camera constraints not supported: {0}")]
    Unsupported(String),
    /// No device or frame directory available
    #[error("camera not found: {0}")]
    NotFound(String),
    /// Reading a frame failed
    #[error("frame read failed: {0}")]
    Frame(String),
    /// Frame file failed to load
    #[error("failed to load frame {path}: {source}")]
    Image {
        /// Offending file
        path: PathBuf,
        /// Underlying image error
        #[source]
        source: image::ImageError,
    },
    /// A session was used after it was closed
    #[error("live session is closed")]
    Closed,
}

/// Failure of a field extractor
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The payload was empty
    #[error("payload is empty")]
    Empty,
    /// The extractor's backend failed
    #[error("extractor backend failed: {0}")]
    Backend(String),
}
