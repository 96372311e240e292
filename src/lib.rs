//! cccd_qr - QR decoding core for Vietnamese citizen ID cards (CCCD)
//!
//! Finds and decodes the QR code printed on a CCCD card, either from still
//! photos or from a live frame stream, and turns the payload into labelled
//! identity fields.
//!
//! * Still images run a fixed chain of region scans (full frame, top-right,
//!   center, top-left) and stop at the first payload. See [`StaticDecoder`].
//! * Live streams scan a centered square of each frame and de-duplicate
//!   repeats with a cooldown. See [`live::LiveSession`].
//! * Payloads go to a [`fields::FieldExtractor`], usually on a background
//!   [`fields::ExtractionWorker`].
//!
//! The QR matrix decode itself is delegated to a [`MatrixDecoder`]; the
//! default is [`RqrrDecoder`].

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Environment-driven settings
pub mod config;
/// Region scanning over a pluggable matrix decoder
pub mod decoder;
/// Error types
pub mod error;
/// CCCD field extraction
pub mod fields;
/// Live frame decoding
pub mod live;
/// Core data structures (regions, fields)
pub mod models;
/// Still-image fallback chain
pub mod pipeline;
/// File and dataset helpers
pub mod tools;
/// Pixel conversion and buffer reuse
pub mod utils;

use std::path::Path;

use image::RgbaImage;

pub use config::{LiveConfig, ScanConfig};
pub use decoder::{MatrixDecoder, RegionScanner, RqrrDecoder};
pub use error::{CaptureError, DecodeError, ExtractError, ScanError};
pub use models::{Field, Polarity, ScanRegion, ScannedRecord};
pub use pipeline::{FileOutcome, StaticDecode, StaticDecoder, Strategy};

/// Decode the QR on a still image with default settings
pub fn decode_image(image: &RgbaImage) -> Result<StaticDecode, DecodeError> {
    StaticDecoder::new().decode(image)
}

/// Load an image file and decode its QR with default settings
pub fn decode_file<P: AsRef<Path>>(path: P) -> Result<StaticDecode, DecodeError> {
    StaticDecoder::new().decode_file(path)
}
