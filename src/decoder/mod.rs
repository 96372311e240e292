//! QR decoding primitives
//!
//! This module wraps the matrix decode algorithm for the scanners above it:
//! - Luma extraction of a clamped sub-region
//! - Optional downscaling of oversized regions
//! - Normal / inverted polarity attempts

/// Matrix decode algorithm seam and its `rqrr` backend
pub mod matrix;
/// Region-scan primitive shared by the still-image and live decoders
pub mod region_scan;

pub use matrix::{MatrixDecoder, RqrrDecoder};
pub use region_scan::RegionScanner;
