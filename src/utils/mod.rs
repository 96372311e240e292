//! Utility functions for image processing
//!
//! - Luma conversion of RGBA regions (plus inversion and downscaling)
//! - Memory pools (frame buffer reuse for live scanning)

pub mod grayscale;
pub mod memory_pool;
