use image::RgbaImage;
use tracing::debug;

use crate::config::ScanConfig;
use crate::decoder::matrix::{MatrixDecoder, RqrrDecoder};
use crate::error::ScanError;
use crate::models::{Polarity, ScanRegion};
use crate::utils::grayscale::{downscale_luma, invert_in_place, rgba_region_to_luma};

/// Scans one rectangle of an RGBA buffer for a QR code.
///
/// "No code here" is `Ok(None)`. Errors are reserved for buffers or regions
/// that contain no pixels at all.
#[derive(Debug, Clone, Default)]
pub struct RegionScanner<D = RqrrDecoder> {
    decoder: D,
    config: ScanConfig,
}

impl RegionScanner<RqrrDecoder> {
    /// Scanner backed by `rqrr` with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Scanner backed by `rqrr` with explicit settings
    pub fn with_config(config: ScanConfig) -> Self {
        Self::with_decoder(RqrrDecoder, config)
    }
}

impl<D: MatrixDecoder> RegionScanner<D> {
    /// Scanner with a custom matrix decoder
    pub fn with_decoder(decoder: D, config: ScanConfig) -> Self {
        Self { decoder, config }
    }

    /// Active settings
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// The underlying matrix decoder
    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// Scan `region` of `image`
    pub fn scan(
        &self,
        image: &RgbaImage,
        region: ScanRegion,
        polarity: Polarity,
    ) -> Result<Option<String>, ScanError> {
        let mut scratch = Vec::new();
        self.scan_raw(image.as_raw(), image.width(), image.height(), region, polarity, &mut scratch)
    }

    /// Scan `region` of a raw interleaved RGBA buffer, reusing `scratch` for luma data
    pub fn scan_raw(
        &self,
        rgba: &[u8],
        width: u32,
        height: u32,
        region: ScanRegion,
        polarity: Polarity,
        scratch: &mut Vec<u8>,
    ) -> Result<Option<String>, ScanError> {
        if width == 0 || height == 0 {
            return Err(ScanError::EmptyImage { width, height });
        }
        let expected = width as usize * height as usize * 4;
        if rgba.len() < expected {
            return Err(ScanError::BufferSize {
                expected,
                actual: rgba.len(),
            });
        }

        let clamped = region.clamp_to(width, height);
        if clamped.is_empty() {
            return Err(ScanError::EmptyRegion {
                region,
                width,
                height,
            });
        }

        rgba_region_to_luma(rgba, width, clamped, scratch);
        let (mut lw, mut lh) = (clamped.width, clamped.height);
        if let Some(max_dim) = self.config.max_scan_dimension {
            if let Some((small, sw, sh)) = downscale_luma(scratch, lw, lh, max_dim) {
                *scratch = small;
                (lw, lh) = (sw, sh);
            }
        }

        let (lw, lh) = (lw as usize, lh as usize);
        if let Some(payload) = self.decoder.decode(scratch, lw, lh) {
            debug!(region = %clamped, "QR decoded (normal polarity)");
            return Ok(Some(payload));
        }

        if polarity.tries_inverted() {
            invert_in_place(scratch);
            if let Some(payload) = self.decoder.decode(scratch, lw, lh) {
                debug!(region = %clamped, "QR decoded (inverted polarity)");
                return Ok(Some(payload));
            }
        }

        debug!(region = %clamped, ?polarity, "no QR in region");
        Ok(None)
    }
}
