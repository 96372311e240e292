//! Still-image decoding: an ordered chain of region scans over one photo.
//!
//! Large photos often defeat a full-frame scan because the code ends up below
//! the decoder's resolvable module size. Cropping to where an ID-card QR
//! usually sits restores effective resolution, so the chain walks regions in
//! decreasing likelihood and stops at the first payload.

use std::path::{Path, PathBuf};

use image::RgbaImage;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ScanConfig;
use crate::decoder::{MatrixDecoder, RegionScanner, RqrrDecoder};
use crate::error::{DecodeError, ScanError};
use crate::models::{Polarity, ScanRegion};

/// One step of the still-image fallback chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Whole image
    FullFrame,
    /// x in [50%, 100%], y in [0%, 50%]; where the CCCD layout puts its QR
    TopRight,
    /// Central 60% x 60%; close-up, centered photos
    Center,
    /// x, y in [0%, 50%]; mirrored or rotated captures
    TopLeft,
}

impl Strategy {
    /// Attempt order
    pub const ORDER: [Strategy; 4] = [
        Strategy::FullFrame,
        Strategy::TopRight,
        Strategy::Center,
        Strategy::TopLeft,
    ];

    /// Region for a `width x height` image, clamped to its bounds
    pub fn region(&self, width: u32, height: u32) -> ScanRegion {
        match self {
            Strategy::FullFrame => ScanRegion::full(width, height),
            Strategy::TopRight => ScanRegion::from_fractions(width, height, 0.5, 0.0, 1.0, 0.5),
            Strategy::Center => ScanRegion::from_fractions(width, height, 0.2, 0.2, 0.8, 0.8),
            Strategy::TopLeft => ScanRegion::from_fractions(width, height, 0.0, 0.0, 0.5, 0.5),
        }
    }

    /// Short name for logs and CLI output
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::FullFrame => "full-frame",
            Strategy::TopRight => "top-right",
            Strategy::Center => "center",
            Strategy::TopLeft => "top-left",
        }
    }
}

/// Successful still-image decode
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaticDecode {
    /// Decoded payload
    pub payload: String,
    /// Chain step that produced it
    pub strategy: Strategy,
    /// Number of region attempts made, including the successful one
    pub attempts: usize,
}

/// Result for one file of a batch
#[derive(Debug)]
pub struct FileOutcome {
    /// Input path
    pub path: PathBuf,
    /// Decode result for that path
    pub result: Result<StaticDecode, DecodeError>,
}

/// Still-image decoder running the fixed region chain
#[derive(Debug, Clone, Default)]
pub struct StaticDecoder<D = RqrrDecoder> {
    scanner: RegionScanner<D>,
}

impl StaticDecoder<RqrrDecoder> {
    /// Decoder backed by `rqrr` with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoder backed by `rqrr` with explicit settings
    pub fn with_config(config: ScanConfig) -> Self {
        Self::with_scanner(RegionScanner::with_config(config))
    }
}

impl<D: MatrixDecoder> StaticDecoder<D> {
    /// Decoder over an existing region scanner
    pub fn with_scanner(scanner: RegionScanner<D>) -> Self {
        Self { scanner }
    }

    /// The region scanner used for every attempt
    pub fn scanner(&self) -> &RegionScanner<D> {
        &self.scanner
    }

    /// Ordered `(strategy, region)` pairs for a `width x height` image
    pub fn plan(width: u32, height: u32) -> Vec<(Strategy, ScanRegion)> {
        Strategy::ORDER
            .iter()
            .map(|s| (*s, s.region(width, height)))
            .collect()
    }

    /// Run the chain over one image
    pub fn decode(&self, image: &RgbaImage) -> Result<StaticDecode, DecodeError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(ScanError::EmptyImage { width, height }.into());
        }

        let mut scratch = Vec::new();
        let mut attempts = 0;
        for (strategy, region) in Self::plan(width, height) {
            attempts += 1;
            match self.scanner.scan_raw(
                image.as_raw(),
                width,
                height,
                region,
                Polarity::Both,
                &mut scratch,
            ) {
                Ok(Some(payload)) => {
                    info!(strategy = strategy.name(), attempts, "QR found");
                    return Ok(StaticDecode {
                        payload,
                        strategy,
                        attempts,
                    });
                }
                Ok(None) => debug!(strategy = strategy.name(), %region, "attempt found nothing"),
                Err(err) => debug!(strategy = strategy.name(), %err, "attempt skipped"),
            }
        }

        Err(DecodeError::NotFound { attempts })
    }

    /// Load an image file and run the chain over it
    pub fn decode_file<P: AsRef<Path>>(&self, path: P) -> Result<StaticDecode, DecodeError> {
        let path = path.as_ref();
        let image = image::open(path)
            .map_err(|source| DecodeError::Load {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgba8();
        debug!(path = %path.display(), width = image.width(), height = image.height(), "image loaded");
        self.decode(&image)
    }

    /// Decode many files in parallel.
    ///
    /// Returns one outcome per input, in input order. A failing file never
    /// stops the others.
    pub fn decode_batch<P: AsRef<Path> + Sync>(&self, paths: &[P]) -> Vec<FileOutcome> {
        paths
            .par_iter()
            .map(|p| {
                let path = p.as_ref().to_path_buf();
                let result = self.decode_file(&path);
                if let Err(err) = &result {
                    warn!(path = %path.display(), %err, "skipping file");
                }
                FileOutcome { path, result }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::sync::Mutex;

    /// Succeeds only on buffers no wider than `max_width` that contain some,
    /// but not mostly, dark pixels. Stands in for a decoder that loses small
    /// codes in large buffers.
    struct NarrowDecoder {
        max_width: usize,
        seen: Mutex<Vec<(usize, usize)>>,
    }

    impl NarrowDecoder {
        fn new(max_width: usize) -> Self {
            Self {
                max_width,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl MatrixDecoder for NarrowDecoder {
        fn decode(&self, luma: &[u8], width: usize, height: usize) -> Option<String> {
            self.seen.lock().unwrap().push((width, height));
            let dark = luma.iter().filter(|&&v| v < 128).count();
            let ratio = dark as f64 / luma.len() as f64;
            (width <= self.max_width && ratio > 0.0 && ratio < 0.5).then(|| "payload".to_string())
        }
    }

    fn card_with_block(w: u32, h: u32, bx: u32, by: u32, size: u32) -> RgbaImage {
        let mut img = RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255]));
        for y in by..by + size {
            for x in bx..bx + size {
                img.put_pixel(x, y, Rgba([0, 0, 0, 255]));
            }
        }
        img
    }

    fn decoder(max_width: usize) -> StaticDecoder<NarrowDecoder> {
        StaticDecoder::with_scanner(RegionScanner::with_decoder(
            NarrowDecoder::new(max_width),
            ScanConfig::default(),
        ))
    }

    #[test]
    fn test_plan_order_and_regions() {
        let plan = StaticDecoder::<RqrrDecoder>::plan(4000, 3000);
        let strategies: Vec<_> = plan.iter().map(|(s, _)| *s).collect();
        assert_eq!(strategies, Strategy::ORDER.to_vec());
        assert_eq!(plan[0].1, ScanRegion::new(0, 0, 4000, 3000));
        assert_eq!(plan[1].1, ScanRegion::new(2000, 0, 2000, 1500));
        assert_eq!(plan[2].1, ScanRegion::new(800, 600, 2400, 1800));
        assert_eq!(plan[3].1, ScanRegion::new(0, 0, 2000, 1500));
    }

    #[test]
    fn test_full_frame_wins_when_it_can() {
        let dec = decoder(usize::MAX);
        let img = card_with_block(400, 300, 250, 20, 60);
        let out = dec.decode(&img).unwrap();
        assert_eq!(out.strategy, Strategy::FullFrame);
        assert_eq!(out.attempts, 1);
    }

    #[test]
    fn test_falls_back_to_top_right() {
        let dec = decoder(250);
        let img = card_with_block(400, 300, 250, 20, 60);
        let out = dec.decode(&img).unwrap();
        assert_eq!(out.payload, "payload");
        assert_eq!(out.strategy, Strategy::TopRight);
        assert_eq!(out.attempts, 2);

        // full frame normal + inverted, then top-right normal
        let seen = dec.scanner().decoder().seen.lock().unwrap();
        assert_eq!(*seen, vec![(400, 300), (400, 300), (200, 150)]);
    }

    #[test]
    fn test_center_then_top_left() {
        let dec = decoder(250);
        // inside the center crop only
        let img = card_with_block(400, 300, 180, 160, 30);
        assert_eq!(dec.decode(&img).unwrap().strategy, Strategy::Center);

        // top-left quadrant, outside the center crop
        let img = card_with_block(400, 300, 10, 10, 40);
        let out = dec.decode(&img).unwrap();
        assert_eq!(out.strategy, Strategy::TopLeft);
        assert_eq!(out.attempts, 4);
    }

    #[test]
    fn test_exhausted_chain_is_not_found() {
        let dec = decoder(usize::MAX);
        let img = RgbaImage::from_pixel(64, 48, Rgba([255, 255, 255, 255]));
        let err = dec.decode(&img).unwrap_err();
        assert!(matches!(err, DecodeError::NotFound { attempts: 4 }));
        assert!(err.to_string().contains("Không tìm thấy mã QR"));
    }

    #[test]
    fn test_one_pixel_image_degrades_to_not_found() {
        let dec = decoder(usize::MAX);
        let img = RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 255]));
        assert!(matches!(dec.decode(&img), Err(DecodeError::NotFound { attempts: 4 })));
    }

    #[test]
    fn test_empty_image_is_a_scan_error() {
        let dec = decoder(usize::MAX);
        let img = RgbaImage::new(0, 0);
        assert!(matches!(
            dec.decode(&img),
            Err(DecodeError::Scan(ScanError::EmptyImage { .. }))
        ));
    }

    #[test]
    fn test_missing_file_is_a_load_error() {
        let dec = decoder(usize::MAX);
        let err = dec.decode_file("does/not/exist.png").unwrap_err();
        assert!(matches!(err, DecodeError::Load { .. }));
    }

    #[test]
    fn test_decode_serializes_for_json_output() {
        let decoded = StaticDecode {
            payload: "ABC123".to_string(),
            strategy: Strategy::TopRight,
            attempts: 2,
        };
        assert_eq!(
            serde_json::to_value(&decoded).unwrap(),
            serde_json::json!({"payload": "ABC123", "strategy": "top_right", "attempts": 2})
        );
    }
}
