//! Luma extraction for region scans
//! Y = 0.299*R + 0.587*G + 0.114*B
//! Uses fast integer arithmetic: Y = (76*R + 150*G + 29*B) >> 8
//!
//! Input is always interleaved RGBA (alpha ignored), the layout handed over
//! by canvas-style frame grabs and by `image::RgbaImage`.

use image::imageops::{self, FilterType};
use image::GrayImage;
use rayon::prelude::*;

use crate::models::ScanRegion;

/// Coefficients for grayscale conversion: Y = (76*R + 150*G + 29*B) >> 8
const COEF_R: u32 = 76;
const COEF_G: u32 = 150;
const COEF_B: u32 = 29;

/// Regions with fewer rows than this are converted on the calling thread
const PARALLEL_MIN_ROWS: u32 = 256;

#[inline]
fn luma(px: &[u8]) -> u8 {
    let lum = (COEF_R * px[0] as u32 + COEF_G * px[1] as u32 + COEF_B * px[2] as u32) >> 8;
    lum.min(255) as u8
}

fn convert_row(src: &[u8], dst: &mut [u8]) {
    // 8x unrolled main loop, scalar tail
    let mut chunks_out = dst.chunks_exact_mut(8);
    let mut chunks_in = src.chunks_exact(32);
    for (out, px) in (&mut chunks_out).zip(&mut chunks_in) {
        out[0] = luma(&px[0..4]);
        out[1] = luma(&px[4..8]);
        out[2] = luma(&px[8..12]);
        out[3] = luma(&px[12..16]);
        out[4] = luma(&px[16..20]);
        out[5] = luma(&px[20..24]);
        out[6] = luma(&px[24..28]);
        out[7] = luma(&px[28..32]);
    }
    for (out, px) in chunks_out
        .into_remainder()
        .iter_mut()
        .zip(chunks_in.remainder().chunks_exact(4))
    {
        *out = luma(px);
    }
}

/// Convert a whole RGBA buffer to luma
pub fn rgba_to_luma(rgba: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut gray = vec![0u8; width * height];
    if width == 0 {
        return gray;
    }
    gray.par_chunks_mut(width)
        .zip(rgba.par_chunks(width * 4))
        .for_each(|(row_out, row_in)| convert_row(row_in, row_out));
    gray
}

/// Convert the pixels of `region` into `output` (resized to `width * height` of the region).
///
/// `rgba` is a row-major buffer `image_width` pixels wide. The region must
/// already be clamped to the buffer.
pub fn rgba_region_to_luma(rgba: &[u8], image_width: u32, region: ScanRegion, output: &mut Vec<u8>) {
    let (w, h) = (region.width as usize, region.height as usize);
    output.clear();
    output.resize(w * h, 0);
    if w == 0 || h == 0 {
        return;
    }

    let stride = image_width as usize * 4;
    let x0 = region.x as usize * 4;
    let y0 = region.y as usize;

    let row = |(i, out): (usize, &mut [u8])| {
        let start = (y0 + i) * stride + x0;
        convert_row(&rgba[start..start + w * 4], out);
    };

    if region.height >= PARALLEL_MIN_ROWS {
        output.par_chunks_mut(w).enumerate().for_each(row);
    } else {
        output.chunks_mut(w).enumerate().for_each(row);
    }
}

/// Flip dark and light in place
pub fn invert_in_place(gray: &mut [u8]) {
    for v in gray.iter_mut() {
        *v = 255 - *v;
    }
}

/// Shrink a luma buffer so its longer side is at most `max_dim`.
///
/// Returns `None` when the buffer already fits.
pub fn downscale_luma(
    gray: &[u8],
    width: u32,
    height: u32,
    max_dim: u32,
) -> Option<(Vec<u8>, u32, u32)> {
    let longer = width.max(height);
    if longer <= max_dim || max_dim == 0 {
        return None;
    }
    let scale = max_dim as f64 / longer as f64;
    let new_w = ((width as f64 * scale).round() as u32).max(1);
    let new_h = ((height as f64 * scale).round() as u32).max(1);
    let src = GrayImage::from_raw(width, height, gray.to_vec())?;
    let resized = imageops::resize(&src, new_w, new_h, FilterType::Triangle);
    Some((resized.into_raw(), new_w, new_h))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_rgba_to_luma() {
        // white, black, red, green
        let rgba = vec![
            255, 255, 255, 255, 0, 0, 0, 255, 255, 0, 0, 255, 0, 255, 0, 0,
        ];
        let gray = rgba_to_luma(&rgba, 2, 2);
        assert_eq!(gray.len(), 4);
        assert!(gray[0] >= 254);
        assert_eq!(gray[1], 0);
        assert!(gray[2] > 0 && gray[2] < 255);
        assert!(gray[3] > 100);
    }

    #[test]
    fn test_unrolled_and_tail_agree() {
        // 11 pixels wide exercises one unrolled chunk plus a 3-pixel tail
        let mut rgba = Vec::new();
        for i in 0..11u8 {
            rgba.extend_from_slice(&[i * 20, 255 - i * 20, i * 7, 255]);
        }
        let gray = rgba_to_luma(&rgba, 11, 1);
        for (i, px) in rgba.chunks_exact(4).enumerate() {
            assert_eq!(gray[i], luma(px));
        }
    }

    #[test]
    fn test_region_extraction_reads_only_the_region() {
        let mut img = RgbaImage::from_pixel(10, 8, Rgba([255, 255, 255, 255]));
        for y in 2..5 {
            for x in 6..9 {
                img.put_pixel(x, y, Rgba([0, 0, 0, 255]));
            }
        }
        let mut out = Vec::new();
        rgba_region_to_luma(img.as_raw(), img.width(), ScanRegion::new(6, 2, 3, 3), &mut out);
        assert_eq!(out, vec![0u8; 9]);

        rgba_region_to_luma(img.as_raw(), img.width(), ScanRegion::new(0, 0, 4, 2), &mut out);
        assert_eq!(out.len(), 8);
        assert!(out.iter().all(|&v| v >= 254));
    }

    #[test]
    fn test_invert() {
        let mut gray = vec![0, 10, 255];
        invert_in_place(&mut gray);
        assert_eq!(gray, vec![255, 245, 0]);
    }

    #[test]
    fn test_downscale_luma() {
        let gray = vec![128u8; 400 * 200];
        let (small, w, h) = downscale_luma(&gray, 400, 200, 100).expect("should shrink");
        assert_eq!((w, h), (100, 50));
        assert_eq!(small.len(), 100 * 50);
        assert!(downscale_luma(&gray, 400, 200, 400).is_none());
    }
}
