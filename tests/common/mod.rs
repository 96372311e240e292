#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use image::{Rgba, RgbaImage};
use qrcode::{Color, QrCode};

pub const SAMPLE_CCCD: &str =
    "001099012345|123456789|Nguyễn Văn An|15081990|Nam|12 Lý Thường Kiệt, Hoàn Kiếm, Hà Nội|20042021";

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Render `payload` as a QR with a 4-module quiet zone
pub fn render_qr(payload: &str, module_px: u32) -> RgbaImage {
    let code = QrCode::new(payload.as_bytes()).expect("payload fits in a QR code");
    let modules = code.width() as u32;
    let colors = code.to_colors();
    let quiet = 4;
    let side = (modules + 2 * quiet) * module_px;

    let mut img = RgbaImage::from_pixel(side, side, WHITE);
    for (i, color) in colors.iter().enumerate() {
        if *color != Color::Dark {
            continue;
        }
        let mx = (i as u32 % modules + quiet) * module_px;
        let my = (i as u32 / modules + quiet) * module_px;
        for y in my..my + module_px {
            for x in mx..mx + module_px {
                img.put_pixel(x, y, BLACK);
            }
        }
    }
    img
}

/// Swap dark and light pixels
pub fn invert(img: &mut RgbaImage) {
    for px in img.pixels_mut() {
        px.0[0] = 255 - px.0[0];
        px.0[1] = 255 - px.0[1];
        px.0[2] = 255 - px.0[2];
    }
}

/// Light-grey `width x height` canvas with `qr` pasted at `(x, y)`
pub fn photo_with(width: u32, height: u32, qr: &RgbaImage, x: u32, y: u32) -> RgbaImage {
    let mut img = RgbaImage::from_pixel(width, height, Rgba([235, 235, 230, 255]));
    paste(&mut img, qr, x, y);
    img
}

pub fn paste(dst: &mut RgbaImage, src: &RgbaImage, x: u32, y: u32) {
    for (sx, sy, px) in src.enumerate_pixels() {
        let (dx, dy) = (x + sx, y + sy);
        if dx < dst.width() && dy < dst.height() {
            dst.put_pixel(dx, dy, *px);
        }
    }
}

pub fn blank(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, WHITE)
}

/// Fresh per-test scratch directory
pub fn temp_dir(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("cccd_it_{tag}_{}_{nanos}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn save(img: &RgbaImage, dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    img.save(&path).unwrap();
    path
}
