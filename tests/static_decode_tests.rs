mod common;

use std::fs;
use std::path::PathBuf;

use cccd_qr::fields::{FieldExtractor, LocalExtractor};
use cccd_qr::{
    DecodeError, MatrixDecoder, RegionScanner, RqrrDecoder, ScanConfig, StaticDecoder, Strategy,
};
use common::*;

/// rqrr, but blind to buffers wider than `max_width`, like a decoder whose
/// finder search gives up on a small code in a very large frame
struct LimitedResolution {
    max_width: usize,
}

impl MatrixDecoder for LimitedResolution {
    fn decode(&self, luma: &[u8], width: usize, height: usize) -> Option<String> {
        if width > self.max_width {
            return None;
        }
        RqrrDecoder.decode(luma, width, height)
    }
}

const SCENARIO: &str = "012345678901|123456789|NGUYEN VAN A|01011990|Nam|Ha Noi|01012020";

/// 4000x3000 photo with the card's QR in the top-right quadrant
fn scenario_photo() -> image::RgbaImage {
    let qr = render_qr(SCENARIO, 32);
    photo_with(4000, 3000, &qr, 2100, 50)
}

#[test]
fn decodes_qr_in_top_right_of_large_photo() {
    let decoded = StaticDecoder::new().decode(&scenario_photo()).expect("QR should be found");
    assert_eq!(decoded.payload, SCENARIO);
    assert!(matches!(decoded.strategy, Strategy::FullFrame | Strategy::TopRight));

    let fields = LocalExtractor.extract(&decoded.payload).unwrap();
    assert_eq!(fields[0].value, "012345678901");
    assert_eq!(fields[2].value, "NGUYEN VAN A");
    assert_eq!(fields[3].value, "01/01/1990");
}

#[test]
fn falls_back_to_top_right_when_full_frame_is_unresolvable() {
    let scanner = RegionScanner::with_decoder(LimitedResolution { max_width: 2500 }, ScanConfig::default());
    let decoded = StaticDecoder::with_scanner(scanner).decode(&scenario_photo()).unwrap();
    assert_eq!(decoded.strategy, Strategy::TopRight);
    assert_eq!(decoded.attempts, 2);
    assert_eq!(decoded.payload, SCENARIO);
}

#[test]
fn vietnamese_payload_survives_decoding() {
    let qr = render_qr(SAMPLE_CCCD, 8);
    let photo = photo_with(1600, 1200, &qr, 1100, 80);
    let decoded = StaticDecoder::new().decode(&photo).unwrap();
    assert_eq!(decoded.payload, SAMPLE_CCCD);
    let fields = LocalExtractor.extract(&decoded.payload).unwrap();
    assert_eq!(fields[2].value, "Nguyễn Văn An");
}

#[test]
fn small_photo_decodes_on_full_frame() {
    let qr = render_qr("ABC123", 6);
    let photo = photo_with(480, 360, &qr, 120, 60);
    let decoded = cccd_qr::decode_image(&photo).unwrap();
    assert_eq!(decoded.payload, "ABC123");
    assert_eq!(decoded.strategy, Strategy::FullFrame);
    assert_eq!(decoded.attempts, 1);
}

#[test]
fn inverted_qr_is_found() {
    let mut qr = render_qr("ABC123", 6);
    invert(&mut qr);
    let mut photo = blank(400, 400);
    invert(&mut photo);
    common::paste(&mut photo, &qr, 80, 80);

    let decoded = StaticDecoder::new().decode(&photo).unwrap();
    assert_eq!(decoded.payload, "ABC123");
}

#[test]
fn downscaling_keeps_large_codes_readable() {
    let qr = render_qr("ABC123", 20);
    let photo = photo_with(1600, 1200, &qr, 500, 300);
    let decoder = StaticDecoder::with_config(ScanConfig {
        max_scan_dimension: Some(800),
    });
    assert_eq!(decoder.decode(&photo).unwrap().payload, "ABC123");
}

#[test]
fn blank_photo_is_not_found() {
    let err = StaticDecoder::new().decode(&blank(640, 480)).unwrap_err();
    assert!(matches!(err, DecodeError::NotFound { attempts: 4 }));
}

#[test]
fn batch_continues_past_bad_files() {
    let dir = temp_dir("batch");
    let good = save(&photo_with(400, 300, &render_qr("ABC123", 5), 100, 50), &dir, "good.png");
    let corrupt = dir.join("corrupt.png");
    fs::write(&corrupt, b"definitely not a png").unwrap();
    let missing = dir.join("missing.png");
    let empty = save(&blank(320, 240), &dir, "blank.png");
    let good_again = save(&photo_with(300, 300, &render_qr("XYZ789", 5), 20, 20), &dir, "z.png");

    let paths: Vec<PathBuf> = vec![good, corrupt, missing, empty, good_again];
    let outcomes = StaticDecoder::new().decode_batch(&paths);

    assert_eq!(outcomes.len(), 5);
    let returned: Vec<_> = outcomes.iter().map(|o| o.path.clone()).collect();
    assert_eq!(returned, paths);

    assert_eq!(outcomes[0].result.as_ref().unwrap().payload, "ABC123");
    assert!(matches!(outcomes[1].result, Err(DecodeError::Load { .. })));
    assert!(matches!(outcomes[2].result, Err(DecodeError::Load { .. })));
    assert!(matches!(outcomes[3].result, Err(DecodeError::NotFound { .. })));
    assert_eq!(outcomes[4].result.as_ref().unwrap().payload, "XYZ789");

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn decode_file_matches_in_memory_decode() {
    let dir = temp_dir("file");
    let path = save(&photo_with(500, 400, &render_qr(SAMPLE_CCCD, 4), 250, 10), &dir, "card.png");
    let decoded = cccd_qr::decode_file(&path).unwrap();
    assert_eq!(decoded.payload, SAMPLE_CCCD);
    let _ = fs::remove_dir_all(dir);
}
