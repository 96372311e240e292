use cccd_qr::live::roi_for_frame;
use cccd_qr::{ScanRegion, StaticDecoder, Strategy};
use proptest::prelude::*;

proptest! {
    #[test]
    fn static_plan_stays_inside_image(width in 1u32..=8000, height in 1u32..=8000) {
        let plan = StaticDecoder::<cccd_qr::RqrrDecoder>::plan(width, height);
        prop_assert_eq!(plan.len(), 4);
        prop_assert_eq!(plan[0].1, ScanRegion::full(width, height));
        for (strategy, region) in plan {
            prop_assert!(region.fits_within(width, height), "{:?} {} escapes {}x{}", strategy, region, width, height);
        }
    }

    #[test]
    fn top_right_covers_the_right_half(width in 2u32..=8000, height in 2u32..=8000) {
        let r = Strategy::TopRight.region(width, height);
        prop_assert_eq!(r.right(), width);
        prop_assert_eq!(r.y, 0);
        prop_assert!(r.x >= width / 2 && r.x <= width / 2 + 1);
        prop_assert!(!r.is_empty());
    }

    #[test]
    fn live_roi_is_a_nonempty_centered_square(
        width in 1u32..=4096,
        height in 1u32..=4096,
        fraction in 0.1f64..=1.0,
    ) {
        let roi = roi_for_frame(width, height, fraction);
        prop_assert!(!roi.is_empty());
        prop_assert_eq!(roi.width, roi.height);
        prop_assert!(roi.fits_within(width, height));
        let left = roi.x;
        let right = width - roi.right();
        prop_assert!(left.abs_diff(right) <= 1);
    }

    #[test]
    fn clamping_never_escapes(
        x in -10_000i64..10_000,
        y in -10_000i64..10_000,
        w in -100i64..20_000,
        h in -100i64..20_000,
        bw in 0u32..5000,
        bh in 0u32..5000,
    ) {
        let r = ScanRegion::clamped(x, y, w, h, bw, bh);
        prop_assert!(r.fits_within(bw, bh));
        prop_assert_eq!(r.clamp_to(bw, bh), r);
    }
}
