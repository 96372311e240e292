/// Which pixel polarities the matrix decoder is asked to try
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Dark modules on a light background only (live scanning)
    Normal,
    /// Normal first, then the colour-inverted data (still images)
    Both,
}

impl Polarity {
    /// Whether an inverted retry is allowed
    pub fn tries_inverted(&self) -> bool {
        matches!(self, Polarity::Both)
    }
}

/// Rectangle in pixel coordinates of some source buffer.
///
/// Every constructor that takes buffer bounds clamps its result into
/// `[0, bounds_w] x [0, bounds_h]`, so a region built that way can be handed
/// straight to the region scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanRegion {
    /// Left edge
    pub x: u32,
    /// Top edge
    pub y: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl ScanRegion {
    /// Create a region without clamping
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The whole buffer
    pub fn full(bounds_w: u32, bounds_h: u32) -> Self {
        Self::new(0, 0, bounds_w, bounds_h)
    }

    /// Clamp an arbitrary (possibly negative or oversized) rectangle into the buffer
    pub fn clamped(x: i64, y: i64, width: i64, height: i64, bounds_w: u32, bounds_h: u32) -> Self {
        let (bw, bh) = (bounds_w as i64, bounds_h as i64);
        let x0 = x.clamp(0, bw);
        let y0 = y.clamp(0, bh);
        let x1 = x.saturating_add(width.max(0)).clamp(x0, bw);
        let y1 = y.saturating_add(height.max(0)).clamp(y0, bh);
        Self::new(x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32)
    }

    /// Region spanning `[x0, x1) x [y0, y1)` expressed as fractions of the buffer size.
    ///
    /// Fractions are clamped to `[0, 1]` and pixel edges are truncated, the
    /// same way a canvas read with fractional coordinates would be.
    pub fn from_fractions(bounds_w: u32, bounds_h: u32, x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        let left = fraction_to_px(x0, bounds_w);
        let top = fraction_to_px(y0, bounds_h);
        let right = fraction_to_px(x1, bounds_w).max(left);
        let bottom = fraction_to_px(y1, bounds_h).max(top);
        Self::new(left, top, right - left, bottom - top)
    }

    /// Centered square whose side is `fraction` of the shorter buffer dimension
    pub fn centered_square(bounds_w: u32, bounds_h: u32, fraction: f64) -> Self {
        let shorter = bounds_w.min(bounds_h);
        if shorter == 0 {
            return Self::default();
        }
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            1.0
        };
        let side = ((shorter as f64 * fraction + PX_EPSILON).floor() as u32).clamp(1, shorter);
        Self::new((bounds_w - side) / 2, (bounds_h - side) / 2, side, side)
    }

    /// Exclusive right edge
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// Pixel count
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// True when the region covers no pixels
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True when the region lies entirely inside a `bounds_w x bounds_h` buffer
    pub fn fits_within(&self, bounds_w: u32, bounds_h: u32) -> bool {
        self.right() <= bounds_w && self.bottom() <= bounds_h
    }

    /// Clamp an existing region into the buffer
    pub fn clamp_to(&self, bounds_w: u32, bounds_h: u32) -> Self {
        Self::clamped(
            self.x as i64,
            self.y as i64,
            self.width as i64,
            self.height as i64,
            bounds_w,
            bounds_h,
        )
    }
}

/// Absorbs float error so `1080 * 0.6` lands on 648, not 647.
const PX_EPSILON: f64 = 1e-9;

fn fraction_to_px(fraction: f64, extent: u32) -> u32 {
    let fraction = if fraction.is_nan() {
        0.0
    } else {
        fraction.clamp(0.0, 1.0)
    };
    ((extent as f64 * fraction + PX_EPSILON).floor() as u32).min(extent)
}

impl std::fmt::Display for ScanRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({},{})-({},{}) {}x{}",
            self.x,
            self.y,
            self.right(),
            self.bottom(),
            self.width,
            self.height
        )
    }
}
