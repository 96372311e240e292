//! Frame-source seam for live scanning.
//!
//! A [`Camera`] hands out an exclusively owned [`FrameSource`]; the live
//! session is responsible for calling [`FrameSource::stop`] on every exit
//! path so the device is released for the next session.

use crate::error::CaptureError;

/// Which physical camera to prefer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FacingMode {
    /// Rear camera, the one pointed at a card
    #[default]
    Environment,
    /// Front camera
    User,
}

/// Constraints passed to [`Camera::open`]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CameraRequest {
    /// Preferred camera
    pub facing: FacingMode,
    /// Requested zoom; advisory
    pub zoom: Option<f64>,
}

/// Zoom capability reported by a source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomRange {
    /// Smallest supported zoom
    pub min: f64,
    /// Largest supported zoom
    pub max: f64,
    /// Granularity; 0 means continuous
    pub step: f64,
}

impl ZoomRange {
    /// Snap `zoom` into the range and onto the step grid
    pub fn clamp(&self, zoom: f64) -> f64 {
        let z = if zoom.is_finite() { zoom } else { self.min };
        let z = z.clamp(self.min, self.max);
        if self.step > 0.0 {
            let steps = ((z - self.min) / self.step).round();
            (self.min + steps * self.step).clamp(self.min, self.max)
        } else {
            z
        }
    }
}

/// A live stream of RGBA frames
pub trait FrameSource: Send {
    /// Whether a full frame is buffered and can be read now
    fn has_enough_data(&self) -> bool;

    /// Native `(width, height)` of the next frame; `(0, 0)` before the first
    /// frame is available
    fn dimensions(&self) -> (u32, u32);

    /// Copy the current frame at native resolution into `buf` (interleaved
    /// RGBA, row-major) and return its `(width, height)`
    fn read_frame(&mut self, buf: &mut Vec<u8>) -> Result<(u32, u32), CaptureError>;

    /// Zoom capability, if the device exposes one
    fn zoom_range(&self) -> Option<ZoomRange> {
        None
    }

    /// Apply a zoom constraint
    fn apply_zoom(&mut self, zoom: f64) -> Result<(), CaptureError> {
        Err(CaptureError::Unsupported(format!("zoom {zoom}")))
    }

    /// Stop capture and release the device. Must be idempotent.
    fn stop(&mut self);

    /// True once [`FrameSource::stop`] has run
    fn is_stopped(&self) -> bool;

    /// True when a finite source has no more frames
    fn is_exhausted(&self) -> bool {
        false
    }
}

/// Something that can acquire a [`FrameSource`]
pub trait Camera {
    /// Acquire the device. Permission or constraint failures end the session
    /// before it starts.
    fn open(&self, request: &CameraRequest) -> Result<Box<dyn FrameSource>, CaptureError>;
}
