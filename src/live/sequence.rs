use std::path::{Path, PathBuf};

use image::RgbaImage;
use tracing::debug;

use crate::error::CaptureError;
use crate::live::capture::{Camera, CameraRequest, FrameSource, ZoomRange};
use crate::tools::{collect_images, load_rgba};

/// Replays a list of image files as a camera feed.
///
/// Each file is shown for `hold` consecutive reads, which mimics a card held
/// in front of the lens for a few ticks. An optional zoom range turns on a
/// digital center-crop zoom.
#[derive(Debug, Clone)]
pub struct ImageSequenceCamera {
    frames: Vec<PathBuf>,
    hold: u32,
    zoom_range: Option<ZoomRange>,
}

impl ImageSequenceCamera {
    /// All images under `dir`, in path order
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self::from_paths(collect_images(dir))
    }

    /// An explicit frame list
    pub fn from_paths(frames: Vec<PathBuf>) -> Self {
        Self {
            frames,
            hold: 1,
            zoom_range: None,
        }
    }

    /// Repeat each frame for `reads` reads (at least one)
    pub fn hold_frames(mut self, reads: u32) -> Self {
        self.hold = reads.max(1);
        self
    }

    /// Advertise a zoom range
    pub fn with_zoom_range(mut self, range: ZoomRange) -> Self {
        self.zoom_range = Some(range);
        self
    }

    /// Number of distinct frames
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

impl Camera for ImageSequenceCamera {
    fn open(&self, request: &CameraRequest) -> Result<Box<dyn FrameSource>, CaptureError> {
        if self.frames.is_empty() {
            return Err(CaptureError::NotFound("no frames in image sequence".to_string()));
        }
        debug!(facing = ?request.facing, frames = self.frames.len(), hold = self.hold, "opening image sequence");
        Ok(Box::new(ImageSequenceSource {
            frames: self.frames.clone(),
            hold: u64::from(self.hold),
            reads: 0,
            current: None,
            zoom_range: self.zoom_range,
            zoom: 1.0,
            stopped: false,
        }))
    }
}

/// Frame source handed out by [`ImageSequenceCamera`]
pub struct ImageSequenceSource {
    frames: Vec<PathBuf>,
    hold: u64,
    reads: u64,
    current: Option<(usize, RgbaImage)>,
    zoom_range: Option<ZoomRange>,
    zoom: f64,
    stopped: bool,
}

impl ImageSequenceSource {
    fn index(&self) -> usize {
        (self.reads / self.hold) as usize
    }

    /// Currently applied zoom factor
    pub fn zoom(&self) -> f64 {
        self.zoom
    }
}

/// Size of the centered crop that a digital `zoom` keeps
fn zoomed_size(width: u32, height: u32, zoom: f64) -> (u32, u32) {
    if zoom <= 1.0 {
        return (width, height);
    }
    let w = ((width as f64 / zoom).round() as u32).clamp(1, width.max(1));
    let h = ((height as f64 / zoom).round() as u32).clamp(1, height.max(1));
    (w, h)
}

impl FrameSource for ImageSequenceSource {
    fn has_enough_data(&self) -> bool {
        !self.stopped && !self.is_exhausted()
    }

    fn dimensions(&self) -> (u32, u32) {
        match &self.current {
            Some((_, image)) => zoomed_size(image.width(), image.height(), self.zoom),
            None => (0, 0),
        }
    }

    fn read_frame(&mut self, buf: &mut Vec<u8>) -> Result<(u32, u32), CaptureError> {
        if self.stopped {
            return Err(CaptureError::Closed);
        }
        let index = self.index();
        if index >= self.frames.len() {
            return Err(CaptureError::Frame("image sequence exhausted".to_string()));
        }
        self.reads += 1;

        if self.current.as_ref().is_none_or(|(i, _)| *i != index) {
            let path = &self.frames[index];
            let image = load_rgba(path).map_err(|source| CaptureError::Image {
                path: path.clone(),
                source,
            })?;
            self.current = Some((index, image));
        }
        let Some((_, image)) = &self.current else {
            return Err(CaptureError::Frame("frame not loaded".to_string()));
        };

        let (width, height) = image.dimensions();
        let (cw, ch) = zoomed_size(width, height, self.zoom);
        buf.clear();
        if (cw, ch) == (width, height) {
            buf.extend_from_slice(image.as_raw());
        } else {
            let raw = image.as_raw();
            let x0 = ((width - cw) / 2) as usize;
            let y0 = ((height - ch) / 2) as usize;
            let stride = width as usize * 4;
            for row in y0..y0 + ch as usize {
                let start = row * stride + x0 * 4;
                buf.extend_from_slice(&raw[start..start + cw as usize * 4]);
            }
        }
        Ok((cw, ch))
    }

    fn zoom_range(&self) -> Option<ZoomRange> {
        self.zoom_range
    }

    fn apply_zoom(&mut self, zoom: f64) -> Result<(), CaptureError> {
        let range = self
            .zoom_range
            .ok_or_else(|| CaptureError::Unsupported(format!("zoom {zoom}")))?;
        self.zoom = range.clamp(zoom);
        Ok(())
    }

    fn stop(&mut self) {
        if !self.stopped {
            debug!(reads = self.reads, "image sequence stopped");
        }
        self.stopped = true;
        self.current = None;
    }

    fn is_stopped(&self) -> bool {
        self.stopped
    }

    fn is_exhausted(&self) -> bool {
        self.index() >= self.frames.len()
    }
}
