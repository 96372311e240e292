//! Live frame decoding.
//!
//! A [`LiveSession`] owns one [`FrameSource`] and scans a centered square of
//! each frame at a fixed tick rate. Payloads pass through [`DedupState`] so a
//! card held in front of the camera produces one emission per cooldown
//! window, not one per frame.
//!
//! The session is single-threaded: [`LiveSession::run`] ticks sequentially and
//! another thread stops it through a [`CancelHandle`]. Closing, explicitly or
//! by drop, stops the source and disarms every timer.

/// Frame source and camera traits
pub mod capture;
/// Directory replay camera
pub mod sequence;
/// De-duplication state machine
pub mod state;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;

use crossbeam_channel::Sender;
use tracing::{debug, info, warn};

use crate::config::{LiveConfig, ScanConfig};
use crate::decoder::{MatrixDecoder, RegionScanner, RqrrDecoder};
use crate::error::CaptureError;
use crate::models::{Polarity, ScanRegion};
use crate::utils::memory_pool::{AllocationStats, BufferPool};

pub use capture::{Camera, CameraRequest, FacingMode, FrameSource, ZoomRange};
pub use sequence::{ImageSequenceCamera, ImageSequenceSource};
pub use state::{DedupState, Emission, SessionState, Timer, TimerEvent};

/// Shared flag that stops a running poll loop
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    /// Fresh, uncancelled handle
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Hook for user-facing acknowledgment (sound, vibration, overlay)
pub trait ScanFeedback: Send {
    /// A payload was emitted
    fn acknowledge(&mut self, emission: &Emission);

    /// The success indicator timed out
    fn indicator_cleared(&mut self) {}

    /// Cooldown ended; the same card may fire again
    fn cooldown_ended(&mut self) {}
}

/// What one tick did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Session is idle or closed
    Inactive,
    /// Source had no complete frame buffered
    NotReady,
    /// Frame could not be read; skipped
    FrameError,
    /// Frame scanned, no code in the ROI
    NoCode,
    /// Code found but held back by the de-dup rule
    Suppressed,
    /// Code found and emitted
    Emitted(Emission),
}

/// Counters for one session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Ticks run while active
    pub ticks: u64,
    /// Ticks skipped for lack of data
    pub not_ready: u64,
    /// Frames that failed to read
    pub frame_errors: u64,
    /// Frames scanned
    pub scans: u64,
    /// Scans that found a code
    pub detections: u64,
    /// Payloads emitted
    pub emissions: u64,
}

/// Centered square ROI with side `fraction` of the shorter frame dimension
pub fn roi_for_frame(width: u32, height: u32, fraction: f64) -> ScanRegion {
    ScanRegion::centered_square(width, height, fraction)
}

/// One live scanning session over an exclusively owned frame source
pub struct LiveSession<D = RqrrDecoder> {
    source: Option<Box<dyn FrameSource>>,
    scanner: RegionScanner<D>,
    config: LiveConfig,
    dedup: DedupState,
    pool: BufferPool,
    cancel: CancelHandle,
    feedback: Option<Box<dyn ScanFeedback>>,
    stats: SessionStats,
    closed: bool,
}

impl LiveSession<RqrrDecoder> {
    /// Acquire a source from `camera` and start an `rqrr`-backed session,
    /// with scan settings from the environment
    pub fn open(camera: &dyn Camera, config: LiveConfig) -> Result<Self, CaptureError> {
        Self::open_with(camera, ScanConfig::from_env(), config)
    }

    /// [`LiveSession::open`] with explicit scan settings
    pub fn open_with(
        camera: &dyn Camera,
        scan: ScanConfig,
        config: LiveConfig,
    ) -> Result<Self, CaptureError> {
        let mut session = Self::new(RegionScanner::with_config(scan), config);
        session.start(camera)?;
        Ok(session)
    }
}

impl<D: MatrixDecoder> LiveSession<D> {
    /// Idle session; call [`LiveSession::start`] to acquire a source
    pub fn new(scanner: RegionScanner<D>, config: LiveConfig) -> Self {
        let dedup = DedupState::new(config.cooldown, config.indicator);
        Self {
            source: None,
            scanner,
            config,
            dedup,
            pool: BufferPool::new(),
            cancel: CancelHandle::new(),
            feedback: None,
            stats: SessionStats::default(),
            closed: false,
        }
    }

    /// Install an acknowledgment hook
    pub fn with_feedback(mut self, feedback: impl ScanFeedback + 'static) -> Self {
        self.feedback = Some(Box::new(feedback));
        self
    }

    /// Acquire a frame source from `camera`.
    ///
    /// Asks for the rear camera and the configured zoom. Zoom is applied only
    /// when the source reports a zoom range, and a failure to apply it is
    /// logged, not returned. A source held from an earlier start is stopped
    /// first.
    pub fn start(&mut self, camera: &dyn Camera) -> Result<(), CaptureError> {
        if self.closed {
            return Err(CaptureError::Closed);
        }
        if let Some(mut old) = self.source.take() {
            old.stop();
        }

        let request = CameraRequest {
            facing: FacingMode::Environment,
            zoom: self.config.zoom,
        };
        let mut source = camera.open(&request)?;

        if let Some(zoom) = self.config.zoom {
            match source.zoom_range() {
                Some(range) => {
                    let applied = range.clamp(zoom);
                    match source.apply_zoom(applied) {
                        Ok(()) => debug!(requested = zoom, applied, "zoom applied"),
                        Err(err) => warn!(%err, "could not apply zoom"),
                    }
                }
                None => warn!(requested = zoom, "zoom not supported by frame source"),
            }
        }

        info!(roi_fraction = self.config.roi_fraction, "live session started");
        self.source = Some(source);
        Ok(())
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state_at(Instant::now())
    }

    /// Lifecycle state at `now`; a cooldown whose deadline has passed counts
    /// as over even before the next tick polls it
    pub fn state_at(&self, now: Instant) -> SessionState {
        if self.closed {
            SessionState::Closed
        } else if self.source.is_none() {
            SessionState::Idle
        } else if self.dedup.in_cooldown_at(now) {
            SessionState::CooldownActive
        } else {
            SessionState::Streaming
        }
    }

    /// Handle that stops [`LiveSession::run`] from another thread
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// De-dup state, for inspection
    pub fn dedup(&self) -> &DedupState {
        &self.dedup
    }

    /// Session counters
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Buffer reuse counters
    pub fn buffer_stats(&self) -> &AllocationStats {
        self.pool.stats()
    }

    /// Region scanner used on each frame
    pub fn scanner(&self) -> &RegionScanner<D> {
        &self.scanner
    }

    /// Active settings
    pub fn config(&self) -> &LiveConfig {
        &self.config
    }

    /// Run one tick at time `now`
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        if self.closed {
            return TickOutcome::Inactive;
        }
        let Some(source) = self.source.as_mut() else {
            return TickOutcome::Inactive;
        };
        self.stats.ticks += 1;

        for event in self.dedup.poll_timers(now) {
            debug!(?event, "timer fired");
            if let Some(feedback) = self.feedback.as_mut() {
                match event {
                    TimerEvent::IndicatorCleared => feedback.indicator_cleared(),
                    TimerEvent::CooldownEnded => feedback.cooldown_ended(),
                }
            }
        }

        if !source.has_enough_data() {
            self.stats.not_ready += 1;
            return TickOutcome::NotReady;
        }

        let mut frame = self.pool.take_frame_buffer();
        let capacity = frame.capacity();
        let (width, height) = match source.read_frame(&mut frame) {
            Ok(dims) => dims,
            Err(err) => {
                warn!(%err, "frame read failed; skipping tick");
                self.pool.restore_frame_buffer(frame);
                self.stats.frame_errors += 1;
                return TickOutcome::FrameError;
            }
        };
        self.pool.record_frame(capacity, &frame);

        let roi = roi_for_frame(width, height, self.config.roi_fraction);
        let scanned = self.scanner.scan_raw(
            &frame,
            width,
            height,
            roi,
            Polarity::Normal,
            self.pool.luma_buffer(),
        );
        self.pool.restore_frame_buffer(frame);
        self.stats.scans += 1;

        let payload = match scanned {
            Ok(Some(payload)) => payload,
            Ok(None) => return TickOutcome::NoCode,
            Err(err) => {
                debug!(%err, "frame not scannable");
                return TickOutcome::NoCode;
            }
        };
        self.stats.detections += 1;

        match self.dedup.on_payload(&payload, now) {
            Some(emission) => {
                self.stats.emissions += 1;
                info!(len = emission.payload.len(), "Đã quét thành công!");
                if let Some(feedback) = self.feedback.as_mut() {
                    feedback.acknowledge(&emission);
                }
                TickOutcome::Emitted(emission)
            }
            None => TickOutcome::Suppressed,
        }
    }

    /// Tick every [`LiveConfig::tick_interval`] until cancelled, closed or the
    /// source runs dry.
    ///
    /// Emissions go to `sink` without waiting for the receiver. The session is
    /// closed on return.
    pub fn run(&mut self, sink: &Sender<Emission>) -> SessionStats {
        let interval = self.config.tick_interval;
        while !self.cancel.is_cancelled() && !self.closed {
            if self.source.as_ref().is_none_or(|s| s.is_exhausted() || s.is_stopped()) {
                debug!("frame source finished");
                break;
            }

            let started = Instant::now();
            if let TickOutcome::Emitted(emission) = self.tick(started) {
                if sink.send(emission).is_err() {
                    debug!("emission sink disconnected");
                }
            }

            if let Some(rest) = interval.checked_sub(started.elapsed()) {
                if !self.cancel.is_cancelled() {
                    thread::sleep(rest);
                }
            }
        }
        self.close();
        self.stats.clone()
    }
}

impl<D> LiveSession<D> {
    /// Stop the loop, disarm timers and release the frame source. Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.cancel.cancel();
        self.dedup.cancel_timers();
        if let Some(mut source) = self.source.take() {
            source.stop();
        }
        self.pool.clear();
        info!(
            ticks = self.stats.ticks,
            scans = self.stats.scans,
            emissions = self.stats.emissions,
            "live session closed"
        );
    }
}

impl<D> Drop for LiveSession<D> {
    fn drop(&mut self) {
        self.close();
    }
}
