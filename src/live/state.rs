//! De-duplication and cooldown for live scanning.
//!
//! Everything here is a pure function of the previous state and an explicit
//! `now`, so the policy is tested without cameras, threads or sleeps.

use std::time::{Duration, Instant};

/// Lifecycle of a live session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No frame source acquired yet
    Idle,
    /// Polling frames, emissions allowed
    Streaming,
    /// A payload fired recently; repeats are suppressed
    CooldownActive,
    /// Source released and polling cancelled
    Closed,
}

/// Owned, cancellable one-shot deadline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timer {
    deadline: Option<Instant>,
}

impl Timer {
    /// Arm (or re-arm) the timer
    pub fn arm(&mut self, deadline: Instant) {
        self.deadline = Some(deadline);
    }

    /// Disarm without firing
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Pending deadline, if armed
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the timer is armed
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Disarm and return true if the deadline has passed
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(at) if at <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Side effects of expired timers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// The success indicator should be hidden
    IndicatorCleared,
    /// Cooldown is over and the last payload forgotten
    CooldownEnded,
}

/// A payload that passed de-duplication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emission {
    /// Decoded payload
    pub payload: String,
    /// Tick time at which it fired
    pub at: Instant,
}

/// Duplicate suppression for one live session.
///
/// A payload fires only when no cooldown is running and it differs from the
/// last fired payload. Firing starts two timers: a short one for the success
/// indicator and a long one that ends cooldown and forgets the payload, so
/// the same card can fire again once the long timer has run out.
#[derive(Debug, Clone)]
pub struct DedupState {
    cooldown: Duration,
    indicator: Duration,
    last_payload: Option<String>,
    in_cooldown: bool,
    indicator_visible: bool,
    indicator_timer: Timer,
    cooldown_timer: Timer,
}

impl DedupState {
    /// Fresh state with the given timer lengths
    pub fn new(cooldown: Duration, indicator: Duration) -> Self {
        Self {
            cooldown,
            indicator,
            last_payload: None,
            in_cooldown: false,
            indicator_visible: false,
            indicator_timer: Timer::default(),
            cooldown_timer: Timer::default(),
        }
    }

    /// Apply the de-dup rule to a decoded payload
    pub fn on_payload(&mut self, payload: &str, now: Instant) -> Option<Emission> {
        if self.in_cooldown || self.last_payload.as_deref() == Some(payload) {
            return None;
        }
        self.in_cooldown = true;
        self.indicator_visible = true;
        self.last_payload = Some(payload.to_string());
        self.indicator_timer.arm(now + self.indicator);
        self.cooldown_timer.arm(now + self.cooldown);
        Some(Emission {
            payload: payload.to_string(),
            at: now,
        })
    }

    /// Fire every timer whose deadline is at or before `now`, earliest first
    pub fn poll_timers(&mut self, now: Instant) -> Vec<TimerEvent> {
        let mut due: Vec<(Instant, TimerEvent)> = Vec::with_capacity(2);
        if let Some(at) = self.indicator_timer.deadline() {
            if self.indicator_timer.fire_if_due(now) {
                due.push((at, TimerEvent::IndicatorCleared));
            }
        }
        if let Some(at) = self.cooldown_timer.deadline() {
            if self.cooldown_timer.fire_if_due(now) {
                due.push((at, TimerEvent::CooldownEnded));
            }
        }
        due.sort_by_key(|(at, _)| *at);

        for (_, event) in &due {
            match event {
                TimerEvent::IndicatorCleared => self.indicator_visible = false,
                TimerEvent::CooldownEnded => {
                    self.in_cooldown = false;
                    self.last_payload = None;
                }
            }
        }
        due.into_iter().map(|(_, e)| e).collect()
    }

    /// Disarm both timers without applying their effects
    pub fn cancel_timers(&mut self) {
        self.indicator_timer.cancel();
        self.cooldown_timer.cancel();
    }

    /// Whether repeats are currently suppressed
    pub fn in_cooldown(&self) -> bool {
        self.in_cooldown
    }

    /// Whether repeats are suppressed at `now`, counting a cooldown whose
    /// deadline has passed as over even if it has not been polled yet
    pub fn in_cooldown_at(&self, now: Instant) -> bool {
        self.in_cooldown && self.cooldown_timer.deadline().is_none_or(|at| at > now)
    }

    /// Whether the success indicator is showing
    pub fn indicator_visible(&self) -> bool {
        self.indicator_visible
    }

    /// Last fired payload, until cooldown ends
    pub fn last_payload(&self) -> Option<&str> {
        self.last_payload.as_deref()
    }

    /// Earliest armed deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.indicator_timer.deadline(), self.cooldown_timer.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}
