//! Tunables for still-image and live scanning.
//!
//! Defaults match the ID-card layout this crate targets. Each knob can be
//! overridden through a `CCCD_*` environment variable; unparsable values fall
//! back to the default and out-of-range values are clamped.

use std::time::Duration;

fn parse_env<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    lookup(name).and_then(|v| v.trim().parse::<T>().ok())
}

fn parse_env_u64(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: u64) -> u64 {
    parse_env(lookup, name).unwrap_or(default)
}

fn parse_env_f64(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: f64) -> f64 {
    parse_env::<f64>(lookup, name)
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Region-scan settings
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScanConfig {
    /// Downscale scanned regions whose longer side exceeds this many pixels.
    /// `None` scans at native resolution.
    pub max_scan_dimension: Option<u32>,
}

impl ScanConfig {
    /// Read `CCCD_MAX_SCAN_DIM` (0 or unset disables downscaling)
    pub fn from_env() -> Self {
        Self::from_lookup(process_env)
    }

    /// Same as [`ScanConfig::from_env`] with an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let max_scan_dimension = match parse_env::<u32>(&lookup, "CCCD_MAX_SCAN_DIM") {
            Some(0) | None => None,
            Some(v) => Some(v.max(64)),
        };
        Self { max_scan_dimension }
    }
}

/// Live session settings
#[derive(Debug, Clone, PartialEq)]
pub struct LiveConfig {
    /// Side of the centered ROI as a fraction of the shorter frame dimension
    pub roi_fraction: f64,
    /// Window during which repeats are suppressed; clears the last payload when it ends
    pub cooldown: Duration,
    /// How long the success indicator stays up after an emission
    pub indicator: Duration,
    /// Delay between ticks of the poll loop
    pub tick_interval: Duration,
    /// Requested zoom, applied only if the source reports a zoom range
    pub zoom: Option<f64>,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            roi_fraction: 0.6,
            cooldown: Duration::from_millis(3000),
            indicator: Duration::from_millis(1500),
            tick_interval: Duration::from_millis(16),
            zoom: None,
        }
    }
}

impl LiveConfig {
    /// Read `CCCD_ROI_FRACTION`, `CCCD_COOLDOWN_MS`, `CCCD_INDICATOR_MS`,
    /// `CCCD_TICK_MS` and `CCCD_ZOOM`
    pub fn from_env() -> Self {
        Self::from_lookup(process_env)
    }

    /// Same as [`LiveConfig::from_env`] with an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let roi_fraction =
            parse_env_f64(&lookup, "CCCD_ROI_FRACTION", defaults.roi_fraction).clamp(0.1, 1.0);
        let cooldown = Duration::from_millis(parse_env_u64(
            &lookup,
            "CCCD_COOLDOWN_MS",
            defaults.cooldown.as_millis() as u64,
        ));
        let indicator = Duration::from_millis(parse_env_u64(
            &lookup,
            "CCCD_INDICATOR_MS",
            defaults.indicator.as_millis() as u64,
        ));
        let tick_interval = Duration::from_millis(
            parse_env_u64(&lookup, "CCCD_TICK_MS", defaults.tick_interval.as_millis() as u64).clamp(1, 1000),
        );
        let zoom = parse_env::<f64>(&lookup, "CCCD_ZOOM").filter(|z| z.is_finite() && *z > 0.0);
        Self {
            roi_fraction,
            cooldown,
            indicator,
            tick_interval,
            zoom,
        }
    }
}
