//! Sliding-window bitrate/fps estimation.

use serde::{Deserialize, Serialize};

const WINDOW_DURATION_MS: i64 = 1_000;

/// One completed measurement window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameStatsReport {
    /// Average bitrate over the window, in kbit/s.
    pub bitrate_kbps: u32,

    /// Average frame rate over the window.
    pub fps: u32,
}

/// Accumulates per-frame byte samples into one-second windows.
///
/// Timestamps come from the host clock; a window closes once a sample
/// arrives at least one second after the window opened, and the next
/// window starts at that sample's timestamp so windows tile the
/// timeline without gaps.
#[derive(Debug, Default)]
pub struct FrameStats {
    window_bytes: u64,
    window_frames: u32,
    window_start_ms: Option<i64>,
}

impl FrameStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one frame of `bytes` observed at `timestamp_ms`.
    ///
    /// Returns a report when this sample closes the current window.
    pub fn on_sample(&mut self, bytes: usize, timestamp_ms: i64) -> Option<FrameStatsReport> {
        let window_start = *self.window_start_ms.get_or_insert(timestamp_ms);
        self.window_bytes += bytes as u64;
        self.window_frames += 1;

        let elapsed = timestamp_ms - window_start;
        if elapsed < WINDOW_DURATION_MS {
            return None;
        }

        let elapsed_f = elapsed as f64;
        let bitrate_kbps =
            (self.window_bytes as f64 * 8.0 * 1000.0 / elapsed_f / 1000.0).round().max(0.0) as u32;
        let fps = (f64::from(self.window_frames) * 1000.0 / elapsed_f).round().max(0.0) as u32;

        self.reset(timestamp_ms);
        Some(FrameStatsReport { bitrate_kbps, fps })
    }

    /// Restart the window at `timestamp_ms`.
    pub fn reset(&mut self, timestamp_ms: i64) {
        self.window_bytes = 0;
        self.window_frames = 0;
        self.window_start_ms = Some(timestamp_ms);
    }

    /// Forget the window entirely; the next sample opens a fresh one.
    pub fn clear(&mut self) {
        self.window_bytes = 0;
        self.window_frames = 0;
        self.window_start_ms = None;
    }
}
