//! Presentation rate meter for the FPS badge.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Counts presented frames over a sliding one-second window.
#[derive(Debug, Default)]
pub struct FpsMeter {
    stamps: VecDeque<Instant>,
}

impl FpsMeter {
    const WINDOW: Duration = Duration::from_secs(1);

    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, now: Instant) {
        self.stamps.push_back(now);
        self.evict(now);
    }

    /// Frames presented during the last second.
    pub fn fps(&mut self, now: Instant) -> f64 {
        self.evict(now);
        self.stamps.len() as f64 / Self::WINDOW.as_secs_f64()
    }

    pub fn reset(&mut self) {
        self.stamps.clear();
    }

    fn evict(&mut self, now: Instant) {
        while let Some(&oldest) = self.stamps.front() {
            if now.saturating_duration_since(oldest) >= Self::WINDOW {
                self.stamps.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Badge text, e.g. `FPS: 29`.
pub fn fps_label(fps: f64) -> String {
    format!("FPS: {}", fps.floor() as u64)
}
