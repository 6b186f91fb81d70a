//! The life clock.

use serde::{Deserialize, Serialize};

/// Elapsed time against a duration that time crystals can extend.
///
/// `elapsed` never exceeds `duration`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LifeTimer {
    elapsed: f32,
    duration: f32,
    bonus_granted: f32,
}

impl LifeTimer {
    pub fn new(duration: f32) -> Self {
        Self {
            elapsed: 0.0,
            duration: duration.max(0.0),
            bonus_granted: 0.0,
        }
    }

    /// Advance the clock. Returns `true` once the life has run out.
    pub fn advance(&mut self, dt: f32) -> bool {
        if dt.is_finite() && dt > 0.0 {
            self.elapsed = (self.elapsed + dt).min(self.duration);
        }
        self.is_expired()
    }

    /// Add bonus seconds to the duration.
    pub fn extend(&mut self, seconds: f32) {
        if seconds > 0.0 {
            self.duration += seconds;
            self.bonus_granted += seconds;
        }
    }

    pub fn is_expired(&self) -> bool {
        self.elapsed >= self.duration
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn remaining(&self) -> f32 {
        (self.duration - self.elapsed).max(0.0)
    }

    /// Total seconds added by crystals this life.
    pub fn bonus_granted(&self) -> f32 {
        self.bonus_granted
    }
}
