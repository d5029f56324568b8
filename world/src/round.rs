//! Round bookkeeping owned by the world.

use std::time::Duration;

use meter_rider_core::{RoundIndex, RoundScore};

/// Countdown, running flag and score history of the current game.
#[derive(Clone, Debug)]
pub(crate) struct RoundState {
    pub(crate) index: RoundIndex,
    pub(crate) remaining: Duration,
    pub(crate) scores: Vec<RoundScore>,
    pub(crate) game_over: bool,
    pub(crate) running: bool,
    /// Highest peak-meter level observed since the round started.
    pub(crate) peak: f64,
}

impl RoundState {
    pub(crate) fn new(round_duration: Duration) -> Self {
        Self {
            index: RoundIndex::FIRST,
            remaining: round_duration,
            scores: Vec::new(),
            game_over: false,
            running: false,
            peak: 0.0,
        }
    }

    /// Reports whether frames should advance the signal chain.
    pub(crate) const fn is_live(&self) -> bool {
        self.running && !self.game_over
    }

    /// Runs the countdown down by `dt` and reports whether it expired.
    pub(crate) fn count_down(&mut self, dt: Duration) -> bool {
        self.remaining = self.remaining.saturating_sub(dt);
        self.remaining.is_zero()
    }

    pub(crate) fn observe_peak(&mut self, level: f64) {
        if level > self.peak {
            self.peak = level;
        }
    }

    pub(crate) fn total_score(&self) -> u32 {
        self.scores
            .iter()
            .fold(0u32, |total, score| total.saturating_add(score.get()))
    }
}
