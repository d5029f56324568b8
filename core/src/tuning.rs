use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Dynamics, GainDb, Seed};

/// Aggregated knobs controlling a game session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameTuning {
    /// Number of rounds played before the game ends.
    pub rounds: u32,
    /// Length of each round's countdown in seconds.
    pub round_duration_secs: f64,
    /// Seed used for the opening round; later rounds increment it.
    pub seed: u32,
    /// Gain selected when the game starts, in decibels.
    pub initial_gain_db: f64,
    /// Dynamics intensity selected when the game starts.
    pub initial_dynamics: f64,
    /// Calibration of the round score formula.
    pub scoring: ScoringTuning,
    /// Configuration of the loudness integrator.
    pub loudness: LoudnessTuning,
}

impl Default for GameTuning {
    fn default() -> Self {
        Self {
            rounds: 5,
            round_duration_secs: 20.0,
            seed: 1337,
            initial_gain_db: -12.0,
            initial_dynamics: 0.5,
            scoring: ScoringTuning::default(),
            loudness: LoudnessTuning::default(),
        }
    }
}

impl GameTuning {
    /// Checks that every knob describes a playable session.
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.rounds == 0 {
            return Err(TuningError::NoRounds);
        }
        ensure_positive("round_duration_secs", self.round_duration_secs)?;
        if self.round_duration().is_zero() {
            return Err(TuningError::NotPositive {
                field: "round_duration_secs",
                value: self.round_duration_secs,
            });
        }
        ensure_finite("initial_gain_db", self.initial_gain_db)?;
        ensure_finite("initial_dynamics", self.initial_dynamics)?;
        self.scoring.validate()?;
        self.loudness.validate()
    }

    /// Countdown length of a single round.
    ///
    /// Falls back to zero for values that [`GameTuning::validate`] rejects.
    #[must_use]
    pub fn round_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.round_duration_secs).unwrap_or(Duration::ZERO)
    }

    /// Seed of the opening round.
    #[must_use]
    pub const fn initial_seed(&self) -> Seed {
        Seed::new(self.seed)
    }

    /// Gain selected when the game starts.
    #[must_use]
    pub fn initial_gain(&self) -> GainDb {
        GainDb::new(self.initial_gain_db)
    }

    /// Dynamics selected when the game starts.
    #[must_use]
    pub fn initial_dynamics(&self) -> Dynamics {
        Dynamics::new(self.initial_dynamics)
    }
}

/// Calibration constants of the round score formula.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringTuning {
    /// Gain that earns a perfect score, in decibels.
    pub target_gain_db: f64,
    /// Points lost for every decibel away from the target.
    pub penalty_per_db: f64,
    /// Peak level above which the overshoot penalty applies.
    pub peak_threshold: f64,
    /// Points lost per unit of peak level above the threshold.
    pub over_penalty: f64,
}

impl Default for ScoringTuning {
    fn default() -> Self {
        Self {
            target_gain_db: -6.0,
            penalty_per_db: 5.0,
            peak_threshold: 0.9,
            over_penalty: 50.0,
        }
    }
}

impl ScoringTuning {
    /// Checks that every calibration constant is finite.
    pub fn validate(&self) -> Result<(), TuningError> {
        ensure_finite("scoring.target_gain_db", self.target_gain_db)?;
        ensure_finite("scoring.penalty_per_db", self.penalty_per_db)?;
        ensure_finite("scoring.peak_threshold", self.peak_threshold)?;
        ensure_finite("scoring.over_penalty", self.over_penalty)
    }
}

/// Configuration of the sliding loudness window.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoudnessTuning {
    /// Length of the trailing integration window in seconds.
    pub window_secs: f64,
}

impl Default for LoudnessTuning {
    fn default() -> Self {
        Self { window_secs: 3.0 }
    }
}

impl LoudnessTuning {
    /// Checks that the window has a positive finite length.
    pub fn validate(&self) -> Result<(), TuningError> {
        ensure_positive("loudness.window_secs", self.window_secs)
    }
}

/// Reasons a tuning set may be rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum TuningError {
    /// The session would contain no rounds.
    #[error("a game needs at least one round")]
    NoRounds,
    /// A duration-like knob was zero, negative or not finite.
    #[error("`{field}` must be a positive number of seconds, got {value}")]
    NotPositive {
        /// Name of the rejected knob.
        field: &'static str,
        /// Rejected value.
        value: f64,
    },
    /// A calibration knob was NaN or infinite.
    #[error("`{field}` must be finite, got {value}")]
    NotFinite {
        /// Name of the rejected knob.
        field: &'static str,
        /// Rejected value.
        value: f64,
    },
}

fn ensure_finite(field: &'static str, value: f64) -> Result<(), TuningError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(TuningError::NotFinite { field, value })
    }
}

fn ensure_positive(field: &'static str, value: f64) -> Result<(), TuningError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TuningError::NotPositive { field, value })
    }
}
