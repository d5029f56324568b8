#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Round scoring for Meter Rider.
//!
//! A round starts from a perfect 100 points. Points are lost linearly for every
//! decibel the player's gain sits away from the target, and for how far the
//! peak meter climbed above the overload threshold during the round.

use meter_rider_core::{GainDb, RoundScore, ScoringTuning};

const PERFECT_SCORE: f64 = 100.0;

/// Scores a round from the gain at submission and the round's highest peak.
///
/// The result is clamped at zero and rounded to whole points. An infinite peak
/// or gain penalty scores zero, while a NaN peak counts as no overshoot.
#[must_use]
pub fn score_round(gain: GainDb, round_peak: f64, tuning: &ScoringTuning) -> RoundScore {
    let gain_penalty = (gain.get() - tuning.target_gain_db).abs() * tuning.penalty_per_db;
    let overshoot = (round_peak - tuning.peak_threshold).max(0.0);
    let points = PERFECT_SCORE - gain_penalty - overshoot * tuning.over_penalty;

    if !points.is_finite() {
        return RoundScore::new(0);
    }
    RoundScore::new(points.max(0.0).round() as u32)
}
