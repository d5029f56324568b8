#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic synthetic source that feeds the Meter Rider metering chain.
//!
//! The source layers three components on top of a constant floor: a slow
//! seed-phased tone, probabilistic transients whose likelihood and size follow
//! the dynamics knob, and low-level noise. All randomness comes from an
//! explicit [`RandomState`] that callers thread through every draw, so a round
//! replays exactly from its seed.

use std::{f64::consts::TAU, time::Duration};

use meter_rider_core::{Dynamics, GainDb, Seed};

const RNG_MULTIPLIER: u32 = 1_664_525;
const RNG_INCREMENT: u32 = 1_013_904_223;
const RNG_SCALE: f64 = 4_294_967_296.0;

const SPIKE_PROBABILITY: f64 = 0.08;
const SPIKE_SCALE: f64 = 0.6;
const TONE_HZ: f64 = 0.5;
const TONE_DEPTH: f64 = 0.12;
const NOISE_SCALE: f64 = 0.08;
const SIGNAL_FLOOR: f64 = 0.35;
const PHASE_BUCKETS: u32 = 1_000;

/// Linear-congruential random stream over a single 32-bit state word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RandomState(u32);

impl RandomState {
    /// Creates a stream positioned at the provided seed.
    #[must_use]
    pub const fn seeded(seed: Seed) -> Self {
        Self(seed.get())
    }

    /// Raw state word.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Advances the stream and returns the new state normalised into `[0, 1)`.
    pub fn next_unit(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(RNG_MULTIPLIER)
            .wrapping_add(RNG_INCREMENT);
        f64::from(self.0) / RNG_SCALE
    }
}

/// Pure sample synthesiser bound to the seed of the current round.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SignalGenerator {
    seed: Seed,
    phase_offset: f64,
}

impl SignalGenerator {
    /// Creates a generator whose tonal phase is derived from `seed`.
    #[must_use]
    pub fn new(seed: Seed) -> Self {
        let bucket = seed.get() % PHASE_BUCKETS;
        Self {
            seed,
            phase_offset: f64::from(bucket) / f64::from(PHASE_BUCKETS) / TONE_HZ,
        }
    }

    /// Seed the generator was created from.
    #[must_use]
    pub const fn seed(&self) -> Seed {
        self.seed
    }

    /// Synthesises one instantaneous sample.
    ///
    /// Consumes two or three draws from `random` depending on whether a
    /// transient fires, and returns the sample alongside the advanced stream.
    /// The sample never exceeds one; non-finite intermediate results yield zero.
    #[must_use]
    pub fn next(
        &self,
        mut random: RandomState,
        gain: GainDb,
        dynamics: Dynamics,
        wall_time: Duration,
    ) -> (f64, RandomState) {
        let base = gain.linear();
        let intensity = dynamics.get();

        let trigger = random.next_unit();
        let spike = if trigger < SPIKE_PROBABILITY * intensity {
            random.next_unit() * SPIKE_SCALE * intensity
        } else {
            0.0
        };

        let tone = self.tone(wall_time);
        let noise = random.next_unit() * NOISE_SCALE;

        let sample = (base * (SIGNAL_FLOOR + tone + spike + noise)).min(1.0);
        if sample.is_finite() {
            (sample, random)
        } else {
            (0.0, random)
        }
    }

    fn tone(&self, wall_time: Duration) -> f64 {
        let phase = TAU * TONE_HZ * (wall_time.as_secs_f64() + self.phase_offset);
        TONE_DEPTH * (0.5 + 0.5 * phase.sin())
    }
}
