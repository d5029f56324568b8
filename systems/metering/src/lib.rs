#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Envelope followers and loudness integration for the Meter Rider chain.
//!
//! Every follower is a single-pole smoother discretised as
//! `α = 1 − exp(−dt/τ)`, which tracks a continuous first-order lag regardless
//! of how irregularly the host delivers frames. Meters are plain values: each
//! `step` consumes the previous state and returns the next one.

use std::time::Duration;

use meter_rider_core::{floor_frame_dt, MeterReadings};

mod loudness;

pub use loudness::LoudnessWindow;

const VU_TAU: f64 = 0.3;
const PEAK_ATTACK_TAU: f64 = 0.0005;
const PEAK_RELEASE_TAU: f64 = 0.05;
const PPM_ATTACK_TAU: f64 = 0.01;
const PPM_RELEASE_TAU: f64 = 0.08;
const PPM_HOLD_TIME: Duration = Duration::from_millis(80);

/// Fraction of the gap between hold and core closed on every frame once the
/// hold timer has expired.
///
/// Unlike every other envelope in the chain this blend is applied per frame
/// rather than per second, so the hold release speeds up at higher frame rates.
pub const PPM_HOLD_BLEND: f64 = 0.3;

/// Smoothing coefficient for a time constant `tau` (seconds) over `dt`.
///
/// `dt` is floored to the minimum frame delta. A non-positive or non-finite
/// `tau` snaps straight to the input.
#[must_use]
pub fn smoothing_coefficient(tau: f64, dt: Duration) -> f64 {
    if !(tau.is_finite() && tau > 0.0) {
        return 1.0;
    }
    let dt = floor_frame_dt(dt).as_secs_f64();
    1.0 - (-dt / tau).exp()
}

/// Moves `previous` toward `input` through a first-order lag.
#[must_use]
pub fn follow(previous: f64, input: f64, tau: f64, dt: Duration) -> f64 {
    let next = previous + smoothing_coefficient(tau, dt) * (input - previous);
    if next.is_finite() {
        next
    } else {
        0.0
    }
}

/// Attack and release time constants of an asymmetric follower.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ballistics {
    /// Time constant used while the input is above the current level.
    pub attack_tau: f64,
    /// Time constant used otherwise.
    pub release_tau: f64,
}

impl Ballistics {
    /// Moves `previous` toward `input`, picking the attack or release branch.
    #[must_use]
    pub fn follow(&self, previous: f64, input: f64, dt: Duration) -> f64 {
        let tau = if input > previous {
            self.attack_tau
        } else {
            self.release_tau
        };
        follow(previous, input, tau, dt)
    }
}

const PEAK_BALLISTICS: Ballistics = Ballistics {
    attack_tau: PEAK_ATTACK_TAU,
    release_tau: PEAK_RELEASE_TAU,
};

const PPM_BALLISTICS: Ballistics = Ballistics {
    attack_tau: PPM_ATTACK_TAU,
    release_tau: PPM_RELEASE_TAU,
};

/// Slow symmetric volume-unit meter.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VuMeter {
    level: f64,
}

impl VuMeter {
    /// Current smoothed level.
    #[must_use]
    pub const fn level(&self) -> f64 {
        self.level
    }

    /// Integrates one frame of input.
    #[must_use]
    pub fn step(self, input: f64, dt: Duration) -> Self {
        Self {
            level: follow(self.level, input, VU_TAU, dt),
        }
    }
}

/// Near-instant attack peak detector with a short release.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PeakMeter {
    level: f64,
}

impl PeakMeter {
    /// Current smoothed level.
    #[must_use]
    pub const fn level(&self) -> f64 {
        self.level
    }

    /// Integrates one frame of input.
    #[must_use]
    pub fn step(self, input: f64, dt: Duration) -> Self {
        Self {
            level: PEAK_BALLISTICS.follow(self.level, input, dt),
        }
    }
}

/// Peak programme meter with a short peak-hold ceiling.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PpmMeter {
    core: f64,
    hold: f64,
    hold_remaining: Duration,
}

impl PpmMeter {
    /// Ballistic level without the hold ceiling.
    #[must_use]
    pub const fn core(&self) -> f64 {
        self.core
    }

    /// Hold ceiling, which is what a PPM displays.
    #[must_use]
    pub const fn hold(&self) -> f64 {
        self.hold
    }

    /// Time left before the hold ceiling starts releasing.
    #[must_use]
    pub const fn hold_remaining(&self) -> Duration {
        self.hold_remaining
    }

    /// Integrates one frame of input.
    ///
    /// A rise of the core above the ceiling snaps the ceiling up and rearms the
    /// hold timer. Otherwise the timer runs down by `dt`, and once it is spent
    /// the ceiling closes [`PPM_HOLD_BLEND`] of its gap to the core.
    #[must_use]
    pub fn step(self, input: f64, dt: Duration) -> Self {
        let dt = floor_frame_dt(dt);
        let core = PPM_BALLISTICS.follow(self.core, input, dt);

        if core > self.hold {
            return Self {
                core,
                hold: core,
                hold_remaining: PPM_HOLD_TIME,
            };
        }

        let hold_remaining = self.hold_remaining.saturating_sub(dt);
        let hold = if hold_remaining.is_zero() {
            self.hold + (core - self.hold) * PPM_HOLD_BLEND
        } else {
            self.hold
        };

        Self {
            core,
            hold,
            hold_remaining,
        }
    }
}

/// The three ballistic meters driven by a single instantaneous sample.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MeterBank {
    vu: VuMeter,
    peak: PeakMeter,
    ppm: PpmMeter,
}

impl MeterBank {
    /// VU meter state.
    #[must_use]
    pub const fn vu(&self) -> VuMeter {
        self.vu
    }

    /// Peak meter state.
    #[must_use]
    pub const fn peak(&self) -> PeakMeter {
        self.peak
    }

    /// PPM meter state.
    #[must_use]
    pub const fn ppm(&self) -> PpmMeter {
        self.ppm
    }

    /// Feeds one sample to every meter.
    #[must_use]
    pub fn step(self, sample: f64, dt: Duration) -> Self {
        Self {
            vu: self.vu.step(sample, dt),
            peak: self.peak.step(sample, dt),
            ppm: self.ppm.step(sample, dt),
        }
    }

    /// Combines the bank with a loudness value into a reading snapshot.
    #[must_use]
    pub fn readings(&self, lufs: f64) -> MeterReadings {
        MeterReadings {
            vu: self.vu.level(),
            peak: self.peak.level(),
            ppm: self.ppm.hold(),
            ppm_core: self.ppm.core(),
            lufs,
        }
    }
}
