//! Emulated display-driven frame clock.

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::session::HostSettings;

/// Produces monotonically increasing frame timestamps with seeded jitter.
#[derive(Debug)]
pub(crate) struct HostClock {
    rng: ChaCha8Rng,
    period_secs: f64,
    jitter: f64,
    now: Duration,
}

impl HostClock {
    pub(crate) fn new(settings: &HostSettings) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(settings.frame_seed),
            period_secs: 1.0 / settings.fps,
            jitter: settings.jitter,
            now: Duration::ZERO,
        }
    }

    /// Timestamp of the most recent frame.
    pub(crate) const fn now(&self) -> Duration {
        self.now
    }

    /// Advances to the next frame and returns its timestamp.
    pub(crate) fn tick(&mut self) -> Duration {
        let factor = if self.jitter > 0.0 {
            self.rng.gen_range(1.0 - self.jitter..=1.0 + self.jitter)
        } else {
            1.0
        };
        // Validated settings always yield a representable interval.
        let interval = Duration::try_from_secs_f64(self.period_secs * factor).unwrap_or_default();
        self.now = self.now.saturating_add(interval);
        self.now
    }
}
