//! Frame clock that turns host timestamps into integration deltas.

use std::time::Duration;

use meter_rider_core::{floor_frame_dt, MIN_FRAME_DT};

/// Tracks the previous host timestamp and the floored delta of the last frame.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SimulationClock {
    last_timestamp: Option<Duration>,
    dt: Duration,
}

impl SimulationClock {
    pub(crate) const fn new() -> Self {
        Self {
            last_timestamp: None,
            dt: MIN_FRAME_DT,
        }
    }

    /// Records a host timestamp and returns the floored delta since the last one.
    ///
    /// The first frame and any frame whose timestamp does not move forward
    /// integrate over the minimum delta.
    pub(crate) fn advance(&mut self, timestamp: Duration) -> Duration {
        let elapsed = match self.last_timestamp {
            Some(previous) => timestamp.saturating_sub(previous),
            None => Duration::ZERO,
        };
        self.last_timestamp = Some(timestamp);
        self.dt = floor_frame_dt(elapsed);
        self.dt
    }

    pub(crate) const fn dt(&self) -> Duration {
        self.dt
    }
}
