use std::{collections::VecDeque, time::Duration};

use meter_rider_core::{floor_frame_dt, LoudnessTuning};

const DURATION_FLOOR: f64 = 1e-6;

/// Sliding-window RMS integrator exposed as the loudness meter.
///
/// This is a plain energy average over a trailing time window. It carries no
/// K-weighting and no gating, so it only approximates LUFS.
#[derive(Clone, Debug)]
pub struct LoudnessWindow {
    window_secs: f64,
    entries: VecDeque<EnergyEntry>,
    level: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct EnergyEntry {
    energy: f64,
    duration: f64,
}

impl LoudnessWindow {
    /// Creates an empty window using the provided configuration.
    #[must_use]
    pub fn new(tuning: LoudnessTuning) -> Self {
        Self {
            window_secs: tuning.window_secs,
            entries: VecDeque::new(),
            level: 0.0,
        }
    }

    /// Most recently computed loudness.
    #[must_use]
    pub const fn level(&self) -> f64 {
        self.level
    }

    /// Number of frames currently retained.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether the window holds no frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total duration in seconds covered by the retained frames.
    #[must_use]
    pub fn retained_secs(&self) -> f64 {
        self.entries.iter().map(|entry| entry.duration).sum()
    }

    /// Length of the configured window in seconds.
    #[must_use]
    pub const fn window_secs(&self) -> f64 {
        self.window_secs
    }

    /// Drops every retained frame.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.level = 0.0;
    }

    /// Appends one frame and returns the updated loudness.
    pub fn push(&mut self, sample: f64, dt: Duration) -> f64 {
        self.entries.push_back(EnergyEntry {
            energy: sample * sample,
            duration: floor_frame_dt(dt).as_secs_f64(),
        });
        self.trim();
        self.level = self.integrate();
        self.level
    }

    // Walks back from the newest frame; the frame that pushes the total past
    // the window goes, together with everything older. The newest frame stays.
    fn trim(&mut self) {
        let mut total = 0.0;
        let mut overflow = None;
        for (index, entry) in self.entries.iter().enumerate().rev() {
            total += entry.duration;
            if total > self.window_secs {
                overflow = Some(index);
                break;
            }
        }

        if let Some(index) = overflow {
            let newest = self.entries.len().saturating_sub(1);
            let keep_from = (index + 1).min(newest);
            let _ = self.entries.drain(..keep_from);
        }
    }

    fn integrate(&self) -> f64 {
        let (weighted, duration) = self
            .entries
            .iter()
            .fold((0.0, 0.0), |(weighted, duration), entry| {
                (
                    weighted + entry.energy * entry.duration,
                    duration + entry.duration,
                )
            });
        let level = (weighted / f64::max(DURATION_FLOOR, duration)).sqrt();
        if level.is_finite() {
            level
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> LoudnessWindow {
        LoudnessWindow::new(LoudnessTuning::default())
    }

    #[test]
    fn constant_input_reads_its_own_level() {
        let mut loudness = window();
        let mut level = 0.0;
        for _ in 0..100 {
            level = loudness.push(0.5, Duration::from_millis(16));
        }
        assert!((level - 0.5).abs() < 1e-12);
    }

    #[test]
    fn empty_window_reads_zero() {
        let loudness = window();
        assert!(loudness.is_empty());
        assert_eq!(loudness.level(), 0.0);
        assert_eq!(loudness.integrate(), 0.0);
        assert_eq!(loudness.window_secs(), 3.0);
    }

    #[test]
    fn crossing_frame_is_dropped_with_older_frames() {
        let mut loudness = LoudnessWindow::new(LoudnessTuning { window_secs: 0.05 });
        for _ in 0..3 {
            let _ = loudness.push(1.0, Duration::from_millis(20));
        }
        assert_eq!(loudness.len(), 2);
        assert!((loudness.retained_secs() - 0.04).abs() < 1e-12);
    }

    #[test]
    fn oversized_frame_is_kept_alone() {
        let mut loudness = window();
        let _ = loudness.push(0.2, Duration::from_millis(16));
        let level = loudness.push(0.7, Duration::from_secs(5));
        assert_eq!(loudness.len(), 1);
        assert!((level - 0.7).abs() < 1e-12);
    }

    #[test]
    fn energy_is_weighted_by_duration() {
        let mut loudness = window();
        let _ = loudness.push(1.0, Duration::from_millis(30));
        let level = loudness.push(0.0, Duration::from_millis(10));
        assert!((level - 0.75f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn clear_resets_level() {
        let mut loudness = window();
        let _ = loudness.push(0.9, Duration::from_millis(16));
        loudness.clear();
        assert!(loudness.is_empty());
        assert_eq!(loudness.level(), 0.0);
    }
}
