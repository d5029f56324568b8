use std::time::Duration;

use meter_rider_core::{Dynamics, GainDb, LoudnessTuning, Seed};
use meter_rider_system_metering::{
    follow, Ballistics, LoudnessWindow, MeterBank, PeakMeter, PpmMeter, VuMeter,
};
use meter_rider_system_signal::{RandomState, SignalGenerator};

const EPSILON: f64 = 1e-12;

fn jittered_frames(seed: u32, count: usize) -> Vec<Duration> {
    let mut random = RandomState::seeded(Seed::new(seed));
    (0..count)
        .map(|_| Duration::from_micros(500 + (random.next_unit() * 40_000.0) as u64))
        .collect()
}

#[test]
fn followers_converge_monotonically_without_overshoot() {
    let frames = jittered_frames(11, 400);
    for &(start, target) in &[(0.0, 0.8), (1.0, 0.1), (0.3, 0.3)] {
        for tau in [0.0005, 0.01, 0.05, 0.08, 0.3, 2.0] {
            let mut level = start;
            for &dt in &frames {
                let next = follow(level, target, tau, dt);
                if target >= start {
                    assert!(
                        next >= level - EPSILON && next <= target + EPSILON,
                        "rise overshot at tau {tau}"
                    );
                } else {
                    assert!(
                        next <= level + EPSILON && next >= target - EPSILON,
                        "fall overshot at tau {tau}"
                    );
                }
                level = next;
            }
        }
    }
}

#[test]
fn asymmetric_branches_are_individually_monotonic() {
    let ballistics = Ballistics {
        attack_tau: 0.01,
        release_tau: 0.08,
    };
    let frames = jittered_frames(5, 200);

    let mut rising = 0.0;
    for &dt in &frames {
        let next = ballistics.follow(rising, 0.9, dt);
        assert!(next >= rising - EPSILON && next <= 0.9 + EPSILON);
        rising = next;
    }

    let mut falling = 0.9;
    for &dt in &frames {
        let next = ballistics.follow(falling, 0.2, dt);
        assert!(next <= falling + EPSILON && next >= 0.2 - EPSILON);
        falling = next;
    }
}

#[test]
fn vu_is_frame_rate_independent() {
    let mut coarse = VuMeter::default();
    for _ in 0..30 {
        coarse = coarse.step(0.7, Duration::from_millis(33));
    }

    let mut fine = VuMeter::default();
    for _ in 0..90 {
        fine = fine.step(0.7, Duration::from_millis(11));
    }

    assert!((coarse.level() - fine.level()).abs() < 1e-9);
}

#[test]
fn peak_meter_tracks_transients_faster_than_vu() {
    let vu = VuMeter::default().step(1.0, Duration::from_millis(16));
    let peak = PeakMeter::default().step(1.0, Duration::from_millis(16));
    assert!(peak.level() > vu.level());
}

#[test]
fn ppm_hold_covers_core_under_program_material() {
    let seed = Seed::new(77);
    let generator = SignalGenerator::new(seed);
    let mut random = RandomState::seeded(seed);
    let mut ppm = PpmMeter::default();
    let mut wall = Duration::ZERO;

    for dt in jittered_frames(77, 2_000) {
        wall += dt;
        let (sample, advanced) =
            generator.next(random, GainDb::new(0.0), Dynamics::new(1.0), wall);
        random = advanced;

        let previous = ppm;
        ppm = ppm.step(sample, dt);

        assert!(ppm.hold() >= ppm.core(), "hold fell below core");
        if ppm.core() > previous.hold() {
            assert_eq!(ppm.hold(), ppm.core());
        } else if !ppm.hold_remaining().is_zero() {
            assert_eq!(ppm.hold(), previous.hold(), "hold released early");
        }
    }
}

#[test]
fn loudness_window_stays_within_one_frame_of_its_length() {
    let tuning = LoudnessTuning::default();
    let mut loudness = LoudnessWindow::new(tuning);
    let mut random = RandomState::seeded(Seed::new(9));

    for dt in jittered_frames(9, 5_000) {
        let _ = loudness.push(random.next_unit(), dt);
        let retained = loudness.retained_secs();
        assert!(retained <= tuning.window_secs + dt.as_secs_f64() + 1e-9);
        assert!(!loudness.is_empty());
        assert!(loudness.level().is_finite());
        assert!((0.0..=1.0).contains(&loudness.level()));
    }
}

#[test]
fn bank_replays_bit_identically() {
    let run = || {
        let seed = Seed::new(4_242);
        let generator = SignalGenerator::new(seed);
        let mut random = RandomState::seeded(seed);
        let mut bank = MeterBank::default();
        let mut loudness = LoudnessWindow::new(LoudnessTuning::default());
        let mut wall = Duration::ZERO;
        let mut trace = Vec::new();

        for dt in jittered_frames(1, 1_000) {
            wall += dt;
            let (sample, advanced) =
                generator.next(random, GainDb::new(-6.0), Dynamics::new(0.7), wall);
            random = advanced;
            bank = bank.step(sample, dt);
            let readings = bank.readings(loudness.push(sample, dt));
            trace.push([
                readings.vu.to_bits(),
                readings.peak.to_bits(),
                readings.ppm.to_bits(),
                readings.lufs.to_bits(),
            ]);
        }
        trace
    };

    assert_eq!(run(), run());
}
