//! Session files describing a headless game run.

use std::{fs, path::Path, time::Duration};

use anyhow::{ensure, Context, Result};
use meter_rider_core::GameTuning;
use serde::Deserialize;

/// Contents of a TOML session file. Every table and key is optional.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct SessionFile {
    /// Game rules and calibration.
    pub(crate) game: GameTuning,
    /// Behaviour of the emulated host frame clock.
    pub(crate) host: HostSettings,
}

impl SessionFile {
    /// Reads and parses the session file at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read session file {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to load session file {}", path.display()))
    }

    pub(crate) fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse session toml contents")
    }
}

/// Frame pacing of the emulated display-driven host.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct HostSettings {
    /// Nominal refresh rate in frames per second.
    pub(crate) fps: f64,
    /// Relative spread of frame intervals around the nominal period, below one.
    pub(crate) jitter: f64,
    /// Seed of the frame interval generator.
    pub(crate) frame_seed: u64,
    /// Host seconds between one-second pauses, if pausing is exercised.
    pub(crate) pause_every_secs: Option<f64>,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            fps: 60.0,
            jitter: 0.0,
            frame_seed: 0x5eed_f00d,
            pause_every_secs: None,
        }
    }
}

impl HostSettings {
    /// Checks that the host clock can be emulated with these settings.
    pub(crate) fn validate(&self) -> Result<()> {
        ensure!(
            self.fps.is_finite() && self.fps > 0.0,
            "host fps must be positive, got {}",
            self.fps
        );
        ensure!(
            self.jitter.is_finite() && (0.0..1.0).contains(&self.jitter),
            "host jitter must lie in [0, 1), got {}",
            self.jitter
        );
        let longest_interval = (1.0 + self.jitter) / self.fps;
        ensure!(
            Duration::try_from_secs_f64(longest_interval).is_ok(),
            "host fps {} gives frame intervals too long to represent",
            self.fps
        );
        let _ = self.pause_every()?;
        Ok(())
    }

    /// Pause period of the host, if pausing is exercised.
    pub(crate) fn pause_every(&self) -> Result<Option<Duration>> {
        self.pause_every_secs
            .map(|secs| -> Result<Duration> {
                ensure!(
                    secs.is_finite() && secs > 0.0,
                    "pause period must be positive, got {secs}"
                );
                let period = Duration::try_from_secs_f64(secs)
                    .with_context(|| format!("pause period {secs} is out of range"))?;
                ensure!(!period.is_zero(), "pause period {secs} rounds to zero");
                Ok(period)
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let session = SessionFile::parse("").expect("empty session parses");
        assert_eq!(session, SessionFile::default());
    }

    #[test]
    fn nested_tables_override_defaults() {
        let session = SessionFile::parse(
            r#"
            [game]
            rounds = 2
            round_duration_secs = 5.0

            [game.scoring]
            target_gain_db = -9.0

            [host]
            fps = 144.0
            jitter = 0.25
            "#,
        )
        .expect("session parses");

        assert_eq!(session.game.rounds, 2);
        assert_eq!(session.game.round_duration_secs, 5.0);
        assert_eq!(session.game.scoring.target_gain_db, -9.0);
        assert_eq!(session.game.seed, GameTuning::default().seed);
        assert_eq!(session.host.fps, 144.0);
        assert_eq!(session.host.jitter, 0.25);
        assert_eq!(session.host.pause_every_secs, None);
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(file, "[game]\nseed = 99").expect("write session");

        let session = SessionFile::load(file.path()).expect("session loads");
        assert_eq!(session.game.seed, 99);
    }

    #[test]
    fn missing_file_reports_path() {
        let error = SessionFile::load(Path::new("/nonexistent/meter-rider.toml"))
            .expect_err("missing file fails");
        assert!(format!("{error:#}").contains("/nonexistent/meter-rider.toml"));
    }

    #[test]
    fn malformed_file_is_rejected() {
        assert!(SessionFile::parse("[game]\nrounds = \"many\"").is_err());
    }

    #[test]
    fn host_settings_are_validated() {
        assert!(HostSettings::default().validate().is_ok());
        let fast = HostSettings {
            fps: 0.0,
            ..HostSettings::default()
        };
        assert!(fast.validate().is_err());
        let shaky = HostSettings {
            jitter: 1.0,
            ..HostSettings::default()
        };
        assert!(shaky.validate().is_err());
        let pausing = HostSettings {
            pause_every_secs: Some(-1.0),
            ..HostSettings::default()
        };
        assert!(pausing.validate().is_err());
    }

    #[test]
    fn unrepresentable_durations_are_rejected() {
        let glacial = HostSettings {
            fps: 1e-300,
            ..HostSettings::default()
        };
        assert!(glacial.validate().is_err());

        let distant = HostSettings {
            pause_every_secs: Some(1e20),
            ..HostSettings::default()
        };
        let error = distant.validate().expect_err("pause period overflows");
        assert!(format!("{error:#}").contains("out of range"));

        let instant = HostSettings {
            pause_every_secs: Some(1e-12),
            ..HostSettings::default()
        };
        assert!(instant.validate().is_err());

        let pausing = HostSettings {
            pause_every_secs: Some(2.5),
            ..HostSettings::default()
        };
        assert_eq!(
            pausing.pause_every().expect("valid period"),
            Some(Duration::from_millis(2_500))
        );
        assert_eq!(HostSettings::default().pause_every().expect("no pauses"), None);
    }
}
