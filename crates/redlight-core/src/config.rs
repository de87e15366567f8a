use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::detector::MotionDetector;
use crate::error::ConfigError;

/// Which way the camera faces. Only the host's rendering cares; detection
/// always works on frames that are already oriented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraFacing {
    #[default]
    User,
    Environment,
}

/// Per-session game settings chosen on the setup screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    /// Number of players, one vertical zone each.
    pub player_count: usize,
    /// Motion sensitivity, 1 (lenient) to 100 (strict).
    pub sensitivity: u8,
    /// Narration playback rate multiplier.
    pub speed: f32,
    /// Phrase spoken during every green phase.
    pub phrase: String,
    /// Rounds to play before survivors are declared winners.
    pub total_rounds: u32,
    pub camera_facing: CameraFacing,
    /// Fixes the detection-window RNG. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            player_count: 2,
            sensitivity: 50,
            speed: 1.0,
            phrase: "Red light, green light, one, two, three!".to_string(),
            total_rounds: 5,
            camera_facing: CameraFacing::default(),
            seed: None,
        }
    }
}

impl GameSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.player_count == 0 {
            return Err(ConfigError::NoPlayers);
        }
        if !(1..=100).contains(&self.sensitivity) {
            return Err(ConfigError::SensitivityOutOfRange(self.sensitivity));
        }
        if !self.speed.is_finite() || self.speed <= 0.0 {
            return Err(ConfigError::InvalidSpeed(self.speed));
        }
        if self.phrase.trim().is_empty() {
            return Err(ConfigError::EmptyPhrase);
        }
        if self.total_rounds == 0 {
            return Err(ConfigError::NoRounds);
        }
        Ok(())
    }
}

/// Phase timing constants, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Pause after entering green before narration starts.
    pub narration_lead_in_ms: u64,
    /// Delay used in place of narration when speech fails, before dividing by speed.
    pub narration_fallback_ms: u64,
    /// Reaction time between the freeze call and reference capture.
    pub grace_ms: u64,
    /// Shortest detection window.
    pub detect_min_ms: u64,
    /// Longest detection window (inclusive).
    pub detect_max_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            narration_lead_in_ms: 800,
            narration_fallback_ms: 3000,
            grace_ms: 600,
            detect_min_ms: 2000,
            detect_max_ms: 4000,
        }
    }
}

impl TimingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.detect_min_ms > self.detect_max_ms {
            return Err(ConfigError::DetectionWindowInverted {
                min_ms: self.detect_min_ms,
                max_ms: self.detect_max_ms,
            });
        }
        Ok(())
    }

    pub fn lead_in(&self) -> Duration {
        Duration::from_millis(self.narration_lead_in_ms)
    }

    /// Fallback delay scaled by narration speed, so faster games stay faster
    /// even without a voice.
    pub fn fallback(&self, speed: f32) -> Duration {
        let speed = if speed.is_finite() && speed > 0.0 {
            f64::from(speed)
        } else {
            1.0
        };
        let nanos = self.narration_fallback_ms as f64 * 1_000_000.0 / speed;
        Duration::from_nanos(nanos.round() as u64)
    }

    pub fn grace(&self) -> Duration {
        Duration::from_millis(self.grace_ms)
    }
}

/// Everything a session needs, fixed from start to game over.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub game: GameSettings,
    pub timing: TimingConfig,
    pub detector: MotionDetector,
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.game.validate()?;
        self.timing.validate()?;
        self.detector.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = SessionConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.game.player_count, 2);
        assert_eq!(cfg.game.sensitivity, 50);
        assert_eq!(cfg.game.total_rounds, 5);
        assert_eq!(cfg.timing.grace_ms, 600);
        assert_eq!(cfg.timing.detect_min_ms, 2000);
        assert_eq!(cfg.timing.detect_max_ms, 4000);
    }

    #[test]
    fn rejects_zero_players() {
        let game = GameSettings {
            player_count: 0,
            ..GameSettings::default()
        };
        assert_eq!(game.validate(), Err(ConfigError::NoPlayers));
    }

    #[test]
    fn rejects_sensitivity_outside_range() {
        for sensitivity in [0, 101, 255] {
            let game = GameSettings {
                sensitivity,
                ..GameSettings::default()
            };
            assert_eq!(
                game.validate(),
                Err(ConfigError::SensitivityOutOfRange(sensitivity))
            );
        }
    }

    #[test]
    fn rejects_bad_speed() {
        for speed in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let game = GameSettings {
                speed,
                ..GameSettings::default()
            };
            assert!(matches!(game.validate(), Err(ConfigError::InvalidSpeed(_))));
        }
    }

    #[test]
    fn rejects_blank_phrase_and_zero_rounds() {
        let blank = GameSettings {
            phrase: "   ".to_string(),
            ..GameSettings::default()
        };
        assert_eq!(blank.validate(), Err(ConfigError::EmptyPhrase));

        let no_rounds = GameSettings {
            total_rounds: 0,
            ..GameSettings::default()
        };
        assert_eq!(no_rounds.validate(), Err(ConfigError::NoRounds));
    }

    #[test]
    fn rejects_inverted_detection_window() {
        let timing = TimingConfig {
            detect_min_ms: 4000,
            detect_max_ms: 2000,
            ..TimingConfig::default()
        };
        assert!(matches!(
            timing.validate(),
            Err(ConfigError::DetectionWindowInverted { .. })
        ));
    }

    #[test]
    fn fallback_scales_with_speed() {
        let timing = TimingConfig::default();
        assert_eq!(timing.fallback(1.0), Duration::from_millis(3000));
        assert_eq!(timing.fallback(2.0), Duration::from_millis(1500));
        // Invalid speeds never reach here through validation, but stay finite.
        assert_eq!(timing.fallback(0.0), Duration::from_millis(3000));
    }

    #[test]
    fn parse_partial_toml() {
        let toml_str = r#"
[game]
player_count = 4
sensitivity = 80
camera_facing = "environment"

[timing]
grace_ms = 500
"#;
        let cfg: SessionConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.game.player_count, 4);
        assert_eq!(cfg.game.sensitivity, 80);
        assert_eq!(cfg.game.camera_facing, CameraFacing::Environment);
        assert_eq!(cfg.game.total_rounds, 5);
        assert_eq!(cfg.timing.grace_ms, 500);
        assert_eq!(cfg.timing.narration_lead_in_ms, 800);
        assert_eq!(cfg.detector, MotionDetector::default());
    }
}
