use serde::{Deserialize, Serialize};

use redlight_core::config::{GameSettings, SessionConfig, TimingConfig};
use redlight_core::detector::MotionDetector;
use redlight_core::error::ConfigError;

const DEFAULT_PATH: &str = "redlight.toml";

/// Top-level host configuration, loaded from `redlight.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub game: GameSettings,
    pub timing: TimingConfig,
    pub detector: MotionDetector,
    pub video: VideoConfig,
    pub narration: NarrationConfig,
}

/// Synthetic camera output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    pub width: u32,
    pub height: u32,
    /// Analysis ticks per second.
    pub fps: u32,
    /// Players whose zone changes on every frame.
    pub fidgeting: Vec<usize>,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 180,
            fps: 30,
            fidgeting: Vec::new(),
        }
    }
}

/// Simulated speech engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrationConfig {
    /// Speaking time per word at rate 1.0.
    pub word_ms: u64,
    /// Report every utterance as failed instead of finished.
    pub force_failure: bool,
    /// How long a forced failure takes to surface.
    pub failure_delay_ms: u64,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            word_ms: 350,
            force_failure: false,
            failure_delay_ms: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostConfigError {
    Session(ConfigError),
    ZeroFps,
    EmptyFrame { width: u32, height: u32 },
    /// Every player needs at least one column of the frame.
    TooNarrow { width: u32, players: usize },
    FidgetOutOfRange { player: usize, players: usize },
}

impl std::fmt::Display for HostConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Session(e) => write!(f, "{e}"),
            Self::ZeroFps => write!(f, "video.fps must be > 0"),
            Self::EmptyFrame { width, height } => {
                write!(f, "video frame must not be empty, got {width}x{height}")
            },
            Self::TooNarrow { width, players } => write!(
                f,
                "video.width {width} is too narrow for {players} players"
            ),
            Self::FidgetOutOfRange { player, players } => write!(
                f,
                "video.fidgeting names player {player} but only {players} are playing"
            ),
        }
    }
}

impl std::error::Error for HostConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Session(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for HostConfigError {
    fn from(e: ConfigError) -> Self {
        Self::Session(e)
    }
}

impl HostConfig {
    /// The part of the config the core state machine consumes.
    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            game: self.game.clone(),
            timing: self.timing.clone(),
            detector: self.detector,
        }
    }

    pub fn validate(&self) -> Result<(), HostConfigError> {
        self.session().validate()?;
        if self.video.fps == 0 {
            return Err(HostConfigError::ZeroFps);
        }
        if self.video.width == 0 || self.video.height == 0 {
            return Err(HostConfigError::EmptyFrame {
                width: self.video.width,
                height: self.video.height,
            });
        }
        let players = self.game.player_count;
        if (self.video.width as usize) < players {
            return Err(HostConfigError::TooNarrow {
                width: self.video.width,
                players,
            });
        }
        if let Some(&player) = self.video.fidgeting.iter().find(|&&p| p >= players) {
            return Err(HostConfigError::FidgetOutOfRange { player, players });
        }
        Ok(())
    }

    /// Load config from `redlight.toml` (or `$REDLIGHT_CONFIG`) if it exists,
    /// then apply env var overrides.
    pub fn load() -> Self {
        let path = match std::env::var("REDLIGHT_CONFIG") {
            Ok(p) if !p.is_empty() => p,
            _ => DEFAULT_PATH.to_string(),
        };
        let mut config = match std::fs::read_to_string(&path) {
            Ok(content) => match toml::from_str::<HostConfig>(&content) {
                Ok(cfg) => {
                    tracing::info!(path = %path, "Loaded configuration");
                    cfg
                },
                Err(e) => {
                    tracing::warn!(path = %path, "Failed to parse config: {e}, using defaults");
                    HostConfig::default()
                },
            },
            Err(_) => {
                tracing::info!(path = %path, "No config file found, using defaults");
                HostConfig::default()
            },
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Apply `REDLIGHT_*` overrides from `lookup`. Unparseable values are
    /// logged and ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("REDLIGHT_PLAYERS") {
            match val.parse::<usize>() {
                Ok(n) => self.game.player_count = n,
                Err(_) => tracing::warn!(value = %val, "ignoring REDLIGHT_PLAYERS"),
            }
        }
        if let Some(val) = lookup("REDLIGHT_SENSITIVITY") {
            match val.parse::<u8>() {
                Ok(n) => self.game.sensitivity = n,
                Err(_) => tracing::warn!(value = %val, "ignoring REDLIGHT_SENSITIVITY"),
            }
        }
        if let Some(val) = lookup("REDLIGHT_SPEED") {
            match val.parse::<f32>() {
                Ok(n) => self.game.speed = n,
                Err(_) => tracing::warn!(value = %val, "ignoring REDLIGHT_SPEED"),
            }
        }
        if let Some(val) = lookup("REDLIGHT_ROUNDS") {
            match val.parse::<u32>() {
                Ok(n) => self.game.total_rounds = n,
                Err(_) => tracing::warn!(value = %val, "ignoring REDLIGHT_ROUNDS"),
            }
        }
        if let Some(phrase) = lookup("REDLIGHT_PHRASE")
            && !phrase.trim().is_empty()
        {
            self.game.phrase = phrase;
        }
        if let Some(val) = lookup("REDLIGHT_SEED") {
            match val.parse::<u64>() {
                Ok(n) => self.game.seed = Some(n),
                Err(_) => tracing::warn!(value = %val, "ignoring REDLIGHT_SEED"),
            }
        }
    }
}
