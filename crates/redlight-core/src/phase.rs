use serde::{Deserialize, Serialize};

/// The single active phase of a session. Every timer callback, narration
/// notification and analysis tick checks it before touching state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GamePhase {
    #[default]
    Idle,
    Green,
    RedGrace,
    RedDetecting,
    #[serde(rename = "gameover")]
    GameOver,
}

impl GamePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Green => "green",
            Self::RedGrace => "red-grace",
            Self::RedDetecting => "red-detecting",
            Self::GameOver => "gameover",
        }
    }

    /// Red light is showing (players should be frozen).
    pub fn is_red(self) -> bool {
        matches!(self, Self::RedGrace | Self::RedDetecting)
    }
}

impl std::fmt::Display for GamePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
