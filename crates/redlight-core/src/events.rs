use serde::{Deserialize, Serialize};

use crate::phase::GamePhase;

/// How a game ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameOutcome {
    /// Everyone was caught moving before the window closed.
    AllEliminated,
    /// Survivors of the final round, ascending player index.
    Winners { players: Vec<usize> },
    /// The final window closed with nobody left.
    NoSurvivors,
}

impl GameOutcome {
    pub fn from_survivors(players: Vec<usize>) -> Self {
        if players.is_empty() {
            Self::NoSurvivors
        } else {
            Self::Winners { players }
        }
    }
}

impl std::fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AllEliminated => write!(f, "all players eliminated"),
            Self::NoSurvivors => write!(f, "nobody survived to the end"),
            Self::Winners { players } => {
                // Players are numbered from 1 on screen.
                let names: Vec<String> = players.iter().map(|p| format!("P{}", p + 1)).collect();
                write!(f, "winners: {}", names.join(", "))
            },
        }
    }
}

/// Notifications for UI and audio collaborators. Observers only ever see
/// these by shared reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    PhaseChanged { phase: GamePhase },
    PlayerEliminated { player: usize },
    RoundChanged { round: u32, total: u32 },
    GameOver { outcome: GameOutcome },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_from_survivors() {
        assert_eq!(GameOutcome::from_survivors(vec![]), GameOutcome::NoSurvivors);
        assert_eq!(
            GameOutcome::from_survivors(vec![0, 2]),
            GameOutcome::Winners {
                players: vec![0, 2]
            }
        );
    }

    #[test]
    fn outcome_display_is_one_based() {
        let o = GameOutcome::Winners {
            players: vec![0, 2],
        };
        assert_eq!(o.to_string(), "winners: P1, P3");
    }

    #[test]
    fn event_json_shape() {
        let json = serde_json::to_value(GameEvent::PhaseChanged {
            phase: GamePhase::RedDetecting,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"event": "phase_changed", "phase": "red-detecting"})
        );

        let json = serde_json::to_value(GameEvent::GameOver {
            outcome: GameOutcome::Winners { players: vec![1] },
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "event": "game_over",
                "outcome": {"kind": "winners", "players": [1]}
            })
        );
    }

    #[test]
    fn event_json_parses_back() {
        let text = r#"{"event":"round_changed","round":2,"total":5}"#;
        let event: GameEvent = serde_json::from_str(text).unwrap();
        assert_eq!(event, GameEvent::RoundChanged { round: 2, total: 5 });
    }
}
