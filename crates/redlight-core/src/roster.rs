use serde::{Deserialize, Serialize};

/// A player slot. Indices are stable for the whole session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub index: usize,
    pub eliminated: bool,
}

/// Elimination state for every player slot. Players are flagged, never removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerRoster {
    players: Vec<Player>,
}

impl PlayerRoster {
    pub fn new(count: usize) -> Self {
        Self {
            players: (0..count)
                .map(|index| Player {
                    index,
                    eliminated: false,
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn is_eliminated(&self, index: usize) -> bool {
        self.players.get(index).is_some_and(|p| p.eliminated)
    }

    /// Flag a player as eliminated. Returns `true` only the first time, so the
    /// caller announces each elimination once. Unknown indices are ignored.
    pub fn eliminate(&mut self, index: usize) -> bool {
        match self.players.get_mut(index) {
            Some(p) if !p.eliminated => {
                p.eliminated = true;
                true
            },
            _ => false,
        }
    }

    pub fn all_eliminated(&self) -> bool {
        self.players.iter().all(|p| p.eliminated)
    }

    /// Indices of players still in, ascending.
    pub fn survivors(&self) -> Vec<usize> {
        self.players
            .iter()
            .filter(|p| !p.eliminated)
            .map(|p| p.index)
            .collect()
    }

    /// Clear every elimination. Only a full restart does this.
    pub fn reset(&mut self) {
        for p in &mut self.players {
            p.eliminated = false;
        }
    }
}
