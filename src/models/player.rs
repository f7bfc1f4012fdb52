//! Player and PlayerInfo data structures.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a player (used in matchups and lookups).
pub type PlayerId = Uuid;

/// A roster entry. The display name is only used at the edges (file format, UI);
/// everything inside the session refers to players by `id`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Dropped players keep their history but are never paired again.
    pub dropped: bool,
}

impl Player {
    /// Create a new active player. The name is trimmed; validation happens in `Session::add_player`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            dropped: false,
        }
    }

    /// Name with everything but ASCII letters and digits removed.
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    /// Key used for case-insensitive uniqueness checks.
    pub fn lookup_key(&self) -> String {
        lookup_key(&self.name)
    }
}

/// Strip a name down to its ASCII alphanumeric characters.
pub fn normalize_name(name: &str) -> String {
    name.chars().filter(char::is_ascii_alphanumeric).collect()
}

/// Trimmed, lowercased name for duplicate detection.
pub fn lookup_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Derived standings snapshot for one player. Recomputed on every aggregation, never stored.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlayerInfo {
    pub player_id: PlayerId,
    pub name: String,
    pub dropped: bool,
    /// Sum of points earned in the aggregated rounds.
    pub score: f64,
    pub n_played: u32,
    pub n_wins: u32,
    /// Matchups marked delayed that have not been resolved yet.
    pub active_delays: u32,
    /// Mean match-win percentage of the opponents faced (byes excluded).
    pub resistance: f64,
}

impl PlayerInfo {
    pub fn new(player: &Player) -> Self {
        Self {
            player_id: player.id,
            name: player.name.clone(),
            dropped: player.dropped,
            score: 0.0,
            n_played: 0,
            n_wins: 0,
            active_delays: 0,
            resistance: 0.0,
        }
    }

    /// Wins divided by games played, 0 when nothing has been played.
    pub fn win_percentage(&self) -> f64 {
        if self.n_played == 0 {
            0.0
        } else {
            f64::from(self.n_wins) / f64::from(self.n_played)
        }
    }

    /// Score used for pairing: pending delayed games count as half a point.
    pub fn pairing_score(&self) -> f64 {
        self.score + 0.5 * f64::from(self.active_delays)
    }
}
