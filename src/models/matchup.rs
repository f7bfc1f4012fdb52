//! Matchup, Winner and Round: one pairing, its result, and a round of pairings.

use crate::models::player::PlayerId;
use serde::{Deserialize, Serialize};

/// Notes attached to every bye matchup.
pub const BYE_NOTE: &str = "BYE";

/// Recorded outcome of a matchup. `None` on the matchup means nothing was selected yet.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    Player1,
    Player2,
    /// Played, but nobody is credited with the win (e.g. a draw or double loss).
    NoWinner,
    /// Deferred; counts as half a point for pairing until resolved.
    Delayed,
}

/// A single pairing. `player2 == None` is a bye.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Matchup {
    pub player1: PlayerId,
    pub player2: Option<PlayerId>,
    pub winner: Option<Winner>,
    pub score_player1: f64,
    pub score_player2: f64,
    pub notes: String,
}

impl Matchup {
    /// Unplayed matchup between two players.
    pub fn new(player1: PlayerId, player2: PlayerId) -> Self {
        Self {
            player1,
            player2: Some(player2),
            winner: None,
            score_player1: 0.0,
            score_player2: 0.0,
            notes: String::new(),
        }
    }

    /// Bye: player1 wins and scores a full point at creation.
    pub fn bye(player1: PlayerId) -> Self {
        Self {
            player1,
            player2: None,
            winner: Some(Winner::Player1),
            score_player1: 1.0,
            score_player2: 0.0,
            notes: BYE_NOTE.to_string(),
        }
    }

    pub fn is_bye(&self) -> bool {
        self.player2.is_none()
    }

    pub fn is_resolved(&self) -> bool {
        self.winner.is_some()
    }

    pub fn is_delayed(&self) -> bool {
        self.winner == Some(Winner::Delayed)
    }

    pub fn involves(&self, player: PlayerId) -> bool {
        self.player1 == player || self.player2 == Some(player)
    }

    /// Id of the winning player, if a player (not a sentinel) won.
    pub fn winner_id(&self) -> Option<PlayerId> {
        match self.winner? {
            Winner::Player1 => Some(self.player1),
            Winner::Player2 => self.player2,
            Winner::NoWinner | Winner::Delayed => None,
        }
    }

    /// Standard results award 0 or 1 points in total.
    pub fn has_standard_scores(&self) -> bool {
        let sum = self.score_player1 + self.score_player2;
        sum.abs() < 1e-9 || (sum - 1.0).abs() < 1e-9
    }
}

/// One round of matchups. A locked round has been committed to the standings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub matchups: Vec<Matchup>,
    pub locked: bool,
}

impl Round {
    pub fn new(matchups: Vec<Matchup>) -> Self {
        Self {
            matchups,
            locked: false,
        }
    }

    /// True when every matchup has something selected as winner (delays included).
    pub fn is_resolved(&self) -> bool {
        self.matchups.iter().all(Matchup::is_resolved)
    }

    pub fn delayed_count(&self) -> usize {
        self.matchups.iter().filter(|m| m.is_delayed()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn bye_is_won_by_player1_with_full_point() {
        let p = Uuid::new_v4();
        let m = Matchup::bye(p);
        assert!(m.is_bye());
        assert_eq!(m.winner_id(), Some(p));
        assert_eq!(m.score_player1, 1.0);
        assert_eq!(m.notes, BYE_NOTE);
    }

    #[test]
    fn sentinel_winners_have_no_winner_id() {
        let mut m = Matchup::new(Uuid::new_v4(), Uuid::new_v4());
        assert!(!m.is_resolved());
        m.winner = Some(Winner::Delayed);
        assert!(m.is_resolved());
        assert!(m.is_delayed());
        assert_eq!(m.winner_id(), None);
        m.winner = Some(Winner::NoWinner);
        assert_eq!(m.winner_id(), None);
    }

    #[test]
    fn standard_scores_sum_to_zero_or_one() {
        let mut m = Matchup::new(Uuid::new_v4(), Uuid::new_v4());
        assert!(m.has_standard_scores());
        m.score_player1 = 0.5;
        m.score_player2 = 0.5;
        assert!(m.has_standard_scores());
        m.score_player2 = 1.0;
        assert!(!m.has_standard_scores());
    }
}
