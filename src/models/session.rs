//! Session: the roster and match history, plus the error type shared by all operations.

use crate::models::matchup::{Matchup, Round};
use crate::models::player::{lookup_key, Player, PlayerId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during session operations.
///
/// Validation errors leave the session untouched; the message is meant to be shown to the operator.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SessionError {
    /// Another player already has this name (case-insensitive).
    #[error("A player named \"{0}\" already exists")]
    DuplicatePlayer(String),
    /// The name collides with a winner-column sentinel.
    #[error("\"{0}\" is reserved and cannot be used as a player name")]
    ReservedName(String),
    /// The name is blank after trimming.
    #[error("Player name cannot be empty")]
    EmptyName,
    /// Nobody is eligible for pairing.
    #[error("No active players to pair; import players or undrop some first")]
    EmptyRoster,
    /// Too few participants for a bracket.
    #[error("Need at least {needed} participants (found {found})")]
    InsufficientParticipants { needed: usize, found: usize },
    /// History rules out a complete pairing.
    #[error("No valid pairing exists without repeat matchups or byes ({unmatched} player(s) left over)")]
    NoFeasiblePairing { unmatched: usize },
    /// The session file could not be parsed or failed validation.
    #[error("Invalid session file: {0}")]
    InvalidSessionFormat(String),
    /// A matchup still has no result selected.
    #[error(
        "Round {}, matchup {} has no winner; record a result before generating the next round",
        .round + 1,
        .matchup + 1
    )]
    UnresolvedMatchup { round: usize, matchup: usize },
    /// No round with this index.
    #[error("Round {} not found", .0 + 1)]
    RoundNotFound(usize),
    /// No matchup with this index in the round.
    #[error("Round {} has no matchup {}", .round + 1, .matchup + 1)]
    MatchupNotFound { round: usize, matchup: usize },
    /// No player with this id or name.
    #[error("Player not found: {0}")]
    PlayerNotFound(String),
    /// The round is committed and no longer editable.
    #[error("Round {} is locked", .0 + 1)]
    RoundLocked(usize),
    /// The round was committed before.
    #[error("Round {} has already been committed", .0 + 1)]
    RoundAlreadyCommitted(usize),
    /// Only the latest round may be deleted.
    #[error("Only the last round can be deleted")]
    NotLastRound,
    /// The chosen winner does not fit the matchup.
    #[error("That player is not part of this matchup")]
    InvalidWinner,
}

/// Unique identifier for a session (one tournament being run).
pub type SessionId = Uuid;

/// Strings used as sentinels in the winner column; never valid player names.
pub const RESERVED_NAMES: [&str; 4] = ["no winner", "delayed", "select winner...", "bye"];

/// True if `name` collides with a sentinel string (case-insensitive, trimmed).
pub fn is_reserved_name(name: &str) -> bool {
    let key = lookup_key(name);
    RESERVED_NAMES.iter().any(|r| *r == key)
}

/// Roster and match history. Owned by the caller; the algorithms only ever borrow it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub players: Vec<Player>,
    pub rounds: Vec<Round>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Create an empty session.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            players: Vec::new(),
            rounds: Vec::new(),
        }
    }

    /// Create a session from existing players and rounds (e.g. after an import).
    pub fn with_history(players: Vec<Player>, rounds: Vec<Round>) -> Self {
        Self {
            players,
            rounds,
            ..Self::new()
        }
    }

    pub fn get_player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Exact (case-sensitive) name lookup, as used at the file boundary.
    pub fn find_player_by_name(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.name == name)
    }

    /// Case-insensitive lookup, as used for pasted or typed names.
    pub fn find_player_loose(&self, name: &str) -> Option<&Player> {
        let key = lookup_key(name);
        self.players.iter().find(|p| p.lookup_key() == key)
    }

    /// Display name for an id, or an empty string when the id is unknown.
    pub fn player_name(&self, id: PlayerId) -> &str {
        self.get_player(id).map(|p| p.name.as_str()).unwrap_or("")
    }

    /// Check that `name` may be given to a player. `except` is ignored in the duplicate check (for renames).
    pub fn validate_new_name(&self, name: &str, except: Option<PlayerId>) -> Result<String, SessionError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(SessionError::EmptyName);
        }
        if is_reserved_name(trimmed) {
            return Err(SessionError::ReservedName(trimmed.to_string()));
        }
        let key = lookup_key(trimmed);
        let is_duplicate = self
            .players
            .iter()
            .any(|p| Some(p.id) != except && p.lookup_key() == key);
        if is_duplicate {
            return Err(SessionError::DuplicatePlayer(trimmed.to_string()));
        }
        Ok(trimmed.to_string())
    }

    /// Add a player. Names must be unique (case-insensitive) and not reserved.
    pub fn add_player(&mut self, name: impl Into<String>) -> Result<PlayerId, SessionError> {
        let name = self.validate_new_name(&name.into(), None)?;
        let player = Player::new(name);
        let id = player.id;
        log::info!("Added player {}", player.name);
        self.players.push(player);
        Ok(id)
    }

    /// Rename a player. History is keyed by id, so past matchups follow the new name.
    pub fn rename_player(&mut self, id: PlayerId, name: &str) -> Result<(), SessionError> {
        let name = self.validate_new_name(name, Some(id))?;
        let player = self
            .players
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| SessionError::PlayerNotFound(id.to_string()))?;
        log::info!("Renamed player {} to {}", player.name, name);
        player.name = name;
        Ok(())
    }

    /// Drop or re-activate a player. Dropped players are skipped by future pairings.
    pub fn set_dropped(&mut self, id: PlayerId, dropped: bool) -> Result<(), SessionError> {
        let player = self
            .players
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| SessionError::PlayerNotFound(id.to_string()))?;
        player.dropped = dropped;
        log::info!(
            "{} is now {}",
            player.name,
            if dropped { "dropped" } else { "active" }
        );
        Ok(())
    }

    /// Players that will be considered for the next pairing.
    pub fn active_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| !p.dropped)
    }

    pub fn round(&self, round: usize) -> Result<&Round, SessionError> {
        self.rounds.get(round).ok_or(SessionError::RoundNotFound(round))
    }

    pub fn matchup(&self, round: usize, matchup: usize) -> Result<&Matchup, SessionError> {
        self.round(round)?
            .matchups
            .get(matchup)
            .ok_or(SessionError::MatchupNotFound { round, matchup })
    }

    pub(crate) fn matchup_mut(&mut self, round: usize, matchup: usize) -> Result<&mut Matchup, SessionError> {
        self.rounds
            .get_mut(round)
            .ok_or(SessionError::RoundNotFound(round))?
            .matchups
            .get_mut(matchup)
            .ok_or(SessionError::MatchupNotFound { round, matchup })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_player_rejects_case_insensitive_duplicates() {
        let mut s = Session::new();
        s.add_player("Alice").unwrap();
        assert_eq!(
            s.add_player("  alice "),
            Err(SessionError::DuplicatePlayer("alice".to_string()))
        );
        assert_eq!(s.players.len(), 1);
    }

    #[test]
    fn add_player_rejects_reserved_and_empty_names() {
        let mut s = Session::new();
        assert_eq!(s.add_player("   "), Err(SessionError::EmptyName));
        assert!(matches!(s.add_player("Delayed"), Err(SessionError::ReservedName(_))));
        assert!(matches!(s.add_player("NO WINNER"), Err(SessionError::ReservedName(_))));
        assert!(matches!(s.add_player("Select winner..."), Err(SessionError::ReservedName(_))));
        assert!(s.players.is_empty());
    }

    #[test]
    fn rename_allows_changing_case_of_own_name() {
        let mut s = Session::new();
        let a = s.add_player("alice").unwrap();
        s.add_player("Bob").unwrap();
        s.rename_player(a, "Alice").unwrap();
        assert_eq!(s.player_name(a), "Alice");
        assert!(matches!(s.rename_player(a, "BOB"), Err(SessionError::DuplicatePlayer(_))));
    }

    #[test]
    fn error_messages_number_rounds_from_one() {
        assert_eq!(SessionError::RoundNotFound(0).to_string(), "Round 1 not found");
        assert_eq!(
            SessionError::MatchupNotFound { round: 1, matchup: 2 }.to_string(),
            "Round 2 has no matchup 3"
        );
        assert_eq!(SessionError::RoundLocked(2).to_string(), "Round 3 is locked");
        assert!(SessionError::UnresolvedMatchup { round: 0, matchup: 0 }
            .to_string()
            .starts_with("Round 1, matchup 1 has no winner"));
    }

    #[test]
    fn set_dropped_excludes_from_active_players() {
        let mut s = Session::new();
        let a = s.add_player("A").unwrap();
        s.add_player("B").unwrap();
        s.set_dropped(a, true).unwrap();
        let active: Vec<_> = s.active_players().map(|p| p.name.as_str()).collect();
        assert_eq!(active, vec!["B"]);
    }
}
