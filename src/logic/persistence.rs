//! Session file format: players and matchups referenced by name, as stored on disk.
//!
//! ```json
//! { "players": { "Alice": false, "Bob": true },
//!   "rounds": [ { "matchups": [ { "player1": "Alice", "player2": null, "winner": "Alice",
//!                                 "score_player1": 1.0, "score_player2": 0.0, "notes": "BYE" } ],
//!                 "locked": true } ] }
//! ```

use crate::models::{is_reserved_name, lookup_key, Matchup, Player, PlayerId, Round, Session, SessionError, SessionId, Winner};
use chrono::{DateTime, TimeZone};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;

pub const NO_WINNER: &str = "No Winner";
pub const DELAYED: &str = "Delayed";

#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    players: PlayerFlags,
    #[serde(default)]
    rounds: Vec<RoundRecord>,
}

/// Roster entries in file order, written as a JSON object of name to drop flag.
/// A name that appears twice in the object is rejected rather than overwritten.
#[derive(Debug)]
struct PlayerFlags(Vec<(String, Value)>);

impl Serialize for PlayerFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, dropped) in &self.0 {
            map.serialize_entry(name, dropped)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PlayerFlags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FlagsVisitor;

        impl<'de> Visitor<'de> for FlagsVisitor {
            type Value = PlayerFlags;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping player names to drop flags")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<PlayerFlags, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                let mut seen = HashSet::new();
                while let Some((name, dropped)) = access.next_entry::<String, serde_json::Value>()? {
                    if !seen.insert(name.clone()) {
                        return Err(de::Error::custom(SessionError::DuplicatePlayer(name)));
                    }
                    entries.push((name, dropped));
                }
                Ok(PlayerFlags(entries))
            }
        }

        deserializer.deserialize_map(FlagsVisitor)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct RoundRecord {
    matchups: Vec<MatchupRecord>,
    #[serde(default)]
    locked: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct MatchupRecord {
    player1: String,
    player2: Option<String>,
    winner: Option<String>,
    score_player1: f64,
    score_player2: f64,
    #[serde(default)]
    notes: String,
}

/// Serialize a session to the on-disk JSON format (pretty-printed).
pub fn export_session(session: &Session) -> Result<String, SessionError> {
    let players = PlayerFlags(
        session
            .players
            .iter()
            .map(|p| (p.name.clone(), Value::Bool(p.dropped)))
            .collect(),
    );
    let rounds = session
        .rounds
        .iter()
        .map(|r| RoundRecord {
            matchups: r.matchups.iter().map(|m| matchup_record(session, m)).collect(),
            locked: r.locked,
        })
        .collect();
    serde_json::to_string_pretty(&SessionFile { players, rounds })
        .map_err(|e| SessionError::InvalidSessionFormat(e.to_string()))
}

fn matchup_record(session: &Session, m: &Matchup) -> MatchupRecord {
    let winner = m.winner.map(|w| match w {
        Winner::Player1 => session.player_name(m.player1).to_string(),
        Winner::Player2 => m
            .player2
            .map(|p| session.player_name(p).to_string())
            .unwrap_or_default(),
        Winner::NoWinner => NO_WINNER.to_string(),
        Winner::Delayed => DELAYED.to_string(),
    });
    MatchupRecord {
        player1: session.player_name(m.player1).to_string(),
        player2: m.player2.map(|p| session.player_name(p).to_string()),
        winner,
        score_player1: m.score_player1,
        score_player2: m.score_player2,
        notes: m.notes.clone(),
    }
}

/// Parse a session file. Any structural problem (bad JSON, duplicate or reserved names, unknown
/// players in matchups, unrecognised winners) fails the whole import.
pub fn import_session(text: &str) -> Result<Session, SessionError> {
    let file: SessionFile =
        serde_json::from_str(text).map_err(|e| SessionError::InvalidSessionFormat(e.to_string()))?;

    let mut players = Vec::with_capacity(file.players.0.len());
    let mut seen = HashSet::new();
    for (name, dropped) in &file.players.0 {
        let dropped = dropped.as_bool().ok_or_else(|| {
            SessionError::InvalidSessionFormat(format!("drop flag of \"{}\" is not a boolean", name))
        })?;
        if name.trim().is_empty() || name.trim() != name {
            return Err(SessionError::InvalidSessionFormat(format!(
                "invalid player name \"{}\"",
                name
            )));
        }
        if is_reserved_name(name) {
            return Err(SessionError::InvalidSessionFormat(
                SessionError::ReservedName(name.clone()).to_string(),
            ));
        }
        if !seen.insert(lookup_key(name)) {
            return Err(SessionError::InvalidSessionFormat(
                SessionError::DuplicatePlayer(name.clone()).to_string(),
            ));
        }
        let mut player = Player::new(name.as_str());
        player.dropped = dropped;
        players.push(player);
    }

    let ids: HashMap<&str, PlayerId> = players.iter().map(|p| (p.name.as_str(), p.id)).collect();
    let resolve = |name: &str, round: usize| {
        ids.get(name).copied().ok_or_else(|| {
            SessionError::InvalidSessionFormat(format!(
                "round {} references unknown player \"{}\"",
                round + 1,
                name
            ))
        })
    };

    let mut rounds = Vec::with_capacity(file.rounds.len());
    for (round_idx, record) in file.rounds.iter().enumerate() {
        let mut matchups = Vec::with_capacity(record.matchups.len());
        for m in &record.matchups {
            let player1 = resolve(&m.player1, round_idx)?;
            let player2 = m.player2.as_deref().map(|n| resolve(n, round_idx)).transpose()?;
            if player2 == Some(player1) {
                return Err(SessionError::InvalidSessionFormat(format!(
                    "round {}: \"{}\" is paired with themselves",
                    round_idx + 1,
                    m.player1
                )));
            }
            let winner = match m.winner.as_deref() {
                None => None,
                Some(NO_WINNER) => Some(Winner::NoWinner),
                Some(DELAYED) => Some(Winner::Delayed),
                Some(w) if w == m.player1 => Some(Winner::Player1),
                Some(w) if Some(w) == m.player2.as_deref() => Some(Winner::Player2),
                Some(w) => {
                    return Err(SessionError::InvalidSessionFormat(format!(
                        "round {}: winner \"{}\" is not part of the matchup",
                        round_idx + 1,
                        w
                    )))
                }
            };
            matchups.push(Matchup {
                player1,
                player2,
                winner,
                score_player1: m.score_player1,
                score_player2: m.score_player2,
                notes: m.notes.clone(),
            });
        }
        rounds.push(Round {
            matchups,
            locked: record.locked,
        });
    }

    log::info!(
        "Imported session with {} players and {} rounds",
        players.len(),
        rounds.len()
    );
    Ok(Session::with_history(players, rounds))
}

/// Replace the contents of `session` with an imported file. On error the session is untouched.
pub fn load_session_into(session: &mut Session, text: &str) -> Result<(), SessionError> {
    let imported = import_session(text)?;
    session.players = imported.players;
    session.rounds = imported.rounds;
    Ok(())
}

/// File name for a saved snapshot, e.g. `session-<id>-20250101-120000.json`.
pub fn snapshot_file_name<Tz: TimeZone>(session_id: SessionId, at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("session-{}-{}.json", session_id, at.format("%Y%m%d-%H%M%S"))
}
