//! Data structures for the Swiss tournament: players, matchups, rounds, session state.

mod matchup;
mod player;
mod session;

pub use matchup::{Matchup, Round, Winner, BYE_NOTE};
pub use player::{lookup_key, normalize_name, Player, PlayerId, PlayerInfo};
pub use session::{is_reserved_name, Session, SessionError, SessionId, RESERVED_NAMES};
