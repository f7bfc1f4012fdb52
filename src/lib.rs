//! Swiss tournament organizer: library with models, pairing/seeding logic and persistence.

pub mod config;
pub mod logic;
pub mod models;

pub use config::ServerConfig;
pub use logic::{
    aggregate_standings, assign_integer_scores, bracket_seed_pairs, check_round_generation,
    commit_round, delete_round, export_session, generate_round, generate_round_with,
    import_roster, import_roster_strict, import_session, load_session_into, max_weight_matching,
    min_weight_matching, pairing_seed, parse_roster_names, paste_winners, ranked_standings,
    seed_bracket, seed_bracket_from_standings, set_notes, set_scores, set_winner,
    snapshot_file_name, start_next_round, GenerationWarning, ImportReport, PairingOptions,
    RosterFormat, RoundPairing, RoundStart, WinnerChoice,
};
pub use models::{
    Matchup, Player, PlayerId, PlayerInfo, Round, Session, SessionError, SessionId, Winner,
};
