//! Tournament business logic: standings, pairing, bracket seeding, result entry, persistence.

mod bracket;
mod matching;
mod pairing;
mod persistence;
mod roster;
mod rounds;
mod standings;
mod validation;

pub use bracket::{bracket_seed_pairs, seed_bracket, seed_bracket_from_standings};
pub use matching::{max_weight_matching, min_weight_matching};
pub use pairing::{
    assign_integer_scores, generate_round, generate_round_with, pairing_seed, PairingOptions,
    RoundPairing, SCORE_TOLERANCE,
};
pub use persistence::{
    export_session, import_session, load_session_into, snapshot_file_name, DELAYED, NO_WINNER,
};
pub use roster::{import_roster, import_roster_strict, parse_roster_names, ImportReport, RosterFormat};
pub use rounds::{
    commit_round, delete_round, paste_winners, set_notes, set_scores, set_winner, start_next_round,
    RoundStart, WinnerChoice,
};
pub use standings::{aggregate_standings, ranked_standings};
pub use validation::{check_round_generation, GenerationWarning};
