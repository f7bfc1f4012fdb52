//! Single-elimination seeding: first-round matchups from a ranked list of participants.

use crate::logic::standings::ranked_standings;
use crate::models::{Matchup, PlayerId, Session, SessionError};

/// First-round seed pairs for `participant_count` entrants, 1-based, best seed first.
///
/// Uses the seed-sum construction: start from `(1, 2)` and, for each further round, split every
/// pair `(a, b)` into `(a, sum - a)` and `(sum - b, b)` with `sum = 2^(r + 1) + 1`. Seeds 1 and 2
/// can then only meet in the final. Seeds above `participant_count` become `None` (a bye).
pub fn bracket_seed_pairs(participant_count: usize) -> Vec<(Option<usize>, Option<usize>)> {
    if participant_count < 2 {
        return Vec::new();
    }
    let rounds = participant_count.next_power_of_two().trailing_zeros();
    let mut pairs: Vec<(usize, usize)> = vec![(1, 2)];
    for round in 1..rounds {
        let sum = (1usize << (round + 1)) + 1;
        pairs = pairs
            .into_iter()
            .flat_map(|(a, b)| [(a, sum - a), (sum - b, b)])
            .collect();
    }
    let seat = |seed: usize| (seed <= participant_count).then_some(seed);
    pairs.into_iter().map(|(a, b)| (seat(a), seat(b))).collect()
}

/// Seed `ranked` (best first) into first-round matchups. A missing opponent becomes a bye.
pub fn seed_bracket(ranked: &[PlayerId]) -> Result<Vec<Matchup>, SessionError> {
    if ranked.len() < 2 {
        return Err(SessionError::InsufficientParticipants {
            needed: 2,
            found: ranked.len(),
        });
    }
    let pick = |seed: usize| ranked[seed - 1];
    let matchups: Vec<Matchup> = bracket_seed_pairs(ranked.len())
        .into_iter()
        .filter_map(|pair| match pair {
            (Some(a), Some(b)) => Some(Matchup::new(pick(a.min(b)), pick(a.max(b)))),
            (Some(a), None) | (None, Some(a)) => Some(Matchup::bye(pick(a))),
            (None, None) => None,
        })
        .collect();
    log::info!(
        "Seeded bracket of {} for {} participants",
        ranked.len().next_power_of_two(),
        ranked.len()
    );
    Ok(matchups)
}

/// Seed the bracket from current standings: active players only, best `top` (all when `None`).
pub fn seed_bracket_from_standings(session: &Session, top: Option<usize>) -> Result<Vec<Matchup>, SessionError> {
    let ranked: Vec<PlayerId> = ranked_standings(&session.players, &session.rounds, None)
        .into_iter()
        .filter(|info| !info.dropped)
        .map(|info| info.player_id)
        .take(top.unwrap_or(usize::MAX))
        .collect();
    seed_bracket(&ranked)
}
