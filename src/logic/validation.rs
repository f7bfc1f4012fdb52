//! Checks run before a new round is generated: blocking errors first, then soft warnings.

use crate::models::{Session, SessionError};
use serde::Serialize;
use std::fmt;

/// Something the operator should look at, but which does not block generation.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerationWarning {
    /// A delayed matchup is still waiting for its result.
    DelayedMatchup { round: usize, matchup: usize },
    /// Scores that do not add up to 0 or 1.
    NonStandardScore { round: usize, matchup: usize, total: f64 },
}

impl fmt::Display for GenerationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationWarning::DelayedMatchup { round, matchup } => {
                write!(f, "Round {}, matchup {} is still delayed", round + 1, matchup + 1)
            }
            GenerationWarning::NonStandardScore { round, matchup, total } => write!(
                f,
                "Round {}, matchup {} has scores adding up to {} instead of 0 or 1",
                round + 1,
                matchup + 1,
                total
            ),
        }
    }
}

/// Gate for round generation.
///
/// Fails with `UnresolvedMatchup` if any matchup in the latest round has no winner selected.
/// Otherwise returns warnings for delayed matchups in any round and for non-standard scores in
/// the latest round.
pub fn check_round_generation(session: &Session) -> Result<Vec<GenerationWarning>, SessionError> {
    let Some(last_idx) = session.rounds.len().checked_sub(1) else {
        return Ok(Vec::new());
    };
    let last = &session.rounds[last_idx];
    if let Some(matchup) = last.matchups.iter().position(|m| !m.is_resolved()) {
        return Err(SessionError::UnresolvedMatchup {
            round: last_idx,
            matchup,
        });
    }

    let mut warnings = Vec::new();
    for (round_idx, round) in session.rounds.iter().enumerate() {
        for (matchup_idx, m) in round.matchups.iter().enumerate() {
            if m.is_delayed() {
                warnings.push(GenerationWarning::DelayedMatchup {
                    round: round_idx,
                    matchup: matchup_idx,
                });
            }
        }
    }
    for (matchup_idx, m) in last.matchups.iter().enumerate() {
        if !m.has_standard_scores() {
            warnings.push(GenerationWarning::NonStandardScore {
                round: last_idx,
                matchup: matchup_idx,
                total: m.score_player1 + m.score_player2,
            });
        }
    }
    for w in &warnings {
        log::warn!("{}", w);
    }
    Ok(warnings)
}
