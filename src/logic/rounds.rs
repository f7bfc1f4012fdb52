//! Round lifecycle: generate the next round, record results, commit or delete rounds.

use crate::logic::pairing::{generate_round_with, PairingOptions};
use crate::logic::validation::{check_round_generation, GenerationWarning};
use crate::models::{lookup_key, Matchup, PlayerId, Round, Session, SessionError, Winner};
use serde::{Deserialize, Serialize};

/// What the operator picked in the winner column.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinnerChoice {
    Player(PlayerId),
    NoWinner,
    Delayed,
    /// Back to "Select winner...".
    Clear,
}

/// A freshly generated round plus everything the operator should be told about it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RoundStart {
    pub round: usize,
    pub warnings: Vec<GenerationWarning>,
    pub repeated: Vec<(PlayerId, Option<PlayerId>)>,
}

/// Generate and append the next round.
///
/// Runs the generation gate, pairs the players, then commits the previous round (if it is not
/// committed yet) and appends the new one. On any error the session is left as it was.
pub fn start_next_round(session: &mut Session, options: &PairingOptions) -> Result<RoundStart, SessionError> {
    let warnings = check_round_generation(session)?;
    let pairing = generate_round_with(&session.players, &session.rounds, options)?;

    if let Some(last) = session.rounds.last_mut() {
        if !last.locked {
            last.locked = true;
            log::info!("Committed round {}", session.rounds.len());
        }
    }
    session.rounds.push(Round::new(pairing.matchups));
    let round = session.rounds.len() - 1;
    log::info!("Created round {}", round + 1);
    Ok(RoundStart {
        round,
        warnings,
        repeated: pairing.repeated,
    })
}

/// Commit a round: its results become permanent and further edits are rejected.
pub fn commit_round(session: &mut Session, round: usize) -> Result<(), SessionError> {
    let r = session.round(round)?;
    if r.locked {
        return Err(SessionError::RoundAlreadyCommitted(round));
    }
    if let Some(matchup) = r.matchups.iter().position(|m| !m.is_resolved()) {
        return Err(SessionError::UnresolvedMatchup { round, matchup });
    }
    session.rounds[round].locked = true;
    log::info!("Committed round {}", round + 1);
    Ok(())
}

/// Delete the latest round, as long as it has not been committed.
pub fn delete_round(session: &mut Session, round: usize) -> Result<(), SessionError> {
    let r = session.round(round)?;
    if round + 1 != session.rounds.len() {
        return Err(SessionError::NotLastRound);
    }
    if r.locked {
        return Err(SessionError::RoundLocked(round));
    }
    session.rounds.pop();
    log::info!("Deleted round {}", round + 1);
    Ok(())
}

/// Record the winner of a matchup. Picking a player sets the scores to 1/0 and `Delayed`
/// resets them to 0/0, so a pending game credits nobody. `NoWinner` and `Clear` keep whatever
/// scores were entered.
///
/// Committed rounds only accept resolving a delayed matchup. Byes always stay won by player1.
pub fn set_winner(
    session: &mut Session,
    round: usize,
    matchup: usize,
    choice: WinnerChoice,
) -> Result<(), SessionError> {
    let locked = session.round(round)?.locked;
    let m = session.matchup_mut(round, matchup)?;
    if locked && (!m.is_delayed() || choice == WinnerChoice::Clear) {
        return Err(SessionError::RoundLocked(round));
    }
    if m.is_bye() && choice != WinnerChoice::Player(m.player1) {
        return Err(SessionError::InvalidWinner);
    }
    apply_winner(m, choice)?;
    log::debug!("Round {}, matchup {}: winner {:?}", round + 1, matchup + 1, m.winner);
    Ok(())
}

fn apply_winner(m: &mut Matchup, choice: WinnerChoice) -> Result<(), SessionError> {
    match choice {
        WinnerChoice::Player(id) if id == m.player1 => {
            m.winner = Some(Winner::Player1);
            m.score_player1 = 1.0;
            m.score_player2 = 0.0;
        }
        WinnerChoice::Player(id) if Some(id) == m.player2 => {
            m.winner = Some(Winner::Player2);
            m.score_player1 = 0.0;
            m.score_player2 = 1.0;
        }
        WinnerChoice::Player(_) => return Err(SessionError::InvalidWinner),
        WinnerChoice::NoWinner => m.winner = Some(Winner::NoWinner),
        WinnerChoice::Delayed => {
            m.winner = Some(Winner::Delayed);
            m.score_player1 = 0.0;
            m.score_player2 = 0.0;
        }
        WinnerChoice::Clear => m.winner = None,
    }
    Ok(())
}

/// Overwrite both scores. Sums other than 0 or 1 are allowed; the generation gate warns about them.
pub fn set_scores(
    session: &mut Session,
    round: usize,
    matchup: usize,
    score_player1: f64,
    score_player2: f64,
) -> Result<(), SessionError> {
    if session.round(round)?.locked {
        return Err(SessionError::RoundLocked(round));
    }
    let m = session.matchup_mut(round, matchup)?;
    m.score_player1 = score_player1;
    m.score_player2 = score_player2;
    if !m.has_standard_scores() {
        log::warn!(
            "Round {}, matchup {}: scores add up to {}",
            round + 1,
            matchup + 1,
            score_player1 + score_player2
        );
    }
    Ok(())
}

pub fn set_notes(session: &mut Session, round: usize, matchup: usize, notes: &str) -> Result<(), SessionError> {
    if session.round(round)?.locked {
        return Err(SessionError::RoundLocked(round));
    }
    session.matchup_mut(round, matchup)?.notes = notes.to_string();
    Ok(())
}

/// Set winners from a pasted list of names (one per line, case-insensitive).
/// Each two-player matchup takes the first listed name that belongs to it. Returns how many
/// matchups were updated.
pub fn paste_winners(session: &mut Session, round: usize, text: &str) -> Result<usize, SessionError> {
    if session.round(round)?.locked {
        return Err(SessionError::RoundLocked(round));
    }
    let winners: Vec<String> = text
        .lines()
        .map(lookup_key)
        .filter(|name| !name.is_empty())
        .collect();

    let mut choices = Vec::new();
    for (idx, m) in session.rounds[round].matchups.iter().enumerate() {
        let Some(p2) = m.player2 else { continue };
        let key1 = lookup_key(session.player_name(m.player1));
        let key2 = lookup_key(session.player_name(p2));
        let picked = winners.iter().find_map(|w| {
            if *w == key1 {
                Some(m.player1)
            } else if *w == key2 {
                Some(p2)
            } else {
                None
            }
        });
        if let Some(id) = picked {
            choices.push((idx, id));
        }
    }

    for &(idx, id) in &choices {
        apply_winner(&mut session.rounds[round].matchups[idx], WinnerChoice::Player(id))?;
    }
    log::info!("Pasted winners for {} matchups in round {}", choices.len(), round + 1);
    Ok(choices.len())
}
