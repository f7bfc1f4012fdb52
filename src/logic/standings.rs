//! Standings aggregation: fold the match history into one `PlayerInfo` per roster entry.

use crate::models::{Matchup, Player, PlayerId, PlayerInfo, Round, Winner};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Compute standings from the roster and the first `cutoff` rounds (all rounds when `None`).
///
/// Every roster entry gets a `PlayerInfo`, dropped players included, so history stays visible.
/// Matchup sides that reference an unknown player are skipped. Pure function: nothing is mutated.
pub fn aggregate_standings(
    players: &[Player],
    rounds: &[Round],
    cutoff: Option<usize>,
) -> HashMap<PlayerId, PlayerInfo> {
    let mut infos: HashMap<PlayerId, PlayerInfo> =
        players.iter().map(|p| (p.id, PlayerInfo::new(p))).collect();
    let mut opponents: HashMap<PlayerId, Vec<PlayerId>> = HashMap::new();

    let end = cutoff.unwrap_or(rounds.len()).min(rounds.len());
    for round in &rounds[..end] {
        for m in &round.matchups {
            credit(&mut infos, m, m.player1, m.score_player1, Winner::Player1);
            if let Some(p2) = m.player2 {
                credit(&mut infos, m, p2, m.score_player2, Winner::Player2);
                opponents.entry(m.player1).or_default().push(p2);
                opponents.entry(p2).or_default().push(m.player1);
            }
        }
    }

    let win_pct: HashMap<PlayerId, f64> = infos
        .iter()
        .map(|(id, info)| (*id, info.win_percentage()))
        .collect();
    for (id, info) in infos.iter_mut() {
        info.resistance = resistance(opponents.get(id).map(Vec::as_slice).unwrap_or(&[]), &win_pct);
    }

    infos
}

/// Add one side of a matchup to that player's totals.
fn credit(
    infos: &mut HashMap<PlayerId, PlayerInfo>,
    matchup: &Matchup,
    player: PlayerId,
    score: f64,
    side: Winner,
) {
    let Some(info) = infos.get_mut(&player) else {
        log::warn!("Matchup references player {} who is not on the roster", player);
        return;
    };
    info.score += score;
    info.n_played += 1;
    match matchup.winner {
        Some(w) if w == side => info.n_wins += 1,
        Some(Winner::Delayed) => info.active_delays += 1,
        _ => {}
    }
}

/// Mean match-win percentage of the given opponents; 0.0 when there are none.
fn resistance(opponents: &[PlayerId], win_pct: &HashMap<PlayerId, f64>) -> f64 {
    let known: Vec<f64> = opponents.iter().filter_map(|o| win_pct.get(o).copied()).collect();
    if known.is_empty() {
        return 0.0;
    }
    known.iter().sum::<f64>() / known.len() as f64
}

/// Standings ordered best to worst: score, then resistance, then wins, then name.
pub fn ranked_standings(players: &[Player], rounds: &[Round], cutoff: Option<usize>) -> Vec<PlayerInfo> {
    let mut list: Vec<PlayerInfo> = aggregate_standings(players, rounds, cutoff).into_values().collect();
    list.sort_by(compare_standings);
    list
}

fn compare_standings(a: &PlayerInfo, b: &PlayerInfo) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.resistance.total_cmp(&a.resistance))
        .then_with(|| b.n_wins.cmp(&a.n_wins))
        .then_with(|| a.name.cmp(&b.name))
}
