//! Swiss pairing: turn the roster and match history into the next round's matchups.
//!
//! 1. Filter to non-dropped players and compute standings (delayed games count half a point).
//! 2. Sort players canonically and shuffle them with a seed derived from their names only.
//! 3. Compress scores into integer buckets.
//! 4. Connect every pair that has not met before with weight `bucket_distance^3`; when the player
//!    count is odd, add a bye vertex connected to everyone who has not had a bye yet.
//! 5. Take a minimum-weight maximum-cardinality matching and turn its edges into matchups.

use crate::logic::matching::min_weight_matching;
use crate::logic::standings::aggregate_standings;
use crate::models::{normalize_name, Matchup, Player, PlayerId, PlayerInfo, Round, SessionError};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use std::time::Instant;

/// Scores closer than this share a bucket.
pub const SCORE_TOLERANCE: f64 = 1e-9;

/// How strictly the history constrains a new round.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PairingOptions {
    /// Allow repeat matchups and repeat byes at a prohibitive cost instead of failing
    /// with `NoFeasiblePairing`. Off by default.
    pub allow_repeats: bool,
}

/// Result of a pairing run.
#[derive(Clone, Debug, PartialEq)]
pub struct RoundPairing {
    pub matchups: Vec<Matchup>,
    /// Pairs (or byes, as `(player, None)`) that repeat history. Only non-empty with `allow_repeats`.
    pub repeated: Vec<(PlayerId, Option<PlayerId>)>,
}

/// Who has already met whom, and who has already had a bye.
#[derive(Debug, Default)]
struct PairingHistory {
    met: HashSet<(PlayerId, PlayerId)>,
    byes: HashSet<PlayerId>,
}

impl PairingHistory {
    fn from_rounds(rounds: &[Round]) -> Self {
        let mut history = Self::default();
        for m in rounds.iter().flat_map(|r| &r.matchups) {
            match m.player2 {
                Some(p2) => {
                    history.met.insert((m.player1, p2));
                    history.met.insert((p2, m.player1));
                }
                None => {
                    history.byes.insert(m.player1);
                }
            }
        }
        history
    }

    fn have_met(&self, a: PlayerId, b: PlayerId) -> bool {
        self.met.contains(&(a, b))
    }

    fn had_bye(&self, p: PlayerId) -> bool {
        self.byes.contains(&p)
    }
}

/// Generate the next round with default (strict) options.
pub fn generate_round(players: &[Player], rounds: &[Round]) -> Result<Vec<Matchup>, SessionError> {
    generate_round_with(players, rounds, &PairingOptions::default()).map(|p| p.matchups)
}

/// Generate the next round. Nothing is mutated; the caller decides whether to append the result.
pub fn generate_round_with(
    players: &[Player],
    rounds: &[Round],
    options: &PairingOptions,
) -> Result<RoundPairing, SessionError> {
    let start = Instant::now();
    let standings = aggregate_standings(players, rounds, None);
    let mut eligible: Vec<&PlayerInfo> = players
        .iter()
        .filter(|p| !p.dropped)
        .filter_map(|p| standings.get(&p.id))
        .collect();
    if eligible.is_empty() {
        return Err(SessionError::EmptyRoster);
    }

    // Canonical order first so the roster's insertion order does not matter.
    eligible.sort_by(|a, b| {
        normalize_name(&a.name)
            .cmp(&normalize_name(&b.name))
            .then_with(|| a.name.cmp(&b.name))
    });
    let seed = pairing_seed(eligible.iter().map(|info| info.name.as_str()));
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    eligible.shuffle(&mut rng);

    let scores: Vec<f64> = eligible.iter().map(|info| info.pairing_score()).collect();
    let buckets = assign_integer_scores(&scores);
    log::debug!("Score buckets: {:?}", buckets);

    let history = PairingHistory::from_rounds(rounds);
    let n = eligible.len();
    let bye_vertex = (n % 2 == 1).then_some(n);
    let vertex_count = n + usize::from(bye_vertex.is_some());

    let max_bucket = i64::from(buckets.iter().copied().max().unwrap_or(0));
    let repeat_penalty = max_bucket.pow(3) * vertex_count as i64 + 1;

    let mut edges: Vec<(usize, usize, i64)> = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            let distance = i64::from(buckets[i].abs_diff(buckets[j]));
            if !history.have_met(eligible[i].player_id, eligible[j].player_id) {
                edges.push((i, j, distance.pow(3)));
            } else if options.allow_repeats {
                edges.push((i, j, repeat_penalty + distance.pow(3)));
            }
        }
    }
    if let Some(bye) = bye_vertex {
        // The bye sits in bucket 0, so it drifts towards the lowest scores.
        for (i, info) in eligible.iter().enumerate() {
            let weight = i64::from(buckets[i]).pow(3);
            if !history.had_bye(info.player_id) {
                edges.push((i, bye, weight));
            } else if options.allow_repeats {
                edges.push((i, bye, repeat_penalty + weight));
            }
        }
    }
    log::debug!("Pairing graph: {} vertices, {} edges", vertex_count, edges.len());

    let mate = min_weight_matching(vertex_count, &edges);
    let unmatched = mate[..n].iter().filter(|m| m.is_none()).count();
    if unmatched > 0 {
        log::warn!("No feasible pairing: {} player(s) could not be matched", unmatched);
        return Err(SessionError::NoFeasiblePairing { unmatched });
    }

    let mut matchups = Vec::with_capacity(vertex_count / 2);
    let mut byes = Vec::new();
    let mut repeated = Vec::new();
    for (i, m) in mate[..n].iter().enumerate() {
        let Some(j) = *m else { continue };
        let p1 = eligible[i].player_id;
        if Some(j) == bye_vertex {
            if history.had_bye(p1) {
                repeated.push((p1, None));
            }
            byes.push(Matchup::bye(p1));
        } else if j > i {
            let p2 = eligible[j].player_id;
            if history.have_met(p1, p2) {
                repeated.push((p1, Some(p2)));
            }
            matchups.push(Matchup::new(p1, p2));
        }
    }
    matchups.extend(byes);

    if !repeated.is_empty() {
        log::warn!("Pairing repeats {} earlier matchup(s) or bye(s)", repeated.len());
    }
    log::info!(
        "Generated {} matchups for {} players in {:?}",
        matchups.len(),
        n,
        start.elapsed()
    );
    Ok(RoundPairing { matchups, repeated })
}

/// Seed derived only from the player names (FNV-1a over the normalized names, each followed
/// by a zero byte so `["Ab", "C"]` and `["A", "BC"]` differ).
///
/// The same roster always shuffles the same way, and nobody can influence the draw
/// without changing the roster itself.
pub fn pairing_seed<'a>(names: impl IntoIterator<Item = &'a str>) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = FNV_OFFSET;
    for name in names {
        for byte in normalize_name(name).bytes().chain([0]) {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(FNV_PRIME);
        }
    }
    hash
}

/// Compress scores into ordinal buckets: the lowest score gets 0 and the bucket increases
/// whenever the next score (in ascending order) differs from the previous one by more than
/// `SCORE_TOLERANCE`. The result is aligned with the input slice.
pub fn assign_integer_scores(scores: &[f64]) -> Vec<u32> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut buckets = vec![0u32; scores.len()];
    let mut bucket = 0u32;
    let mut previous: Option<f64> = None;
    for idx in order {
        let score = scores[idx];
        if let Some(prev) = previous {
            if (score - prev).abs() > SCORE_TOLERANCE {
                bucket += 1;
            }
        }
        previous = Some(score);
        buckets[idx] = bucket;
    }
    buckets
}
