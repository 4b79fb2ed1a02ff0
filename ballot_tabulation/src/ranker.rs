use std::cmp::Reverse;

use crate::ballot::Roster;
use crate::config::TabulationResult;
use crate::methods::{MethodTally, Standing, TallyEntry};

/// `part / base` as a percentage rounded to two decimals. Zero when the base is zero.
pub(crate) fn percentage(part: u64, base: u64) -> f64 {
    if base == 0 {
        return 0.0;
    }
    (part as f64 * 10000.0 / base as f64).round() / 100.0
}

// Elected first, then the contenders by decreasing tally, then the unranked
// candidates, then the eliminated ones from the last round eliminated to the first.
fn sort_key(entry: &TallyEntry) -> (u8, Reverse<u64>) {
    match entry.standing {
        Standing::Elected => (0, Reverse(0)),
        Standing::Contending => (1, Reverse(entry.tally)),
        Standing::Unranked => (2, Reverse(0)),
        Standing::Eliminated { round } => (3, Reverse(round as u64)),
    }
}

/// Orders the calculator output into the final result list.
///
/// Candidates with the same key share a rank (standard competition ranking)
/// and keep the roster order among themselves.
pub(crate) fn rank(roster: &Roster, tally: &MethodTally) -> Vec<TabulationResult> {
    let mut ordered: Vec<&TallyEntry> = tally.entries.iter().collect();
    // Stable sort: entries are in roster order to begin with.
    ordered.sort_by_key(|e| sort_key(e));

    let mut res: Vec<TabulationResult> = Vec::with_capacity(ordered.len());
    let mut current_rank: u32 = 0;
    for (pos, e) in ordered.iter().enumerate() {
        let same_as_previous = pos > 0 && sort_key(ordered[pos - 1]) == sort_key(e);
        if !same_as_previous {
            current_rank = pos as u32 + 1;
        }
        let cand = roster.candidate(e.candidate);
        res.push(TabulationResult {
            candidate_id: cand.id.clone(),
            display_name: cand.name.clone(),
            rank: current_rank,
            tally: e.tally,
            percentage: e.percentage,
            eliminated: e.eliminated(),
            is_winner: e.is_winner,
            note: e.note.clone(),
        });
    }
    res
}
