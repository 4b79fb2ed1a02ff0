mod approval;
mod condorcet;
mod elimination;
mod plurality;
mod score;

pub use approval::Approval;
pub use condorcet::{Condorcet, PairwiseMatrix, NO_CONDORCET_WINNER};
pub use elimination::{InstantRunoff, ELIMINATED_IN_FINAL_TIE, WON_BY_DEFAULT};
pub use plurality::Plurality;
pub use score::Score;

use crate::ballot::*;
use crate::config::*;
use crate::ranker::percentage;

pub const TIED_FOR_FIRST: &str = "tied for first place";

/// A tabulation method: turns a roster and the validated ballots into tallies.
///
/// The ballot type is fixed per calculator, so a calculator can only be fed
/// the ballot shape it was written for.
pub trait TabulationCalculator {
    type Ballot: BallotShape;

    fn tabulate(&self, roster: &Roster, ballots: &[Self::Ballot]) -> MethodTally;
}

/// How a candidate stands at the end of the count. Drives the final ordering.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Standing {
    /// Placed first regardless of the tally.
    Elected,
    /// Ordered by tally.
    Contending,
    /// No order between these candidates: they share a rank and keep the
    /// roster order. The tally is informational.
    Unranked,
    /// Ordered by elimination round, later rounds first.
    Eliminated { round: u32 },
}

#[derive(PartialEq, Debug, Clone)]
pub struct TallyEntry {
    pub candidate: CandidateId,
    pub tally: u64,
    pub percentage: f64,
    pub standing: Standing,
    pub is_winner: bool,
    pub note: Option<String>,
}

impl TallyEntry {
    fn contending(candidate: CandidateId, tally: u64, percentage: f64) -> TallyEntry {
        TallyEntry {
            candidate,
            tally,
            percentage,
            standing: Standing::Contending,
            is_winner: false,
            note: None,
        }
    }

    pub fn eliminated(&self) -> bool {
        matches!(self.standing, Standing::Eliminated { .. })
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Decision {
    Winner(CandidateId),
    Tie(Vec<CandidateId>),
    NoWinner,
}

/// The raw output of a calculator, before ranking.
#[derive(PartialEq, Debug, Clone)]
pub struct MethodTally {
    /// One entry per roster candidate, in roster order.
    pub entries: Vec<TallyEntry>,
    pub decision: Decision,
    pub percentage_basis: PercentageBasis,
    pub rounds: Vec<RoundStats>,
    pub pairwise: Option<PairwiseRecord>,
}

impl MethodTally {
    pub fn entry(&self, cid: CandidateId) -> &TallyEntry {
        &self.entries[cid.index()]
    }
}

/// Shared by the aggregating methods: the highest tally wins, a tie at the top
/// is reported as such, and a top tally of zero elects nobody.
fn highest_tally_wins(
    roster: &Roster,
    tallies: &[u64],
    base: u64,
    percentage_basis: PercentageBasis,
) -> MethodTally {
    let mut entries: Vec<TallyEntry> = roster
        .ids()
        .map(|cid| {
            let tally = tallies[cid.index()];
            TallyEntry::contending(cid, tally, percentage(tally, base))
        })
        .collect();

    let top = tallies.iter().copied().max().unwrap_or(0);
    let leaders: Vec<CandidateId> = entries
        .iter()
        .filter(|e| top > 0 && e.tally == top)
        .map(|e| e.candidate)
        .collect();

    let decision = match leaders.as_slice() {
        [] => Decision::NoWinner,
        [winner] => {
            entries[winner.index()].is_winner = true;
            Decision::Winner(*winner)
        }
        tied => {
            for cid in tied {
                entries[cid.index()].note = Some(TIED_FOR_FIRST.to_string());
            }
            Decision::Tie(tied.to_vec())
        }
    };

    MethodTally {
        entries,
        decision,
        percentage_basis,
        rounds: Vec::new(),
        pairwise: None,
    }
}
