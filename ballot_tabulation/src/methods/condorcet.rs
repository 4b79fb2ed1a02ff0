use log::debug;

use super::*;

pub const NO_CONDORCET_WINNER: &str = "no Condorcet winner found (cycle or ties)";

/// Head-to-head counts between every pair of candidates.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PairwiseMatrix {
    size: usize,
    // Row-major: wins[a * size + b] ballots rank a above b.
    wins: Vec<u64>,
}

impl PairwiseMatrix {
    /// A ballot only takes part in the contests between candidates it ranks both of.
    pub fn build(roster: &Roster, ballots: &[RankedBallot]) -> PairwiseMatrix {
        let size = roster.len();
        let mut wins: Vec<u64> = vec![0; size * size];
        for b in ballots.iter() {
            let prefs = b.preferences();
            for (pos, winner) in prefs.iter().enumerate() {
                for loser in prefs[pos + 1..].iter() {
                    wins[winner.index() * size + loser.index()] += 1;
                }
            }
        }
        PairwiseMatrix { size, wins }
    }

    /// Number of ballots ranking `a` above `b`.
    pub fn wins(&self, a: CandidateId, b: CandidateId) -> u64 {
        self.wins[a.index() * self.size + b.index()]
    }

    /// Strict majority: a tie does not count as beating.
    pub fn beats(&self, a: CandidateId, b: CandidateId) -> bool {
        self.wins(a, b) > self.wins(b, a)
    }

    /// The candidate beating every other candidate head to head, if there is one.
    pub fn condorcet_winner(&self, roster: &Roster) -> Option<CandidateId> {
        roster
            .ids()
            .find(|a| roster.ids().all(|b| b == *a || self.beats(*a, b)))
    }

    fn total_wins(&self, roster: &Roster, a: CandidateId) -> u64 {
        roster
            .ids()
            .filter(|b| *b != a)
            .map(|b| self.wins(a, b))
            .sum()
    }

    fn to_record(&self, roster: &Roster) -> PairwiseRecord {
        PairwiseRecord {
            candidates: roster.ids().map(|c| roster.candidate(c).id.clone()).collect(),
            wins: roster
                .ids()
                .map(|a| roster.ids().map(|b| self.wins(a, b)).collect())
                .collect(),
        }
    }
}

/// Condorcet method on ranked ballots.
///
/// The winner, if any, gets the number of ballots as tally and 100 percent.
/// Without a winner, every candidate reports the sum of its pairwise wins as
/// an informational tally and carries the `NO_CONDORCET_WINNER` note. The sum
/// does not order the candidates: they all share the first rank.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct Condorcet;

impl TabulationCalculator for Condorcet {
    type Ballot = RankedBallot;

    fn tabulate(&self, roster: &Roster, ballots: &[RankedBallot]) -> MethodTally {
        let matrix = PairwiseMatrix::build(roster, ballots);
        debug!("Condorcet::tabulate: matrix: {:?}", matrix);

        // A roster of one would otherwise win without a single ballot.
        let winner = if ballots.is_empty() {
            None
        } else {
            matrix.condorcet_winner(roster)
        };

        let (entries, decision): (Vec<TallyEntry>, Decision) = match winner {
            Some(w) => (
                roster
                    .ids()
                    .map(|cid| {
                        if cid == w {
                            TallyEntry {
                                candidate: cid,
                                tally: ballots.len() as u64,
                                percentage: 100.0,
                                standing: Standing::Elected,
                                is_winner: true,
                                note: None,
                            }
                        } else {
                            TallyEntry::contending(cid, 0, 0.0)
                        }
                    })
                    .collect(),
                Decision::Winner(w),
            ),
            None => (
                roster
                    .ids()
                    .map(|cid| TallyEntry {
                        standing: Standing::Unranked,
                        note: Some(NO_CONDORCET_WINNER.to_string()),
                        ..TallyEntry::contending(cid, matrix.total_wins(roster, cid), 0.0)
                    })
                    .collect(),
                Decision::NoWinner,
            ),
        };

        MethodTally {
            entries,
            decision,
            percentage_basis: PercentageBasis::CondorcetWinner,
            rounds: Vec::new(),
            pairwise: Some(matrix.to_record(roster)),
        }
    }
}
