use log::debug;

use super::*;

/// Score voting: the highest total score wins.
///
/// The percentage is relative to the best total, so the leader always shows
/// 100. It is not a share of the vote.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct Score;

impl TabulationCalculator for Score {
    type Ballot = ScoredBallot;

    fn tabulate(&self, roster: &Roster, ballots: &[ScoredBallot]) -> MethodTally {
        let mut tallies: Vec<u64> = vec![0; roster.len()];
        for b in ballots.iter() {
            for (cid, score) in b.scores.iter() {
                tallies[cid.index()] += *score as u64;
            }
        }
        let top = tallies.iter().copied().max().unwrap_or(0);
        debug!("Score::tabulate: tallies: {:?} top: {}", tallies, top);
        highest_tally_wins(roster, &tallies, top, PercentageBasis::TopScore)
    }
}
