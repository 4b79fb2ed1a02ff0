use log::{debug, warn};

use super::*;

/// Approval voting: every approved candidate gets one vote from the ballot.
///
/// Percentages are relative to the number of distinct voters, so they
/// describe the share of voters approving each candidate and do not sum to 100.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct Approval {
    pub distinct_voters: u64,
}

impl TabulationCalculator for Approval {
    type Ballot = ApprovalBallot;

    fn tabulate(&self, roster: &Roster, ballots: &[ApprovalBallot]) -> MethodTally {
        let mut tallies: Vec<u64> = vec![0; roster.len()];
        for b in ballots.iter() {
            for cid in b.approved.iter() {
                tallies[cid.index()] += 1;
            }
        }
        debug!("Approval::tabulate: tallies: {:?}", tallies);
        let top = tallies.iter().copied().max().unwrap_or(0);
        // Inconsistent turnout figures: the percentages stay within 0..=100.
        let base = if top > self.distinct_voters {
            warn!(
                "Approval::tabulate: a candidate has {} approvals but only {} distinct voters were reported",
                top, self.distinct_voters
            );
            top
        } else {
            self.distinct_voters
        };
        highest_tally_wins(roster, &tallies, base, PercentageBasis::DistinctVoters)
    }
}
