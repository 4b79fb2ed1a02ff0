use log::debug;

use super::*;

/// First-past-the-post: one vote per ballot, most votes wins.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct Plurality;

impl TabulationCalculator for Plurality {
    type Ballot = PluralityBallot;

    fn tabulate(&self, roster: &Roster, ballots: &[PluralityBallot]) -> MethodTally {
        let mut tallies: Vec<u64> = vec![0; roster.len()];
        for b in ballots.iter() {
            tallies[b.choice.index()] += 1;
        }
        debug!("Plurality::tabulate: tallies: {:?}", tallies);
        highest_tally_wins(
            roster,
            &tallies,
            ballots.len() as u64,
            PercentageBasis::BallotsCast,
        )
    }
}
