pub use crate::config::*;

/// A builder for assembling an election and its ballots.
///
/// Ballots are stored as raw payloads and only validated by the tabulation,
/// so a builder can hold ballots that will end up in the diagnostics.
///
/// ```
/// pub use ballot_tabulation::builder::Builder;
/// pub use ballot_tabulation::{Candidate, Outcome, VotingMethod};
/// # use ballot_tabulation::TabulationError;
///
/// let mut builder = Builder::new(VotingMethod::Rcv).candidates(&[
///     Candidate::new("anna", "Anna", 1),
///     Candidate::new("bob", "Bob", 2),
///     Candidate::new("clara", "Clara", 3),
/// ]);
///
/// builder.add_ranking(&["anna", "bob"]);
/// builder.add_ranking(&["clara", "bob"]);
/// builder.add_ranking(&["bob"]);
/// builder.add_ranking(&["bob", "anna"]);
/// builder.add_ranking(&["anna", "clara"]);
///
/// let summary = builder.tabulate()?;
/// assert_eq!(summary.outcome, Outcome::Winner("bob".to_string()));
/// assert_eq!(summary.round_stats.len(), 2);
///
/// # Ok::<(), TabulationError>(())
/// ```
pub struct Builder {
    pub(crate) _method: VotingMethod,
    pub(crate) _rules: TabulationRules,
    pub(crate) _candidates: Vec<Candidate>,
    pub(crate) _ballots: Vec<RawBallot>,
    pub(crate) _turnout: Option<Turnout>,
}

impl Builder {
    pub fn new(method: VotingMethod) -> Builder {
        Builder {
            _method: method,
            _rules: TabulationRules::DEFAULT_RULES,
            _candidates: Vec::new(),
            _ballots: Vec::new(),
            _turnout: None,
        }
    }

    pub fn candidates(self, cands: &[Candidate]) -> Builder {
        Builder {
            _candidates: cands.to_vec(),
            ..self
        }
    }

    /// Candidates given by name only. The name doubles as the id and the
    /// display order follows the slice.
    pub fn named_candidates(self, names: &[&str]) -> Builder {
        let cands: Vec<Candidate> = names
            .iter()
            .enumerate()
            .map(|(idx, name)| Candidate::new(name, name, idx as i32 + 1))
            .collect();
        self.candidates(&cands)
    }

    pub fn rules(self, rules: &TabulationRules) -> Builder {
        Builder {
            _rules: rules.clone(),
            ..self
        }
    }

    /// Sets the turnout figures. Without them, both the number of eligible
    /// voters and the number of distinct voters are the number of ballots.
    pub fn turnout(self, eligible_voters: u64, distinct_voters: u64) -> Builder {
        Builder {
            _turnout: Some(Turnout {
                eligible_voters,
                distinct_voters,
            }),
            ..self
        }
    }

    /// Adds a plurality ballot.
    pub fn add_choice(&mut self, candidate: &str) {
        self.add_raw(RawBallot::Single(candidate.to_string()));
    }

    /// Adds an approval ballot. The list may be empty.
    pub fn add_approval(&mut self, candidates: &[&str]) {
        self.add_raw(RawBallot::List(
            candidates.iter().map(|c| c.to_string()).collect(),
        ));
    }

    /// Adds a ranked ballot, most preferred first.
    pub fn add_ranking(&mut self, candidates: &[&str]) {
        self.add_raw(RawBallot::List(
            candidates.iter().map(|c| c.to_string()).collect(),
        ));
    }

    pub fn add_scores(&mut self, scores: &[(&str, i64)]) {
        self.add_raw(RawBallot::Scores(
            scores
                .iter()
                .map(|(c, s)| (c.to_string(), s.to_string()))
                .collect(),
        ));
    }

    pub fn add_raw(&mut self, ballot: RawBallot) {
        self._ballots.push(ballot);
    }

    pub fn build(&self) -> ElectionTabulationContext {
        let num_ballots = self._ballots.len() as u64;
        ElectionTabulationContext {
            method: self._method,
            candidates: self._candidates.clone(),
            ballots: self._ballots.clone(),
            turnout: self._turnout.unwrap_or(Turnout {
                eligible_voters: num_ballots,
                distinct_voters: num_ballots,
            }),
            rules: self._rules.clone(),
        }
    }

    pub fn tabulate(&self) -> Result<TabulationSummary, TabulationError> {
        crate::tabulate(&self.build())
    }
}
