use log::debug;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Display;

use crate::config::*;

/// Position of a candidate in the roster. Only meaningful for the roster that issued it.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct CandidateId(u32);

impl CandidateId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The ordered, immutable set of candidates of one election.
///
/// Candidates are ordered by `display_order`, then by their position in the
/// input. This order is the stable tie order used by every calculator.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Roster {
    candidates: Vec<Candidate>,
    by_id: HashMap<String, CandidateId>,
}

impl Roster {
    pub fn new(candidates: &[Candidate]) -> Result<Roster, TabulationError> {
        if candidates.is_empty() {
            return Err(TabulationError::EmptyRoster {});
        }
        let mut sorted: Vec<Candidate> = candidates.to_vec();
        // Stable: equal display orders keep the input order.
        sorted.sort_by_key(|c| c.display_order);

        let mut by_id: HashMap<String, CandidateId> = HashMap::new();
        for (idx, c) in sorted.iter().enumerate() {
            if by_id
                .insert(c.id.clone(), CandidateId(idx as u32))
                .is_some()
            {
                return Err(TabulationError::DuplicateRosterEntry { id: c.id.clone() });
            }
        }
        Ok(Roster {
            candidates: sorted,
            by_id,
        })
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// All the candidate ids, in roster order.
    pub fn ids(&self) -> impl Iterator<Item = CandidateId> + '_ {
        (0..self.candidates.len()).map(|idx| CandidateId(idx as u32))
    }

    pub fn candidate(&self, cid: CandidateId) -> &Candidate {
        &self.candidates[cid.index()]
    }

    pub fn lookup(&self, id: &str) -> Option<CandidateId> {
        self.by_id.get(id).copied()
    }

    fn resolve(&self, id: &str) -> Result<CandidateId, BallotError> {
        self.lookup(id)
            .ok_or_else(|| BallotError::UnknownCandidate { id: id.to_string() })
    }
}

/// The ballot shapes, one per family of voting methods.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum BallotKind {
    Plurality,
    Approval,
    Ranking,
    Scored,
}

impl Display for BallotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BallotKind::Plurality => "plurality",
            BallotKind::Approval => "approval",
            BallotKind::Ranking => "ranking",
            BallotKind::Scored => "scored",
        };
        write!(f, "{}", s)
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PluralityBallot {
    pub choice: CandidateId,
}

/// An approval ballot. The set may be empty.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ApprovalBallot {
    pub approved: BTreeSet<CandidateId>,
}

/// A ranked ballot, most preferred first.
// Invariant: no candidate appears twice.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RankedBallot {
    preferences: Vec<CandidateId>,
}

impl RankedBallot {
    /// Fails with the position of the first repeated candidate.
    pub fn new(preferences: Vec<CandidateId>) -> Result<RankedBallot, usize> {
        let mut seen: BTreeSet<CandidateId> = BTreeSet::new();
        match preferences.iter().position(|cid| !seen.insert(*cid)) {
            Some(pos) => Err(pos),
            None => Ok(RankedBallot { preferences }),
        }
    }

    pub fn preferences(&self) -> &[CandidateId] {
        &self.preferences
    }

    /// The first preference still present in `active`, if any.
    pub fn current_preference(&self, active: &BTreeSet<CandidateId>) -> Option<CandidateId> {
        self.preferences
            .iter()
            .find(|cid| active.contains(cid))
            .copied()
    }
}

/// A scored ballot. Candidates left out are not in the map.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ScoredBallot {
    pub scores: BTreeMap<CandidateId, u32>,
}

/// One validated ballot. Every candidate it references is on the roster.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Ballot {
    Plurality(PluralityBallot),
    Approval(ApprovalBallot),
    Ranking(RankedBallot),
    Scored(ScoredBallot),
}

impl Ballot {
    pub fn kind(&self) -> BallotKind {
        match self {
            Ballot::Plurality(_) => BallotKind::Plurality,
            Ballot::Approval(_) => BallotKind::Approval,
            Ballot::Ranking(_) => BallotKind::Ranking,
            Ballot::Scored(_) => BallotKind::Scored,
        }
    }

    /// Validates a raw payload against the roster.
    ///
    /// Nothing is coerced: a payload of the wrong shape, a duplicated candidate,
    /// an unknown candidate or a bad score rejects the whole ballot.
    pub fn parse(
        kind: BallotKind,
        raw: &RawBallot,
        roster: &Roster,
        rules: &TabulationRules,
    ) -> Result<Ballot, BallotError> {
        match (kind, raw) {
            (BallotKind::Plurality, RawBallot::Single(id)) => {
                if id.trim().is_empty() {
                    return Err(BallotError::EmptyChoice {});
                }
                Ok(Ballot::Plurality(PluralityBallot {
                    choice: roster.resolve(id)?,
                }))
            }
            (BallotKind::Approval, RawBallot::List(ids)) => {
                let mut approved: BTreeSet<CandidateId> = BTreeSet::new();
                for id in ids {
                    if !approved.insert(roster.resolve(id)?) {
                        return Err(BallotError::DuplicateCandidate { id: id.clone() });
                    }
                }
                Ok(Ballot::Approval(ApprovalBallot { approved }))
            }
            (BallotKind::Ranking, RawBallot::List(ids)) => {
                let preferences = ids
                    .iter()
                    .map(|id| roster.resolve(id))
                    .collect::<Result<Vec<CandidateId>, BallotError>>()?;
                RankedBallot::new(preferences)
                    .map(Ballot::Ranking)
                    .map_err(|pos| BallotError::DuplicateCandidate {
                        id: ids[pos].clone(),
                    })
            }
            (BallotKind::Scored, RawBallot::Scores(pairs)) => {
                let mut scores: BTreeMap<CandidateId, u32> = BTreeMap::new();
                for (id, value) in pairs {
                    let cid = roster.resolve(id)?;
                    let score = parse_score(id, value, rules.max_score)?;
                    if scores.insert(cid, score).is_some() {
                        return Err(BallotError::DuplicateCandidate { id: id.clone() });
                    }
                }
                Ok(Ballot::Scored(ScoredBallot { scores }))
            }
            (expected, found) => {
                debug!("Ballot::parse: expected {} ballot, got {:?}", expected, found);
                Err(BallotError::WrongShape {
                    expected,
                    found: found.shape(),
                })
            }
        }
    }
}

fn parse_score(id: &str, value: &str, max: u32) -> Result<u32, BallotError> {
    let v: i64 = value
        .trim()
        .parse::<i64>()
        .map_err(|_| BallotError::NonIntegerScore {
            id: id.to_string(),
            value: value.to_string(),
        })?;
    if v < 0 || v > max as i64 {
        return Err(BallotError::ScoreOutOfRange {
            id: id.to_string(),
            value: v,
            max,
        });
    }
    Ok(v as u32)
}

/// A ballot type consumed by one calculator.
pub trait BallotShape: Sized {
    const KIND: BallotKind;

    /// Returns the ballot back if it is of another shape.
    fn from_ballot(ballot: Ballot) -> Result<Self, Ballot>;
}

impl BallotShape for PluralityBallot {
    const KIND: BallotKind = BallotKind::Plurality;

    fn from_ballot(ballot: Ballot) -> Result<Self, Ballot> {
        match ballot {
            Ballot::Plurality(b) => Ok(b),
            other => Err(other),
        }
    }
}

impl BallotShape for ApprovalBallot {
    const KIND: BallotKind = BallotKind::Approval;

    fn from_ballot(ballot: Ballot) -> Result<Self, Ballot> {
        match ballot {
            Ballot::Approval(b) => Ok(b),
            other => Err(other),
        }
    }
}

impl BallotShape for RankedBallot {
    const KIND: BallotKind = BallotKind::Ranking;

    fn from_ballot(ballot: Ballot) -> Result<Self, Ballot> {
        match ballot {
            Ballot::Ranking(b) => Ok(b),
            other => Err(other),
        }
    }
}

impl BallotShape for ScoredBallot {
    const KIND: BallotKind = BallotKind::Scored;

    fn from_ballot(ballot: Ballot) -> Result<Self, Ballot> {
        match ballot {
            Ballot::Scored(b) => Ok(b),
            other => Err(other),
        }
    }
}

/// Parses every raw ballot into the shape `B`.
///
/// Rejected ballots are counted in the returned diagnostics, with their
/// position in `raws`.
pub fn parse_ballots<B: BallotShape>(
    raws: &[RawBallot],
    roster: &Roster,
    rules: &TabulationRules,
) -> (Vec<B>, Diagnostics) {
    let mut accepted: Vec<B> = Vec::with_capacity(raws.len());
    let mut diagnostics = Diagnostics::default();
    for (idx, raw) in raws.iter().enumerate() {
        let parsed = Ballot::parse(B::KIND, raw, roster, rules).and_then(|b| {
            B::from_ballot(b).map_err(|_| BallotError::WrongShape {
                expected: B::KIND,
                found: raw.shape(),
            })
        });
        match parsed {
            Ok(b) => accepted.push(b),
            Err(e) => {
                debug!("parse_ballots: ballot {} rejected: {}", idx, e);
                diagnostics.reject(idx, e);
            }
        }
    }
    (accepted, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Roster {
        Roster::new(&[
            Candidate::new("B", "Bob", 2),
            Candidate::new("A", "Alice", 1),
            Candidate::new("C", "Carol", 2),
        ])
        .unwrap()
    }

    fn list(ids: &[&str]) -> RawBallot {
        RawBallot::List(ids.iter().map(|s| s.to_string()).collect())
    }

    fn scores(pairs: &[(&str, &str)]) -> RawBallot {
        RawBallot::Scores(
            pairs
                .iter()
                .map(|(id, s)| (id.to_string(), s.to_string()))
                .collect(),
        )
    }

    fn parse(kind: BallotKind, raw: &RawBallot) -> Result<Ballot, BallotError> {
        Ballot::parse(kind, raw, &roster(), &TabulationRules::DEFAULT_RULES)
    }

    #[test]
    fn roster_order() {
        let r = roster();
        let order: Vec<&str> = r.ids().map(|cid| r.candidate(cid).id.as_str()).collect();
        assert_eq!(order, vec!["A", "B", "C"]);
        assert_eq!(r.lookup("C"), Some(CandidateId(2)));
        assert_eq!(r.lookup("Z"), None);
    }

    #[test]
    fn plurality_ballots() {
        let r = roster();
        assert_eq!(
            parse(BallotKind::Plurality, &RawBallot::Single("B".to_string())),
            Ok(Ballot::Plurality(PluralityBallot {
                choice: r.lookup("B").unwrap()
            }))
        );
        assert_eq!(
            parse(BallotKind::Plurality, &RawBallot::Single(" ".to_string())),
            Err(BallotError::EmptyChoice {})
        );
        assert_eq!(
            parse(BallotKind::Plurality, &list(&["A"])),
            Err(BallotError::WrongShape {
                expected: BallotKind::Plurality,
                found: "list of choices"
            })
        );
    }

    #[test]
    fn approval_and_ranking_ballots() {
        let r = roster();
        match parse(BallotKind::Approval, &list(&[])) {
            Ok(Ballot::Approval(b)) => assert!(b.approved.is_empty()),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            parse(BallotKind::Approval, &list(&["A", "A"])),
            Err(BallotError::DuplicateCandidate { id: "A".to_string() })
        );
        match parse(BallotKind::Ranking, &list(&["C", "A"])) {
            Ok(Ballot::Ranking(b)) => assert_eq!(
                b.preferences(),
                &[r.lookup("C").unwrap(), r.lookup("A").unwrap()]
            ),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            parse(BallotKind::Ranking, &list(&["C", "B", "C"])),
            Err(BallotError::DuplicateCandidate { id: "C".to_string() })
        );
        // An unknown candidate anywhere rejects the whole ballot.
        assert_eq!(
            parse(BallotKind::Ranking, &list(&["A", "Z"])),
            Err(BallotError::UnknownCandidate { id: "Z".to_string() })
        );
        // Even when a candidate is also repeated.
        assert_eq!(
            parse(BallotKind::Ranking, &list(&["A", "A", "Z"])),
            Err(BallotError::UnknownCandidate { id: "Z".to_string() })
        );
    }

    #[test]
    fn scored_ballots() {
        match parse(BallotKind::Scored, &scores(&[("A", "10"), ("B", " 0 ")])) {
            Ok(Ballot::Scored(b)) => {
                assert_eq!(b.scores.values().copied().collect::<Vec<u32>>(), vec![10, 0])
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            parse(BallotKind::Scored, &scores(&[("A", "11")])),
            Err(BallotError::ScoreOutOfRange {
                id: "A".to_string(),
                value: 11,
                max: MAX_SCORE
            })
        );
        assert_eq!(
            parse(BallotKind::Scored, &scores(&[("A", "-1")])),
            Err(BallotError::ScoreOutOfRange {
                id: "A".to_string(),
                value: -1,
                max: MAX_SCORE
            })
        );
        assert_eq!(
            parse(BallotKind::Scored, &scores(&[("A", "2.5")])),
            Err(BallotError::NonIntegerScore {
                id: "A".to_string(),
                value: "2.5".to_string()
            })
        );
        assert_eq!(
            parse(BallotKind::Scored, &RawBallot::Unreadable("???".to_string())),
            Err(BallotError::WrongShape {
                expected: BallotKind::Scored,
                found: "unreadable payload"
            })
        );
    }

    #[test]
    fn ranked_ballot_progression() {
        let r = roster();
        let (a, b, c) = (
            r.lookup("A").unwrap(),
            r.lookup("B").unwrap(),
            r.lookup("C").unwrap(),
        );
        assert_eq!(RankedBallot::new(vec![a, b, a]), Err(2));
        let ballot = RankedBallot::new(vec![b, c]).unwrap();
        let mut active: BTreeSet<CandidateId> = r.ids().collect();
        assert_eq!(ballot.current_preference(&active), Some(b));
        active.remove(&b);
        assert_eq!(ballot.current_preference(&active), Some(c));
        active.remove(&c);
        assert_eq!(ballot.current_preference(&active), None);
    }

    #[test]
    fn diagnostics_split_unknown_from_malformed() {
        let raws = vec![
            list(&["A", "B"]),
            list(&["Z"]),
            RawBallot::Single("A".to_string()),
            list(&["B", "B"]),
            list(&[]),
        ];
        let (ballots, diag) =
            parse_ballots::<RankedBallot>(&raws, &roster(), &TabulationRules::DEFAULT_RULES);
        assert_eq!(ballots.len(), 2);
        assert_eq!(diag.unknown_candidate, 1);
        assert_eq!(diag.malformed, 2);
        let indexes: Vec<usize> = diag.rejections.iter().map(|r| r.index).collect();
        assert_eq!(indexes, vec![1, 2, 3]);
    }
}
