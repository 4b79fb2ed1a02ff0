// ********* Input data structures ***********

use snafu::Snafu;
use std::fmt::Display;
use std::str::FromStr;

use crate::ballot::BallotKind;

/// Highest score a voter may give to one candidate with the score method.
pub const MAX_SCORE: u32 = 10;

/// A candidate standing in an election.
///
/// Candidates are created by the election setup and are only read during a
/// tabulation.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Candidate {
    /// Opaque identifier, unique within one election.
    pub id: String,
    pub name: String,
    pub display_order: i32,
}

impl Candidate {
    pub fn new(id: &str, name: &str, display_order: i32) -> Candidate {
        Candidate {
            id: id.to_string(),
            name: name.to_string(),
            display_order,
        }
    }
}

/// The voting methods an election may be configured with.
///
/// RCV and STV are both tabulated by the instant-runoff calculator: STV is a
/// single-winner elimination here, not a quota-based multi-seat count.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum VotingMethod {
    Fptp,
    Approval,
    Rcv,
    Stv,
    Score,
    Condorcet,
}

impl VotingMethod {
    /// The shape of ballot this method consumes.
    pub fn ballot_kind(&self) -> BallotKind {
        match self {
            VotingMethod::Fptp => BallotKind::Plurality,
            VotingMethod::Approval => BallotKind::Approval,
            VotingMethod::Rcv | VotingMethod::Stv | VotingMethod::Condorcet => BallotKind::Ranking,
            VotingMethod::Score => BallotKind::Scored,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            VotingMethod::Fptp => "FPTP",
            VotingMethod::Approval => "Approval",
            VotingMethod::Rcv => "RCV",
            VotingMethod::Stv => "STV",
            VotingMethod::Score => "Score",
            VotingMethod::Condorcet => "Condorcet",
        }
    }
}

impl Display for VotingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for VotingMethod {
    type Err = TabulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fptp" | "plurality" => Ok(VotingMethod::Fptp),
            "approval" => Ok(VotingMethod::Approval),
            "rcv" | "irv" => Ok(VotingMethod::Rcv),
            "stv" => Ok(VotingMethod::Stv),
            "score" => Ok(VotingMethod::Score),
            "condorcet" => Ok(VotingMethod::Condorcet),
            _ => Err(TabulationError::UnsupportedMethod {
                method: s.to_string(),
            }),
        }
    }
}

/// A ballot as it was stored by the calling system, before any validation.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum RawBallot {
    /// A single candidate id.
    Single(String),
    /// A list of candidate ids. For ranked methods the most preferred comes first.
    List(Vec<String>),
    /// Candidate ids with the score given to each, still in textual form.
    Scores(Vec<(String, String)>),
    /// A payload that could not be read as any of the shapes above.
    Unreadable(String),
}

impl RawBallot {
    pub fn shape(&self) -> &'static str {
        match self {
            RawBallot::Single(_) => "single choice",
            RawBallot::List(_) => "list of choices",
            RawBallot::Scores(_) => "score map",
            RawBallot::Unreadable(_) => "unreadable payload",
        }
    }
}

impl Display for RawBallot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawBallot::Single(id) => write!(f, "{}", id),
            RawBallot::List(ids) => write!(f, "[{}]", ids.join(",")),
            RawBallot::Scores(scores) => {
                let parts: Vec<String> = scores.iter().map(|(id, s)| format!("{}={}", id, s)).collect();
                write!(f, "{{{}}}", parts.join(","))
            }
            RawBallot::Unreadable(content) => write!(f, "<{}>", content),
        }
    }
}

/// Turnout figures. They only serve as percentage bases.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct Turnout {
    pub eligible_voters: u64,
    pub distinct_voters: u64,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TabulationRules {
    /// Upper bound (inclusive) of a score on a scored ballot.
    pub max_score: u32,
}

impl TabulationRules {
    pub const DEFAULT_RULES: TabulationRules = TabulationRules {
        max_score: MAX_SCORE,
    };
}

impl Default for TabulationRules {
    fn default() -> Self {
        TabulationRules::DEFAULT_RULES
    }
}

/// Everything the engine needs for one tabulation run.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ElectionTabulationContext {
    pub method: VotingMethod,
    pub candidates: Vec<Candidate>,
    pub ballots: Vec<RawBallot>,
    pub turnout: Turnout,
    pub rules: TabulationRules,
}

// ******** Output data structures *********

/// The final standing of one candidate.
#[derive(PartialEq, Debug, Clone)]
pub struct TabulationResult {
    pub candidate_id: String,
    pub display_name: String,
    /// Competition rank: tied candidates share a rank and the next rank skips ("1,1,3").
    pub rank: u32,
    /// Votes, approvals, total score or pairwise wins depending on the method.
    pub tally: u64,
    /// Between 0 and 100, rounded to two decimals. See `PercentageBasis`.
    pub percentage: f64,
    pub eliminated: bool,
    pub is_winner: bool,
    pub note: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Outcome {
    Winner(String),
    /// Several candidates share the highest tally. None of them is flagged as winner.
    Tie(Vec<String>),
    NoWinner,
}

impl Outcome {
    pub fn winner(&self) -> Option<&str> {
        match self {
            Outcome::Winner(id) => Some(id.as_str()),
            _ => None,
        }
    }
}

/// What the percentages of a result set are relative to.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum PercentageBasis {
    /// Share of the valid ballots.
    BallotsCast,
    /// Share of the distinct voters. Percentages do not add up to 100.
    DistinctVoters,
    /// Share of the active ballots in the round the tally was taken.
    RoundActiveBallots,
    /// Relative to the highest total score: the top candidate always shows 100.
    TopScore,
    /// 100 for a Condorcet winner, 0 for everyone else.
    CondorcetWinner,
}

impl Display for PercentageBasis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PercentageBasis::BallotsCast => "ballotsCast",
            PercentageBasis::DistinctVoters => "distinctVoters",
            PercentageBasis::RoundActiveBallots => "roundActiveBallots",
            PercentageBasis::TopScore => "topScore",
            PercentageBasis::CondorcetWinner => "condorcetWinner",
        };
        write!(f, "{}", s)
    }
}

/// Where the ballots of an eliminated candidate went.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct EliminationStats {
    pub candidate_id: String,
    pub name: String,
    /// Transfers to the next continuing preference, by candidate id.
    pub transfers: Vec<(String, u64)>,
    pub exhausted: u64,
}

/// Statistics for one instant-runoff round
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RoundStats {
    pub round: u32,
    pub threshold: u64,
    pub active_ballots: u64,
    pub exhausted_ballots: u64,
    /// Tally of the candidates still running at the start of the round, by
    /// candidate id. Names are not unique, ids are.
    pub tally: Vec<(String, u64)>,
    /// Ids of the candidates elected in this round.
    pub elected: Vec<String>,
    pub eliminated: Vec<EliminationStats>,
}

/// Head-to-head record: `wins[a][b]` ballots prefer candidate `a` over `b`.
/// Candidates are listed by id in roster order.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PairwiseRecord {
    pub candidates: Vec<String>,
    pub wins: Vec<Vec<u64>>,
}

impl PairwiseRecord {
    pub fn wins(&self, a: &str, b: &str) -> Option<u64> {
        let ia = self.candidates.iter().position(|c| c == a)?;
        let ib = self.candidates.iter().position(|c| c == b)?;
        Some(self.wins[ia][ib])
    }
}

/// A ballot left out of the count.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct BallotRejection {
    /// Position of the ballot in the input sequence.
    pub index: usize,
    pub error: BallotError,
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Diagnostics {
    pub malformed: u64,
    pub unknown_candidate: u64,
    pub rejections: Vec<BallotRejection>,
}

impl Diagnostics {
    pub fn excluded(&self) -> u64 {
        self.malformed + self.unknown_candidate
    }

    pub(crate) fn reject(&mut self, index: usize, error: BallotError) {
        if error.is_unknown_candidate() {
            self.unknown_candidate += 1;
        } else {
            self.malformed += 1;
        }
        self.rejections.push(BallotRejection { index, error });
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct TabulationSummary {
    pub method: VotingMethod,
    /// One entry per roster candidate, in final rank order.
    pub results: Vec<TabulationResult>,
    pub outcome: Outcome,
    pub percentage_basis: PercentageBasis,
    pub ballots_counted: u64,
    pub turnout_percentage: f64,
    pub diagnostics: Diagnostics,
    /// Only filled for the instant-runoff methods.
    pub round_stats: Vec<RoundStats>,
    /// Only filled for Condorcet.
    pub pairwise: Option<PairwiseRecord>,
    /// SHA-256 over the inputs and the ordered results.
    pub fingerprint: String,
}

// ********* Errors **********

/// Reasons for leaving a single ballot out of the count.
#[derive(Eq, PartialEq, Debug, Clone, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum BallotError {
    #[snafu(display("expected a {expected} ballot, found a {found}"))]
    WrongShape {
        expected: BallotKind,
        found: &'static str,
    },
    #[snafu(display("the ballot does not name a candidate"))]
    EmptyChoice {},
    #[snafu(display("candidate {id} appears more than once"))]
    DuplicateCandidate { id: String },
    #[snafu(display("score '{value}' for candidate {id} is not an integer"))]
    NonIntegerScore { id: String, value: String },
    #[snafu(display("score {value} for candidate {id} is outside 0..={max}"))]
    ScoreOutOfRange { id: String, value: i64, max: u32 },
    #[snafu(display("candidate {id} is not on the roster"))]
    UnknownCandidate { id: String },
}

impl BallotError {
    pub fn is_unknown_candidate(&self) -> bool {
        matches!(self, BallotError::UnknownCandidate { .. })
    }
}

/// Errors that prevent a tabulation from producing any result.
#[derive(Eq, PartialEq, Debug, Clone, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TabulationError {
    #[snafu(display("unsupported voting method '{method}'"))]
    UnsupportedMethod { method: String },
    #[snafu(display("no candidates configured"))]
    EmptyRoster {},
    #[snafu(display("candidate id {id} appears more than once in the roster"))]
    DuplicateRosterEntry { id: String },
}
