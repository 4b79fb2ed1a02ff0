mod ballot;
pub mod builder;
mod config;
pub mod manual;
mod methods;
mod ranker;

use log::{debug, info};

pub use crate::ballot::*;
pub use crate::config::*;
pub use crate::methods::{
    Approval, Condorcet, Decision, InstantRunoff, MethodTally, PairwiseMatrix, Plurality, Score,
    Standing, TabulationCalculator, TallyEntry, ELIMINATED_IN_FINAL_TIE, NO_CONDORCET_WINNER,
    TIED_FOR_FIRST, WON_BY_DEFAULT,
};

/// Tabulates one election.
///
/// Arguments:
/// * `ctx` the method, the roster, the raw ballots and the turnout figures
///
/// The call has no side effect besides logging: the same context always
/// produces the same summary, fingerprint included. Ballots that do not
/// validate are left out and reported in the diagnostics. Only a problem with
/// the election setup itself is an error.
pub fn tabulate(ctx: &ElectionTabulationContext) -> Result<TabulationSummary, TabulationError> {
    info!(
        "Tabulating {} ballots with method {}, candidates: {:?}",
        ctx.ballots.len(),
        ctx.method,
        ctx.candidates
    );
    let roster = Roster::new(&ctx.candidates)?;
    for cid in roster.ids() {
        let c = roster.candidate(cid);
        debug!("tabulate: candidate {:?}: {} ({})", cid, c.id, c.name);
    }

    let (tally, diagnostics, counted) = match ctx.method {
        VotingMethod::Fptp => run_calculator(&Plurality, &roster, ctx),
        VotingMethod::Approval => run_calculator(
            &Approval {
                distinct_voters: ctx.turnout.distinct_voters,
            },
            &roster,
            ctx,
        ),
        VotingMethod::Rcv => run_calculator(&InstantRunoff, &roster, ctx),
        VotingMethod::Stv => {
            info!("tabulate: STV is counted as a single-winner instant runoff");
            run_calculator(&InstantRunoff, &roster, ctx)
        }
        VotingMethod::Score => run_calculator(&Score, &roster, ctx),
        VotingMethod::Condorcet => run_calculator(&Condorcet, &roster, ctx),
    };
    info!(
        "tabulate: {} ballots counted, {} malformed, {} with unknown candidates",
        counted, diagnostics.malformed, diagnostics.unknown_candidate
    );

    let results = ranker::rank(&roster, &tally);
    let outcome = match &tally.decision {
        Decision::Winner(cid) => Outcome::Winner(roster.candidate(*cid).id.clone()),
        Decision::Tie(cids) => Outcome::Tie(
            cids.iter()
                .map(|cid| roster.candidate(*cid).id.clone())
                .collect(),
        ),
        Decision::NoWinner => Outcome::NoWinner,
    };
    info!("tabulate: outcome: {:?}", outcome);

    let fingerprint = fingerprint(ctx, &roster, &results);
    Ok(TabulationSummary {
        method: ctx.method,
        results,
        outcome,
        percentage_basis: tally.percentage_basis,
        ballots_counted: counted,
        // Capped at 100 when more voters than eligible voters are reported.
        turnout_percentage: ranker::percentage(
            ctx.turnout.distinct_voters.min(ctx.turnout.eligible_voters),
            ctx.turnout.eligible_voters,
        ),
        diagnostics,
        round_stats: tally.rounds,
        pairwise: tally.pairwise,
        fingerprint,
    })
}

fn run_calculator<C: TabulationCalculator>(
    calculator: &C,
    roster: &Roster,
    ctx: &ElectionTabulationContext,
) -> (MethodTally, Diagnostics, u64) {
    let (ballots, diagnostics) = parse_ballots::<C::Ballot>(&ctx.ballots, roster, &ctx.rules);
    let tally = calculator.tabulate(roster, &ballots);
    (tally, diagnostics, ballots.len() as u64)
}

/// SHA-256 over the inputs and the ordered results, as lowercase hex.
fn fingerprint(
    ctx: &ElectionTabulationContext,
    roster: &Roster,
    results: &[TabulationResult],
) -> String {
    let mut lines: Vec<String> = vec![format!("method:{}", ctx.method)];
    for cid in roster.ids() {
        let c = roster.candidate(cid);
        lines.push(format!("candidate:{}|{}|{}", c.id, c.name, c.display_order));
    }
    for b in ctx.ballots.iter() {
        lines.push(format!("ballot:{}", b));
    }
    for r in results.iter() {
        lines.push(format!(
            "result:{}|{}|{}|{:.2}|{}|{}",
            r.candidate_id, r.rank, r.tally, r.percentage, r.eliminated, r.is_winner
        ));
    }
    let payload = lines.join("\n");
    sha256::digest(payload.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn candidates() -> Vec<Candidate> {
        vec![
            Candidate::new("A", "Alice", 1),
            Candidate::new("B", "Bob", 2),
            Candidate::new("C", "Carol", 3),
        ]
    }

    fn single(id: &str) -> RawBallot {
        RawBallot::Single(id.to_string())
    }

    fn list(ids: &[&str]) -> RawBallot {
        RawBallot::List(ids.iter().map(|s| s.to_string()).collect())
    }

    fn context(method: VotingMethod, ballots: Vec<RawBallot>) -> ElectionTabulationContext {
        let n = ballots.len() as u64;
        ElectionTabulationContext {
            method,
            candidates: candidates(),
            ballots,
            turnout: Turnout {
                eligible_voters: n * 2,
                distinct_voters: n,
            },
            rules: TabulationRules::DEFAULT_RULES,
        }
    }

    fn ids(summary: &TabulationSummary) -> Vec<(&str, u32)> {
        summary
            .results
            .iter()
            .map(|r| (r.candidate_id.as_str(), r.rank))
            .collect()
    }

    #[test]
    fn plurality_end_to_end() {
        init();
        let ctx = context(
            VotingMethod::Fptp,
            vec![
                single("A"),
                single("B"),
                single("A"),
                single("C"),
                single("A"),
                single("Z"),
                list(&["A"]),
            ],
        );
        let s = tabulate(&ctx).unwrap();
        assert_eq!(s.outcome, Outcome::Winner("A".to_string()));
        assert_eq!(ids(&s), vec![("A", 1), ("B", 2), ("C", 2)]);
        assert_eq!(s.results[0].percentage, 60.0);
        assert!(s.results[0].is_winner);
        assert_eq!(s.ballots_counted, 5);
        assert_eq!(s.diagnostics.unknown_candidate, 1);
        assert_eq!(s.diagnostics.malformed, 1);
        assert_eq!(s.diagnostics.excluded(), 2);
        assert_eq!(s.diagnostics.rejections[0].index, 5);
        assert_eq!(s.turnout_percentage, 50.0);
        assert_eq!(s.percentage_basis, PercentageBasis::BallotsCast);
    }

    #[test]
    fn every_method_reports_the_whole_roster() {
        init();
        let ranked = vec![list(&["A", "B"]), list(&["B", "C", "A"]), list(&["C"])];
        let cases = vec![
            context(VotingMethod::Fptp, vec![single("A")]),
            context(VotingMethod::Approval, vec![list(&["A", "C"])]),
            context(VotingMethod::Rcv, ranked.clone()),
            context(VotingMethod::Stv, ranked.clone()),
            context(VotingMethod::Condorcet, ranked),
            context(
                VotingMethod::Score,
                vec![RawBallot::Scores(vec![("B".to_string(), "4".to_string())])],
            ),
        ];
        for ctx in cases.iter() {
            let s = tabulate(ctx).unwrap();
            let mut got: Vec<&str> = s.results.iter().map(|r| r.candidate_id.as_str()).collect();
            got.sort_unstable();
            assert_eq!(got, vec!["A", "B", "C"], "method {}", ctx.method);
            let winners = s.results.iter().filter(|r| r.is_winner).count();
            assert!(winners <= 1);
            assert_eq!(winners == 1, s.outcome.winner().is_some());
            for r in s.results.iter() {
                assert!((0.0..=100.0).contains(&r.percentage));
                assert!(r.rank >= 1);
            }
        }
    }

    #[test]
    fn rcv_and_stv_agree() {
        init();
        let ranked = vec![
            list(&["A", "B"]),
            list(&["A", "C"]),
            list(&["B", "A"]),
            list(&["B", "C"]),
            list(&["C", "B"]),
        ];
        let rcv = tabulate(&context(VotingMethod::Rcv, ranked.clone())).unwrap();
        let stv = tabulate(&context(VotingMethod::Stv, ranked)).unwrap();
        assert_eq!(rcv.results, stv.results);
        assert_eq!(rcv.outcome, Outcome::Winner("B".to_string()));
        assert_eq!(rcv.round_stats.len(), 2);
        // The method is part of the fingerprint.
        assert_ne!(rcv.fingerprint, stv.fingerprint);
    }

    #[test]
    fn tabulation_is_deterministic() {
        init();
        let ctx = context(
            VotingMethod::Condorcet,
            vec![
                list(&["A", "B", "C"]),
                list(&["B", "C", "A"]),
                list(&["C", "A", "B"]),
            ],
        );
        let first = tabulate(&ctx).unwrap();
        let second = tabulate(&ctx).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.fingerprint.len(), 64);
        assert_eq!(first.outcome, Outcome::NoWinner);
        assert_eq!(ids(&first), vec![("A", 1), ("B", 1), ("C", 1)]);
        assert!(first.pairwise.is_some());
    }

    #[test]
    fn condorcet_without_winner_keeps_the_roster_order() {
        init();
        let s = tabulate(&context(
            VotingMethod::Condorcet,
            vec![list(&["A"]), list(&["C", "B"])],
        ))
        .unwrap();
        assert_eq!(s.outcome, Outcome::NoWinner);
        let got: Vec<(&str, u32, u64)> = s
            .results
            .iter()
            .map(|r| (r.candidate_id.as_str(), r.rank, r.tally))
            .collect();
        assert_eq!(got, vec![("A", 1, 0), ("B", 1, 0), ("C", 1, 1)]);
    }

    #[test]
    fn display_order_breaks_ties() {
        init();
        let mut ctx = context(
            VotingMethod::Approval,
            vec![list(&["A", "B", "C"]), list(&["C", "B", "A"])],
        );
        ctx.candidates = vec![
            Candidate::new("A", "Alice", 3),
            Candidate::new("B", "Bob", 1),
            Candidate::new("C", "Carol", 2),
        ];
        let s = tabulate(&ctx).unwrap();
        assert_eq!(ids(&s), vec![("B", 1), ("C", 1), ("A", 1)]);
        assert_eq!(
            s.outcome,
            Outcome::Tie(vec!["B".to_string(), "C".to_string(), "A".to_string()])
        );
        assert!(s
            .results
            .iter()
            .all(|r| !r.is_winner && r.note.as_deref() == Some(TIED_FOR_FIRST)));
    }

    #[test]
    fn no_valid_ballots() {
        init();
        let s = tabulate(&context(VotingMethod::Score, vec![single("A")])).unwrap();
        assert_eq!(s.outcome, Outcome::NoWinner);
        assert_eq!(s.ballots_counted, 0);
        assert_eq!(s.diagnostics.malformed, 1);
        assert!(s.results.iter().all(|r| r.tally == 0 && r.percentage == 0.0));
        assert_eq!(ids(&s), vec![("A", 1), ("B", 1), ("C", 1)]);
    }

    #[test]
    fn setup_errors() {
        init();
        let mut ctx = context(VotingMethod::Fptp, vec![single("A")]);
        ctx.candidates = Vec::new();
        assert_eq!(tabulate(&ctx), Err(TabulationError::EmptyRoster {}));

        ctx.candidates = vec![Candidate::new("A", "Alice", 1), Candidate::new("A", "Ann", 2)];
        assert_eq!(
            tabulate(&ctx),
            Err(TabulationError::DuplicateRosterEntry {
                id: "A".to_string()
            })
        );

        assert_eq!(
            "borda".parse::<VotingMethod>(),
            Err(TabulationError::UnsupportedMethod {
                method: "borda".to_string()
            })
        );
    }
}
