use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};

use super::*;

pub const WON_BY_DEFAULT: &str = "won by default as the last remaining candidate";
pub const ELIMINATED_IN_FINAL_TIE: &str = "eliminated in a final tie, no candidate remains";

/// Instant-runoff voting. Backs both RCV and the single-winner STV.
///
/// Each round counts every ballot for its highest-ranked candidate still
/// running. A candidate with a majority of the non-exhausted ballots wins.
/// Otherwise all the candidates tied at the lowest tally are eliminated
/// together (there is no secondary tie-break) and the next round starts.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct InstantRunoff;

#[derive(Eq, PartialEq, Debug, Clone)]
struct RoundCount {
    // Only the candidates still running.
    tally: BTreeMap<CandidateId, u64>,
    active_ballots: u64,
    exhausted_ballots: u64,
    threshold: u64,
}

/// How the count ended.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
enum Termination {
    /// A candidate reached the majority threshold.
    Majority(CandidateId),
    /// One candidate was left running, whatever its tally.
    LastStanding(CandidateId),
    /// The last candidates running were eliminated together.
    Exhausted,
}

#[derive(Eq, PartialEq, Debug, Clone)]
enum RoundOutcome {
    Finished(Termination),
    Eliminate(Vec<CandidateId>),
}

fn count_round(ballots: &[RankedBallot], active: &BTreeSet<CandidateId>) -> RoundCount {
    // Initialize with every running candidate to capture the ones without any vote.
    let mut tally: BTreeMap<CandidateId, u64> = active.iter().map(|cid| (*cid, 0)).collect();
    let mut active_ballots: u64 = 0;
    let mut exhausted_ballots: u64 = 0;
    for b in ballots.iter() {
        match b.current_preference(active) {
            Some(cid) => {
                *tally.entry(cid).or_insert(0) += 1;
                active_ballots += 1;
            }
            None => exhausted_ballots += 1,
        }
    }
    RoundCount {
        tally,
        active_ballots,
        exhausted_ballots,
        threshold: active_ballots / 2 + 1,
    }
}

fn decide_round(count: &RoundCount) -> RoundOutcome {
    if let Some((cid, _)) = count.tally.iter().find(|(_, t)| **t >= count.threshold) {
        return RoundOutcome::Finished(Termination::Majority(*cid));
    }
    if count.tally.len() == 1 {
        if let Some(cid) = count.tally.keys().next() {
            return RoundOutcome::Finished(Termination::LastStanding(*cid));
        }
    }
    match count.tally.values().min() {
        Some(min) => RoundOutcome::Eliminate(
            count
                .tally
                .iter()
                .filter(|(_, t)| *t == min)
                .map(|(cid, _)| *cid)
                .collect(),
        ),
        None => RoundOutcome::Finished(Termination::Exhausted),
    }
}

type Transfers = BTreeMap<CandidateId, (BTreeMap<CandidateId, u64>, u64)>;

/// For each eliminated candidate, where its ballots go next (or how many exhaust).
fn compute_transfers(
    ballots: &[RankedBallot],
    active: &BTreeSet<CandidateId>,
    eliminated: &BTreeSet<CandidateId>,
    remaining: &BTreeSet<CandidateId>,
) -> Transfers {
    let mut res: Transfers = eliminated
        .iter()
        .map(|cid| (*cid, (BTreeMap::new(), 0)))
        .collect();
    for b in ballots.iter() {
        let Some(current) = b.current_preference(active) else {
            continue;
        };
        if let Some(e) = res.get_mut(&current) {
            match b.current_preference(remaining) {
                Some(next) => *e.0.entry(next).or_insert(0) += 1,
                None => e.1 += 1,
            }
        }
    }
    res
}

impl TabulationCalculator for InstantRunoff {
    type Ballot = RankedBallot;

    fn tabulate(&self, roster: &Roster, ballots: &[RankedBallot]) -> MethodTally {
        let name = |cid: &CandidateId| roster.candidate(*cid).name.clone();
        let id = |cid: &CandidateId| roster.candidate(*cid).id.clone();
        let n = roster.len();

        let mut active: BTreeSet<CandidateId> = roster.ids().collect();
        // The last tally taken for each candidate, with the active ballots of that round.
        let mut last_count: Vec<(u64, u64)> = vec![(0, 0); n];
        let mut standings: Vec<Standing> = vec![Standing::Contending; n];
        let mut rounds: Vec<RoundStats> = Vec::new();
        let mut termination = Termination::Exhausted;

        // Every round either terminates or eliminates at least one candidate,
        // so there are at most as many rounds as candidates.
        for round in 1..=n as u32 {
            let count = count_round(ballots, &active);
            info!(
                "Round {} (winning threshold: {}, active ballots: {}, exhausted: {})",
                round, count.threshold, count.active_ballots, count.exhausted_ballots
            );
            for (cid, t) in count.tally.iter() {
                info!("      {} {}", t, name(cid));
                last_count[cid.index()] = (*t, count.active_ballots);
            }

            let mut stats = RoundStats {
                round,
                threshold: count.threshold,
                active_ballots: count.active_ballots,
                exhausted_ballots: count.exhausted_ballots,
                tally: count.tally.iter().map(|(cid, t)| (id(cid), *t)).collect(),
                elected: Vec::new(),
                eliminated: Vec::new(),
            };

            match decide_round(&count) {
                RoundOutcome::Finished(t) => {
                    if let Termination::Majority(cid) | Termination::LastStanding(cid) = t {
                        info!("Round {}: {} -> elected", round, name(&cid));
                        stats.elected.push(id(&cid));
                    }
                    rounds.push(stats);
                    termination = t;
                    break;
                }
                RoundOutcome::Eliminate(losers) => {
                    let eliminated: BTreeSet<CandidateId> = losers.iter().copied().collect();
                    let remaining: BTreeSet<CandidateId> =
                        active.difference(&eliminated).copied().collect();
                    let transfers = compute_transfers(ballots, &active, &eliminated, &remaining);
                    debug!("Round {}: transfers: {:?}", round, transfers);

                    for (cid, (to, exhausted)) in transfers.iter() {
                        standings[cid.index()] = Standing::Eliminated { round };
                        info!(
                            "Round {}: {} -> eliminated: {} transferred, {} exhausted",
                            round,
                            name(cid),
                            to.values().sum::<u64>(),
                            exhausted
                        );
                        stats.eliminated.push(EliminationStats {
                            candidate_id: id(cid),
                            name: name(cid),
                            transfers: to.iter().map(|(c, v)| (id(c), *v)).collect(),
                            exhausted: *exhausted,
                        });
                    }
                    rounds.push(stats);
                    active = remaining;
                    if active.is_empty() {
                        termination = Termination::Exhausted;
                        break;
                    }
                }
            }
        }

        let mut entries: Vec<TallyEntry> = roster
            .ids()
            .map(|cid| {
                let (tally, base) = last_count[cid.index()];
                TallyEntry {
                    candidate: cid,
                    tally,
                    percentage: percentage(tally, base),
                    standing: standings[cid.index()],
                    is_winner: false,
                    note: None,
                }
            })
            .collect();

        let decision = match termination {
            Termination::Majority(cid) | Termination::LastStanding(cid) => {
                let e = &mut entries[cid.index()];
                e.standing = Standing::Elected;
                e.is_winner = true;
                if matches!(termination, Termination::LastStanding(_)) {
                    e.note = Some(WON_BY_DEFAULT.to_string());
                }
                Decision::Winner(cid)
            }
            Termination::Exhausted => {
                let last_round = rounds.len() as u32;
                for e in entries.iter_mut() {
                    if e.standing == (Standing::Eliminated { round: last_round }) {
                        e.note = Some(ELIMINATED_IN_FINAL_TIE.to_string());
                    }
                }
                Decision::NoWinner
            }
        };

        MethodTally {
            entries,
            decision,
            percentage_basis: PercentageBasis::RoundActiveBallots,
            rounds,
            pairwise: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(ids: &[&str]) -> Roster {
        let cands: Vec<Candidate> = ids
            .iter()
            .enumerate()
            .map(|(idx, id)| Candidate::new(id, &format!("Candidate {}", id), idx as i32))
            .collect();
        Roster::new(&cands).unwrap()
    }

    fn rankings(roster: &Roster, ballots: &[&[&str]]) -> Vec<RankedBallot> {
        ballots
            .iter()
            .map(|prefs| {
                RankedBallot::new(prefs.iter().map(|id| roster.lookup(id).unwrap()).collect())
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn transfer_decides_second_round() {
        let r = roster(&["A", "B", "C"]);
        let ballots = rankings(
            &r,
            &[
                &["A", "B", "C"],
                &["A", "C", "B"],
                &["B", "A", "C"],
                &["C", "B", "A"],
                &["B", "C", "A"],
            ],
        );
        let res = InstantRunoff.tabulate(&r, &ballots);
        let (a, b, c) = (
            r.lookup("A").unwrap(),
            r.lookup("B").unwrap(),
            r.lookup("C").unwrap(),
        );
        assert_eq!(res.decision, Decision::Winner(b));
        assert_eq!(res.rounds.len(), 2);

        let r1 = &res.rounds[0];
        assert_eq!(r1.threshold, 3);
        assert_eq!(
            r1.tally,
            vec![
                ("A".to_string(), 2),
                ("B".to_string(), 2),
                ("C".to_string(), 1)
            ]
        );
        assert_eq!(r1.eliminated.len(), 1);
        assert_eq!(r1.eliminated[0].candidate_id, "C");
        assert_eq!(r1.eliminated[0].name, "Candidate C");
        assert_eq!(r1.eliminated[0].transfers, vec![("B".to_string(), 1)]);

        let r2 = &res.rounds[1];
        assert_eq!(r2.elected, vec!["B".to_string()]);

        assert_eq!(res.entry(b).tally, 3);
        assert_eq!(res.entry(b).percentage, 60.0);
        assert_eq!(res.entry(b).standing, Standing::Elected);
        assert_eq!(res.entry(a).tally, 2);
        assert_eq!(res.entry(a).standing, Standing::Contending);
        assert_eq!(res.entry(c).tally, 1);
        assert_eq!(res.entry(c).standing, Standing::Eliminated { round: 1 });
        assert!(res.entry(c).eliminated());
    }

    #[test]
    fn first_round_majority_stops_the_count() {
        let r = roster(&["A", "B", "C"]);
        let ballots = rankings(&r, &[&["A"], &["A", "B"], &["C", "A"]]);
        let res = InstantRunoff.tabulate(&r, &ballots);
        assert_eq!(res.decision, Decision::Winner(r.lookup("A").unwrap()));
        assert_eq!(res.rounds.len(), 1);
        assert!(res.entries.iter().all(|e| !e.eliminated()));
    }

    #[test]
    fn tied_lowest_are_eliminated_together_and_exhausted_ballots_leave_the_base() {
        let r = roster(&["A", "B", "C", "D"]);
        let ballots = rankings(&r, &[&["A"], &["A"], &["B"], &["B"], &["C", "A"], &["D"]]);
        let res = InstantRunoff.tabulate(&r, &ballots);
        let (a, b, c, d) = (
            r.lookup("A").unwrap(),
            r.lookup("B").unwrap(),
            r.lookup("C").unwrap(),
            r.lookup("D").unwrap(),
        );
        assert_eq!(res.rounds.len(), 2);
        let eliminated: Vec<&str> = res.rounds[0]
            .eliminated
            .iter()
            .map(|e| e.candidate_id.as_str())
            .collect();
        assert_eq!(eliminated, vec!["C", "D"]);
        assert_eq!(res.rounds[0].eliminated[1].exhausted, 1);

        let r2 = &res.rounds[1];
        assert_eq!(r2.active_ballots, 5);
        assert_eq!(r2.exhausted_ballots, 1);
        assert_eq!(r2.threshold, 3);
        assert_eq!(res.decision, Decision::Winner(a));
        assert_eq!(res.entry(a).percentage, 60.0);
        assert_eq!(res.entry(b).percentage, 40.0);
        assert_eq!(res.entry(c).percentage, 16.67);
        assert_eq!(res.entry(d).standing, Standing::Eliminated { round: 1 });
    }

    #[test]
    fn final_tie_leaves_no_winner() {
        let r = roster(&["A", "B"]);
        let ballots = rankings(&r, &[&["A", "B"], &["B", "A"]]);
        let res = InstantRunoff.tabulate(&r, &ballots);
        assert_eq!(res.decision, Decision::NoWinner);
        assert!(res.entries.iter().all(|e| e.eliminated()));
        assert!(res
            .entries
            .iter()
            .all(|e| e.note.as_deref() == Some(ELIMINATED_IN_FINAL_TIE)));
        assert!(res.entries.iter().all(|e| e.tally == 1));
    }

    #[test]
    fn no_ballots_terminates_without_winner() {
        let r = roster(&["A", "B", "C"]);
        let res = InstantRunoff.tabulate(&r, &[]);
        assert_eq!(res.decision, Decision::NoWinner);
        assert_eq!(res.rounds.len(), 1);
        assert!(res.entries.iter().all(|e| e.eliminated() && e.tally == 0));
        assert!(res.entries.iter().all(|e| e.percentage == 0.0));
    }

    #[test]
    fn single_candidate_wins_by_default() {
        let r = roster(&["A"]);
        let res = InstantRunoff.tabulate(&r, &[]);
        let a = r.lookup("A").unwrap();
        assert_eq!(res.decision, Decision::Winner(a));
        assert_eq!(res.entry(a).note.as_deref(), Some(WON_BY_DEFAULT));
    }

    #[test]
    fn rounds_are_bounded_by_candidates() {
        let ids = ["A", "B", "C", "D", "E", "F"];
        let r = roster(&ids);
        // Every candidate loses one at a time: F has 1 vote, E 2, ...
        let mut prefs: Vec<&[&str]> = Vec::new();
        let orders: [&[&str]; 6] = [
            &["A", "B", "C", "D", "E", "F"],
            &["B", "A"],
            &["C", "B"],
            &["D", "C"],
            &["E", "D"],
            &["F", "E"],
        ];
        for (idx, order) in orders.iter().enumerate() {
            for _ in 0..(ids.len() - idx) {
                prefs.push(*order);
            }
        }
        let ballots = rankings(&r, &prefs);
        let res = InstantRunoff.tabulate(&r, &ballots);
        assert!(res.rounds.len() <= ids.len());
        assert!(matches!(res.decision, Decision::Winner(_)));
        let last = res.rounds.last().unwrap();
        assert_eq!(last.elected.len(), 1);
        assert!(res.rounds[..res.rounds.len() - 1]
            .iter()
            .all(|rs| rs.elected.is_empty()));
    }

    #[test]
    fn namesakes_keep_separate_counts() {
        let r = Roster::new(&[
            Candidate::new("s1", "Smith", 1),
            Candidate::new("s2", "Smith", 2),
            Candidate::new("j", "Jones", 3),
        ])
        .unwrap();
        let ballots = rankings(
            &r,
            &[&["s1", "j"], &["s1", "j"], &["s2", "s1"], &["j"], &["j"]],
        );
        let res = InstantRunoff.tabulate(&r, &ballots);
        assert_eq!(
            res.rounds[0].tally,
            vec![
                ("s1".to_string(), 2),
                ("s2".to_string(), 1),
                ("j".to_string(), 2)
            ]
        );
        assert_eq!(res.rounds[0].eliminated[0].candidate_id, "s2");
        assert_eq!(
            res.rounds[0].eliminated[0].transfers,
            vec![("s1".to_string(), 1)]
        );
        assert_eq!(res.rounds[1].elected, vec!["s1".to_string()]);
        assert_eq!(res.decision, Decision::Winner(r.lookup("s1").unwrap()));
    }
}
