use log::{debug, info, warn};

use ballot_tabulation::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::election::config_reader::*;

mod config_reader;
mod io_common;
mod io_csv;
mod io_json;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ElectionError {
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing file {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON: {source}"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("{path}: expected a JSON array of ballots"))]
    JsonNotArray { path: String },
    #[snafu(display("{field}: expected a positive number or a column name"))]
    ParsingJsonNumber { field: String },
    #[snafu(display("Candidate {name}: the id must be a string or a number"))]
    InvalidCandidateId { name: String },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of the CSV file"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Line {lineno} of the CSV file is too short"))]
    CsvLineTooShort { lineno: usize },
    #[snafu(display("{path}: score ballots need a header row with the candidate ids"))]
    CsvMissingHeader { path: String },
    #[snafu(display("Missing parent directory for {path}"))]
    MissingParentDir { path: String },
    #[snafu(display("Input provider not implemented: {provider}"))]
    UnknownProvider { provider: String },
    #[snafu(display("Neither a configuration nor an input file was given"))]
    MissingInput {},
    #[snafu(display("No voting method given"))]
    MissingMethod {},
    #[snafu(display("Tabulation failed: {source}"))]
    Tabulation { source: TabulationError },
    #[snafu(display("Difference detected between calculated summary and reference summary"))]
    ReferenceMismatch {},
}

pub type ElectionResult<T> = Result<T, ElectionError>;

/// A ballot, as read from the input sources.
/// The payload is not validated: the tabulation decides if it is counted.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedBallot {
    pub id: Option<String>,
    pub ballot: RawBallot,
}

// Candidates are keyed by id: two candidates may share a name.
fn round_stats_to_json(rounds: &[RoundStats]) -> Vec<JSValue> {
    let mut l: Vec<JSValue> = Vec::new();
    for round_stat in rounds.iter() {
        let mut tally: JSMap<String, JSValue> = JSMap::new();
        for (cand_id, count) in round_stat.tally.iter() {
            tally.insert(cand_id.clone(), json!(count.to_string()));
        }

        let mut tally_results: Vec<JSValue> = Vec::new();
        for elim_stats in round_stat.eliminated.iter() {
            let mut transfers: JSMap<String, JSValue> = JSMap::new();
            for (cand_id, count) in elim_stats.transfers.iter() {
                transfers.insert(cand_id.clone(), json!(count.to_string()));
            }
            if elim_stats.exhausted > 0 {
                transfers.insert(
                    "exhausted".to_string(),
                    json!(elim_stats.exhausted.to_string()),
                );
            }
            tally_results.push(json!({
                "eliminated": elim_stats.candidate_id,
                "transfers": transfers
            }));
        }
        for winner_id in round_stat.elected.iter() {
            tally_results.push(json!({
                "elected": winner_id,
                "transfers": {}
            }));
        }

        let js = json!({
            "round": round_stat.round,
            "threshold": round_stat.threshold.to_string(),
            "activeBallots": round_stat.active_ballots.to_string(),
            "exhaustedBallots": round_stat.exhausted_ballots.to_string(),
            "tally": tally,
            "tallyResults": tally_results
        });
        l.push(js);
    }
    l
}

fn results_to_json(results: &[TabulationResult]) -> Vec<JSValue> {
    results
        .iter()
        .map(|r| {
            let mut js = json!({
                "candidateId": r.candidate_id,
                "name": r.display_name,
                "rank": r.rank,
                "tally": r.tally,
                "percentage": r.percentage,
                "eliminated": r.eliminated,
                "winner": r.is_winner,
            });
            if let Some(note) = &r.note {
                js["note"] = json!(note);
            }
            js
        })
        .collect()
}

fn pairwise_to_json(record: &PairwiseRecord) -> JSValue {
    let mut rows: JSMap<String, JSValue> = JSMap::new();
    for (ia, a) in record.candidates.iter().enumerate() {
        let mut row: JSMap<String, JSValue> = JSMap::new();
        for (ib, b) in record.candidates.iter().enumerate() {
            if ia != ib {
                row.insert(b.clone(), json!(record.wins[ia][ib]));
            }
        }
        rows.insert(a.clone(), JSValue::Object(row));
    }
    JSValue::Object(rows)
}

fn build_summary_js(config: &OutputConfig, summary: &TabulationSummary, turnout: &Turnout) -> JSValue {
    let (status, winners): (&str, Vec<String>) = match &summary.outcome {
        Outcome::Winner(id) => ("winner", vec![id.clone()]),
        Outcome::Tie(ids) => ("tie", ids.clone()),
        Outcome::NoWinner => ("noWinner", Vec::new()),
    };
    let diag = &summary.diagnostics;
    let mut js = json!({
        "config": config,
        "outcome": { "status": status, "candidates": winners },
        "percentageBasis": summary.percentage_basis.to_string(),
        "ballots": {
            "counted": summary.ballots_counted,
            "excluded": diag.excluded(),
            "malformed": diag.malformed,
            "unknownCandidate": diag.unknown_candidate,
        },
        "turnout": {
            "eligibleVoters": turnout.eligible_voters,
            "distinctVoters": turnout.distinct_voters,
            "percentage": summary.turnout_percentage,
        },
        "results": results_to_json(&summary.results),
        "fingerprint": summary.fingerprint,
    });
    if !summary.round_stats.is_empty() {
        js["rounds"] = JSValue::Array(round_stats_to_json(&summary.round_stats));
    }
    if let Some(record) = &summary.pairwise {
        js["pairwise"] = pairwise_to_json(record);
    }
    js
}

fn read_ballot_data(
    root_path: &Path,
    cfs: &FileSource,
    kind: BallotKind,
) -> ElectionResult<Vec<ParsedBallot>> {
    let p: PathBuf = root_path.join(&cfs.file_path);
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read ballot file {:?}", p2);
    match cfs.provider.as_str() {
        "json" => io_json::read_json(p2),
        "csv" => io_csv::read_csv(p2, cfs, kind),
        x => UnknownProviderSnafu {
            provider: x.to_string(),
        }
        .fail(),
    }
}

/// Candidates seen in the ballots, in order of first appearance.
fn infer_candidates(ballots: &[ParsedBallot]) -> Vec<Candidate> {
    let mut ids: Vec<String> = Vec::new();
    for pb in ballots.iter() {
        let seen: Vec<&String> = match &pb.ballot {
            RawBallot::Single(id) => vec![id],
            RawBallot::List(l) => l.iter().collect(),
            RawBallot::Scores(l) => l.iter().map(|(id, _)| id).collect(),
            RawBallot::Unreadable(_) => Vec::new(),
        };
        for id in seen {
            if !id.trim().is_empty() && !ids.contains(id) {
                ids.push(id.clone());
            }
        }
    }
    ids.iter()
        .enumerate()
        .map(|(idx, id)| Candidate::new(id, id, idx as i32 + 1))
        .collect()
}

fn load_config(args: &Args) -> ElectionResult<(ElectionConfig, PathBuf)> {
    match &args.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            let root_p = Path::new(config_path.as_str())
                .parent()
                .context(MissingParentDirSnafu {
                    path: config_path.clone(),
                })?;
            Ok((config, root_p.to_path_buf()))
        }
        None => {
            let input = args.input.as_ref().context(MissingInputSnafu {})?;
            let method = args.method.clone().context(MissingMethodSnafu {})?;
            let config = ElectionConfig::for_input(&io_common::simplify_file_name(input), &method);
            Ok((config, PathBuf::from(".")))
        }
    }
}

pub fn run_election(args: &Args) -> ElectionResult<()> {
    let (config, root_p) = load_config(args)?;
    info!("config: {:?}", config);

    let method_name = args.method.clone().unwrap_or_else(|| config.method.clone());
    let method: VotingMethod = method_name.parse().context(TabulationSnafu {})?;
    let kind = method.ballot_kind();

    let ballots: Vec<ParsedBallot> = if let Some(input) = &args.input {
        let provider = args.input_type.clone().unwrap_or_else(|| "json".to_string());
        let cfs = FileSource::for_input(input, &provider);
        read_ballot_data(Path::new("."), &cfs, kind)?
    } else {
        let mut data: Vec<ParsedBallot> = io_json::read_inline(config.ballots.as_deref().unwrap_or(&[]));
        for cfs in config.ballot_file_sources.iter().flatten() {
            let mut file_data = read_ballot_data(&root_p, cfs, kind)?;
            data.append(&mut file_data);
        }
        data
    };
    info!("Read {} ballots", ballots.len());
    debug!("ballots: {:?}", ballots);

    let candidates: Vec<Candidate> = if config.candidates.is_empty() {
        let inferred = infer_candidates(&ballots);
        info!("No candidates declared, inferred from the ballots: {:?}", inferred);
        inferred
    } else {
        config.roster_candidates()?
    };

    let num_ballots = ballots.len() as u64;
    let turnout = config.turnout(num_ballots);
    if turnout.distinct_voters > turnout.eligible_voters {
        warn!(
            "More distinct voters ({}) than eligible voters ({})",
            turnout.distinct_voters, turnout.eligible_voters
        );
    }

    let ctx = ElectionTabulationContext {
        method,
        candidates,
        ballots: ballots.iter().map(|pb| pb.ballot.clone()).collect(),
        turnout,
        rules: config.tabulation_rules(),
    };
    let summary = tabulate(&ctx).context(TabulationSnafu {})?;
    info!("summary {:?}", summary);

    for rejection in summary.diagnostics.rejections.iter() {
        let ballot_id = ballots
            .get(rejection.index)
            .and_then(|pb| pb.id.clone())
            .unwrap_or_else(|| format!("#{}", rejection.index));
        warn!("Ballot {} excluded: {}", ballot_id, rejection.error);
    }
    if summary.diagnostics.excluded() > 0 {
        warn!(
            "{} ballots excluded ({} malformed, {} with unknown candidates)",
            summary.diagnostics.excluded(),
            summary.diagnostics.malformed,
            summary.diagnostics.unknown_candidate
        );
    }

    // Assemble the final json
    let result_js = build_summary_js(&config.output_config(method), &summary, &turnout);
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;

    match args.out.as_deref() {
        None | Some("stdout") => println!("{}", pretty_js_stats),
        Some("") => {}
        Some(out_path) => {
            info!("Writing summary to {}", out_path);
            fs::write(out_path, &pretty_js_stats).context(WritingFileSnafu {
                path: out_path.to_string(),
            })?;
        }
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = &args.reference {
        let summary_ref = read_summary(summary_p)?;
        debug!("summary: {:?}", summary_ref);
        let mut computed_js = result_js.clone();
        // The fingerprint is only compared when the reference records one.
        if summary_ref.get("fingerprint").is_none() {
            if let Some(obj) = computed_js.as_object_mut() {
                obj.remove("fingerprint");
            }
        }
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        let pretty_js_computed =
            serde_json::to_string_pretty(&computed_js).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_computed {
            warn!("Found differences with the reference string");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_computed.as_ref(),
                "\n",
            );
            return ReferenceMismatchSnafu {}.fail();
        }
    }

    Ok(())
}

#[cfg(test)]
fn run_election_test(test_name: &str, config_lpath: &str, summary_lpath: &str) {
    let _ = env_logger::builder().is_test(true).try_init();
    let test_dir = format!("{}/tests", env!("CARGO_MANIFEST_DIR"));
    info!("Running test {}", test_name);
    let args = Args {
        config: Some(format!("{}/{}/{}", test_dir, test_name, config_lpath)),
        reference: Some(format!("{}/{}/{}", test_dir, test_name, summary_lpath)),
        out: Some("".to_string()),
        input: None,
        input_type: None,
        method: None,
        verbose: false,
    };
    let res = run_election(&args);
    if let Err(e) = &res {
        eprintln!("An error occured {}", e);
    }
    assert!(res.is_ok(), "election {} failed: {:?}", test_name, res);
}

#[cfg(test)]
pub fn test_wrapper(test_name: &str) {
    run_election_test(
        test_name,
        format!("{}_config.json", test_name).as_str(),
        format!("{}_expected_summary.json", test_name).as_str(),
    )
}
