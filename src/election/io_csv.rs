// Primitives for reading CSV files.

use csv::StringRecord;

use crate::election::io_common::make_default_id;
use crate::election::*;

/// Reads one ballot per row, from the first vote row on.
///
/// The cells from the first vote column on are read according to the ballot
/// kind: a single choice, a list of choices with the blank cells skipped, or
/// one score per candidate of the header row. A plurality row with several
/// choices is read as a list and left for the tabulation to reject.
pub fn read_csv(path: String, cfs: &FileSource, kind: BallotKind) -> ElectionResult<Vec<ParsedBallot>> {
    let default_id = make_default_id(&path);

    let id_idx_o = cfs.id_column_index()?;
    let choices_start_col = cfs.first_vote_column_index()?;
    let first_row = cfs.first_vote_row_index()?;

    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(&path)
        .context(CsvOpenSnafu { path: path.clone() })?;

    let mut header: Option<StringRecord> = None;
    let mut res: Vec<ParsedBallot> = Vec::new();
    // The index starts at 1 to respect most conventions in the excel world
    for (idx, line_r) in rdr.into_records().enumerate() {
        let lineno = idx + 1;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        if lineno < first_row {
            // Only the last row before the votes is kept.
            header = Some(line);
            continue;
        }
        let id = if let Some(id_idx) = id_idx_o {
            line.get(id_idx)
                .context(CsvLineTooShortSnafu { lineno })?
                .to_string()
        } else {
            default_id(lineno)
        };

        let cells: Vec<&str> = line.iter().skip(choices_start_col).map(|s| s.trim()).collect();
        let choices: Vec<String> = cells
            .iter()
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect();
        let ballot = match kind {
            // More than one choice is kept as a list, which a plurality count rejects.
            BallotKind::Plurality => match choices.as_slice() {
                [] => RawBallot::Single(String::new()),
                [choice] => RawBallot::Single(choice.clone()),
                _ => RawBallot::List(choices),
            },
            BallotKind::Approval | BallotKind::Ranking => RawBallot::List(choices),
            BallotKind::Scored => {
                let header = header
                    .as_ref()
                    .context(CsvMissingHeaderSnafu { path: path.clone() })?;
                read_scores(header, choices_start_col, &cells)
            }
        };
        debug!("read_csv: lineno: {:?} id: {} ballot: {}", lineno, id, ballot);
        res.push(ParsedBallot {
            id: Some(id),
            ballot,
        });
    }
    Ok(res)
}

// A score under a column without a candidate makes the ballot unreadable.
fn read_scores(header: &StringRecord, start_col: usize, cells: &[&str]) -> RawBallot {
    let mut scores: Vec<(String, String)> = Vec::new();
    for (pos, cell) in cells.iter().enumerate() {
        if cell.is_empty() {
            continue;
        }
        match header.get(start_col + pos).map(|s| s.trim()) {
            Some(cand) if !cand.is_empty() => scores.push((cand.to_string(), cell.to_string())),
            _ => return RawBallot::Unreadable(cells.join(",")),
        }
    }
    RawBallot::Scores(scores)
}
