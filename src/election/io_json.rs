// Reading ballots written in JSON.

use crate::election::io_common::make_default_id;
use crate::election::*;

/// Reads a JSON array of ballots.
pub fn read_json(path: String) -> ElectionResult<Vec<ParsedBallot>> {
    let contents = fs::read_to_string(&path).context(OpeningFileSnafu { path: path.clone() })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    let elements = js.as_array().context(JsonNotArraySnafu { path: path.clone() })?;

    let default_id = make_default_id(&path);
    let ballots: Vec<ParsedBallot> = elements
        .iter()
        .enumerate()
        .map(|(idx, elt)| ParsedBallot {
            id: Some(default_id(idx + 1)),
            ballot: js_to_raw(elt),
        })
        .collect();
    debug!("read_json: {} ballots read from {}", ballots.len(), path);
    Ok(ballots)
}

/// The ballots written directly in the configuration.
pub fn read_inline(elements: &[JSValue]) -> Vec<ParsedBallot> {
    let default_id = make_default_id("inline");
    elements
        .iter()
        .enumerate()
        .map(|(idx, elt)| ParsedBallot {
            id: Some(default_id(idx + 1)),
            ballot: js_to_raw(elt),
        })
        .collect()
}

// Candidate ids and scores may be written as numbers. Scores are kept as
// text: the tabulation rejects the ones that are not integers.
fn js_to_text(js: &JSValue) -> Option<String> {
    match js {
        JSValue::String(s) => Some(s.clone()),
        JSValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// The shape of the JSON value gives the shape of the ballot: a string is a
/// single choice, an array a list of choices, an object a score map.
fn js_to_raw(js: &JSValue) -> RawBallot {
    let res: Option<RawBallot> = match js {
        JSValue::String(_) | JSValue::Number(_) => js_to_text(js).map(RawBallot::Single),
        JSValue::Array(l) => l
            .iter()
            .map(js_to_text)
            .collect::<Option<Vec<String>>>()
            .map(RawBallot::List),
        JSValue::Object(m) => m
            .iter()
            .map(|(id, v)| js_to_text(v).map(|s| (id.clone(), s)))
            .collect::<Option<Vec<(String, String)>>>()
            .map(RawBallot::Scores),
        _ => None,
    };
    res.unwrap_or_else(|| RawBallot::Unreadable(js.to_string()))
}
