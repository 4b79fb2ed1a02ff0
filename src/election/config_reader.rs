use crate::election::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "contestName")]
    pub contest_name: String,
    #[serde(rename = "contestDate")]
    pub contest_date: Option<String>,
    #[serde(rename = "contestJurisdiction")]
    pub contest_jurisdiction: Option<String>,
    #[serde(rename = "contestOffice")]
    pub contest_office: Option<String>,
}

/// The `config` section of the summary.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub contest: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub office: Option<String>,
    pub method: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "firstVoteColumnIndex")]
    _first_vote_column_index: Option<JSValue>,
    #[serde(rename = "firstVoteRowIndex")]
    _first_vote_row_index: Option<JSValue>,
    #[serde(rename = "idColumnIndex")]
    _id_column_index: Option<JSValue>,
}

impl FileSource {
    /// A source for a ballot file given on the command line, with the default layout.
    pub fn for_input(path: &str, provider: &str) -> FileSource {
        FileSource {
            provider: provider.to_string(),
            file_path: path.to_string(),
            _first_vote_column_index: None,
            _first_vote_row_index: None,
            _id_column_index: None,
        }
    }

    /// 0-based index of the first column holding votes.
    pub fn first_vote_column_index(&self) -> ElectionResult<usize> {
        let x = read_js_int("firstVoteColumnIndex", &self._first_vote_column_index)?;
        Ok(x.unwrap_or(1) - 1)
    }

    /// 1-based index of the first row holding votes. The rows before it are
    /// skipped, except the last one which is the header.
    pub fn first_vote_row_index(&self) -> ElectionResult<usize> {
        let x = read_js_int("firstVoteRowIndex", &self._first_vote_row_index)?;
        Ok(x.unwrap_or(1))
    }

    /// 0-based index of the column holding the ballot ids, if any.
    pub fn id_column_index(&self) -> ElectionResult<Option<usize>> {
        let x = read_js_int("idColumnIndex", &self._id_column_index)?;
        Ok(x.map(|i| i - 1))
    }
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ConfigCandidate {
    pub id: JSValue,
    pub name: String,
    #[serde(rename = "displayOrder")]
    pub display_order: Option<i32>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ConfigTurnout {
    #[serde(rename = "eligibleVoters")]
    pub eligible_voters: u64,
    #[serde(rename = "distinctVoters")]
    pub distinct_voters: Option<u64>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ConfigRules {
    #[serde(rename = "maxScore")]
    pub max_score: Option<u32>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ElectionConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    pub method: String,
    #[serde(default)]
    pub candidates: Vec<ConfigCandidate>,
    pub ballots: Option<Vec<JSValue>>,
    #[serde(rename = "ballotFileSources")]
    pub ballot_file_sources: Option<Vec<FileSource>>,
    pub turnout: Option<ConfigTurnout>,
    pub rules: Option<ConfigRules>,
}

impl ElectionConfig {
    /// The configuration used when only a ballot file is given.
    pub fn for_input(contest_name: &str, method: &str) -> ElectionConfig {
        ElectionConfig {
            output_settings: OutputSettings {
                contest_name: contest_name.to_string(),
                contest_date: None,
                contest_jurisdiction: None,
                contest_office: None,
            },
            method: method.to_string(),
            candidates: Vec::new(),
            ballots: None,
            ballot_file_sources: None,
            turnout: None,
            rules: None,
        }
    }

    /// The declared candidates. Without a display order, a candidate keeps its
    /// position in the list.
    pub fn roster_candidates(&self) -> ElectionResult<Vec<Candidate>> {
        let mut res: Vec<Candidate> = Vec::new();
        for (idx, c) in self.candidates.iter().enumerate() {
            let id = match &c.id {
                JSValue::String(s) => s.clone(),
                JSValue::Number(n) => n.to_string(),
                _ => {
                    return InvalidCandidateIdSnafu {
                        name: c.name.clone(),
                    }
                    .fail()
                }
            };
            res.push(Candidate {
                id,
                name: c.name.clone(),
                display_order: c.display_order.unwrap_or(idx as i32 + 1),
            });
        }
        Ok(res)
    }

    /// Without turnout figures, every ballot read is taken as one eligible and distinct voter.
    pub fn turnout(&self, num_ballots: u64) -> Turnout {
        match &self.turnout {
            Some(t) => Turnout {
                eligible_voters: t.eligible_voters,
                distinct_voters: t.distinct_voters.unwrap_or(num_ballots),
            },
            None => Turnout {
                eligible_voters: num_ballots,
                distinct_voters: num_ballots,
            },
        }
    }

    pub fn tabulation_rules(&self) -> TabulationRules {
        TabulationRules {
            max_score: self
                .rules
                .as_ref()
                .and_then(|r| r.max_score)
                .unwrap_or(MAX_SCORE),
        }
    }

    pub fn output_config(&self, method: VotingMethod) -> OutputConfig {
        OutputConfig {
            contest: self.output_settings.contest_name.clone(),
            date: self.output_settings.contest_date.clone(),
            jurisdiction: self.output_settings.contest_jurisdiction.clone(),
            office: self.output_settings.contest_office.clone(),
            method: method.to_string(),
        }
    }
}

pub fn read_config(path: &str) -> ElectionResult<ElectionConfig> {
    let config_str = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    serde_json::from_str(&config_str).context(ParsingJsonSnafu {})
}

pub fn read_summary(path: &str) -> ElectionResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})
}

/// Reads a 1-based index, given as a number, a numeric string or an
/// Excel-style column name ("A", "B", ..., "AA").
fn read_js_int(field: &str, x: &Option<JSValue>) -> ElectionResult<Option<usize>> {
    let res: Option<usize> = match x {
        None | Some(JSValue::Null) => return Ok(None),
        Some(JSValue::Number(n)) => n.as_u64().map(|x| x as usize),
        // Parsing the Excel-style columns
        Some(JSValue::String(s)) if !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic()) => {
            // None on overflow.
            s.to_ascii_lowercase().chars().try_fold(0usize, |acc, c| {
                acc.checked_mul(26)?
                    .checked_add(c as usize - 'a' as usize + 1)
            })
        }
        Some(JSValue::String(s)) => s.trim().parse::<usize>().ok(),
        Some(_) => None,
    };
    match res {
        Some(i) if i >= 1 => Ok(Some(i)),
        _ => ParsingJsonNumberSnafu { field }.fail(),
    }
}
