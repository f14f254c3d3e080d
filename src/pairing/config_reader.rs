use crate::pairing::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "contestName")]
    pub contest_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "contestDate")]
    pub contest_date: Option<String>,
    // New options specific to matchmaker
    #[serde(rename = "resultTable")]
    pub result_table: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub contest: String,
    pub date: Option<String>,
    pub tiebreak: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "firstDataRowIndex")]
    pub _first_data_row_index: Option<JSValue>,
    #[serde(rename = "groupColumnIndex")]
    pub _group_column_index: Option<JSValue>,
    #[serde(rename = "idColumnIndex")]
    pub _id_column_index: Option<JSValue>,
    #[serde(rename = "firstPreferenceColumnIndex")]
    pub _first_preference_column_index: Option<JSValue>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    #[serde(rename = "groupLabels")]
    pub group_labels: Option<Vec<String>>,
}

impl FileSource {
    pub fn new(provider: &str, file_path: &str) -> FileSource {
        FileSource {
            provider: provider.to_string(),
            file_path: file_path.to_string(),
            _first_data_row_index: None,
            _group_column_index: None,
            _id_column_index: None,
            _first_preference_column_index: None,
            excel_worksheet_name: None,
            group_labels: None,
        }
    }

    /// The first row with data (1-based, like in a spreadsheet).
    pub fn first_data_row_index(&self) -> MatchResult<usize> {
        read_js_index(&self._first_data_row_index, 2)
    }

    // The column indexes are 1-based in the configuration and 0-based here.

    pub fn group_column_index(&self) -> MatchResult<usize> {
        Ok(read_js_index(&self._group_column_index, 2)? - 1)
    }

    pub fn id_column_index(&self) -> MatchResult<usize> {
        Ok(read_js_index(&self._id_column_index, 3)? - 1)
    }

    pub fn first_preference_column_index(&self) -> MatchResult<usize> {
        Ok(read_js_index(&self._first_preference_column_index, 4)? - 1)
    }

    /// The labels of group A and group B.
    pub fn group_labels(&self) -> MatchResult<(String, String)> {
        match self.group_labels.as_deref() {
            None => Ok(("A".to_string(), "B".to_string())),
            Some([a, b]) if a != b => Ok((a.clone(), b.clone())),
            Some(x) => InvalidGroupLabelsSnafu {
                labels: x.to_vec(),
            }
            .fail(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct RulesConfig {
    #[serde(rename = "tiebreakMode")]
    pub tiebreak_mode: Option<String>,
    #[serde(rename = "randomSeed")]
    pub random_seed: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct MatchConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "participantSources")]
    pub participant_sources: Vec<FileSource>,
    #[serde(default)]
    pub rules: RulesConfig,
}

pub fn read_config(path: &str) -> MatchResult<MatchConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: MatchConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(config)
}

pub fn read_summary(path: &str) -> MatchResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(js)
}

/// Reads a 1-based index: a number, a number in a string, or an Excel-style column name.
fn read_js_index(x: &Option<JSValue>, default: usize) -> MatchResult<usize> {
    let idx = match x {
        None => Some(default),
        Some(JSValue::Number(n)) => n.as_u64().map(|x| x as usize),
        // Parsing the Excel-style columns: A is 1, Z is 26, AA is 27.
        Some(JSValue::String(s)) if !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic()) => {
            Some(s.to_ascii_lowercase().chars().fold(0, |acc, c| {
                acc * 26 + (c as usize) - ('a' as usize) + 1
            }))
        }
        Some(JSValue::String(s)) => s.parse::<usize>().ok(),
        Some(_) => None,
    };
    match idx {
        Some(i) if i >= 1 => Ok(i),
        _ => ParsingJsonNumberSnafu {
            content: format!("{:?}", x),
        }
        .fail(),
    }
}
