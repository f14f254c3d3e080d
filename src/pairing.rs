use log::{debug, info, warn};

use mutual_matching::builder::parse_number;
use mutual_matching::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::pairing::config_reader::*;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_output;
mod io_xlsx;

#[derive(Debug, Snafu)]
pub enum MatchError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("No data found in the spreadsheet {path}"))]
    EmptyExcel { path: String },
    #[snafu(display(
        "Several worksheets found in {path}, the worksheet name must be provided: {names:?}"
    ))]
    AmbiguousWorksheet { path: String, names: Vec<String> },
    #[snafu(display("Could not understand the cell in line {lineno}: {content}"))]
    ExcelWrongCellType { lineno: usize, content: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error writing JSON"))]
    WritingJson { source: serde_json::Error },
    #[snafu(display("Expected a positive index, got {content}"))]
    ParsingJsonNumber { content: String },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading CSV file at line {lineno}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Error writing the result table {path}"))]
    CsvWrite { source: csv::Error, path: String },
    #[snafu(display("Error writing file {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Line {lineno}: unknown group {group:?}, expected {expected_a:?} or {expected_b:?}"))]
    UnknownGroup {
        lineno: usize,
        group: String,
        expected_a: String,
        expected_b: String,
    },
    #[snafu(display("Line {lineno}: invalid participant number"))]
    InvalidNumber {
        source: MatchingErrors,
        lineno: usize,
    },
    #[snafu(display("Two distinct group labels are required, got {labels:?}"))]
    InvalidGroupLabels { labels: Vec<String> },
    #[snafu(display("No participant source: provide --input or a configuration file"))]
    MissingInput {},
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type MatchResult<T> = Result<T, MatchError>;

/// A participant row, as parsed by the readers.
/// This is before checking the group labels and the numbers.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedRow {
    // The line in the file (1-based), for error reporting
    pub lineno: usize,
    pub group: String,
    pub id: String,
    pub preferences: Vec<String>,
}

impl ParsedRow {
    fn is_blank(&self) -> bool {
        self.group.trim().is_empty()
            && self.id.trim().is_empty()
            && self.preferences.iter().all(|p| p.trim().is_empty())
    }
}

fn read_participant_rows(root_path: &Path, cfs: &FileSource) -> MatchResult<Vec<ParticipantRow>> {
    let p: PathBuf = root_path.join(&cfs.file_path);
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read participant file {:?}", p2);
    let parsed_rows = match cfs.provider.as_str() {
        "csv" => io_csv::read_csv_rows(&p2, cfs)?,
        "xlsx" => io_xlsx::read_excel_rows(&p2, cfs)?,
        x => whatever!("Provider not implemented {:?}", x),
    };
    validate_rows(&parsed_rows, cfs)
}

/// Checks the group labels and the numbers of the parsed rows.
fn validate_rows(parsed_rows: &[ParsedRow], source: &FileSource) -> MatchResult<Vec<ParticipantRow>> {
    let (label_a, label_b) = source.group_labels()?;
    let mut res: Vec<ParticipantRow> = Vec::new();
    for pr in parsed_rows.iter() {
        if pr.is_blank() {
            debug!("validate_rows: skipping empty line {}", pr.lineno);
            continue;
        }
        let group = match pr.group.trim() {
            g if g == label_a.trim() => Group::A,
            g if g == label_b.trim() => Group::B,
            g => {
                return UnknownGroupSnafu {
                    lineno: pr.lineno,
                    group: g,
                    expected_a: label_a.clone(),
                    expected_b: label_b.clone(),
                }
                .fail();
            }
        };
        let id = parse_number(&pr.id).context(InvalidNumberSnafu { lineno: pr.lineno })?;
        let mut preferences: Vec<Option<u32>> = Vec::new();
        for s in pr.preferences.iter() {
            let pref = match s.trim() {
                "" => None,
                x => Some(parse_number(x).context(InvalidNumberSnafu { lineno: pr.lineno })?),
            };
            preferences.push(pref);
        }
        let row = ParticipantRow {
            group,
            id,
            preferences,
        };
        debug!("validate_rows: line {}: {:?}", pr.lineno, row);
        res.push(row);
    }
    Ok(res)
}

fn validate_rules(rules: &RulesConfig) -> MatchResult<MatchRules> {
    let tiebreak_mode = match rules.tiebreak_mode.as_deref() {
        None | Some("firstReference") => TieBreakMode::FirstReference,
        Some("participantOrder") => TieBreakMode::ParticipantOrder,
        Some("random") => {
            let seed = match rules.random_seed.clone().map(|s| s.parse::<u32>()) {
                Some(Ok(x)) => x,
                x => {
                    whatever!("The random tiebreak mode requires a numeric randomSeed, got {:?}", x)
                }
            };
            TieBreakMode::Random(seed)
        }
        Some(x) => {
            whatever!("Unknown tiebreak mode {:?}", x)
        }
    };
    Ok(MatchRules { tiebreak_mode })
}

fn tiebreak_name(mode: TieBreakMode) -> String {
    match mode {
        TieBreakMode::FirstReference => "firstReference".to_string(),
        TieBreakMode::ParticipantOrder => "participantOrder".to_string(),
        TieBreakMode::Random(seed) => format!("random({})", seed),
    }
}

fn build_summary_js(config: &MatchConfig, rules: &MatchRules, res: &MatchingResult) -> JSValue {
    let c = OutputConfig {
        contest: config.output_settings.contest_name.clone(),
        date: config.output_settings.contest_date.clone(),
        tiebreak: tiebreak_name(rules.tiebreak_mode),
    };
    let results: Vec<JSValue> = res
        .rows
        .iter()
        .map(|r| {
            json!({
                "participant": r.participant.to_string(),
                "partner": r.partner_label(),
                "rank": r.rank_label(),
                "tier": r.tier.name(),
            })
        })
        .collect();
    let order: Vec<JSValue> = res
        .processing_order
        .iter()
        .map(|pe| json!({"participant": pe.participant.to_string(), "popularity": pe.score}))
        .collect();
    let s = res.stats;
    json!({
        "config": c,
        "results": results,
        "processingOrder": order,
        "stats": {
            "participants": s.participants,
            "pairs": s.pairs,
            "mutualTopChoice": s.mutual_top_choice,
            "partialPreference": s.partial_preference,
            "unmatched": s.unmatched,
        }
    })
}

/// Runs the matching described by a configuration.
///
/// * `root_p` the directory against which the relative paths of the configuration are resolved
/// * `out_path` where to write the JSON summary (a path or `stdout`)
/// * `check_summary_path` a reference summary. The run fails if the summary differs.
/// * `table_path` where to write the result table. Overrides the configuration.
pub fn run_matching_config(
    config: &MatchConfig,
    root_p: &Path,
    out_path: Option<String>,
    check_summary_path: Option<String>,
    table_path: Option<String>,
) -> MatchResult<MatchingResult> {
    info!("config: {:?}", config);

    let rules = validate_rules(&config.rules)?;

    if config.participant_sources.is_empty() {
        return MissingInputSnafu {}.fail();
    }

    let mut data: Vec<ParticipantRow> = Vec::new();
    for cfs in config.participant_sources.iter() {
        let mut file_data = read_participant_rows(root_p, cfs)?;
        data.append(&mut file_data);
    }
    info!("Read {} participant rows", data.len());

    let result = run_matching(&data, &rules);
    for r in result.rows.iter() {
        info!(
            "{:>6} -> {:>9} {} {}",
            r.participant.to_string(),
            r.partner_label(),
            r.tier.name(),
            r.rank_label()
        );
    }

    let output_dir: PathBuf = match config.output_settings.output_directory.as_deref() {
        Some(d) => root_p.join(d),
        None => root_p.to_path_buf(),
    };
    let table_p: Option<PathBuf> = match table_path {
        Some(p) => Some(PathBuf::from(p)),
        None => config
            .output_settings
            .result_table
            .as_ref()
            .map(|t| output_dir.join(t)),
    };
    if let Some(p) = table_p {
        io_output::write_table(&p, &result.rows)?;
    }

    let result_js = build_summary_js(config, &rules, &result);
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(WritingJsonSnafu {})?;
    match out_path.as_deref() {
        None | Some("stdout") => {
            println!("{}", pretty_js_stats);
        }
        Some(p) => {
            info!("Writing summary to {:?}", p);
            fs::write(p, &pretty_js_stats).context(WritingFileSnafu { path: p })?;
        }
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = check_summary_path {
        let summary_ref = read_summary(&summary_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(WritingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference summary {:?}", summary_p);
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary")
        }
    }

    Ok(result)
}

fn input_provider(args: &Args, input: &str) -> String {
    match args.input_type.as_deref() {
        Some(t) => t.to_string(),
        None if input.ends_with(".xlsx") => "xlsx".to_string(),
        None => "csv".to_string(),
    }
}

/// Assembles the configuration from the file (if any) and the command line flags.
fn config_from_args(args: &Args) -> MatchResult<(MatchConfig, PathBuf)> {
    let (mut config, root_p) = match args.config.as_deref() {
        Some(config_path) => {
            let config = read_config(config_path)?;
            let root_p = Path::new(config_path)
                .parent()
                .context(MissingParentDirSnafu {})?
                .to_path_buf();
            (config, root_p)
        }
        None => {
            let config = MatchConfig {
                output_settings: OutputSettings {
                    contest_name: "matching".to_string(),
                    output_directory: None,
                    contest_date: None,
                    result_table: None,
                },
                participant_sources: vec![],
                rules: RulesConfig::default(),
            };
            (config, PathBuf::from("."))
        }
    };

    if let Some(input) = args.input.as_deref() {
        let provider = input_provider(args, input);
        // Keep the layout of the first configured source.
        let mut cfs = match config.participant_sources.first() {
            Some(first) => FileSource {
                provider,
                file_path: input.to_string(),
                ..first.clone()
            },
            None => FileSource::new(&provider, input),
        };
        // The input is relative to the current directory, not to the configuration.
        if args.config.is_some() {
            cfs.file_path = std::env::current_dir()
                .whatever_context("Cannot read the current directory")?
                .join(input)
                .display()
                .to_string();
        }
        config.participant_sources = vec![cfs];
    }
    if config.participant_sources.is_empty() {
        return MissingInputSnafu {}.fail();
    }

    for cfs in config.participant_sources.iter_mut() {
        if let Some(ws) = args.excel_worksheet_name.as_ref() {
            cfs.excel_worksheet_name = Some(ws.clone());
        }
        if let Some(labels) = args.group_labels.as_ref() {
            cfs.group_labels = Some(labels.clone());
        }
    }
    if let Some(tb) = args.tiebreak.as_ref() {
        config.rules.tiebreak_mode = Some(tb.clone());
    }
    if let Some(seed) = args.random_seed {
        config.rules.random_seed = Some(seed.to_string());
    }
    Ok((config, root_p))
}

pub fn run_from_args(args: &Args) -> MatchResult<()> {
    let (config, root_p) = config_from_args(args)?;
    run_matching_config(
        &config,
        &root_p,
        args.out.clone(),
        args.reference.clone(),
        args.table.clone(),
    )?;
    Ok(())
}

#[cfg(test)]
fn run_matching_test(test_name: &str) -> MatchResult<MatchingResult> {
    let test_dir = format!("{}/tests/{}", env!("CARGO_MANIFEST_DIR"), test_name);
    info!("Running test {}", test_name);
    let config_path = format!("{}/{}_config.json", test_dir, test_name);
    let config = read_config(&config_path)?;
    let out_path = std::env::temp_dir()
        .join(format!("{}_summary.json", test_name))
        .display()
        .to_string();
    run_matching_config(
        &config,
        Path::new(&test_dir),
        Some(out_path),
        Some(format!("{}/{}_expected_summary.json", test_dir, test_name)),
        None,
    )
}

#[cfg(test)]
pub fn test_wrapper(test_name: &str) -> MatchingResult {
    let _ = env_logger::builder().is_test(true).try_init();
    match run_matching_test(test_name) {
        Ok(res) => res,
        Err(e) => {
            for err in snafu::ErrorCompat::iter_chain(&e) {
                eprintln!("caused by: {}", err);
            }
            panic!("test {} failed: {}", test_name, e);
        }
    }
}
