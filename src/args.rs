use clap::Parser;

/// This is a program for pairing two groups of participants from their ranked preferences.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON file describing the participant sources, the outputs and the rules.
    /// Relative paths in this file are resolved against its directory.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference file containing the outcome of a matching in JSON format. If provided, the
    /// program will check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the matching will be written in JSON format to the given
    /// location. Prints to the standard output by default.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) The file with the participant rows. Setting this option overrides the sources
    /// that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (csv or xlsx) The type of the input. Guessed from the extension of the file by default.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (default: the only worksheet) When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (two values) The labels used in the group column for group A and group B, for example
    /// '--group-labels M --group-labels F'.
    #[clap(long, value_parser)]
    pub group_labels: Option<Vec<String>>,

    /// (file path) If specified, the result table will be written in CSV format to the given location.
    #[clap(short, long, value_parser)]
    pub table: Option<String>,

    /// (firstReference, participantOrder or random) How to order participants with the same popularity.
    #[clap(long, value_parser)]
    pub tiebreak: Option<String>,

    /// The seed for the random tiebreak mode.
    #[clap(long, value_parser)]
    pub random_seed: Option<u32>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
