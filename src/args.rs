use clap::Parser;

/// This is an election tabulation program.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The file containing the election description in JSON.
    /// See the manual of the ballot_tabulation crate for the format.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference file containing the summary of an election in JSON format. If provided,
    /// tabulate will check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the election will be written in JSON
    /// format to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) A file of ballots. Setting this option overrides the ballot sources that may
    /// be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (json or csv, default json) The type of the input file.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (FPTP, Approval, RCV, STV, Score or Condorcet) The voting method. Overrides the method of the
    /// configuration file. Required when no configuration is given.
    #[clap(short, long, value_parser)]
    pub method: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
