mod args;
mod election;

use clap::Parser;
use log::{info, LevelFilter};

fn main() {
    let args = args::Args::parse();

    let mut builder = env_logger::Builder::from_default_env();
    if args.verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
    info!("args: {:?}", args);

    if let Err(e) = election::run_election(&args) {
        eprintln!("An error occured: {}", e);
        std::process::exit(1);
    }
}
