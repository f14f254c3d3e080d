mod args;
mod pairing;

use clap::Parser;
use log::{debug, error};
use snafu::ErrorCompat;

use crate::args::Args;

fn main() {
    let args = Args::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if args.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();
    debug!("args: {:?}", args);

    if let Err(e) = pairing::run_from_args(&args) {
        error!("{}", e);
        for cause in ErrorCompat::iter_chain(&e).skip(1) {
            error!("caused by: {}", cause);
        }
        eprintln!("An error occured: {}", e);
        std::process::exit(1);
    }
}
