use std::process;

use appcycle::cli::{self, Cli};
use appcycle::telemetry::init_tracing;
use clap::Parser;

fn main() {
    let args = Cli::parse();
    if let Err(err) = init_tracing(args.verbose) {
        eprintln!("appcycle: failed to initialise logging: {err:#}");
    }

    match cli::run(args) {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("appcycle: {err:#}");
            process::exit(1);
        }
    }
}
