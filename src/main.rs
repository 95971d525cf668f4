// Allow dead code for items that are part of the public API but only used in tests
#![allow(dead_code)]

mod cmd;
mod graph;
mod infer;
mod schema;
mod source;

use clap::Parser;
use cmd::{Cli, GraphConfig};

fn main() {
    let cli = Cli::parse();
    cmd::init_logging(cli.verbose);

    if let Err(e) = GraphConfig::from_cli(cli).and_then(cmd::run) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
