use std::process;

use clap::Parser;
use roomgen::commands::VERSION;
use roomgen::commands::scan::{self, ScanArgs};
use roomgen::logging::{self, LogArgs};

#[derive(Debug, Parser)]
#[command(
    name = "roomscan",
    version = VERSION,
    about = "Extract image URLs from a tool-execution response"
)]
struct Cli {
    #[command(flatten)]
    log: LogArgs,
    #[command(flatten)]
    scan: ScanArgs,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.log);
    if let Err(err) = scan::run(cli.scan) {
        eprintln!("{err}");
        process::exit(1);
    }
}
