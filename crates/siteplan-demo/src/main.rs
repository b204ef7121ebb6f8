#![forbid(unsafe_code)]

//! `siteplan` binary entry point.

use siteplan_demo::{app, cli, logging};

fn main() {
    logging::init();
    let opts = cli::Opts::parse();

    match app::run(&opts) {
        Ok(output) => print!("{output}"),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
