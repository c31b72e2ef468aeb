#![forbid(unsafe_code)]

//! `curry` binary entrypoint.

use std::process;

use clap::Parser;
use curry_app::{Cli, execute};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    match execute(cli).await {
        Ok(report) => {
            if report.failed() > 0 {
                eprintln!(
                    "{} of {} releases failed; see the log for details",
                    report.failed(),
                    report.tasks.len()
                );
            }
        }
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            process::exit(err.exit_code());
        }
    }
}
