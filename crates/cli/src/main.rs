use clap::Parser;

use invoicestamp_cli::{Cli, run, summary};

fn main() {
    invoicestamp_observability::init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(report) => {
            println!("{}", summary(&report));
            if !report.is_complete() {
                std::process::exit(2);
            }
        }
        Err(e) => {
            tracing::error!(error = ?e, "batch failed");
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    }
}
