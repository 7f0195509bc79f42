//! Wallet Engine CLI
//!
//! Command-line interface for applying wallet transactions from CSV files.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- requests.csv > responses.csv
//! cargo run -- --strategy sequential requests.csv > responses.csv
//! cargo run -- --seed balances.csv --report balances requests.csv > balances.csv
//! cargo run -- --strategy concurrent --batch-size 2000 --max-in-flight 128 --workers 8 requests.csv
//! ```
//!
//! Logs go to stderr; the level defaults to `warn` and can be changed with
//! `RUST_LOG` (for example `RUST_LOG=wallet_engine=debug`).
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (unreadable input or seed file, invalid seed data, output failure)

use std::process;
use tracing::error;
use tracing_subscriber::EnvFilter;
use wallet_engine::cli::{self, StrategyType};
use wallet_engine::strategy;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::parse_args();

    let engine = match args.to_engine_config() {
        Ok(engine) => engine,
        Err(e) => {
            error!(error = %e, "failed to build engine configuration");
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let concurrency = match args.strategy {
        StrategyType::Concurrent => Some(args.to_concurrency_config()),
        StrategyType::Sequential => None,
    };
    let strategy = strategy::create_strategy(args.strategy, engine, concurrency);

    let mut output = std::io::stdout();
    if let Err(e) = strategy.process(&args.input_file, &mut output) {
        error!(error = %e, "processing aborted");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
