use crate::core::ProcessorConfig;
use crate::io::read_seed_file;
use crate::strategy::{ConcurrencyConfig, EngineConfig};
use crate::types::{BalanceRecord, WalletError};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Apply wallet win/lose transactions and balance queries from a CSV file
#[derive(Parser, Debug)]
#[command(name = "wallet-engine")]
#[command(about = "Apply wallet win/lose transactions and balance queries", long_about = None)]
pub struct CliArgs {
    /// Input CSV file path containing request rows
    #[arg(value_name = "INPUT", help = "Path to the input CSV file")]
    pub input_file: PathBuf,

    /// Scheduling strategy used to run the requests
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "concurrent",
        help = "Processing strategy: 'sequential' for file order or 'concurrent' for independent requests"
    )]
    pub strategy: StrategyType,

    /// Seed CSV with the initial balance table
    #[arg(
        long = "seed",
        value_name = "FILE",
        help = "CSV with columns user,balance (default: users 1, 2, 3 with 100.00, 50.00, 0.00)"
    )]
    pub seed_file: Option<PathBuf>,

    /// Report written to stdout
    #[arg(
        long = "report",
        value_name = "REPORT",
        default_value = "responses",
        help = "Report: 'responses' for one row per request or 'balances' for final balances"
    )]
    pub report: ReportKind,

    /// Balance lock wait limit
    #[arg(
        long = "lock-timeout-ms",
        value_name = "MILLIS",
        help = "Maximum time to wait for a balance row lock (default: wait indefinitely)"
    )]
    pub lock_timeout_ms: Option<u64>,

    /// Number of request rows per batch (concurrent mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of request rows per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Maximum number of requests processed at once (concurrent mode only)
    #[arg(
        long = "max-in-flight",
        value_name = "COUNT",
        help = "Maximum number of requests inside the processor at once (default: 64)"
    )]
    pub max_in_flight: Option<usize>,

    /// Number of runtime worker threads (concurrent mode only)
    #[arg(
        long = "workers",
        value_name = "COUNT",
        help = "Number of worker threads (default: CPU cores)"
    )]
    pub workers: Option<usize>,
}

/// Available processing strategies
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sequential,
    Concurrent,
}

/// Available reports
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
    Responses,
    Balances,
}

impl CliArgs {
    /// Create a ConcurrencyConfig from CLI arguments
    ///
    /// Missing values use the defaults; zero values fall back to the defaults with a
    /// warning.
    pub fn to_concurrency_config(&self) -> ConcurrencyConfig {
        let default = ConcurrencyConfig::default();
        ConcurrencyConfig::new(
            self.batch_size.unwrap_or(default.batch_size),
            self.max_in_flight.unwrap_or(default.max_in_flight),
            self.workers.unwrap_or(default.worker_threads),
        )
    }

    pub fn to_processor_config(&self) -> ProcessorConfig {
        ProcessorConfig {
            lock_timeout: self.lock_timeout_ms.map(Duration::from_millis),
        }
    }

    /// Build the engine configuration, loading the seed file if one was given
    ///
    /// # Errors
    ///
    /// Returns a seed error when the seed file cannot be read or holds invalid rows.
    pub fn to_engine_config(&self) -> Result<EngineConfig, WalletError> {
        let seeds = match &self.seed_file {
            Some(path) => read_seed_file(path)?,
            None => BalanceRecord::default_seeds(),
        };

        Ok(EngineConfig {
            seeds,
            processor: self.to_processor_config(),
            report: self.report,
        })
    }
}
