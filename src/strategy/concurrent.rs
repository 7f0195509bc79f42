//! Concurrent processing strategy
//!
//! This module provides a multi-threaded implementation of the ProcessingStrategy
//! trait in which every request is an independent task, the way a request handler
//! would see them. Correctness does not depend on any ordering between requests:
//! the processor's row locks and the ledger's unique transaction id carry it.
//!
//! # Architecture
//!
//! ```text
//! ConcurrentProcessingStrategy
//!     ├── ConcurrencyConfig (batch_size, max_in_flight, worker_threads)
//!     ├── AsyncReader (batch CSV reading)
//!     └── TransactionProcessor (shared by all tasks)
//!         ├── MemoryBalanceStore (per-row locks)
//!         └── MemoryLedger (unique transaction id)
//! ```
//!
//! # Scheduling
//!
//! - Batches are read and processed one after another
//! - Within a batch every request is spawned onto the multi-threaded runtime
//! - A semaphore caps the number of requests inside the processor at once
//! - Report rows are sorted back into file order before writing

use crate::strategy::{dispatch, open_reader, write_report, EngineConfig, ProcessingStrategy};
use crate::types::WalletError;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, warn};

/// Configuration for concurrent processing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConcurrencyConfig {
    /// Number of request rows read per batch
    pub batch_size: usize,
    /// Maximum number of requests inside the processor at once
    pub max_in_flight: usize,
    /// Number of runtime worker threads
    pub worker_threads: usize,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_in_flight: 64,
            worker_threads: num_cpus::get(),
        }
    }
}

impl ConcurrencyConfig {
    /// Create a config, replacing zero values with the defaults
    pub fn new(batch_size: usize, max_in_flight: usize, worker_threads: usize) -> Self {
        let default = Self::default();

        Self {
            batch_size: non_zero_or_default("batch_size", batch_size, default.batch_size),
            max_in_flight: non_zero_or_default("max_in_flight", max_in_flight, default.max_in_flight),
            worker_threads: non_zero_or_default("worker_threads", worker_threads, default.worker_threads),
        }
    }
}

fn non_zero_or_default(name: &str, value: usize, default: usize) -> usize {
    if value == 0 {
        warn!(setting = name, default, "invalid value 0, using default");
        default
    } else {
        value
    }
}

/// Concurrent processing strategy
#[derive(Debug, Clone)]
pub struct ConcurrentProcessingStrategy {
    engine: EngineConfig,
    config: ConcurrencyConfig,
}

impl ConcurrentProcessingStrategy {
    pub fn new(engine: EngineConfig, config: ConcurrencyConfig) -> Self {
        Self { engine, config }
    }
}

impl ProcessingStrategy for ConcurrentProcessingStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), WalletError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.worker_threads)
            .enable_time()
            .build()
            .map_err(|e| WalletError::Io {
                message: format!("Failed to create tokio runtime: {}", e),
            })?;

        runtime.block_on(async {
            let processor = self.engine.build_processor();
            let in_flight = Arc::new(Semaphore::new(self.config.max_in_flight));
            let mut reader = open_reader(input_path).await?;
            let mut rows = Vec::new();

            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                let mut tasks = Vec::with_capacity(batch.len());
                for record in batch {
                    let processor = processor.clone();
                    let in_flight = Arc::clone(&in_flight);
                    tasks.push(tokio::spawn(async move {
                        // The semaphore is never closed, so acquiring cannot fail
                        let _permit = in_flight.acquire_owned().await;
                        dispatch(&processor, record).await
                    }));
                }

                // Wait for the whole batch before reading the next one
                for task in tasks {
                    match task.await {
                        Ok(row) => rows.push(row),
                        Err(e) => error!(error = %e, "request task failed"),
                    }
                }
            }

            rows.sort_by_key(|row| row.seq);
            write_report(self.engine.report, &processor, &rows, output)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ReportKind;
    use crate::types::{Amount, BalanceRecord};
    use rstest::rstest;
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[rstest]
    #[case::batch_size(ConcurrencyConfig::new(0, 8, 2), ConcurrencyConfig { batch_size: 1000, max_in_flight: 8, worker_threads: 2 })]
    #[case::max_in_flight(ConcurrencyConfig::new(10, 0, 2), ConcurrencyConfig { batch_size: 10, max_in_flight: 64, worker_threads: 2 })]
    #[case::worker_threads(ConcurrencyConfig::new(10, 8, 0), ConcurrencyConfig { batch_size: 10, max_in_flight: 8, worker_threads: num_cpus::get() })]
    fn test_zero_values_fall_back_to_defaults(
        #[case] config: ConcurrencyConfig,
        #[case] expected: ConcurrencyConfig,
    ) {
        assert_eq!(config, expected);
    }

    #[test]
    fn test_concurrent_responses_sorted_by_seq() {
        let mut content = String::from("op,user,source,state,amount,tx\n");
        for i in 1..=20 {
            content.push_str(&format!("apply,3,game,win,1.00,t{}\n", i));
        }
        let file = create_temp_csv(&content);

        // Small batches and a tight in-flight cap to exercise several rounds
        let strategy = ConcurrentProcessingStrategy::new(
            EngineConfig::default(),
            ConcurrencyConfig::new(6, 3, 4),
        );
        let mut output = Vec::new();

        strategy.process(file.path(), &mut output).unwrap();

        let output = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = output.lines().skip(1).collect();
        assert_eq!(lines.len(), 20);
        for (i, line) in lines.iter().enumerate() {
            assert!(line.starts_with(&format!("{},apply,3,t{},ok,", i + 1, i + 1)));
        }
    }

    #[test]
    fn test_concurrent_lose_never_overdraws() {
        // 10 debits of 1.00 against 5.00: exactly five succeed
        let mut content = String::from("op,user,source,state,amount,tx\n");
        for i in 1..=10 {
            content.push_str(&format!("apply,7,server,lose,1.00,d{}\n", i));
        }
        let file = create_temp_csv(&content);

        let engine = EngineConfig {
            seeds: vec![BalanceRecord::new(7, Amount::from_cents(500))],
            report: ReportKind::Balances,
            ..EngineConfig::default()
        };
        let strategy = ConcurrentProcessingStrategy::new(engine, ConcurrencyConfig::new(10, 10, 4));
        let mut output = Vec::new();

        strategy.process(file.path(), &mut output).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "user,balance\n7,0.00\n");
    }

    #[test]
    fn test_concurrent_handles_missing_file() {
        let strategy =
            ConcurrentProcessingStrategy::new(EngineConfig::default(), ConcurrencyConfig::default());
        let mut output = Vec::new();

        let result = strategy.process(Path::new("nonexistent.csv"), &mut output);

        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Failed to open file"));
    }
}
