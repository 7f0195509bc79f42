//! Processing strategy module for request processing
//!
//! This module defines the Strategy pattern for complete request processing pipelines,
//! encompassing CSV parsing, the transaction processor and report output. This allows
//! different scheduling implementations (sequential, concurrent) to be selected at
//! runtime while sharing the same per-request dispatch.

use crate::cli::{ReportKind, StrategyType};
use crate::core::{
    BalanceStore, MemoryBalanceStore, MemoryLedger, MemoryProcessor, ProcessorConfig,
    TransactionLedger, TransactionProcessor,
};
use crate::io::{write_balances_csv, write_report_csv, AsyncReader, Command, ParsedRecord, ReportRow};
use crate::types::{BalanceRecord, ErrorKind, WalletError};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};
use tracing::{debug, error};

pub mod concurrent;
pub mod sequential;

pub use concurrent::{ConcurrencyConfig, ConcurrentProcessingStrategy};
pub use sequential::SequentialProcessingStrategy;

/// Processing strategy trait for complete request processing pipelines
///
/// Each strategy reads request rows from a CSV file, runs them through a processor
/// built from the [`EngineConfig`], and writes the selected report to output.
pub trait ProcessingStrategy: Send + Sync {
    /// Process requests from input file and write the report to output
    ///
    /// # Errors
    ///
    /// Returns an error only for fatal conditions: the input file cannot be opened,
    /// the runtime cannot be built or the report cannot be written. A failing request
    /// becomes a report row and processing continues with the next one.
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), WalletError>;
}

/// Settings shared by every strategy
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Initial balance table
    pub seeds: Vec<BalanceRecord>,
    pub processor: ProcessorConfig,
    pub report: ReportKind,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seeds: BalanceRecord::default_seeds(),
            processor: ProcessorConfig::default(),
            report: ReportKind::Responses,
        }
    }
}

impl EngineConfig {
    /// Build a processor over freshly seeded in-memory stores
    pub fn build_processor(&self) -> MemoryProcessor {
        let balances = Arc::new(MemoryBalanceStore::with_balances(self.seeds.iter().copied()));
        let ledger = Arc::new(MemoryLedger::new());
        TransactionProcessor::with_config(balances, ledger, self.processor)
    }
}

/// Create a processing strategy based on the specified strategy type
///
/// `concurrency` is ignored by the sequential strategy; the concurrent strategy
/// falls back to [`ConcurrencyConfig::default`] when it is `None`.
pub fn create_strategy(
    strategy_type: StrategyType,
    engine: EngineConfig,
    concurrency: Option<ConcurrencyConfig>,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sequential => Box::new(SequentialProcessingStrategy::new(engine)),
        StrategyType::Concurrent => Box::new(ConcurrentProcessingStrategy::new(
            engine,
            concurrency.unwrap_or_default(),
        )),
    }
}

/// Run one parsed request through the processor and turn the result into a report row
pub async fn dispatch<B, L>(processor: &TransactionProcessor<B, L>, record: ParsedRecord) -> ReportRow
where
    B: BalanceStore,
    L: TransactionLedger,
{
    let ParsedRecord {
        seq,
        op,
        user,
        transaction,
        command,
    } = record;

    let result = match command {
        Ok(Command::Apply {
            user_id,
            source_type,
            request,
        }) => processor
            .apply_transaction(user_id, &request, source_type)
            .await
            .map(|response| ReportRow::from_transaction(seq, &op, &response)),
        Ok(Command::Balance { user_id }) => processor
            .get_balance(user_id)
            .map(|response| ReportRow::from_balance(seq, &op, &response)),
        Err(e) => Err(e),
    };

    result.unwrap_or_else(|e| {
        match e.kind() {
            ErrorKind::Internal => error!(seq, error = %e, "request failed"),
            ErrorKind::Validation | ErrorKind::NotFound => {
                debug!(seq, error = %e, "request rejected")
            }
        }
        ReportRow::from_error(seq, &op, &user, &transaction, &e)
    })
}

/// Open the request file as an async CSV reader
pub(crate) async fn open_reader(
    input_path: &Path,
) -> Result<AsyncReader<Compat<tokio::fs::File>>, WalletError> {
    let file = tokio::fs::File::open(input_path)
        .await
        .map_err(|e| WalletError::Io {
            message: format!("Failed to open file '{}': {}", input_path.display(), e),
        })?;

    Ok(AsyncReader::new(file.compat()))
}

/// Write the report selected by `kind`
pub(crate) fn write_report(
    kind: ReportKind,
    processor: &MemoryProcessor,
    rows: &[ReportRow],
    output: &mut dyn Write,
) -> Result<(), WalletError> {
    match kind {
        ReportKind::Responses => write_report_csv(rows, output),
        ReportKind::Balances => write_balances_csv(&processor.balances().snapshot(), output),
    }
}
