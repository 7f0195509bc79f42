//! Sequential processing strategy
//!
//! Requests are applied one at a time in file order on a current-thread runtime.
//! The outcome of every request is therefore fully determined by the rows before
//! it, which makes this strategy the reference for the expected-output fixtures.
//!
//! # Memory Efficiency
//!
//! Rows are streamed in fixed-size chunks; only the report rows are accumulated.

use crate::strategy::{dispatch, open_reader, write_report, EngineConfig, ProcessingStrategy};
use crate::types::WalletError;
use std::io::Write;
use std::path::Path;

/// Rows pulled from the reader per read call
const READ_CHUNK: usize = 256;

/// Sequential processing strategy
///
/// ```no_run
/// use wallet_engine::strategy::{EngineConfig, ProcessingStrategy, SequentialProcessingStrategy};
/// use std::path::Path;
///
/// let strategy = SequentialProcessingStrategy::new(EngineConfig::default());
/// let mut output = std::io::stdout();
///
/// strategy.process(Path::new("requests.csv"), &mut output)
///     .expect("Processing failed");
/// ```
#[derive(Debug, Clone)]
pub struct SequentialProcessingStrategy {
    config: EngineConfig,
}

impl SequentialProcessingStrategy {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }
}

impl ProcessingStrategy for SequentialProcessingStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), WalletError> {
        // Time driver is needed for lock timeouts
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(|e| WalletError::Io {
                message: format!("Failed to create tokio runtime: {}", e),
            })?;

        runtime.block_on(async {
            let processor = self.config.build_processor();
            let mut reader = open_reader(input_path).await?;
            let mut rows = Vec::new();

            loop {
                let batch = reader.read_batch(READ_CHUNK).await;
                if batch.is_empty() {
                    break;
                }

                for record in batch {
                    rows.push(dispatch(&processor, record).await);
                }
            }

            write_report(self.config.report, &processor, &rows, output)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ReportKind;
    use crate::types::{Amount, BalanceRecord};
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    fn run(config: EngineConfig, content: &str) -> String {
        let file = create_temp_csv(content);
        let strategy = SequentialProcessingStrategy::new(config);
        let mut output = Vec::new();

        strategy.process(file.path(), &mut output).unwrap();

        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_sequential_responses_in_file_order() {
        let output = run(
            EngineConfig::default(),
            "op,user,source,state,amount,tx\n\
             apply,1,game,win,10.50,t1\n\
             apply,1,game,win,10.50,t1\n\
             balance,1,,,,\n",
        );

        assert_eq!(
            output,
            "seq,op,user,transaction,status,balance,message\n\
             1,apply,1,t1,ok,110.50,Transaction applied successfully\n\
             2,apply,1,t1,ok,110.50,Duplicate transaction ignored\n\
             3,balance,1,,ok,110.50,\n"
        );
    }

    #[test]
    fn test_sequential_balances_report() {
        let config = EngineConfig {
            seeds: vec![
                BalanceRecord::new(4, Amount::from_cents(500)),
                BalanceRecord::new(2, Amount::ZERO),
            ],
            report: ReportKind::Balances,
            ..EngineConfig::default()
        };

        let output = run(
            config,
            "op,user,source,state,amount,tx\n\
             apply,2,server,win,1,a\n\
             apply,4,payment,lose,5.00,b\n",
        );

        assert_eq!(output, "user,balance\n2,1.00\n4,0.00\n");
    }

    #[test]
    fn test_sequential_handles_missing_file() {
        let strategy = SequentialProcessingStrategy::new(EngineConfig::default());
        let mut output = Vec::new();

        let result = strategy.process(Path::new("nonexistent.csv"), &mut output);

        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Failed to open file"));
        assert!(output.is_empty());
    }
}
