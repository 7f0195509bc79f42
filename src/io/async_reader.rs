//! Asynchronous CSV request reader with batch interface
//!
//! Provides a streaming interface over request rows from a CSV file.
//! Supports batch reading for efficient async processing.
//!
//! # Architecture
//!
//! ```text
//! CSV Reader → AsyncReader → Batches of ParsedRecords
//!                  ↓
//!           csv_format module
//!           (CsvRecord, convert_csv_record)
//! ```

use crate::io::csv_format::{convert_csv_record, CsvRecord, ParsedRecord};
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use tracing::warn;

/// Asynchronous CSV request reader
///
/// Rows are numbered from 1 in file order as they are read. Rows that cannot be
/// deserialized at all are logged and skipped without consuming a number; rows that
/// deserialize but fail validation are returned so they can be reported.
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    next_seq: u64,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            next_seq: 1,
        }
    }

    /// Read up to `batch_size` request rows
    ///
    /// Returns an empty vector only once the end of the file is reached.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<ParsedRecord> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<CsvRecord>();

        while batch.len() < batch_size {
            match records.next().await {
                Some(Ok(csv_record)) => {
                    batch.push(convert_csv_record(self.next_seq, csv_record));
                    self.next_seq += 1;
                }
                Some(Err(e)) => warn!(error = %e, "skipping malformed request row"),
                None => break,
            }
        }

        batch
    }
}
