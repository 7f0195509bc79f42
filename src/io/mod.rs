//! I/O module
//!
//! Handles CSV request parsing, seed loading and report output.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (record conversion, report serialization)
//! - `async_reader` - Asynchronous request reader with batch reading interface
//! - `seed` - Initial balance table loading

pub mod async_reader;
pub mod csv_format;
pub mod seed;

pub use async_reader::AsyncReader;
pub use csv_format::{
    convert_csv_record, write_balances_csv, write_report_csv, Command, CsvRecord, ParsedRecord,
    ReportRow,
};
pub use seed::{read_seed_file, read_seeds};
