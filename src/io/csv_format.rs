//! CSV format handling for requests and reports
//!
//! This module centralizes all CSV format concerns, providing:
//! - CsvRecord structure for deserializing request rows
//! - Conversion from CSV records to validated commands
//! - Report rows and their serialization (per-request responses or final balances)
//!
//! All functions are pure (no file handling) for easy testing.

use crate::types::{
    BalanceRecord, BalanceResponse, SourceType, TransactionRequest, TransactionResponse, UserId,
    WalletError,
};
use crate::validation::{
    validate_amount, validate_source_type, validate_state, validate_transaction_id,
    validate_user_id,
};
use serde::Deserialize;
use std::io::Write;
use tracing::debug;

/// CSV record structure for deserialization
///
/// Matches the request CSV format with columns: op, user, source, state, amount, tx.
/// Only `op` and `user` are required; `balance` rows leave the rest empty.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvRecord {
    pub op: String,
    pub user: String,
    pub source: Option<String>,
    pub state: Option<String>,
    pub amount: Option<String>,
    pub tx: Option<String>,
}

/// A validated request ready for the processor
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Apply a win/lose transaction
    Apply {
        user_id: UserId,
        source_type: SourceType,
        request: TransactionRequest,
    },
    /// Read a user's balance
    Balance { user_id: UserId },
}

/// One request row, validated or not
///
/// The raw `op`, `user` and `tx` fields are kept so a rejected row can still be
/// reported against what the caller sent.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecord {
    /// 1-based position of the row among the request rows
    pub seq: u64,
    pub op: String,
    pub user: String,
    pub transaction: String,
    pub command: Result<Command, WalletError>,
}

/// Convert a CsvRecord into a ParsedRecord
///
/// Fields are validated in the order the service checks them: operation, user id,
/// source type, state, amount, transaction id. The first failure wins.
pub fn convert_csv_record(seq: u64, csv_record: CsvRecord) -> ParsedRecord {
    let op = csv_record.op.to_lowercase();
    let transaction = csv_record.tx.clone().unwrap_or_default();
    let command = build_command(&op, &csv_record);

    ParsedRecord {
        seq,
        op,
        user: csv_record.user,
        transaction,
        command,
    }
}

fn build_command(op: &str, csv_record: &CsvRecord) -> Result<Command, WalletError> {
    let field = |value: &Option<String>| value.clone().unwrap_or_default();

    match op {
        "apply" => {
            let user_id = validate_user_id(&csv_record.user)?;
            let source_type = validate_source_type(&field(&csv_record.source))?;
            let state = validate_state(&field(&csv_record.state))?;
            let amount = field(&csv_record.amount);
            validate_amount(&amount)?;
            let transaction_id = field(&csv_record.tx);
            validate_transaction_id(&transaction_id)?;

            Ok(Command::Apply {
                user_id,
                source_type,
                request: TransactionRequest::new(state, amount, transaction_id),
            })
        }
        "balance" => Ok(Command::Balance {
            user_id: validate_user_id(&csv_record.user)?,
        }),
        _ => Err(WalletError::invalid_operation(op)),
    }
}

/// One line of the responses report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub seq: u64,
    pub op: String,
    pub user: String,
    pub transaction: String,
    /// `ok`, `client_error`, `not_found` or `server_error`
    pub status: &'static str,
    /// Exactly two fractional digits; empty when the request failed
    pub balance: String,
    pub message: String,
}

impl ReportRow {
    pub fn from_transaction(seq: u64, op: &str, response: &TransactionResponse) -> Self {
        ReportRow {
            seq,
            op: op.to_string(),
            user: response.user_id.to_string(),
            transaction: response.transaction_id.clone(),
            status: "ok",
            balance: response.balance.to_string(),
            message: response.message().to_string(),
        }
    }

    pub fn from_balance(seq: u64, op: &str, response: &BalanceResponse) -> Self {
        ReportRow {
            seq,
            op: op.to_string(),
            user: response.user_id.to_string(),
            transaction: String::new(),
            status: "ok",
            balance: response.balance.to_string(),
            message: String::new(),
        }
    }

    pub fn from_error(seq: u64, op: &str, user: &str, transaction: &str, error: &WalletError) -> Self {
        ReportRow {
            seq,
            op: op.to_string(),
            user: user.to_string(),
            transaction: transaction.to_string(),
            status: error.kind().status(),
            balance: String::new(),
            message: error.to_string(),
        }
    }
}

/// Write per-request responses in CSV format
///
/// Columns: seq, op, user, transaction, status, balance, message. Rows are written
/// in the order given.
pub fn write_report_csv(rows: &[ReportRow], output: &mut dyn Write) -> Result<(), WalletError> {
    let mut writer = csv::Writer::from_writer(output);

    writer.write_record([
        "seq",
        "op",
        "user",
        "transaction",
        "status",
        "balance",
        "message",
    ])?;

    for row in rows {
        writer.write_record([
            row.seq.to_string().as_str(),
            row.op.as_str(),
            row.user.as_str(),
            row.transaction.as_str(),
            row.status,
            row.balance.as_str(),
            row.message.as_str(),
        ])?;
    }

    writer.flush()?;
    debug!(rows = rows.len(), "responses report written");

    Ok(())
}

/// Write balance rows in CSV format
///
/// Columns: user, balance. Rows are sorted by user id for deterministic output.
pub fn write_balances_csv(
    balances: &[BalanceRecord],
    output: &mut dyn Write,
) -> Result<(), WalletError> {
    let mut writer = csv::Writer::from_writer(output);

    writer.write_record(["user", "balance"])?;

    let mut sorted = balances.to_vec();
    sorted.sort_by_key(|record| record.user_id);

    for record in sorted {
        writer.write_record([record.user_id.to_string(), record.balance.to_string()])?;
    }

    writer.flush()?;

    Ok(())
}
