//! Error types for the Wallet Engine
//!
//! This module defines all error types that can occur while validating requests,
//! applying transactions and talking to the storage backend.
//!
//! # Error Categories
//!
//! - **Validation Errors**: malformed user id, source type, state, amount or transaction id
//! - **Not Found**: the referenced balance row does not exist
//! - **Internal Errors**: storage failures, lock timeouts, arithmetic overflow, I/O
//!
//! Business outcomes such as a duplicate submission or insufficient funds are not
//! errors; they are reported through [`TransactionOutcome`](super::TransactionOutcome).

use super::transaction::UserId;
use thiserror::Error;

/// Coarse classification used by the boundary layer to pick a status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself is malformed (client error)
    Validation,
    /// The referenced user does not exist
    NotFound,
    /// Anything else: storage, overflow, I/O
    Internal,
}

impl ErrorKind {
    /// Transport-neutral status written to reports
    pub fn status(self) -> &'static str {
        match self {
            ErrorKind::Validation => "client_error",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Internal => "server_error",
        }
    }
}

/// Failures reported by a balance store or transaction ledger
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Waiting for a balance row lock exceeded the configured timeout
    #[error("Timed out after {waited_ms}ms waiting for the balance lock of user {user_id}")]
    LockTimeout {
        /// User whose row could not be locked
        user_id: UserId,
        /// Configured timeout in milliseconds
        waited_ms: u64,
    },

    /// A ledger record with the same transaction id already exists
    ///
    /// The processor treats this as a lost race against an identical request and
    /// answers with a duplicate outcome.
    #[error("Transaction '{transaction_id}' already exists")]
    DuplicateKey { transaction_id: String },

    /// Any other backend failure
    #[error("Storage backend failure: {message}")]
    Backend { message: String },
}

/// Main error type for the wallet engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WalletError {
    /// User id is not a positive integer
    #[error("Invalid user ID '{value}': must be a positive integer")]
    InvalidUserId { value: String },

    /// Source type is not one of the known callers
    #[error("Invalid Source-Type '{value}': must be 'game', 'server', or 'payment'")]
    InvalidSourceType { value: String },

    /// State is neither a credit nor a debit
    #[error("Invalid state '{value}': must be 'win' or 'lose'")]
    InvalidState { value: String },

    /// Amount is malformed, negative or out of range
    #[error("Invalid amount '{value}': {reason}")]
    InvalidAmount { value: String, reason: String },

    /// Transaction id is empty
    #[error("Transaction ID is required")]
    MissingTransactionId,

    /// Request row names an unknown operation
    #[error("Invalid operation '{value}': must be 'apply' or 'balance'")]
    InvalidOperation { value: String },

    /// No balance row exists for the user
    #[error("User {user_id} not found")]
    UserNotFound { user_id: UserId },

    /// The new balance does not fit the fixed-point representation
    #[error("Balance overflow for user {user_id}")]
    BalanceOverflow { user_id: UserId },

    /// Storage layer failure; the unit of work was rolled back
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Seed data could not be loaded
    #[error("Invalid seed data{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    Seed { line: Option<u64>, message: String },

    /// I/O error occurred while reading or writing files
    #[error("I/O error: {message}")]
    Io { message: String },

    /// CSV error occurred while reading or writing reports
    #[error("CSV error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    Csv { line: Option<u64>, message: String },
}

impl WalletError {
    /// Classify this error for the boundary layer
    pub fn kind(&self) -> ErrorKind {
        match self {
            WalletError::InvalidUserId { .. }
            | WalletError::InvalidSourceType { .. }
            | WalletError::InvalidState { .. }
            | WalletError::InvalidAmount { .. }
            | WalletError::MissingTransactionId
            | WalletError::InvalidOperation { .. } => ErrorKind::Validation,
            WalletError::UserNotFound { .. } => ErrorKind::NotFound,
            WalletError::BalanceOverflow { .. }
            | WalletError::Storage(_)
            | WalletError::Seed { .. }
            | WalletError::Io { .. }
            | WalletError::Csv { .. } => ErrorKind::Internal,
        }
    }
}

impl From<std::io::Error> for WalletError {
    fn from(error: std::io::Error) -> Self {
        WalletError::Io {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for WalletError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        WalletError::Csv {
            line,
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl WalletError {
    pub fn invalid_user_id(value: &str) -> Self {
        WalletError::InvalidUserId {
            value: value.to_string(),
        }
    }

    pub fn invalid_source_type(value: &str) -> Self {
        WalletError::InvalidSourceType {
            value: value.to_string(),
        }
    }

    pub fn invalid_state(value: &str) -> Self {
        WalletError::InvalidState {
            value: value.to_string(),
        }
    }

    pub fn invalid_amount(value: &str, reason: &str) -> Self {
        WalletError::InvalidAmount {
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_operation(value: &str) -> Self {
        WalletError::InvalidOperation {
            value: value.to_string(),
        }
    }

    pub fn user_not_found(user_id: UserId) -> Self {
        WalletError::UserNotFound { user_id }
    }

    pub fn balance_overflow(user_id: UserId) -> Self {
        WalletError::BalanceOverflow { user_id }
    }

    pub fn seed(line: Option<u64>, message: impl Into<String>) -> Self {
        WalletError::Seed {
            line,
            message: message.into(),
        }
    }
}
