//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `amount`: Fixed-point money
//! - `balance`: Balance rows and the balance query response
//! - `transaction`: Requests, ledger records and outcomes
//! - `error`: Error types for the wallet engine

pub mod amount;
pub mod balance;
pub mod error;
pub mod transaction;

pub use amount::Amount;
pub use balance::{BalanceRecord, BalanceResponse};
pub use error::{ErrorKind, StorageError, WalletError};
pub use transaction::{
    SourceType, TransactionId, TransactionOutcome, TransactionRecord, TransactionRequest,
    TransactionResponse, TransactionState, UserId,
};
