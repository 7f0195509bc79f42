//! Core business logic module
//!
//! This module contains the transaction-application protocol and its storage:
//! - `traits` - Storage contracts the processor is generic over
//! - `balance_store` - In-memory balance rows with per-row locks
//! - `ledger` - In-memory transaction ledger with a unique transaction id
//! - `processor` - The unit of work applying transactions and answering queries

pub mod balance_store;
pub mod ledger;
pub mod processor;
pub mod traits;

pub use balance_store::{MemoryBalanceLock, MemoryBalanceStore};
pub use ledger::MemoryLedger;
pub use processor::{ProcessorConfig, TransactionProcessor};
pub use traits::{BalanceLock, BalanceStore, TransactionLedger};

/// Processor over the in-memory stores
pub type MemoryProcessor = TransactionProcessor<MemoryBalanceStore, MemoryLedger>;
