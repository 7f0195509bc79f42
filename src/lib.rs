//! Wallet Engine Library
//! # Overview
//!
//! This library applies win/lose transactions from game, server and payment
//! callers to per-user balances, exactly once per transaction id, and never lets
//! a balance go negative. Requests are streamed from CSV and run either in file
//! order or as independent concurrent tasks.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (Amount, TransactionRequest, outcomes, errors)
//! - [`validation`] - Boundary checks on raw request fields
//! - [`core`] - Business logic components:
//!   - [`core::processor`] - The apply/query unit of work
//!   - [`core::balance_store`] - Balance rows with per-row locks
//!   - [`core::ledger`] - Transaction records keyed by a unique transaction id
//! - [`io`] - CSV request reading, seed loading and report writing
//! - [`strategy`] - Sequential and concurrent processing pipelines
//! - [`cli`] - CLI arguments parsing
//!
//! # Outcomes
//!
//! Applying a transaction yields one of:
//!
//! - **Applied**: the balance changed and the transaction was recorded
//! - **Duplicate**: the transaction id was already recorded; nothing changed
//! - **InsufficientFunds**: a `lose` would make the balance negative; nothing
//!   changed and nothing was recorded

pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;
pub mod validation;

pub use crate::core::{MemoryBalanceStore, MemoryLedger, ProcessorConfig, TransactionProcessor};
pub use types::{
    Amount, BalanceRecord, BalanceResponse, SourceType, TransactionId, TransactionOutcome,
    TransactionRequest, TransactionResponse, TransactionState, UserId, WalletError,
};
