//! Transaction-related types for the Wallet Engine
//!
//! This module defines the request the core consumes, the ledger record it
//! persists and the structured outcome it returns.

use super::amount::Amount;
use super::error::WalletError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// User identifier (always positive once validated)
pub type UserId = i64;

/// Caller-supplied idempotency token
pub type TransactionId = String;

/// Direction of a balance adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionState {
    /// Credit: the amount is added to the balance
    Win,
    /// Debit: the amount is subtracted, provided the balance stays non-negative
    Lose,
}

impl TransactionState {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionState::Win => "win",
            TransactionState::Lose => "lose",
        }
    }
}

impl FromStr for TransactionState {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "win" => Ok(TransactionState::Win),
            "lose" => Ok(TransactionState::Lose),
            _ => Err(WalletError::invalid_state(s)),
        }
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of the calling system
///
/// Recorded on the ledger for reference; it never affects arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Game,
    Server,
    Payment,
}

impl SourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceType::Game => "game",
            SourceType::Server => "server",
            SourceType::Payment => "payment",
        }
    }
}

impl FromStr for SourceType {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "game" => Ok(SourceType::Game),
            "server" => Ok(SourceType::Server),
            "payment" => Ok(SourceType::Payment),
            _ => Err(WalletError::invalid_source_type(s)),
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request body handed to the processor by the boundary layer
///
/// The amount stays a string here; the processor re-parses it into an
/// [`Amount`] before touching storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub state: TransactionState,
    pub amount: String,
    pub transaction_id: TransactionId,
}

impl TransactionRequest {
    pub fn new(
        state: TransactionState,
        amount: impl Into<String>,
        transaction_id: impl Into<TransactionId>,
    ) -> Self {
        Self {
            state,
            amount: amount.into(),
            transaction_id: transaction_id.into(),
        }
    }
}

/// Immutable ledger entry for an applied transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    /// Insertion number assigned by the ledger (0 until stored)
    pub sequence: u64,

    pub transaction_id: TransactionId,

    /// The balance row this attempt targeted
    pub user_id: UserId,

    pub state: TransactionState,

    /// Amount as submitted, in fixed-point form
    pub amount: Amount,

    pub source_type: SourceType,

    /// Whether the balance was adjusted; only applied attempts are recorded
    pub applied: bool,
}

/// Structured result of applying a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionOutcome {
    /// The balance was adjusted and the ledger record written
    Applied,
    /// A record with the same transaction id already existed; nothing changed
    Duplicate,
    /// A debit would have driven the balance negative; nothing changed
    InsufficientFunds,
}

impl TransactionOutcome {
    pub fn message(self) -> &'static str {
        match self {
            TransactionOutcome::Applied => "Transaction applied successfully",
            TransactionOutcome::Duplicate => "Duplicate transaction ignored",
            TransactionOutcome::InsufficientFunds => "Insufficient funds",
        }
    }
}

/// Response of the apply path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionResponse {
    /// For duplicates this is the user of the original record
    pub user_id: UserId,
    pub transaction_id: TransactionId,
    /// Resulting balance (applied) or observed balance (duplicate, insufficient)
    pub balance: Amount,
    pub outcome: TransactionOutcome,
}

impl TransactionResponse {
    pub fn message(&self) -> &'static str {
        self.outcome.message()
    }
}
