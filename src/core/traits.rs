//! Core traits for balance storage and the transaction ledger
//!
//! The processor is generic over these two contracts so the in-memory stores
//! shipped with the crate can be swapped for another backend without touching
//! the transaction protocol.

use crate::types::{Amount, StorageError, TransactionRecord, UserId};
use std::future::Future;
use std::time::Duration;

/// Exclusive hold on one balance row
///
/// While a lock is alive no other unit of work can lock the same row. Dropping
/// the lock without calling [`commit`](BalanceLock::commit) releases the row
/// unchanged, which is how a unit of work rolls back.
pub trait BalanceLock: Send {
    /// The user whose row is held
    fn user_id(&self) -> UserId;

    /// Balance of the row as last committed
    fn balance(&self) -> Amount;

    /// Publish a new balance and release the row
    ///
    /// Implementations must not fail here: every fallible step of the unit of
    /// work happens before the commit.
    fn commit(self, balance: Amount);
}

/// Table of user balances keyed by user id
pub trait BalanceStore: Send + Sync {
    /// Lock handle produced by [`lock`](BalanceStore::lock)
    type Lock: BalanceLock;

    /// Read the committed balance of a user without locking
    ///
    /// Returns `Ok(None)` when the user has no balance row.
    fn balance(&self, user_id: UserId) -> Result<Option<Amount>, StorageError>;

    /// Acquire the exclusive lock on a user's row
    ///
    /// Waits until the row is free, or until `timeout` elapses
    /// ([`StorageError::LockTimeout`]). Returns `Ok(None)` when the user has no
    /// balance row.
    fn lock(
        &self,
        user_id: UserId,
        timeout: Option<Duration>,
    ) -> impl Future<Output = Result<Option<Self::Lock>, StorageError>> + Send;
}

/// Append-only record of applied transactions keyed by transaction id
pub trait TransactionLedger: Send + Sync {
    /// Look up a record by transaction id
    fn find(&self, transaction_id: &str) -> Result<Option<TransactionRecord>, StorageError>;

    /// Insert a new record, enforcing transaction id uniqueness
    ///
    /// Returns the stored record (with its sequence number assigned), or
    /// [`StorageError::DuplicateKey`] when the id is already taken. The check and
    /// the insert are a single atomic step.
    fn insert(&self, record: TransactionRecord) -> Result<TransactionRecord, StorageError>;
}
