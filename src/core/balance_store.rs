//! Thread-safe in-memory balance store
//!
//! This module provides `MemoryBalanceStore`, the balance table used by the
//! processor. Rows live in a `DashMap`, so rows for different users never contend
//! with each other.
//!
//! # Row Locking
//!
//! Each row carries its own async mutex standing in for a `SELECT ... FOR UPDATE`
//! row lock. A unit of work holds the mutex for its whole read-modify-write, and
//! the committed value sits in an atomic next to it so that plain reads never
//! wait on a writer and never observe an uncommitted balance.

use super::traits::{BalanceLock, BalanceStore};
use crate::types::{Amount, BalanceRecord, StorageError, UserId};
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug)]
struct BalanceRow {
    /// Last committed balance in cents
    committed: AtomicI64,

    /// Row lock; held by at most one unit of work
    lock: Arc<Mutex<()>>,
}

impl BalanceRow {
    fn new(balance: Amount) -> Self {
        Self {
            committed: AtomicI64::new(balance.cents()),
            lock: Arc::new(Mutex::new(())),
        }
    }

    fn committed(&self) -> Amount {
        Amount::from_cents(self.committed.load(Ordering::Acquire))
    }
}

/// In-memory balance table with per-row exclusive locks
#[derive(Debug)]
pub struct MemoryBalanceStore {
    rows: DashMap<UserId, Arc<BalanceRow>>,
}

impl MemoryBalanceStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
        }
    }

    /// Create a store pre-seeded with the given rows
    ///
    /// When the same user appears more than once, the first row wins.
    pub fn with_balances(records: impl IntoIterator<Item = BalanceRecord>) -> Self {
        let store = Self::new();
        for record in records {
            store.insert_user(record.user_id, record.balance);
        }
        store
    }

    /// Create a balance row if the user does not have one yet
    ///
    /// Returns `true` if the row was created, `false` if it already existed (the
    /// existing balance is left untouched).
    pub fn insert_user(&self, user_id: UserId, balance: Amount) -> bool {
        let mut created = false;
        self.rows.entry(user_id).or_insert_with(|| {
            created = true;
            Arc::new(BalanceRow::new(balance))
        });
        created
    }

    /// Committed balances of every user, sorted by user id
    pub fn snapshot(&self) -> Vec<BalanceRecord> {
        let mut records: Vec<BalanceRecord> = self
            .rows
            .iter()
            .map(|entry| BalanceRecord::new(*entry.key(), entry.value().committed()))
            .collect();
        records.sort_by_key(|record| record.user_id);
        records
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Default for MemoryBalanceStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive hold on a [`MemoryBalanceStore`] row
#[derive(Debug)]
pub struct MemoryBalanceLock {
    user_id: UserId,
    row: Arc<BalanceRow>,
    _guard: OwnedMutexGuard<()>,
}

impl BalanceLock for MemoryBalanceLock {
    fn user_id(&self) -> UserId {
        self.user_id
    }

    fn balance(&self) -> Amount {
        self.row.committed()
    }

    fn commit(self, balance: Amount) {
        self.row.committed.store(balance.cents(), Ordering::Release);
    }
}

impl BalanceStore for MemoryBalanceStore {
    type Lock = MemoryBalanceLock;

    fn balance(&self, user_id: UserId) -> Result<Option<Amount>, StorageError> {
        Ok(self.rows.get(&user_id).map(|entry| entry.value().committed()))
    }

    async fn lock(
        &self,
        user_id: UserId,
        timeout: Option<Duration>,
    ) -> Result<Option<MemoryBalanceLock>, StorageError> {
        // Clone the row out so no map shard stays locked across the wait
        let row = self.rows.get(&user_id).map(|entry| Arc::clone(entry.value()));
        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let acquire = Arc::clone(&row.lock).lock_owned();
        let guard = match timeout {
            Some(limit) => tokio::time::timeout(limit, acquire).await.map_err(|_| {
                StorageError::LockTimeout {
                    user_id,
                    waited_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                }
            })?,
            None => acquire.await,
        };

        Ok(Some(MemoryBalanceLock {
            user_id,
            row,
            _guard: guard,
        }))
    }
}
