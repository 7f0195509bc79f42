//! Thread-safe in-memory transaction ledger
//!
//! This module provides `MemoryLedger`, the append-only record of applied
//! transactions keyed by their caller-supplied transaction id.
//!
//! # Uniqueness
//!
//! The ledger, not the processor's pre-check, is what guarantees a transaction id
//! is applied at most once: `insert` checks and claims the key in a single
//! `DashMap` entry operation, so two concurrent inserts of the same id can never
//! both succeed.

use super::traits::TransactionLedger;
use crate::types::{StorageError, TransactionId, TransactionRecord};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// In-memory ledger with a uniqueness constraint on transaction id
#[derive(Debug)]
pub struct MemoryLedger {
    records: DashMap<TransactionId, TransactionRecord>,

    /// Last sequence number handed out
    last_sequence: AtomicU64,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            last_sequence: AtomicU64::new(0),
        }
    }

    /// All records in insertion order
    pub fn records(&self) -> Vec<TransactionRecord> {
        let mut records: Vec<TransactionRecord> = self
            .records
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by_key(|record| record.sequence);
        records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionLedger for MemoryLedger {
    fn find(&self, transaction_id: &str) -> Result<Option<TransactionRecord>, StorageError> {
        Ok(self
            .records
            .get(transaction_id)
            .map(|entry| entry.value().clone()))
    }

    fn insert(&self, record: TransactionRecord) -> Result<TransactionRecord, StorageError> {
        let transaction_id = record.transaction_id.clone();
        let mut stored = None;

        // Only the caller that finds the slot vacant gets to fill it
        self.records
            .entry(transaction_id.clone())
            .or_insert_with(|| {
                let mut record = record;
                record.sequence = self.last_sequence.fetch_add(1, Ordering::Relaxed) + 1;
                stored = Some(record.clone());
                record
            });

        stored.ok_or(StorageError::DuplicateKey { transaction_id })
    }
}
