//! Transaction processing orchestration
//!
//! This module provides `TransactionProcessor`, which applies win/lose transactions
//! against a [`BalanceStore`] and records them in a [`TransactionLedger`].
//!
//! # Unit of Work
//!
//! Every `apply_transaction` call runs as one unit of work:
//!
//! ```text
//! ledger lookup ──found──► lock owner's row ─► Duplicate (no writes)
//!      │
//!   missing
//!      ▼
//! lock user's row ─► compute ─► negative? ─► InsufficientFunds (no writes)
//!                                  │
//!                                  ▼
//!                          ledger insert ──conflict──► Duplicate (no writes)
//!                                  │
//!                                  ▼
//!                          publish balance ─► Applied
//! ```
//!
//! The row lock is held from the read to the publish, so concurrent requests for
//! the same user are serialized. The ledger insert and the balance publish run
//! back to back with no await point between them, so a cancelled task can never
//! leave one without the other.
//!
//! # Architecture
//!
//! ```text
//! TransactionProcessor
//!     ├── Arc<B: BalanceStore>       (balance rows + row locks)
//!     └── Arc<L: TransactionLedger>  (idempotency records)
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use super::traits::{BalanceLock, BalanceStore, TransactionLedger};
use crate::types::{
    Amount, BalanceResponse, SourceType, StorageError, TransactionOutcome, TransactionRecord,
    TransactionRequest, TransactionResponse, TransactionState, UserId, WalletError,
};
use crate::validation::validate_transaction_id;

/// Tuning for the processor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessorConfig {
    /// Upper bound on waiting for a balance row lock; `None` waits indefinitely
    pub lock_timeout: Option<Duration>,
}

impl ProcessorConfig {
    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            lock_timeout: Some(lock_timeout),
        }
    }
}

/// Applies transactions and answers balance queries
///
/// The processor owns nothing but shared handles to its two stores, so it can be
/// cloned freely and moved into as many tasks as needed.
#[derive(Debug)]
pub struct TransactionProcessor<B, L> {
    balances: Arc<B>,
    ledger: Arc<L>,
    config: ProcessorConfig,
}

impl<B, L> Clone for TransactionProcessor<B, L> {
    fn clone(&self) -> Self {
        Self {
            balances: Arc::clone(&self.balances),
            ledger: Arc::clone(&self.ledger),
            config: self.config,
        }
    }
}

impl<B: BalanceStore, L: TransactionLedger> TransactionProcessor<B, L> {
    /// Create a processor with the default configuration
    pub fn new(balances: Arc<B>, ledger: Arc<L>) -> Self {
        Self::with_config(balances, ledger, ProcessorConfig::default())
    }

    pub fn with_config(balances: Arc<B>, ledger: Arc<L>, config: ProcessorConfig) -> Self {
        Self {
            balances,
            ledger,
            config,
        }
    }

    pub fn balances(&self) -> &Arc<B> {
        &self.balances
    }

    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Apply a win or lose transaction for a user
    ///
    /// # Returns
    ///
    /// * `Ok(TransactionResponse)` with outcome `Applied`, `Duplicate` or
    ///   `InsufficientFunds`
    /// * `Err(WalletError::MissingTransactionId | InvalidAmount)` - request failed
    ///   the defensive re-validation; storage was not touched
    /// * `Err(WalletError::UserNotFound)` - no balance row for the user
    /// * `Err(WalletError::BalanceOverflow | Storage)` - internal failure; nothing
    ///   was written
    pub async fn apply_transaction(
        &self,
        user_id: UserId,
        request: &TransactionRequest,
        source_type: SourceType,
    ) -> Result<TransactionResponse, WalletError> {
        validate_transaction_id(&request.transaction_id)?;
        let amount = Amount::parse(&request.amount)?;

        if let Some(existing) = self.ledger.find(&request.transaction_id)? {
            return self.replay_duplicate(existing).await;
        }

        let lock = self
            .lock_row(user_id)
            .await?
            .ok_or_else(|| WalletError::user_not_found(user_id))?;
        let current = lock.balance();

        let tentative = match request.state {
            TransactionState::Win => current.checked_add(amount),
            TransactionState::Lose => current.checked_sub(amount),
        }
        .ok_or_else(|| WalletError::balance_overflow(user_id))?;

        if tentative.is_negative() {
            drop(lock);
            info!(
                user_id,
                transaction_id = %request.transaction_id,
                amount = %amount,
                balance = %current,
                "insufficient funds"
            );
            return Ok(TransactionResponse {
                user_id,
                transaction_id: request.transaction_id.clone(),
                balance: current,
                outcome: TransactionOutcome::InsufficientFunds,
            });
        }

        let record = TransactionRecord {
            sequence: 0,
            transaction_id: request.transaction_id.clone(),
            user_id,
            state: request.state,
            amount,
            source_type,
            applied: true,
        };

        match self.ledger.insert(record) {
            Ok(_) => {}
            Err(StorageError::DuplicateKey { transaction_id }) => {
                // An identical request committed between our lookup and our insert
                drop(lock);
                let existing = self.ledger.find(&transaction_id)?.ok_or_else(|| {
                    StorageError::Backend {
                        message: format!(
                            "transaction '{}' conflicted but could not be read back",
                            transaction_id
                        ),
                    }
                })?;
                return self.replay_duplicate(existing).await;
            }
            Err(err) => return Err(err.into()),
        }

        lock.commit(tentative);

        info!(
            user_id,
            transaction_id = %request.transaction_id,
            state = %request.state,
            amount = %amount,
            source = %source_type,
            balance = %tentative,
            "transaction applied"
        );

        Ok(TransactionResponse {
            user_id,
            transaction_id: request.transaction_id.clone(),
            balance: tentative,
            outcome: TransactionOutcome::Applied,
        })
    }

    /// Read a user's committed balance
    ///
    /// # Returns
    ///
    /// * `Ok(BalanceResponse)` - the current balance
    /// * `Err(WalletError::UserNotFound)` - no balance row for the user
    pub fn get_balance(&self, user_id: UserId) -> Result<BalanceResponse, WalletError> {
        let balance = self
            .balances
            .balance(user_id)?
            .ok_or_else(|| WalletError::user_not_found(user_id))?;

        Ok(BalanceResponse { user_id, balance })
    }

    /// Answer a replayed transaction id with the owner's settled balance
    ///
    /// Locking the row waits out any unit of work still in flight for that user.
    async fn replay_duplicate(
        &self,
        existing: TransactionRecord,
    ) -> Result<TransactionResponse, WalletError> {
        let lock = self
            .lock_row(existing.user_id)
            .await?
            .ok_or_else(|| WalletError::user_not_found(existing.user_id))?;
        let balance = lock.balance();
        drop(lock);

        debug!(
            user_id = existing.user_id,
            transaction_id = %existing.transaction_id,
            balance = %balance,
            "duplicate transaction ignored"
        );

        Ok(TransactionResponse {
            user_id: existing.user_id,
            transaction_id: existing.transaction_id,
            balance,
            outcome: TransactionOutcome::Duplicate,
        })
    }

    async fn lock_row(&self, user_id: UserId) -> Result<Option<B::Lock>, WalletError> {
        Ok(self.balances.lock(user_id, self.config.lock_timeout).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{MemoryBalanceStore, MemoryLedger, MemoryProcessor};
    use crate::types::{BalanceRecord, ErrorKind};
    use rstest::rstest;

    fn processor() -> MemoryProcessor {
        TransactionProcessor::new(
            Arc::new(MemoryBalanceStore::with_balances(
                BalanceRecord::default_seeds(),
            )),
            Arc::new(MemoryLedger::new()),
        )
    }

    fn win(amount: &str, id: &str) -> TransactionRequest {
        TransactionRequest::new(TransactionState::Win, amount, id)
    }

    fn lose(amount: &str, id: &str) -> TransactionRequest {
        TransactionRequest::new(TransactionState::Lose, amount, id)
    }

    #[test]
    fn test_processor_is_cloneable() {
        let processor = processor();
        let _clone = processor.clone();

        assert!(Arc::strong_count(processor.balances()) >= 2);
        assert!(Arc::strong_count(processor.ledger()) >= 2);
    }

    #[tokio::test]
    async fn test_win_then_lose_then_replay() {
        let processor = processor();

        let first = processor
            .apply_transaction(1, &win("10.50", "t1"), SourceType::Game)
            .await
            .unwrap();
        assert_eq!(first.outcome, TransactionOutcome::Applied);
        assert_eq!(first.balance.to_string(), "110.50");
        assert_eq!(first.message(), "Transaction applied successfully");

        let second = processor
            .apply_transaction(1, &lose("25.00", "t2"), SourceType::Server)
            .await
            .unwrap();
        assert_eq!(second.outcome, TransactionOutcome::Applied);
        assert_eq!(second.balance.to_string(), "85.50");

        // Replaying t1 reports the current balance, not the one t1 produced
        let replay = processor
            .apply_transaction(1, &win("10.50", "t1"), SourceType::Game)
            .await
            .unwrap();
        assert_eq!(replay.outcome, TransactionOutcome::Duplicate);
        assert_eq!(replay.balance.to_string(), "85.50");
        assert_eq!(replay.transaction_id, "t1");

        assert_eq!(processor.ledger().len(), 2);
    }

    #[tokio::test]
    async fn test_insufficient_funds_leaves_state_untouched() {
        let processor = processor();

        let response = processor
            .apply_transaction(3, &lose("100.00", "t3"), SourceType::Payment)
            .await
            .unwrap();

        assert_eq!(response.outcome, TransactionOutcome::InsufficientFunds);
        assert_eq!(response.message(), "Insufficient funds");
        assert_eq!(response.balance.to_string(), "0.00");
        assert_eq!(processor.get_balance(3).unwrap().balance, Amount::ZERO);
        assert!(processor.ledger().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_id_can_succeed_after_balance_changes() {
        let processor = processor();

        let rejected = processor
            .apply_transaction(3, &lose("5.00", "retry"), SourceType::Game)
            .await
            .unwrap();
        assert_eq!(rejected.outcome, TransactionOutcome::InsufficientFunds);

        processor
            .apply_transaction(3, &win("5.00", "topup"), SourceType::Payment)
            .await
            .unwrap();

        let retried = processor
            .apply_transaction(3, &lose("5.00", "retry"), SourceType::Game)
            .await
            .unwrap();
        assert_eq!(retried.outcome, TransactionOutcome::Applied);
        assert_eq!(retried.balance, Amount::ZERO);
    }

    #[tokio::test]
    async fn test_lose_down_to_exactly_zero_is_applied() {
        let processor = processor();

        let response = processor
            .apply_transaction(2, &lose("50", "all-in"), SourceType::Game)
            .await
            .unwrap();

        assert_eq!(response.outcome, TransactionOutcome::Applied);
        assert_eq!(response.balance.to_string(), "0.00");
    }

    #[tokio::test]
    async fn test_duplicate_reports_original_user() {
        let processor = processor();

        processor
            .apply_transaction(1, &win("1.00", "shared"), SourceType::Game)
            .await
            .unwrap();

        // Same id submitted for another user is still a duplicate of the first
        let response = processor
            .apply_transaction(2, &win("1.00", "shared"), SourceType::Game)
            .await
            .unwrap();

        assert_eq!(response.outcome, TransactionOutcome::Duplicate);
        assert_eq!(response.user_id, 1);
        assert_eq!(response.balance.to_string(), "101.00");
        assert_eq!(processor.get_balance(2).unwrap().balance.to_string(), "50.00");
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let processor = processor();

        let err = processor
            .apply_transaction(404, &win("1.00", "t404"), SourceType::Game)
            .await
            .unwrap_err();
        assert_eq!(err, WalletError::user_not_found(404));
        assert_eq!(err.kind(), ErrorKind::NotFound);

        assert_eq!(
            processor.get_balance(404).unwrap_err(),
            WalletError::user_not_found(404)
        );
        assert!(processor.ledger().is_empty());
    }

    #[rstest]
    #[case::empty_id(win("1.00", ""))]
    #[case::bad_amount(win("1.001", "t1"))]
    #[case::negative_amount(lose("-1.00", "t1"))]
    #[tokio::test]
    async fn test_defensive_validation(#[case] request: TransactionRequest) {
        let processor = processor();

        let err = processor
            .apply_transaction(1, &request, SourceType::Game)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(processor.ledger().is_empty());
        assert_eq!(processor.get_balance(1).unwrap().balance.to_string(), "100.00");
    }

    #[tokio::test]
    async fn test_get_balance_of_seed_user() {
        let processor = processor();

        let response = processor.get_balance(2).unwrap();
        assert_eq!(response.user_id, 2);
        assert_eq!(response.balance.to_string(), "50.00");
    }

    #[tokio::test]
    async fn test_overflow_is_internal_failure() {
        let balances = Arc::new(MemoryBalanceStore::with_balances(vec![BalanceRecord::new(
            1,
            Amount::from_cents(i64::MAX - 10),
        )]));
        let processor = TransactionProcessor::new(balances, Arc::new(MemoryLedger::new()));

        let err = processor
            .apply_transaction(1, &win("1.00", "big"), SourceType::Game)
            .await
            .unwrap_err();

        assert_eq!(err, WalletError::balance_overflow(1));
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(processor.ledger().is_empty());
    }

    #[tokio::test]
    async fn test_lock_timeout_rolls_back() {
        let processor = TransactionProcessor::with_config(
            Arc::new(MemoryBalanceStore::with_balances(
                BalanceRecord::default_seeds(),
            )),
            Arc::new(MemoryLedger::new()),
            ProcessorConfig::with_lock_timeout(Duration::from_millis(20)),
        );

        let held = processor.balances().lock(1, None).await.unwrap().unwrap();
        let err = processor
            .apply_transaction(1, &win("1.00", "slow"), SourceType::Game)
            .await
            .unwrap_err();
        drop(held);

        assert!(matches!(
            err,
            WalletError::Storage(StorageError::LockTimeout { user_id: 1, .. })
        ));
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(processor.ledger().is_empty());
        assert_eq!(processor.get_balance(1).unwrap().balance.to_string(), "100.00");
    }

    /// Ledger whose inserts always fail, for checking rollback
    struct BrokenLedger;

    impl TransactionLedger for BrokenLedger {
        fn find(&self, _transaction_id: &str) -> Result<Option<TransactionRecord>, StorageError> {
            Ok(None)
        }

        fn insert(&self, _record: TransactionRecord) -> Result<TransactionRecord, StorageError> {
            Err(StorageError::Backend {
                message: "disk full".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_ledger_failure_leaves_balance_unchanged() {
        let balances = Arc::new(MemoryBalanceStore::with_balances(
            BalanceRecord::default_seeds(),
        ));
        let processor = TransactionProcessor::new(Arc::clone(&balances), Arc::new(BrokenLedger));

        let err = processor
            .apply_transaction(1, &lose("10.00", "t1"), SourceType::Game)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(balances.balance(1).unwrap(), Some(Amount::from_cents(10_000)));
        // The row lock was released by the rollback
        assert!(balances
            .lock(1, Some(Duration::from_millis(20)))
            .await
            .unwrap()
            .is_some());
    }

    /// Ledger that hides a record from lookups until the insert, emulating a
    /// concurrent request that commits the same id between check and insert
    struct RacingLedger {
        inner: MemoryLedger,
    }

    impl TransactionLedger for RacingLedger {
        fn find(&self, transaction_id: &str) -> Result<Option<TransactionRecord>, StorageError> {
            self.inner.find(transaction_id)
        }

        fn insert(&self, record: TransactionRecord) -> Result<TransactionRecord, StorageError> {
            let mut winner = record.clone();
            winner.user_id = 2;
            self.inner.insert(winner)?;
            self.inner.insert(record)
        }
    }

    #[tokio::test]
    async fn test_insert_conflict_becomes_duplicate() {
        let balances = Arc::new(MemoryBalanceStore::with_balances(
            BalanceRecord::default_seeds(),
        ));
        let processor = TransactionProcessor::new(
            Arc::clone(&balances),
            Arc::new(RacingLedger {
                inner: MemoryLedger::new(),
            }),
        );

        let response = processor
            .apply_transaction(1, &win("10.00", "raced"), SourceType::Game)
            .await
            .unwrap();

        assert_eq!(response.outcome, TransactionOutcome::Duplicate);
        assert_eq!(response.user_id, 2);
        assert_eq!(response.balance.to_string(), "50.00");
        assert_eq!(balances.balance(1).unwrap(), Some(Amount::from_cents(10_000)));
    }
}
