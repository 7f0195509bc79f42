//! Balance-related types for the Wallet Engine
//!
//! This module defines the balance row as it is seeded and listed, and the
//! response of the read-only balance query.

use super::amount::Amount;
use super::transaction::UserId;

/// A user's balance row
///
/// Used for seeding the balance store and for listing its committed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceRecord {
    /// Primary key of the row (positive)
    pub user_id: UserId,

    /// Committed balance, never negative
    pub balance: Amount,
}

impl BalanceRecord {
    pub fn new(user_id: UserId, balance: Amount) -> Self {
        BalanceRecord { user_id, balance }
    }

    /// The rows the service starts with when no seed file is given
    ///
    /// - user 1: 100.00
    /// - user 2: 50.00
    /// - user 3: 0.00
    pub fn default_seeds() -> Vec<BalanceRecord> {
        vec![
            BalanceRecord::new(1, Amount::from_cents(10_000)),
            BalanceRecord::new(2, Amount::from_cents(5_000)),
            BalanceRecord::new(3, Amount::ZERO),
        ]
    }
}

/// Response of the balance query path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceResponse {
    pub user_id: UserId,
    pub balance: Amount,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_seeds() {
        let seeds = BalanceRecord::default_seeds();

        assert_eq!(seeds.len(), 3);
        assert_eq!(seeds[0].balance.to_string(), "100.00");
        assert_eq!(seeds[1].balance.to_string(), "50.00");
        assert_eq!(seeds[2].balance.to_string(), "0.00");
        assert!(seeds.iter().all(|seed| seed.user_id > 0));
    }
}
