//! Seed loading for the balance table
//!
//! The seed CSV has the columns `user,balance`. Unlike request rows, a bad seed row
//! is fatal: the engine must not start from a balance table it cannot trust.

use crate::types::{Amount, BalanceRecord, WalletError};
use crate::validation::validate_user_id;
use serde::Deserialize;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use tracing::info;

#[derive(Debug, Deserialize)]
struct SeedRow {
    user: String,
    balance: String,
}

/// Load seed rows from a CSV file
pub fn read_seed_file(path: &Path) -> Result<Vec<BalanceRecord>, WalletError> {
    let file = std::fs::File::open(path).map_err(|e| {
        WalletError::seed(
            None,
            format!("failed to open '{}': {}", path.display(), e),
        )
    })?;

    let records = read_seeds(file)?;
    info!(path = %path.display(), users = records.len(), "seed loaded");

    Ok(records)
}

/// Parse seed rows from any reader
///
/// Every row must carry a positive user id and a non-negative amount with at most
/// two decimal places. A user may only appear once.
pub fn read_seeds<R: Read>(reader: R) -> Result<Vec<BalanceRecord>, WalletError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    let mut seen = HashSet::new();

    for row in csv_reader.deserialize::<SeedRow>() {
        let row = row.map_err(|e| {
            let line = e.position().map(|p| p.line());
            WalletError::seed(line, e.to_string())
        })?;
        // Header is line 1
        let line = Some(records.len() as u64 + 2);

        let user_id = validate_user_id(&row.user).map_err(|e| WalletError::seed(line, e.to_string()))?;
        let balance = Amount::parse(&row.balance).map_err(|e| WalletError::seed(line, e.to_string()))?;

        if !seen.insert(user_id) {
            return Err(WalletError::seed(
                line,
                format!("user {} appears more than once", user_id),
            ));
        }

        records.push(BalanceRecord::new(user_id, balance));
    }

    Ok(records)
}
