//! Boundary validation
//!
//! Checks raw request fields before anything reaches the processor. A failure here
//! short-circuits the request with a validation error and no storage access.

use crate::types::amount::matches_amount_format;
use crate::types::{SourceType, TransactionState, UserId, WalletError};

/// Parse a user id that must be a positive 64-bit integer
pub fn validate_user_id(value: &str) -> Result<UserId, WalletError> {
    match value.parse::<UserId>() {
        Ok(user_id) if user_id > 0 => Ok(user_id),
        _ => Err(WalletError::invalid_user_id(value)),
    }
}

pub fn validate_source_type(value: &str) -> Result<SourceType, WalletError> {
    value.parse()
}

pub fn validate_state(value: &str) -> Result<TransactionState, WalletError> {
    value.parse()
}

/// Check the amount against `^\d+(\.\d{1,2})?$` without converting it
pub fn validate_amount(value: &str) -> Result<(), WalletError> {
    if matches_amount_format(value) {
        Ok(())
    } else {
        Err(WalletError::invalid_amount(
            value,
            "must be a string with up to 2 decimal places",
        ))
    }
}

pub fn validate_transaction_id(value: &str) -> Result<(), WalletError> {
    if value.is_empty() {
        Err(WalletError::MissingTransactionId)
    } else {
        Ok(())
    }
}
