//! Fixed-point money type for the Wallet Engine
//!
//! Balances and transaction amounts are held as whole minor units (cents), so the
//! non-negativity and conservation checks are exact integer comparisons. Decimal
//! strings are only converted (via `rust_decimal`) when crossing the boundary.

use super::error::WalletError;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

/// Monetary value with two fractional digits, stored as a count of cents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(i64);

impl Amount {
    /// Number of fractional digits carried by every amount
    pub const SCALE: u32 = 2;

    pub const ZERO: Amount = Amount(0);

    pub const fn from_cents(cents: i64) -> Self {
        Amount(cents)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    pub fn checked_sub(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_sub(rhs.0).map(Amount)
    }

    /// Convert to a `Decimal` with exactly two fractional digits
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, Self::SCALE)
    }

    /// Convert a `Decimal` with at most two fractional digits
    ///
    /// Returns `None` when the value carries more precision than a cent or does
    /// not fit in the integer representation.
    pub fn try_from_decimal(value: Decimal) -> Option<Amount> {
        let value = value.normalize();
        if value.scale() > Self::SCALE {
            return None;
        }
        let factor = 10i128.pow(Self::SCALE - value.scale());
        let cents = value.mantissa().checked_mul(factor)?;
        i64::try_from(cents).ok().map(Amount)
    }

    /// Parse a non-negative decimal string of the form `digits[.d[d]]`
    ///
    /// This is the defensive re-parse the processor runs on every request amount,
    /// so it re-checks the boundary format before handing the string to
    /// `rust_decimal`.
    pub fn parse(input: &str) -> Result<Amount, WalletError> {
        if !matches_amount_format(input) {
            return Err(WalletError::invalid_amount(
                input,
                "must be a string with up to 2 decimal places",
            ));
        }

        let decimal = Decimal::from_str(input)
            .map_err(|_| WalletError::invalid_amount(input, "cannot parse as number"))?;

        if decimal.is_sign_negative() && !decimal.is_zero() {
            return Err(WalletError::invalid_amount(input, "cannot be negative"));
        }

        Self::try_from_decimal(decimal)
            .ok_or_else(|| WalletError::invalid_amount(input, "out of range"))
    }
}

/// Check `input` against `^\d+(\.\d{1,2})?$`
pub(crate) fn matches_amount_format(input: &str) -> bool {
    let (whole, fraction) = match input.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (input, None),
    };

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());

    if whole.is_empty() || !all_digits(whole) {
        return false;
    }

    match fraction {
        None => true,
        Some(fraction) => (1..=2).contains(&fraction.len()) && all_digits(fraction),
    }
}

impl FromStr for Amount {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Amount::parse(s)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.to_decimal())
    }
}
