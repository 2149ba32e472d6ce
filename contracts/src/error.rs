//! # Ledger Errors
//!
//! Every precondition the ledger enforces has its own variant, and every
//! variant maps to a stable revert reason via [`TokenError::reason`] so a
//! caller can assert on the exact string a reverted call produced. A failed
//! call never mutates state and never emits events.

use thiserror::Error;

use crate::address::Address;
use crate::config::{
    REASON_ALLOWANCE_UNDERFLOW, REASON_ARITHMETIC_OVERFLOW, REASON_CONSERVATION_VIOLATED,
    REASON_INSUFFICIENT_ALLOWANCE, REASON_INSUFFICIENT_BALANCE, REASON_NOT_OWNER,
};
use crate::units::Amount;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The debited account holds less than the requested amount.
    #[error("insufficient balance: account has {balance}, needs {needed}")]
    InsufficientBalance {
        /// Current balance of the debited account.
        balance: Amount,
        /// Amount the call tried to move.
        needed: Amount,
    },

    /// The spender's allowance does not cover a delegated transfer.
    #[error("insufficient allowance: spender may move {allowance}, needs {needed}")]
    InsufficientAllowance {
        /// Remaining allowance.
        allowance: Amount,
        /// Amount the spender tried to move.
        needed: Amount,
    },

    /// `decrease_allowance` would take the allowance below zero.
    #[error("allowance underflow: current {allowance}, tried to subtract {subtracted}")]
    AllowanceUnderflow {
        /// Current allowance.
        allowance: Amount,
        /// Amount the caller tried to subtract.
        subtracted: Amount,
    },

    /// An addition exceeded the 256-bit domain.
    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    /// An owner-only operation was called by someone else.
    #[error("caller {caller} is not the owner")]
    NotOwner {
        /// The rejected caller.
        caller: Address,
    },

    /// The sum of balances no longer equals total supply.
    #[error("supply conservation violated: balances sum to {balances}, total supply is {total_supply}")]
    ConservationViolated {
        /// Sum of every account balance in decimal, or `"overflow"`.
        balances: String,
        /// Recorded total supply.
        total_supply: Amount,
    },
}

impl TokenError {
    /// The machine-checkable revert reason for this error.
    pub fn reason(&self) -> &'static str {
        match self {
            TokenError::InsufficientBalance { .. } => REASON_INSUFFICIENT_BALANCE,
            TokenError::InsufficientAllowance { .. } => REASON_INSUFFICIENT_ALLOWANCE,
            TokenError::AllowanceUnderflow { .. } => REASON_ALLOWANCE_UNDERFLOW,
            TokenError::ArithmeticOverflow => REASON_ARITHMETIC_OVERFLOW,
            TokenError::NotOwner { .. } => REASON_NOT_OWNER,
            TokenError::ConservationViolated { .. } => REASON_CONSERVATION_VIOLATED,
        }
    }
}

/// Result type for ledger operations.
pub type TokenResult<T> = Result<T, TokenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_balance_reason_is_stable() {
        let err = TokenError::InsufficientBalance {
            balance: Amount::zero(),
            needed: Amount::one(),
        };
        assert_eq!(err.reason(), "不十分なバランス");
        assert_eq!(err.to_string(), "insufficient balance: account has 0, needs 1");
    }

    #[test]
    fn every_variant_has_a_distinct_reason() {
        let errors = [
            TokenError::InsufficientBalance {
                balance: Amount::zero(),
                needed: Amount::one(),
            },
            TokenError::InsufficientAllowance {
                allowance: Amount::zero(),
                needed: Amount::one(),
            },
            TokenError::AllowanceUnderflow {
                allowance: Amount::zero(),
                subtracted: Amount::one(),
            },
            TokenError::ArithmeticOverflow,
            TokenError::NotOwner {
                caller: Address::ZERO,
            },
            TokenError::ConservationViolated {
                balances: "1".into(),
                total_supply: Amount::zero(),
            },
        ];
        let mut reasons: Vec<_> = errors.iter().map(TokenError::reason).collect();
        reasons.sort_unstable();
        reasons.dedup();
        assert_eq!(reasons.len(), errors.len());
    }
}
