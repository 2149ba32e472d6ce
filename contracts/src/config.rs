//! # Ledger Configuration & Constants
//!
//! Every magic value the ledger depends on lives here: address width,
//! default token parameters, and the revert reasons callers assert on.
//! Deployment parameters travel as a [`TokenConfig`].

use serde::{Deserialize, Serialize};

use crate::units::{self, Amount};

// ---------------------------------------------------------------------------
// Addressing
// ---------------------------------------------------------------------------

/// Width of an account address in bytes.
pub const ADDRESS_LENGTH: usize = 20;

// ---------------------------------------------------------------------------
// Token Defaults
// ---------------------------------------------------------------------------

/// Default token name used when no config is supplied.
pub const DEFAULT_NAME: &str = "MyToken";

/// Default ticker symbol.
pub const DEFAULT_SYMBOL: &str = "MTK";

/// Decimal places of the smallest unit. 18 matches BEP-20 and ERC-20 tooling.
pub const DEFAULT_DECIMALS: u8 = 18;

/// Default initial supply in whole tokens, scaled by `DEFAULT_DECIMALS` at
/// deployment.
pub const DEFAULT_INITIAL_SUPPLY_TOKENS: u64 = 1_000;

// ---------------------------------------------------------------------------
// Revert Reasons
// ---------------------------------------------------------------------------

/// Reason reported when an account's balance cannot cover a debit.
pub const REASON_INSUFFICIENT_BALANCE: &str = "不十分なバランス";

/// Reason reported when a delegated transfer exceeds the spender's allowance.
pub const REASON_INSUFFICIENT_ALLOWANCE: &str = "BEP20: insufficient allowance";

/// Reason reported when `decrease_allowance` would go below zero.
pub const REASON_ALLOWANCE_UNDERFLOW: &str = "BEP20: decreased allowance below zero";

/// Reason reported when an addition would exceed the 256-bit domain.
pub const REASON_ARITHMETIC_OVERFLOW: &str = "BEP20: arithmetic overflow";

/// Reason reported when a non-owner calls an owner-only operation.
pub const REASON_NOT_OWNER: &str = "Ownable: caller is not the owner";

/// Reason reported by the supply audit.
pub const REASON_CONSERVATION_VIOLATED: &str = "BEP20: supply conservation violated";

// ---------------------------------------------------------------------------
// TokenConfig
// ---------------------------------------------------------------------------

/// Deployment parameters for a [`Bep20Token`](crate::ledger::Bep20Token).
///
/// `initial_supply` is in smallest units; use
/// [`TokenConfig::with_whole_supply`] to scale a whole-token count by the
/// configured decimals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Human-readable token name.
    pub name: String,
    /// Ticker symbol.
    pub symbol: String,
    /// Display decimal places. Arithmetic never divides by this.
    pub decimals: u8,
    /// Supply credited to the deployer, in smallest units.
    #[serde(with = "units::serde_amount")]
    pub initial_supply: Amount,
}

impl TokenConfig {
    /// Builds a config with an explicit smallest-unit initial supply.
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        decimals: u8,
        initial_supply: Amount,
    ) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals,
            initial_supply,
        }
    }

    /// Builds a config whose initial supply is `whole_tokens * 10^decimals`.
    ///
    /// # Errors
    ///
    /// Returns [`units::UnitsError::Overflow`] if the scaled supply does not
    /// fit in 256 bits.
    pub fn with_whole_supply(
        name: impl Into<String>,
        symbol: impl Into<String>,
        decimals: u8,
        whole_tokens: u64,
    ) -> Result<Self, units::UnitsError> {
        let supply = units::scale(Amount::from(whole_tokens), decimals)?;
        Ok(Self::new(name, symbol, decimals, supply))
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        // 1000 * 10^18 is far below 2^256.
        let initial_supply = Amount::from(DEFAULT_INITIAL_SUPPLY_TOKENS)
            * Amount::exp10(DEFAULT_DECIMALS as usize);
        Self::new(DEFAULT_NAME, DEFAULT_SYMBOL, DEFAULT_DECIMALS, initial_supply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_reference_deployment() {
        let config = TokenConfig::default();
        assert_eq!(config.name, "MyToken");
        assert_eq!(config.symbol, "MTK");
        assert_eq!(config.decimals, 18);
        assert_eq!(
            config.initial_supply,
            Amount::from_dec_str("1000000000000000000000").unwrap()
        );
    }

    #[test]
    fn whole_supply_scales_by_decimals() {
        let config = TokenConfig::with_whole_supply("T", "TOK", 6, 250).unwrap();
        assert_eq!(config.initial_supply, Amount::from(250_000_000u64));
    }

    #[test]
    fn whole_supply_overflow_rejected() {
        let result = TokenConfig::with_whole_supply("T", "TOK", 255, u64::MAX);
        assert!(result.is_err());
    }

    #[test]
    fn config_json_uses_decimal_supply() {
        let config = TokenConfig::new("T", "TOK", 0, Amount::from(42u64));
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["initial_supply"], "42");
        let back: TokenConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }
}
