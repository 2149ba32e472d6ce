//! # Call Dispatch
//!
//! [`Call`] names one ledger operation with its arguments, so a driver can
//! read a sequence of calls from JSON and replay it against a ledger with
//! [`Bep20Token::execute`]. Reads return a [`ReturnValue`]; writes return the
//! call's [`Receipt`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::address::Address;
use crate::error::TokenResult;
use crate::event::Receipt;
use crate::ledger::Bep20Token;
use crate::units::{serde_amount, Amount};

/// A single ledger operation and its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Call {
    Name,
    Symbol,
    Decimals,
    TotalSupply,
    BalanceOf {
        account: Address,
    },
    Allowance {
        owner: Address,
        spender: Address,
    },
    Owner,
    Transfer {
        to: Address,
        #[serde(with = "serde_amount")]
        amount: Amount,
    },
    Approve {
        spender: Address,
        #[serde(with = "serde_amount")]
        amount: Amount,
    },
    IncreaseAllowance {
        spender: Address,
        #[serde(with = "serde_amount")]
        amount: Amount,
    },
    DecreaseAllowance {
        spender: Address,
        #[serde(with = "serde_amount")]
        amount: Amount,
    },
    TransferFrom {
        from: Address,
        to: Address,
        #[serde(with = "serde_amount")]
        amount: Amount,
    },
    Mint {
        to: Address,
        #[serde(with = "serde_amount")]
        amount: Amount,
    },
    Burn {
        #[serde(with = "serde_amount")]
        amount: Amount,
    },
    TransferOwnership {
        new_owner: Address,
    },
}

impl Call {
    /// The method name, in the same casing the JSON form uses.
    pub fn method(&self) -> &'static str {
        match self {
            Call::Name => "name",
            Call::Symbol => "symbol",
            Call::Decimals => "decimals",
            Call::TotalSupply => "total_supply",
            Call::BalanceOf { .. } => "balance_of",
            Call::Allowance { .. } => "allowance",
            Call::Owner => "owner",
            Call::Transfer { .. } => "transfer",
            Call::Approve { .. } => "approve",
            Call::IncreaseAllowance { .. } => "increase_allowance",
            Call::DecreaseAllowance { .. } => "decrease_allowance",
            Call::TransferFrom { .. } => "transfer_from",
            Call::Mint { .. } => "mint",
            Call::Burn { .. } => "burn",
            Call::TransferOwnership { .. } => "transfer_ownership",
        }
    }

    /// Returns `true` for calls that never change state.
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            Call::Name
                | Call::Symbol
                | Call::Decimals
                | Call::TotalSupply
                | Call::BalanceOf { .. }
                | Call::Allowance { .. }
                | Call::Owner
        )
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method())
    }
}

/// The value returned by a read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReturnValue {
    Text {
        value: String,
    },
    Decimals {
        value: u8,
    },
    Amount {
        #[serde(with = "serde_amount")]
        value: Amount,
    },
    Address {
        value: Address,
    },
}

impl ReturnValue {
    pub fn text(value: impl Into<String>) -> Self {
        ReturnValue::Text { value: value.into() }
    }

    pub fn amount(value: Amount) -> Self {
        ReturnValue::Amount { value }
    }
}

impl fmt::Display for ReturnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnValue::Text { value } => f.write_str(value),
            ReturnValue::Decimals { value } => write!(f, "{value}"),
            ReturnValue::Amount { value } => write!(f, "{value}"),
            ReturnValue::Address { value } => write!(f, "{value}"),
        }
    }
}

/// The successful result of [`Bep20Token::execute`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// A read completed.
    Returned { value: ReturnValue },
    /// A write completed.
    Executed { receipt: Receipt },
}

impl Outcome {
    /// The receipt, if this was a write.
    pub fn receipt(&self) -> Option<&Receipt> {
        match self {
            Outcome::Executed { receipt } => Some(receipt),
            Outcome::Returned { .. } => None,
        }
    }

    /// The returned value, if this was a read.
    pub fn value(&self) -> Option<&ReturnValue> {
        match self {
            Outcome::Returned { value } => Some(value),
            Outcome::Executed { .. } => None,
        }
    }
}

impl Bep20Token {
    /// Runs `call` on behalf of `caller`.
    ///
    /// Reads ignore `caller`.
    ///
    /// # Errors
    ///
    /// Whatever the underlying operation reports.
    pub fn execute(&mut self, caller: Address, call: &Call) -> TokenResult<Outcome> {
        let returned = |value: ReturnValue| -> TokenResult<Outcome> { Ok(Outcome::Returned { value }) };
        let receipt = match *call {
            Call::Name => return returned(ReturnValue::text(self.name())),
            Call::Symbol => return returned(ReturnValue::text(self.symbol())),
            Call::Decimals => return returned(ReturnValue::Decimals { value: self.decimals() }),
            Call::TotalSupply => return returned(ReturnValue::amount(self.total_supply())),
            Call::BalanceOf { account } => {
                return returned(ReturnValue::amount(self.balance_of(&account)))
            }
            Call::Allowance { owner, spender } => {
                return returned(ReturnValue::amount(self.allowance(&owner, &spender)))
            }
            Call::Owner => return returned(ReturnValue::Address { value: self.owner() }),
            Call::Transfer { to, amount } => self.transfer(caller, to, amount)?,
            Call::Approve { spender, amount } => self.approve(caller, spender, amount)?,
            Call::IncreaseAllowance { spender, amount } => {
                self.increase_allowance(caller, spender, amount)?
            }
            Call::DecreaseAllowance { spender, amount } => {
                self.decrease_allowance(caller, spender, amount)?
            }
            Call::TransferFrom { from, to, amount } => {
                self.transfer_from(caller, from, to, amount)?
            }
            Call::Mint { to, amount } => self.mint(caller, to, amount)?,
            Call::Burn { amount } => self.burn(caller, amount)?,
            Call::TransferOwnership { new_owner } => self.transfer_ownership(caller, new_owner)?,
        };
        Ok(Outcome::Executed { receipt })
    }
}
