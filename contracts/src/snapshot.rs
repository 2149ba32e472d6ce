//! # Ledger Snapshots
//!
//! A serializable, deterministic image of a [`Bep20Token`]. Balances and
//! allowances are emitted as sorted lists rather than maps: JSON object keys
//! must be strings, and the allowance table is keyed by a pair.
//!
//! Restoring a snapshot re-checks supply conservation, so a hand-edited file
//! can't produce a ledger whose balances disagree with its supply.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::address::Address;
use crate::error::TokenError;
use crate::event::Event;
use crate::ledger::Bep20Token;
use crate::units::{serde_amount, Amount};

/// One account's balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceEntry {
    pub account: Address,
    #[serde(with = "serde_amount")]
    pub balance: Amount,
}

/// One `(owner, spender)` allowance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowanceEntry {
    pub owner: Address,
    pub spender: Address,
    #[serde(with = "serde_amount")]
    pub value: Amount,
}

/// Serialized form of a [`Bep20Token`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    #[serde(with = "serde_amount")]
    pub total_supply: Amount,
    pub owner: Address,
    pub balances: Vec<BalanceEntry>,
    pub allowances: Vec<AllowanceEntry>,
    #[serde(default)]
    pub logs: Vec<Event>,
}

impl From<Bep20Token> for LedgerSnapshot {
    fn from(token: Bep20Token) -> Self {
        let mut balances: Vec<BalanceEntry> = token
            .balances
            .into_iter()
            .map(|(account, balance)| BalanceEntry { account, balance })
            .collect();
        balances.sort_by_key(|e| e.account);

        let mut allowances: Vec<AllowanceEntry> = token
            .allowances
            .into_iter()
            .map(|((owner, spender), value)| AllowanceEntry {
                owner,
                spender,
                value,
            })
            .collect();
        allowances.sort_by_key(|e| (e.owner, e.spender));

        Self {
            name: token.name,
            symbol: token.symbol,
            decimals: token.decimals,
            total_supply: token.total_supply,
            owner: token.owner,
            balances,
            allowances,
            logs: token.log,
        }
    }
}

impl TryFrom<LedgerSnapshot> for Bep20Token {
    type Error = TokenError;

    fn try_from(snapshot: LedgerSnapshot) -> Result<Self, Self::Error> {
        // Later duplicates overwrite earlier ones; zero entries are dropped
        // to match the live ledger's storage rules.
        let balances: HashMap<Address, Amount> = snapshot
            .balances
            .into_iter()
            .filter(|e| !e.balance.is_zero())
            .map(|e| (e.account, e.balance))
            .collect();
        let allowances: HashMap<(Address, Address), Amount> = snapshot
            .allowances
            .into_iter()
            .filter(|e| !e.value.is_zero())
            .map(|e| ((e.owner, e.spender), e.value))
            .collect();

        let token = Bep20Token {
            name: snapshot.name,
            symbol: snapshot.symbol,
            decimals: snapshot.decimals,
            total_supply: snapshot.total_supply,
            owner: snapshot.owner,
            balances,
            allowances,
            log: snapshot.logs,
        };
        token.check_supply_invariant()?;
        Ok(token)
    }
}

impl Bep20Token {
    /// Captures the current state.
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.clone().into()
    }

    /// Rebuilds a ledger from a snapshot.
    ///
    /// # Errors
    ///
    /// [`TokenError::ConservationViolated`] if the snapshot's balances do not
    /// sum to its total supply.
    pub fn restore(snapshot: LedgerSnapshot) -> Result<Self, TokenError> {
        Self::try_from(snapshot)
    }
}
