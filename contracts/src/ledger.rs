//! # BEP-20 Token Ledger
//!
//! A single fungible token: balances, two-party allowances, total supply and
//! one owner holding the mint privilege. State changes only through the
//! guarded operations on [`Bep20Token`].
//!
//! ## Guarantees
//!
//! - **Conservation**: the sum of all balances equals `total_supply` in every
//!   reachable state. Only `mint` and `burn` touch supply.
//! - **Atomicity**: each operation computes every new value before writing
//!   any of them. A failing call leaves state untouched and emits nothing.
//! - **No wraparound**: every addition and subtraction is checked over the
//!   full 256-bit domain.
//!
//! Allowances always decrement on `transfer_from`; there is no "unlimited"
//! sentinel value. The zero address is an ordinary target for `mint` and
//! `transfer_ownership`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::address::Address;
use crate::config::TokenConfig;
use crate::error::{TokenError, TokenResult};
use crate::event::{Event, Receipt};
use crate::snapshot::LedgerSnapshot;
use crate::units::Amount;

/// Logs a reverted call and hands the error back.
fn reverted(op: &'static str, err: TokenError) -> TokenError {
    debug!(op, reason = err.reason(), error = %err, "call reverted");
    err
}

/// The token ledger.
///
/// Every mutating method takes the calling account explicitly; the ledger
/// has no notion of an ambient sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "LedgerSnapshot", try_from = "LedgerSnapshot")]
pub struct Bep20Token {
    pub(crate) name: String,
    pub(crate) symbol: String,
    pub(crate) decimals: u8,
    pub(crate) total_supply: Amount,
    pub(crate) owner: Address,
    /// Zero balances are not stored.
    pub(crate) balances: HashMap<Address, Amount>,
    /// Keyed by `(owner, spender)`. Zero allowances are not stored.
    pub(crate) allowances: HashMap<(Address, Address), Amount>,
    /// Append-only event log across all successful calls.
    pub(crate) log: Vec<Event>,
}

impl Bep20Token {
    /// Deploys a new token.
    ///
    /// The deployer receives the entire initial supply and becomes owner.
    /// The log starts with `OwnershipTransferred(ZERO, deployer)` and
    /// `Transfer(ZERO, deployer, initial_supply)`.
    pub fn deploy(deployer: Address, config: TokenConfig) -> Self {
        let TokenConfig {
            name,
            symbol,
            decimals,
            initial_supply,
        } = config;

        let mut balances = HashMap::new();
        if !initial_supply.is_zero() {
            balances.insert(deployer, initial_supply);
        }

        info!(
            %deployer,
            name = %name,
            symbol = %symbol,
            decimals,
            initial_supply = %initial_supply,
            "token deployed"
        );

        Self {
            name,
            symbol,
            decimals,
            total_supply: initial_supply,
            owner: deployer,
            balances,
            allowances: HashMap::new(),
            log: vec![
                Event::OwnershipTransferred {
                    previous_owner: Address::ZERO,
                    new_owner: deployer,
                },
                Event::Transfer {
                    from: Address::ZERO,
                    to: deployer,
                    value: initial_supply,
                },
            ],
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Balance of `account`, zero if it never held tokens.
    pub fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or_default()
    }

    /// Remaining amount `spender` may move out of `owner`'s balance.
    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or_default()
    }

    /// The account holding the mint privilege.
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// BEP-20 name for [`owner`](Self::owner).
    pub fn get_owner(&self) -> Address {
        self.owner
    }

    /// Every event emitted since deployment, oldest first.
    pub fn logs(&self) -> &[Event] {
        &self.log
    }

    /// Logged events with the given name, oldest first.
    pub fn events_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Event> + 'a {
        self.log.iter().filter(move |e| e.name() == name)
    }

    /// Accounts with a non-zero balance.
    pub fn holders(&self) -> impl Iterator<Item = (&Address, &Amount)> {
        self.balances.iter()
    }

    // -----------------------------------------------------------------------
    // Transfers
    // -----------------------------------------------------------------------

    /// Moves `amount` from `caller` to `to`.
    ///
    /// Zero-amount transfers succeed and still emit `Transfer`. A transfer to
    /// self leaves the balance unchanged.
    ///
    /// # Errors
    ///
    /// [`TokenError::InsufficientBalance`] if `caller` holds less than `amount`.
    pub fn transfer(
        &mut self,
        caller: Address,
        to: Address,
        amount: Amount,
    ) -> TokenResult<Receipt> {
        let updates = self
            .plan_move(caller, to, amount)
            .map_err(|e| reverted("transfer", e))?;

        self.apply_balances(updates);
        debug!(from = %caller, %to, %amount, "transfer applied");

        Ok(self.emit(vec![Event::Transfer {
            from: caller,
            to,
            value: amount,
        }]))
    }

    /// Moves `amount` from `from` to `to` on `caller`'s allowance.
    ///
    /// The allowance is checked before the balance, and is always decremented
    /// by `amount`.
    ///
    /// # Errors
    ///
    /// [`TokenError::InsufficientAllowance`] if `allowance(from, caller)` is
    /// below `amount`, then [`TokenError::InsufficientBalance`] if `from`
    /// holds less than `amount`.
    pub fn transfer_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> TokenResult<Receipt> {
        let allowance = self.allowance(&from, &caller);
        let remaining = allowance.checked_sub(amount).ok_or_else(|| {
            reverted(
                "transfer_from",
                TokenError::InsufficientAllowance {
                    allowance,
                    needed: amount,
                },
            )
        })?;
        let updates = self
            .plan_move(from, to, amount)
            .map_err(|e| reverted("transfer_from", e))?;

        self.set_allowance(from, caller, remaining);
        self.apply_balances(updates);
        debug!(spender = %caller, %from, %to, %amount, %remaining, "delegated transfer applied");

        Ok(self.emit(vec![Event::Transfer {
            from,
            to,
            value: amount,
        }]))
    }

    // -----------------------------------------------------------------------
    // Allowances
    // -----------------------------------------------------------------------

    /// Sets `allowance(caller, spender)` to exactly `amount`.
    pub fn approve(
        &mut self,
        caller: Address,
        spender: Address,
        amount: Amount,
    ) -> TokenResult<Receipt> {
        self.set_allowance(caller, spender, amount);
        debug!(owner = %caller, %spender, %amount, "allowance set");

        Ok(self.emit(vec![Event::Approval {
            owner: caller,
            spender,
            value: amount,
        }]))
    }

    /// Raises `allowance(caller, spender)` by `added`.
    ///
    /// # Errors
    ///
    /// [`TokenError::ArithmeticOverflow`] if the new allowance exceeds 256 bits.
    pub fn increase_allowance(
        &mut self,
        caller: Address,
        spender: Address,
        added: Amount,
    ) -> TokenResult<Receipt> {
        let updated = self
            .allowance(&caller, &spender)
            .checked_add(added)
            .ok_or_else(|| reverted("increase_allowance", TokenError::ArithmeticOverflow))?;

        self.set_allowance(caller, spender, updated);
        debug!(owner = %caller, %spender, %added, allowance = %updated, "allowance increased");

        Ok(self.emit(vec![Event::Approval {
            owner: caller,
            spender,
            value: updated,
        }]))
    }

    /// Lowers `allowance(caller, spender)` by `subtracted`.
    ///
    /// # Errors
    ///
    /// [`TokenError::AllowanceUnderflow`] if the current allowance is below
    /// `subtracted`.
    pub fn decrease_allowance(
        &mut self,
        caller: Address,
        spender: Address,
        subtracted: Amount,
    ) -> TokenResult<Receipt> {
        let allowance = self.allowance(&caller, &spender);
        let updated = allowance.checked_sub(subtracted).ok_or_else(|| {
            reverted(
                "decrease_allowance",
                TokenError::AllowanceUnderflow {
                    allowance,
                    subtracted,
                },
            )
        })?;

        self.set_allowance(caller, spender, updated);
        debug!(owner = %caller, %spender, %subtracted, allowance = %updated, "allowance decreased");

        Ok(self.emit(vec![Event::Approval {
            owner: caller,
            spender,
            value: updated,
        }]))
    }

    // -----------------------------------------------------------------------
    // Supply
    // -----------------------------------------------------------------------

    /// Creates `amount` new tokens credited to `to`. Owner only.
    ///
    /// Emits `Mint(to, amount)` then `Transfer(ZERO, to, amount)`.
    ///
    /// # Errors
    ///
    /// [`TokenError::NotOwner`] if `caller` is not the owner,
    /// [`TokenError::ArithmeticOverflow`] if supply or the recipient's balance
    /// would exceed 256 bits.
    pub fn mint(&mut self, caller: Address, to: Address, amount: Amount) -> TokenResult<Receipt> {
        self.ensure_owner(caller)
            .map_err(|e| reverted("mint", e))?;

        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| reverted("mint", TokenError::ArithmeticOverflow))?;
        let balance = self
            .balance_of(&to)
            .checked_add(amount)
            .ok_or_else(|| reverted("mint", TokenError::ArithmeticOverflow))?;

        self.total_supply = supply;
        self.apply_balances(vec![(to, balance)]);
        debug!(%to, %amount, total_supply = %supply, "minted");

        Ok(self.emit(vec![
            Event::Mint { to, amount },
            Event::Transfer {
                from: Address::ZERO,
                to,
                value: amount,
            },
        ]))
    }

    /// Destroys `amount` of `caller`'s own tokens.
    ///
    /// Emits `Burn(caller, amount)` then `Transfer(caller, ZERO, amount)`.
    ///
    /// # Errors
    ///
    /// [`TokenError::InsufficientBalance`] if `caller` holds less than `amount`.
    pub fn burn(&mut self, caller: Address, amount: Amount) -> TokenResult<Receipt> {
        let balance = self.balance_of(&caller);
        let remaining = balance.checked_sub(amount).ok_or_else(|| {
            reverted(
                "burn",
                TokenError::InsufficientBalance {
                    balance,
                    needed: amount,
                },
            )
        })?;
        // Supply covers every balance, so this only fails on a broken ledger.
        let supply = self
            .total_supply
            .checked_sub(amount)
            .ok_or_else(|| reverted("burn", self.conservation_error()))?;

        self.total_supply = supply;
        self.apply_balances(vec![(caller, remaining)]);
        debug!(from = %caller, %amount, total_supply = %supply, "burned");

        Ok(self.emit(vec![
            Event::Burn {
                from: caller,
                amount,
            },
            Event::Transfer {
                from: caller,
                to: Address::ZERO,
                value: amount,
            },
        ]))
    }

    // -----------------------------------------------------------------------
    // Ownership
    // -----------------------------------------------------------------------

    /// Hands the mint privilege to `new_owner`. Owner only.
    ///
    /// # Errors
    ///
    /// [`TokenError::NotOwner`] if `caller` is not the owner.
    pub fn transfer_ownership(
        &mut self,
        caller: Address,
        new_owner: Address,
    ) -> TokenResult<Receipt> {
        self.ensure_owner(caller)
            .map_err(|e| reverted("transfer_ownership", e))?;

        let previous_owner = std::mem::replace(&mut self.owner, new_owner);
        info!(%previous_owner, %new_owner, "ownership transferred");

        Ok(self.emit(vec![Event::OwnershipTransferred {
            previous_owner,
            new_owner,
        }]))
    }

    // -----------------------------------------------------------------------
    // Audit
    // -----------------------------------------------------------------------

    /// Verifies that the balances sum to total supply.
    ///
    /// # Errors
    ///
    /// [`TokenError::ConservationViolated`] if they differ or the sum
    /// overflows.
    pub fn check_supply_invariant(&self) -> TokenResult<()> {
        match self.sum_of_balances() {
            Some(sum) if sum == self.total_supply => Ok(()),
            _ => Err(self.conservation_error()),
        }
    }

    fn sum_of_balances(&self) -> Option<Amount> {
        self.balances
            .values()
            .try_fold(Amount::zero(), |acc, b| acc.checked_add(*b))
    }

    fn conservation_error(&self) -> TokenError {
        TokenError::ConservationViolated {
            balances: self
                .sum_of_balances()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "overflow".to_string()),
            total_supply: self.total_supply,
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn ensure_owner(&self, caller: Address) -> TokenResult<()> {
        if caller == self.owner {
            Ok(())
        } else {
            Err(TokenError::NotOwner { caller })
        }
    }

    /// Computes the post-transfer balances of `from` and `to` without
    /// writing them. A self-transfer yields no updates.
    fn plan_move(
        &self,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> TokenResult<Vec<(Address, Amount)>> {
        let from_balance = self.balance_of(&from);
        let debited = from_balance
            .checked_sub(amount)
            .ok_or(TokenError::InsufficientBalance {
                balance: from_balance,
                needed: amount,
            })?;

        if from == to {
            return Ok(Vec::new());
        }

        let credited = self
            .balance_of(&to)
            .checked_add(amount)
            .ok_or(TokenError::ArithmeticOverflow)?;

        Ok(vec![(from, debited), (to, credited)])
    }

    fn apply_balances(&mut self, updates: Vec<(Address, Amount)>) {
        for (account, balance) in updates {
            if balance.is_zero() {
                self.balances.remove(&account);
            } else {
                self.balances.insert(account, balance);
            }
        }
    }

    fn set_allowance(&mut self, owner: Address, spender: Address, value: Amount) {
        if value.is_zero() {
            self.allowances.remove(&(owner, spender));
        } else {
            self.allowances.insert((owner, spender), value);
        }
    }

    fn emit(&mut self, events: Vec<Event>) -> Receipt {
        self.log.extend(events.iter().cloned());
        Receipt::new(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> Address {
        Address::from_label("owner")
    }

    fn alice() -> Address {
        Address::from_label("alice")
    }

    fn bob() -> Address {
        Address::from_label("bob")
    }

    fn amt(n: u64) -> Amount {
        Amount::from(n)
    }

    fn token(supply: u64) -> Bep20Token {
        Bep20Token::deploy(owner(), TokenConfig::new("T", "TOK", 0, amt(supply)))
    }

    #[test]
    fn deploy_credits_deployer_and_logs_genesis_events() {
        let t = token(1_000);
        assert_eq!(t.balance_of(&owner()), amt(1_000));
        assert_eq!(t.total_supply(), amt(1_000));
        assert_eq!(t.owner(), owner());
        assert_eq!(t.get_owner(), owner());
        assert_eq!(t.logs().len(), 2);
        assert_eq!(t.events_named("Transfer").count(), 1);
        t.check_supply_invariant().unwrap();
    }

    #[test]
    fn zero_supply_deploy_stores_no_balance() {
        let t = token(0);
        assert_eq!(t.holders().count(), 0);
        assert_eq!(t.balance_of(&owner()), Amount::zero());
    }

    #[test]
    fn self_transfer_of_full_balance_is_a_no_op() {
        let mut t = token(1_000);
        let receipt = t.transfer(owner(), owner(), amt(1_000)).unwrap();
        assert_eq!(t.balance_of(&owner()), amt(1_000));
        assert_eq!(receipt.events.len(), 1);
        t.check_supply_invariant().unwrap();
    }

    #[test]
    fn self_transfer_beyond_balance_rejected() {
        let mut t = token(10);
        let err = t.transfer(owner(), owner(), amt(11)).unwrap_err();
        assert!(matches!(err, TokenError::InsufficientBalance { .. }));
    }

    #[test]
    fn draining_an_account_removes_its_entry() {
        let mut t = token(100);
        t.transfer(owner(), alice(), amt(100)).unwrap();
        assert_eq!(t.holders().count(), 1);
        assert_eq!(t.balance_of(&owner()), Amount::zero());
    }

    #[test]
    fn failed_call_emits_nothing() {
        let mut t = token(100);
        let before = t.logs().len();
        assert!(t.transfer(alice(), bob(), amt(1)).is_err());
        assert!(t.burn(alice(), amt(1)).is_err());
        assert!(t.mint(alice(), alice(), amt(1)).is_err());
        assert_eq!(t.logs().len(), before);
    }

    #[test]
    fn transfer_from_checks_allowance_before_balance() {
        let mut t = token(100);
        // alice has no balance and bob has no allowance: allowance wins.
        let err = t.transfer_from(bob(), alice(), owner(), amt(5)).unwrap_err();
        assert!(matches!(err, TokenError::InsufficientAllowance { .. }));

        t.approve(alice(), bob(), amt(5)).unwrap();
        let err = t.transfer_from(bob(), alice(), owner(), amt(5)).unwrap_err();
        assert!(matches!(err, TokenError::InsufficientBalance { .. }));
        // Allowance untouched by the failed call.
        assert_eq!(t.allowance(&alice(), &bob()), amt(5));
    }

    #[test]
    fn transfer_from_decrements_allowance() {
        let mut t = token(100);
        t.approve(owner(), alice(), amt(30)).unwrap();
        let receipt = t.transfer_from(alice(), owner(), bob(), amt(20)).unwrap();
        assert_eq!(t.allowance(&owner(), &alice()), amt(10));
        assert_eq!(t.balance_of(&bob()), amt(20));
        assert_eq!(t.balance_of(&owner()), amt(80));
        assert_eq!(
            receipt.events,
            vec![Event::Transfer {
                from: owner(),
                to: bob(),
                value: amt(20)
            }]
        );
    }

    #[test]
    fn max_allowance_is_still_decremented() {
        let mut t = token(100);
        t.approve(owner(), alice(), Amount::MAX).unwrap();
        t.transfer_from(alice(), owner(), bob(), amt(1)).unwrap();
        assert_eq!(t.allowance(&owner(), &alice()), Amount::MAX - amt(1));
    }

    #[test]
    fn increase_allowance_overflow_rejected() {
        let mut t = token(0);
        t.approve(owner(), alice(), Amount::MAX).unwrap();
        let err = t.increase_allowance(owner(), alice(), amt(1)).unwrap_err();
        assert_eq!(err, TokenError::ArithmeticOverflow);
        assert_eq!(t.allowance(&owner(), &alice()), Amount::MAX);
    }

    #[test]
    fn decrease_allowance_below_zero_rejected() {
        let mut t = token(0);
        t.approve(owner(), alice(), amt(3)).unwrap();
        let err = t.decrease_allowance(owner(), alice(), amt(4)).unwrap_err();
        assert_eq!(
            err,
            TokenError::AllowanceUnderflow {
                allowance: amt(3),
                subtracted: amt(4)
            }
        );
    }

    #[test]
    fn mint_overflow_rejected_without_mutation() {
        let mut t = Bep20Token::deploy(owner(), TokenConfig::new("T", "TOK", 0, Amount::MAX));
        let err = t.mint(owner(), alice(), amt(1)).unwrap_err();
        assert_eq!(err, TokenError::ArithmeticOverflow);
        assert_eq!(t.total_supply(), Amount::MAX);
        assert_eq!(t.balance_of(&alice()), Amount::zero());
    }

    #[test]
    fn mint_emits_mint_then_transfer() {
        let mut t = token(0);
        let receipt = t.mint(owner(), alice(), amt(7)).unwrap();
        assert_eq!(
            receipt.events,
            vec![
                Event::Mint {
                    to: alice(),
                    amount: amt(7)
                },
                Event::Transfer {
                    from: Address::ZERO,
                    to: alice(),
                    value: amt(7)
                },
            ]
        );
    }

    #[test]
    fn mint_to_zero_address_allowed() {
        let mut t = token(0);
        t.mint(owner(), Address::ZERO, amt(5)).unwrap();
        assert_eq!(t.balance_of(&Address::ZERO), amt(5));
        t.check_supply_invariant().unwrap();
    }

    #[test]
    fn burn_emits_burn_then_transfer_to_zero() {
        let mut t = token(10);
        let receipt = t.burn(owner(), amt(4)).unwrap();
        assert_eq!(receipt.events[0].name(), "Burn");
        assert_eq!(
            receipt.events[1],
            Event::Transfer {
                from: owner(),
                to: Address::ZERO,
                value: amt(4)
            }
        );
        assert_eq!(t.total_supply(), amt(6));
    }

    #[test]
    fn ownership_to_zero_address_allowed() {
        let mut t = token(0);
        t.transfer_ownership(owner(), Address::ZERO).unwrap();
        assert_eq!(t.owner(), Address::ZERO);
        assert!(t.mint(owner(), owner(), amt(1)).is_err());
    }

    #[test]
    fn non_owner_cannot_transfer_ownership() {
        let mut t = token(0);
        let err = t.transfer_ownership(alice(), alice()).unwrap_err();
        assert_eq!(err, TokenError::NotOwner { caller: alice() });
        assert_eq!(t.owner(), owner());
    }

    #[test]
    fn tampered_supply_detected() {
        let mut t = token(100);
        t.total_supply = amt(99);
        assert!(matches!(
            t.check_supply_invariant(),
            Err(TokenError::ConservationViolated { .. })
        ));
    }
}
