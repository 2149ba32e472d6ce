// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # BEP-20 Token Ledger
//!
//! A fungible-token ledger in the BEP-20 / ERC-20 mould: one token, one
//! owner, balances, spending allowances and a total-supply counter, changed
//! only through guarded operations that either fully apply or fully revert.
//!
//! - **ledger** - [`Bep20Token`], the state machine itself.
//! - **call** - serializable [`Call`]s and a dispatcher for replaying them.
//! - **event** - [`Event`]s and per-call [`Receipt`]s.
//! - **snapshot** - deterministic JSON image of a ledger.
//! - **units** - 256-bit [`Amount`]s and human-unit conversion.
//! - **address** - 20-byte account identifiers.
//! - **config** - constants, revert reasons, [`TokenConfig`].
//!
//! ## Design Principles
//!
//! 1. All monetary operations are checked: `checked_add` and `checked_sub`
//!    everywhere, over the full 256-bit domain.
//! 2. New values are computed before any are written, so a revert never
//!    leaves a half-applied call behind.
//! 3. Authorization is a local comparison against the owner field; there is
//!    no ambient sender.
//! 4. Every public type is serializable (serde).

pub mod address;
pub mod call;
pub mod config;
pub mod error;
pub mod event;
pub mod ledger;
pub mod snapshot;
pub mod units;

pub use address::{Address, AddressError};
pub use call::{Call, Outcome, ReturnValue};
pub use config::TokenConfig;
pub use error::{TokenError, TokenResult};
pub use event::{Event, Receipt};
pub use ledger::Bep20Token;
pub use snapshot::LedgerSnapshot;
pub use units::{format_units, parse_units, Amount, UnitsError};
