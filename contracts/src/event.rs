//! # Events & Receipts
//!
//! Every successful mutating call returns a [`Receipt`] listing the events it
//! emitted, in emission order. The ledger also appends the same events to its
//! own append-only log, so a caller can assert either on a single call or on
//! the whole history.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::address::Address;
use crate::units::{serde_amount, Amount};

/// A structured notification emitted by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum Event {
    /// Value moved between accounts. Mints come from, and burns go to,
    /// [`Address::ZERO`].
    Transfer {
        from: Address,
        to: Address,
        #[serde(with = "serde_amount")]
        value: Amount,
    },
    /// An allowance was set or adjusted; `value` is the new total.
    Approval {
        owner: Address,
        spender: Address,
        #[serde(with = "serde_amount")]
        value: Amount,
    },
    /// New supply was created.
    Mint {
        to: Address,
        #[serde(with = "serde_amount")]
        amount: Amount,
    },
    /// Supply was destroyed.
    Burn {
        from: Address,
        #[serde(with = "serde_amount")]
        amount: Amount,
    },
    /// The mint privilege changed hands.
    OwnershipTransferred {
        previous_owner: Address,
        new_owner: Address,
    },
}

impl Event {
    /// The event's name, as a log consumer would filter on it.
    pub fn name(&self) -> &'static str {
        match self {
            Event::Transfer { .. } => "Transfer",
            Event::Approval { .. } => "Approval",
            Event::Mint { .. } => "Mint",
            Event::Burn { .. } => "Burn",
            Event::OwnershipTransferred { .. } => "OwnershipTransferred",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Transfer { from, to, value } => write!(f, "Transfer({from}, {to}, {value})"),
            Event::Approval {
                owner,
                spender,
                value,
            } => write!(f, "Approval({owner}, {spender}, {value})"),
            Event::Mint { to, amount } => write!(f, "Mint({to}, {amount})"),
            Event::Burn { from, amount } => write!(f, "Burn({from}, {amount})"),
            Event::OwnershipTransferred {
                previous_owner,
                new_owner,
            } => write!(f, "OwnershipTransferred({previous_owner}, {new_owner})"),
        }
    }
}

/// The outcome of a successful mutating call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Events in emission order.
    pub events: Vec<Event>,
}

impl Receipt {
    pub(crate) fn new(events: Vec<Event>) -> Self {
        Self { events }
    }

    /// Returns `true` if the call emitted exactly this event.
    pub fn emitted(&self, event: &Event) -> bool {
        self.events.contains(event)
    }

    /// Events with the given name, in emission order.
    pub fn events_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Event> + 'a {
        self.events.iter().filter(move |e| e.name() == name)
    }
}
