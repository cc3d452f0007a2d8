//! Balance derivation
//!
//! A card's balance is never stored; it is derived from the card's full
//! entry set on every read. The derivation is pure and has no failure mode:
//! an entry set is always well-formed once loaded. Callers must hand it a
//! consistent snapshot, which the engine guarantees by taking the card's
//! critical section around the read and any dependent write.

use crate::types::{EntryKind, LedgerEntry};
use rust_decimal::Decimal;
use serde::Serialize;

/// Derived balance of a card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Balance {
    /// Sum of all finalized (non-held) entries; the spendable ledger balance
    pub total: Decimal,

    /// Sum of magnitudes of open holds; currently reserved funds
    pub blocked: Decimal,

    /// `total - blocked`; the only amount a new authorization may draw
    /// against. Never negative for any state the engine can reach.
    pub available: Decimal,
}

impl Balance {
    /// Derive the balance from a consistent snapshot of a card's entries
    pub fn derive(entries: &[LedgerEntry]) -> Self {
        let mut total = Decimal::ZERO;
        let mut blocked = Decimal::ZERO;

        for entry in entries {
            match entry.kind {
                EntryKind::Hold(magnitude) => blocked += magnitude,
                _ => total += entry.kind.signed_amount(),
            }
        }

        Balance {
            total,
            blocked,
            available: total - blocked,
        }
    }
}
