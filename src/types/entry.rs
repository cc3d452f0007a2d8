//! Ledger entry types
//!
//! Every movement of funds on a card is recorded as a [`LedgerEntry`]. The
//! entry's [`EntryKind`] carries a non-negative magnitude and makes the
//! direction of the movement explicit, so callers never reason about sign
//! arithmetic directly.

use super::card::{CardId, MerchantId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Ledger entry identifier
pub type EntryId = u64;

/// The kind of movement an entry records
///
/// Each variant carries a non-negative magnitude. On the wire and in the
/// balance derivation this maps back onto the classic signed-amount
/// convention: credits are positive, holds and debits are negative, and only
/// holds count as reserved (not yet settled) funds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Funds credited to the card (top-up or refund)
    Credit(Decimal),

    /// An open authorization hold: funds reserved for a merchant but not
    /// yet settled or released
    Hold(Decimal),

    /// A finalized debit (a captured hold)
    Debit(Decimal),
}

impl EntryKind {
    /// The magnitude of the movement, always non-negative
    pub fn magnitude(&self) -> Decimal {
        match self {
            EntryKind::Credit(m) | EntryKind::Hold(m) | EntryKind::Debit(m) => *m,
        }
    }

    /// The signed amount under the classic convention: credits positive,
    /// holds and debits negative
    pub fn signed_amount(&self) -> Decimal {
        match self {
            EntryKind::Credit(m) => *m,
            EntryKind::Hold(m) | EntryKind::Debit(m) => -*m,
        }
    }

    /// Whether this entry is an open hold (reserved, not finalized)
    pub fn is_held(&self) -> bool {
        matches!(self, EntryKind::Hold(_))
    }
}

/// A single ledger entry ("transaction") on a card
///
/// Entries are created by top-up, authorization, capture splits, and
/// refunds. They are deleted only by a full reversal or by the cascading
/// hold release that precedes merchant deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// The entry ID
    pub id: EntryId,

    /// The card this entry belongs to
    pub card: CardId,

    /// The merchant that created this entry
    ///
    /// `None` only for top-ups; every other entry references exactly one
    /// merchant.
    pub merchant: Option<MerchantId>,

    /// Kind and magnitude of the movement
    pub kind: EntryKind,

    /// Creation timestamp
    ///
    /// A debit split off a partially captured hold carries the original
    /// hold's timestamp, not the settlement time, so the ledger orders it
    /// by authorization time.
    pub created_at: DateTime<Utc>,
}

/// Entry data handed to the store for creation
///
/// The store assigns the [`EntryId`] and returns the persisted entry.
#[derive(Debug, Clone)]
pub struct NewEntry {
    /// The card the entry belongs to
    pub card: CardId,

    /// The merchant reference (`None` for top-ups)
    pub merchant: Option<MerchantId>,

    /// Kind and magnitude of the movement
    pub kind: EntryKind,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}
