//! Card and merchant records
//!
//! Cards hold funds (by owning ledger entries); merchants place holds
//! against cards and are referenced by the entries they create.

use serde::{Deserialize, Serialize};

/// Card identifier
pub type CardId = u64;

/// Merchant identifier
pub type MerchantId = u64;

/// A funding card
///
/// The card number is globally unique and is the key merchants use to
/// reference a card in authorization and refund requests. Balances are not
/// stored on the card; they are derived from its ledger entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// The card ID
    pub id: CardId,

    /// Display name of the card holder
    pub name: String,

    /// Globally unique card number
    pub card_number: String,
}

/// A merchant that can place and settle holds against cards
///
/// Merchants own no entries structurally; entries merely reference them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Merchant {
    /// The merchant ID
    pub id: MerchantId,

    /// Unique display name
    pub name: String,
}
