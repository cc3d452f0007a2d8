//! Per-operation request records
//!
//! One record per core operation, consumed by whatever transport layer sits
//! in front of the engine. The records carry exactly the fields each
//! operation validates; the engine resolves merchants by ID and cards by
//! number (for merchant-initiated operations) or by ID (for card-side
//! operations), mirroring how the operations are dispatched.

use super::card::{CardId, MerchantId};
use super::entry::EntryId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Create a new card with a unique card number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCardRequest {
    /// Display name of the card holder
    pub name: String,
    /// Card number; must be globally unique
    pub card_number: String,
}

/// Create a new merchant with a unique name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateMerchantRequest {
    /// Merchant name; must be unique
    pub name: String,
}

/// Credit funds to a card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopUpRequest {
    /// The card to credit
    pub card_id: CardId,
    /// Amount to credit; must be strictly positive
    pub amount: Decimal,
}

/// Place an authorization hold against a card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizeRequest {
    /// The merchant requesting the hold
    pub merchant_id: MerchantId,
    /// Card number to authorize against
    pub card_number: String,
    /// Amount to reserve; must be strictly positive
    pub amount: Decimal,
}

/// Settle some or all of an open hold into a final debit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRequest {
    /// The merchant that owns the hold
    pub merchant_id: MerchantId,
    /// The hold entry to capture against
    pub transaction_id: EntryId,
    /// Magnitude to settle; must be non-negative and at most the held amount
    pub amount: Decimal,
}

/// Release some or all of an open hold back to availability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReverseRequest {
    /// The merchant that owns the hold
    pub merchant_id: MerchantId,
    /// The hold entry to release
    pub transaction_id: EntryId,
    /// Magnitude to release; must be non-negative and at most the held amount
    pub amount: Decimal,
}

/// Return previously captured funds to a card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundRequest {
    /// The merchant returning the funds
    pub merchant_id: MerchantId,
    /// Card number to refund
    pub card_number: String,
    /// Amount to return; must be strictly positive and within the
    /// merchant's net captured total for this card
    pub amount: Decimal,
}
