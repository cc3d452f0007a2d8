//! Error types for the card ledger
//!
//! Every operation validates its request against current state before any
//! mutation, so a returned error always means the ledger is unchanged.
//! Errors carry enough context to diagnose the rejection without another
//! lookup.
//!
//! Note that [`LedgerError::TransactionNotFound`] deliberately covers three
//! cases a caller cannot distinguish: the entry does not exist, it exists
//! but belongs to a different merchant, or it exists but is no longer an
//! open hold. Collapsing them avoids leaking which merchant holds a given
//! transaction.

use super::card::{CardId, MerchantId};
use super::entry::EntryId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Main error type for ledger operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// An amount is out of range for the operation
    ///
    /// Top-up, authorize, and refund require strictly positive amounts;
    /// capture and reverse require non-negative amounts.
    #[error("Invalid amount {amount} for {operation}")]
    InvalidAmount {
        /// Operation that rejected the amount
        operation: String,
        /// The rejected amount
        amount: Decimal,
    },

    /// An authorization exceeds the card's available amount
    #[error("Insufficient funds on card {card}: available {available}, requested {requested}")]
    InsufficientFunds {
        /// Card ID
        card: CardId,
        /// Available amount at the time of the check
        available: Decimal,
        /// Requested hold amount
        requested: Decimal,
    },

    /// A capture requests more than the hold has reserved
    #[error("Capture of {requested} exceeds held amount {held} on transaction {transaction}")]
    CaptureExceedsHold {
        /// The hold entry ID
        transaction: EntryId,
        /// Currently held magnitude
        held: Decimal,
        /// Requested capture magnitude
        requested: Decimal,
    },

    /// A reversal requests more than the hold has reserved
    #[error("Reverse of {requested} exceeds held amount {held} on transaction {transaction}")]
    ReverseExceedsHold {
        /// The hold entry ID
        transaction: EntryId,
        /// Currently held magnitude
        held: Decimal,
        /// Requested release magnitude
        requested: Decimal,
    },

    /// A refund exceeds the merchant's net captured total for the card
    #[error("Refund of {requested} exceeds net captured {captured} for merchant {merchant} on card {card}")]
    RefundExceedsCaptured {
        /// Merchant ID
        merchant: MerchantId,
        /// Card ID
        card: CardId,
        /// Net captured amount still refundable
        captured: Decimal,
        /// Requested refund amount
        requested: Decimal,
    },

    /// No card matches the given ID or card number
    #[error("Card {card} not found")]
    CardNotFound {
        /// The ID or card number that failed to resolve
        card: String,
    },

    /// No merchant matches the given ID
    #[error("Merchant {merchant} not found")]
    MerchantNotFound {
        /// Merchant ID
        merchant: MerchantId,
    },

    /// The referenced entry is not an open hold owned by the caller
    ///
    /// Returned when the entry is missing, owned by another merchant, or
    /// already settled or released.
    #[error("Transaction {transaction} not found")]
    TransactionNotFound {
        /// The entry ID that failed to resolve
        transaction: EntryId,
    },

    /// A unique key (card number or merchant name) already exists
    #[error("Duplicate {field}: {value}")]
    DuplicateKey {
        /// The colliding field ("card_number" or "merchant_name")
        field: String,
        /// The colliding value
        value: String,
    },

    /// Arithmetic overflow while updating a hold
    ///
    /// Rejected to preserve ledger integrity; practically unreachable with
    /// decimal amounts in any realistic range.
    #[error("Arithmetic overflow in {operation} on card {card}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        /// Card ID
        card: CardId,
    },
}

// Helper constructors, mainly to keep engine code free of `.to_string()`
// noise at every rejection site.
impl LedgerError {
    /// Create an InvalidAmount error
    pub fn invalid_amount(operation: &str, amount: Decimal) -> Self {
        LedgerError::InvalidAmount {
            operation: operation.to_string(),
            amount,
        }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(card: CardId, available: Decimal, requested: Decimal) -> Self {
        LedgerError::InsufficientFunds {
            card,
            available,
            requested,
        }
    }

    /// Create a CaptureExceedsHold error
    pub fn capture_exceeds_hold(transaction: EntryId, held: Decimal, requested: Decimal) -> Self {
        LedgerError::CaptureExceedsHold {
            transaction,
            held,
            requested,
        }
    }

    /// Create a ReverseExceedsHold error
    pub fn reverse_exceeds_hold(transaction: EntryId, held: Decimal, requested: Decimal) -> Self {
        LedgerError::ReverseExceedsHold {
            transaction,
            held,
            requested,
        }
    }

    /// Create a RefundExceedsCaptured error
    pub fn refund_exceeds_captured(
        merchant: MerchantId,
        card: CardId,
        captured: Decimal,
        requested: Decimal,
    ) -> Self {
        LedgerError::RefundExceedsCaptured {
            merchant,
            card,
            captured,
            requested,
        }
    }

    /// Create a CardNotFound error from a card ID
    pub fn card_not_found(card: CardId) -> Self {
        LedgerError::CardNotFound {
            card: card.to_string(),
        }
    }

    /// Create a CardNotFound error from a card number
    pub fn card_number_not_found(card_number: &str) -> Self {
        LedgerError::CardNotFound {
            card: card_number.to_string(),
        }
    }

    /// Create a MerchantNotFound error
    pub fn merchant_not_found(merchant: MerchantId) -> Self {
        LedgerError::MerchantNotFound { merchant }
    }

    /// Create a TransactionNotFound error
    pub fn transaction_not_found(transaction: EntryId) -> Self {
        LedgerError::TransactionNotFound { transaction }
    }

    /// Create a DuplicateKey error
    pub fn duplicate_key(field: &str, value: &str) -> Self {
        LedgerError::DuplicateKey {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, card: CardId) -> Self {
        LedgerError::ArithmeticOverflow {
            operation: operation.to_string(),
            card,
        }
    }
}
