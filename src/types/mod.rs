//! Types module
//!
//! Contains core data structures used throughout the ledger.
//! This module organizes types into logical submodules:
//! - `card`: Card and merchant records and identifiers
//! - `entry`: Ledger entry types and the tagged movement kind
//! - `request`: Per-operation request records
//! - `error`: Error types for ledger operations

pub mod card;
pub mod entry;
pub mod error;
pub mod request;

pub use card::{Card, CardId, Merchant, MerchantId};
pub use entry::{EntryId, EntryKind, LedgerEntry, NewEntry};
pub use error::LedgerError;
pub use request::{
    AuthorizeRequest, CaptureRequest, CreateCardRequest, CreateMerchantRequest, RefundRequest,
    ReverseRequest, TopUpRequest,
};
