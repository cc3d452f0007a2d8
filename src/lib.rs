//! # Card Ledger
//!
//! An embeddable card-payment ledger with authorization holds.
//!
//! Cards carry funds; merchants reserve them with authorization holds and
//! later settle (capture), release (reverse), or return (refund) those
//! funds. Balances are never stored: a card's total, blocked, and available
//! amounts are derived from its append-style entry set on every read, and
//! the engine's admission control guarantees the available amount never
//! goes negative.
//!
//! ## Architecture
//!
//! - **Types** ([`types`]): cards, merchants, ledger entries, request
//!   payloads, and the error taxonomy
//! - **Store** ([`store`]): the persistence contract and the bundled
//!   thread-safe in-memory implementation
//! - **Core** ([`core`]): balance and refund-capacity derivations, per-card
//!   critical sections, and the [`LedgerEngine`] that enforces the protocol
//!
//! ## Example
//!
//! ```
//! use card_ledger::{
//!     AuthorizeRequest, CaptureRequest, CreateCardRequest, CreateMerchantRequest,
//!     LedgerEngine, MemoryStore, TopUpRequest,
//! };
//! use rust_decimal::Decimal;
//!
//! # fn main() -> Result<(), card_ledger::LedgerError> {
//! let engine = LedgerEngine::new(MemoryStore::new());
//!
//! let card = engine.create_card(CreateCardRequest {
//!     name: "alice".to_string(),
//!     card_number: "4000001234567890".to_string(),
//! })?;
//! let merchant = engine.create_merchant(CreateMerchantRequest {
//!     name: "acme".to_string(),
//! })?;
//!
//! engine.top_up(TopUpRequest {
//!     card_id: card.id,
//!     amount: Decimal::new(54000, 4), // 5.4
//! })?;
//!
//! let hold = engine.authorize(AuthorizeRequest {
//!     merchant_id: merchant.id,
//!     card_number: card.card_number.clone(),
//!     amount: Decimal::new(50000, 4), // 5.0
//! })?;
//!
//! engine.capture(CaptureRequest {
//!     merchant_id: merchant.id,
//!     transaction_id: hold.id,
//!     amount: Decimal::new(30000, 4), // 3.0
//! })?;
//!
//! let balance = engine.card_balance(card.id)?;
//! assert_eq!(balance.available, Decimal::new(4000, 4)); // 0.4
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod store;
pub mod types;

pub use crate::core::{Balance, LedgerEngine};
pub use crate::store::{LedgerStore, MemoryStore};
pub use crate::types::{
    AuthorizeRequest, CaptureRequest, Card, CardId, CreateCardRequest, CreateMerchantRequest,
    EntryId, EntryKind, LedgerEntry, LedgerError, Merchant, MerchantId, NewEntry, RefundRequest,
    ReverseRequest, TopUpRequest,
};
