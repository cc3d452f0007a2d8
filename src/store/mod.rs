//! Ledger entry store contract
//!
//! The store is an external collaborator: the core only requires the
//! operations declared here. [`memory::MemoryStore`] is the bundled
//! implementation for embedders without a durable backend and for tests;
//! a persistent implementation can be swapped in behind the same trait.

pub mod memory;

pub use memory::MemoryStore;

use crate::types::{
    Card, CardId, EntryId, LedgerEntry, LedgerError, Merchant, MerchantId, NewEntry,
};

/// Durable collection of cards, merchants, and ledger entries
///
/// Query methods return snapshots (owned values). The store itself only has
/// to be internally consistent per call; cross-call consistency for one
/// logical operation is provided by the engine's card-scoped critical
/// sections, which all writers honor. Implementations must be safe to share
/// across threads.
pub trait LedgerStore: Send + Sync {
    /// Create a card, rejecting a duplicate card number with
    /// [`LedgerError::DuplicateKey`]
    fn create_card(&self, name: &str, card_number: &str) -> Result<Card, LedgerError>;

    /// Get a card by ID
    fn get_card(&self, id: CardId) -> Option<Card>;

    /// Get a card by its unique card number
    fn card_by_number(&self, card_number: &str) -> Option<Card>;

    /// Delete a card and cascade-delete all entries that reference it
    ///
    /// Fails with [`LedgerError::CardNotFound`] if the card does not exist.
    fn delete_card(&self, id: CardId) -> Result<(), LedgerError>;

    /// Create a merchant, rejecting a duplicate name with
    /// [`LedgerError::DuplicateKey`]
    fn create_merchant(&self, name: &str) -> Result<Merchant, LedgerError>;

    /// Get a merchant by ID
    fn get_merchant(&self, id: MerchantId) -> Option<Merchant>;

    /// Get a merchant by its unique name
    fn merchant_by_name(&self, name: &str) -> Option<Merchant>;

    /// Delete a merchant record
    ///
    /// The engine releases the merchant's open holds before calling this;
    /// settled entries keep their merchant reference for refund accounting.
    /// Fails with [`LedgerError::MerchantNotFound`] if absent.
    fn delete_merchant(&self, id: MerchantId) -> Result<(), LedgerError>;

    /// Persist a new entry, assigning its ID
    fn create_entry(&self, entry: NewEntry) -> LedgerEntry;

    /// Get an entry by ID
    fn get_entry(&self, id: EntryId) -> Option<LedgerEntry>;

    /// Mutate an entry in place and return the updated entry
    ///
    /// Fails with [`LedgerError::TransactionNotFound`] if the entry does
    /// not exist.
    fn update_entry<F>(&self, id: EntryId, f: F) -> Result<LedgerEntry, LedgerError>
    where
        F: FnOnce(&mut LedgerEntry);

    /// Delete an entry
    ///
    /// Fails with [`LedgerError::TransactionNotFound`] if absent.
    fn delete_entry(&self, id: EntryId) -> Result<(), LedgerError>;

    /// Snapshot of all entries belonging to a card, ordered by entry ID
    fn entries_for_card(&self, card: CardId) -> Vec<LedgerEntry>;

    /// Snapshot of all entries for a (merchant, card) pair, ordered by
    /// entry ID
    fn entries_for_merchant_and_card(
        &self,
        merchant: MerchantId,
        card: CardId,
    ) -> Vec<LedgerEntry>;

    /// Snapshot of all still-open holds placed by a merchant
    ///
    /// Used by cascading merchant deletion to release reservations before
    /// the merchant record is removed.
    fn held_entries_for_merchant(&self, merchant: MerchantId) -> Vec<LedgerEntry>;
}
