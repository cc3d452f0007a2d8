//! In-memory ledger store
//!
//! Thread-safe implementation of [`LedgerStore`] backed by `DashMap`.
//! DashMap's internal sharding lets operations on different cards and
//! merchants proceed concurrently without a global lock. Creates are the
//! exception: they are serialized behind a registry mutex so the uniqueness
//! check on a card number or merchant name and the insert that claims it
//! happen atomically.

use super::LedgerStore;
use crate::types::{
    Card, CardId, EntryId, LedgerEntry, LedgerError, Merchant, MerchantId, NewEntry,
};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// In-memory, thread-safe ledger store
#[derive(Debug, Default)]
pub struct MemoryStore {
    cards: DashMap<CardId, Card>,
    /// Secondary index: card number -> card ID, also the uniqueness guard
    card_numbers: DashMap<String, CardId>,
    merchants: DashMap<MerchantId, Merchant>,
    /// Secondary index: merchant name -> merchant ID
    merchant_names: DashMap<String, MerchantId>,
    entries: DashMap<EntryId, LedgerEntry>,
    /// Serializes creates; uniqueness check and index insert must be atomic
    create_lock: Mutex<()>,
    next_card_id: AtomicU64,
    next_merchant_id: AtomicU64,
    next_entry_id: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStore for MemoryStore {
    fn create_card(&self, name: &str, card_number: &str) -> Result<Card, LedgerError> {
        let _guard = self.create_lock.lock();
        if self.card_numbers.contains_key(card_number) {
            return Err(LedgerError::duplicate_key("card_number", card_number));
        }

        let id = self.next_card_id.fetch_add(1, Ordering::Relaxed) + 1;
        let card = Card {
            id,
            name: name.to_string(),
            card_number: card_number.to_string(),
        };
        self.cards.insert(id, card.clone());
        self.card_numbers.insert(card_number.to_string(), id);
        Ok(card)
    }

    fn get_card(&self, id: CardId) -> Option<Card> {
        self.cards.get(&id).map(|c| c.clone())
    }

    fn card_by_number(&self, card_number: &str) -> Option<Card> {
        let id = *self.card_numbers.get(card_number)?;
        self.get_card(id)
    }

    fn delete_card(&self, id: CardId) -> Result<(), LedgerError> {
        let (_, card) = self
            .cards
            .remove(&id)
            .ok_or_else(|| LedgerError::card_not_found(id))?;
        self.card_numbers.remove(&card.card_number);

        let owned: Vec<EntryId> = self
            .entries
            .iter()
            .filter(|e| e.card == id)
            .map(|e| e.id)
            .collect();
        for entry_id in owned {
            self.entries.remove(&entry_id);
        }
        Ok(())
    }

    fn create_merchant(&self, name: &str) -> Result<Merchant, LedgerError> {
        let _guard = self.create_lock.lock();
        if self.merchant_names.contains_key(name) {
            return Err(LedgerError::duplicate_key("merchant_name", name));
        }

        let id = self.next_merchant_id.fetch_add(1, Ordering::Relaxed) + 1;
        let merchant = Merchant {
            id,
            name: name.to_string(),
        };
        self.merchants.insert(id, merchant.clone());
        self.merchant_names.insert(name.to_string(), id);
        Ok(merchant)
    }

    fn get_merchant(&self, id: MerchantId) -> Option<Merchant> {
        self.merchants.get(&id).map(|m| m.clone())
    }

    fn merchant_by_name(&self, name: &str) -> Option<Merchant> {
        let id = *self.merchant_names.get(name)?;
        self.get_merchant(id)
    }

    fn delete_merchant(&self, id: MerchantId) -> Result<(), LedgerError> {
        let (_, merchant) = self
            .merchants
            .remove(&id)
            .ok_or_else(|| LedgerError::merchant_not_found(id))?;
        self.merchant_names.remove(&merchant.name);
        Ok(())
    }

    fn create_entry(&self, entry: NewEntry) -> LedgerEntry {
        let id = self.next_entry_id.fetch_add(1, Ordering::Relaxed) + 1;
        let entry = LedgerEntry {
            id,
            card: entry.card,
            merchant: entry.merchant,
            kind: entry.kind,
            created_at: entry.created_at,
        };
        self.entries.insert(id, entry.clone());
        entry
    }

    fn get_entry(&self, id: EntryId) -> Option<LedgerEntry> {
        self.entries.get(&id).map(|e| e.clone())
    }

    fn update_entry<F>(&self, id: EntryId, f: F) -> Result<LedgerEntry, LedgerError>
    where
        F: FnOnce(&mut LedgerEntry),
    {
        let mut entry = self
            .entries
            .get_mut(&id)
            .ok_or_else(|| LedgerError::transaction_not_found(id))?;
        f(entry.value_mut());
        Ok(entry.clone())
    }

    fn delete_entry(&self, id: EntryId) -> Result<(), LedgerError> {
        self.entries
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| LedgerError::transaction_not_found(id))
    }

    fn entries_for_card(&self, card: CardId) -> Vec<LedgerEntry> {
        let mut entries: Vec<LedgerEntry> = self
            .entries
            .iter()
            .filter(|e| e.card == card)
            .map(|e| e.clone())
            .collect();
        // Entry IDs are allocated monotonically, so this is creation order
        entries.sort_by_key(|e| e.id);
        entries
    }

    fn entries_for_merchant_and_card(
        &self,
        merchant: MerchantId,
        card: CardId,
    ) -> Vec<LedgerEntry> {
        let mut entries: Vec<LedgerEntry> = self
            .entries
            .iter()
            .filter(|e| e.card == card && e.merchant == Some(merchant))
            .map(|e| e.clone())
            .collect();
        entries.sort_by_key(|e| e.id);
        entries
    }

    fn held_entries_for_merchant(&self, merchant: MerchantId) -> Vec<LedgerEntry> {
        let mut entries: Vec<LedgerEntry> = self
            .entries
            .iter()
            .filter(|e| e.merchant == Some(merchant) && e.kind.is_held())
            .map(|e| e.clone())
            .collect();
        entries.sort_by_key(|e| e.id);
        entries
    }
}
