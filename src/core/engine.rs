//! Ledger engine
//!
//! This module provides the LedgerEngine that owns the authorization
//! protocol: placing holds against cards, settling them into debits,
//! releasing them back to availability, and refunding captured funds. It
//! also manages the card/merchant lifecycle, including the cascading hold
//! release that precedes merchant deletion.
//!
//! The engine enforces the business rules such as:
//! - A card's available amount can never go negative
//! - A merchant can never settle or refund more than it legitimately
//!   holds or has captured
//! - Validation always precedes mutation; a failed operation changes nothing
//!
//! # Concurrency
//!
//! Every operation that reads a card's state and conditionally writes runs
//! inside that card's critical section (see [`super::locks`]), so two
//! concurrent authorizations cannot both observe the pre-mutation available
//! amount and jointly overdraw the card. Operations on different cards
//! proceed in parallel.

use crate::core::balance::Balance;
use crate::core::locks::CardLocks;
use crate::core::refund::net_captured;
use crate::store::LedgerStore;
use crate::types::{
    AuthorizeRequest, CaptureRequest, Card, CardId, CreateCardRequest, CreateMerchantRequest,
    EntryId, EntryKind, LedgerEntry, LedgerError, Merchant, MerchantId, NewEntry, RefundRequest,
    ReverseRequest, TopUpRequest,
};
use chrono::Utc;
use rust_decimal::Decimal;

/// Card ledger engine
///
/// Coordinates the store and the per-card lock registry. All writes to
/// ledger entries go through the engine; no caller mutates an entry
/// directly.
pub struct LedgerEngine<S: LedgerStore> {
    store: S,
    locks: CardLocks,
}

impl<S: LedgerStore> LedgerEngine<S> {
    /// Create an engine on top of a store
    pub fn new(store: S) -> Self {
        LedgerEngine {
            store,
            locks: CardLocks::new(),
        }
    }

    /// Access the underlying store (read-side queries, test assertions)
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create a card
    ///
    /// # Errors
    ///
    /// Returns `DuplicateKey` if the card number already exists.
    pub fn create_card(&self, request: CreateCardRequest) -> Result<Card, LedgerError> {
        let card = self
            .store
            .create_card(&request.name, &request.card_number)?;
        tracing::debug!(card = card.id, "card created");
        Ok(card)
    }

    /// Create a merchant
    ///
    /// # Errors
    ///
    /// Returns `DuplicateKey` if the merchant name already exists.
    pub fn create_merchant(&self, request: CreateMerchantRequest) -> Result<Merchant, LedgerError> {
        let merchant = self.store.create_merchant(&request.name)?;
        tracing::debug!(merchant = merchant.id, "merchant created");
        Ok(merchant)
    }

    /// Delete a card and all of its ledger entries
    ///
    /// # Errors
    ///
    /// Returns `CardNotFound` if the card does not exist.
    pub fn delete_card(&self, card_id: CardId) -> Result<(), LedgerError> {
        let _guard = self.locks.acquire(card_id);
        self.store.delete_card(card_id)?;
        tracing::debug!(card = card_id, "card deleted");
        Ok(())
    }

    /// Delete a merchant, releasing all of its still-open holds first
    ///
    /// Each hold is fully released through the same path as [`Self::reverse`],
    /// one card-scoped critical section per hold; the funds return to the
    /// cards' availability with no residual record. Settled entries keep
    /// their merchant reference for historical refund accounting. The
    /// merchant record is removed only after every hold is released, so a
    /// reservation can never outlive its merchant.
    ///
    /// # Errors
    ///
    /// Returns `MerchantNotFound` if the merchant does not exist.
    pub fn delete_merchant(&self, merchant_id: MerchantId) -> Result<(), LedgerError> {
        let merchant = self
            .store
            .get_merchant(merchant_id)
            .ok_or_else(|| LedgerError::merchant_not_found(merchant_id))?;

        for hold in self.store.held_entries_for_merchant(merchant.id) {
            let release = ReverseRequest {
                merchant_id: merchant.id,
                transaction_id: hold.id,
                amount: hold.kind.magnitude(),
            };
            match self.reverse(release) {
                Ok(()) => {}
                // The hold was settled or released between the snapshot and
                // the card lock; nothing left to clean up for it.
                Err(LedgerError::TransactionNotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }

        self.store.delete_merchant(merchant.id)?;
        tracing::debug!(merchant = merchant.id, "merchant deleted");
        Ok(())
    }

    /// Credit funds to a card
    ///
    /// Top-ups cannot overdraw, so the effect is unconditionally accepted
    /// once validated. The created entry carries no merchant reference.
    ///
    /// # Arguments
    ///
    /// * `request` - Card ID and strictly positive amount
    ///
    /// # Returns
    ///
    /// The created credit entry
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The amount is zero or negative (`InvalidAmount`)
    /// - The card does not exist (`CardNotFound`)
    pub fn top_up(&self, request: TopUpRequest) -> Result<LedgerEntry, LedgerError> {
        if request.amount <= Decimal::ZERO {
            return Err(LedgerError::invalid_amount("top_up", request.amount));
        }

        let card = self
            .store
            .get_card(request.card_id)
            .ok_or_else(|| LedgerError::card_not_found(request.card_id))?;

        let _guard = self.locks.acquire(card.id);
        // The card may have been deleted while waiting on its lock
        if self.store.get_card(card.id).is_none() {
            return Err(LedgerError::card_not_found(card.id));
        }

        let entry = self.store.create_entry(NewEntry {
            card: card.id,
            merchant: None,
            kind: EntryKind::Credit(request.amount),
            created_at: Utc::now(),
        });

        tracing::debug!(card = card.id, amount = %request.amount, "top-up credited");
        Ok(entry)
    }

    /// Place an authorization hold against a card
    ///
    /// This is the only admission-control point in the system: the balance
    /// read and the hold creation happen atomically inside the card's
    /// critical section, so concurrent holds on the same card cannot
    /// jointly overdraw it.
    ///
    /// # Arguments
    ///
    /// * `request` - Merchant ID, card number, and strictly positive amount
    ///
    /// # Returns
    ///
    /// The created hold entry
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The amount is zero or negative (`InvalidAmount`)
    /// - The merchant does not exist (`MerchantNotFound`)
    /// - No card matches the card number (`CardNotFound`)
    /// - The amount exceeds the card's available amount (`InsufficientFunds`)
    pub fn authorize(&self, request: AuthorizeRequest) -> Result<LedgerEntry, LedgerError> {
        if request.amount <= Decimal::ZERO {
            return Err(LedgerError::invalid_amount("authorize", request.amount));
        }

        let merchant = self
            .store
            .get_merchant(request.merchant_id)
            .ok_or_else(|| LedgerError::merchant_not_found(request.merchant_id))?;

        let card = self
            .store
            .card_by_number(&request.card_number)
            .ok_or_else(|| LedgerError::card_number_not_found(&request.card_number))?;

        let _guard = self.locks.acquire(card.id);
        if self.store.get_card(card.id).is_none() {
            return Err(LedgerError::card_number_not_found(&request.card_number));
        }

        let balance = Balance::derive(&self.store.entries_for_card(card.id));
        if balance.available < request.amount {
            tracing::warn!(
                card = card.id,
                merchant = merchant.id,
                available = %balance.available,
                requested = %request.amount,
                "authorization rejected: insufficient funds"
            );
            return Err(LedgerError::insufficient_funds(
                card.id,
                balance.available,
                request.amount,
            ));
        }

        let entry = self.store.create_entry(NewEntry {
            card: card.id,
            merchant: Some(merchant.id),
            kind: EntryKind::Hold(request.amount),
            created_at: Utc::now(),
        });

        tracing::debug!(
            card = card.id,
            merchant = merchant.id,
            transaction = entry.id,
            amount = %request.amount,
            "authorization hold placed"
        );
        Ok(entry)
    }

    /// Settle some or all of an open hold into a final debit
    ///
    /// With held magnitude `H` and requested magnitude `a`:
    /// - `a > H`: fails with `CaptureExceedsHold`, nothing changes
    /// - `a < H`: the hold shrinks to `H - a` and stays open; a new debit
    ///   entry of magnitude `a` is created, stamped with the original
    ///   hold's creation time so the ledger orders it by authorization time
    /// - `a == H`: the hold converts in place to a debit; no new entry
    /// - `a == 0`: accepted as a no-op
    ///
    /// # Arguments
    ///
    /// * `request` - Merchant ID, hold entry ID, and non-negative magnitude
    ///
    /// # Returns
    ///
    /// The hold entry after the capture (shrunk and still held for a
    /// partial capture, converted to a debit for a full capture)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The amount is negative (`InvalidAmount`)
    /// - The entry is missing, owned by another merchant, or not an open
    ///   hold (`TransactionNotFound`)
    /// - The amount exceeds the held magnitude (`CaptureExceedsHold`)
    pub fn capture(&self, request: CaptureRequest) -> Result<LedgerEntry, LedgerError> {
        if request.amount < Decimal::ZERO {
            return Err(LedgerError::invalid_amount("capture", request.amount));
        }

        let card = self.card_of_entry(request.transaction_id)?;
        let _guard = self.locks.acquire(card);

        let hold = self.resolve_hold(request.merchant_id, request.transaction_id)?;
        let held = hold.kind.magnitude();

        if request.amount.is_zero() {
            return Ok(hold);
        }
        if request.amount > held {
            tracing::warn!(
                transaction = hold.id,
                held = %held,
                requested = %request.amount,
                "capture rejected: exceeds hold"
            );
            return Err(LedgerError::capture_exceeds_hold(
                hold.id,
                held,
                request.amount,
            ));
        }

        let updated = if request.amount < held {
            let remaining = held
                .checked_sub(request.amount)
                .ok_or_else(|| LedgerError::arithmetic_overflow("capture", card))?;
            let updated = self
                .store
                .update_entry(hold.id, |e| e.kind = EntryKind::Hold(remaining))?;
            self.store.create_entry(NewEntry {
                card,
                merchant: Some(request.merchant_id),
                kind: EntryKind::Debit(request.amount),
                created_at: hold.created_at,
            });
            updated
        } else {
            self.store
                .update_entry(hold.id, |e| e.kind = EntryKind::Debit(held))?
        };

        tracing::debug!(
            card,
            merchant = request.merchant_id,
            transaction = hold.id,
            amount = %request.amount,
            "hold captured"
        );
        Ok(updated)
    }

    /// Release some or all of an open hold back to availability
    ///
    /// Mirrors [`Self::capture`] except on full release: the hold entry is
    /// deleted outright rather than converted, because a reversal returns
    /// funds by vacating the reservation, not by recording a movement.
    /// An amount of zero is accepted as a no-op.
    ///
    /// # Arguments
    ///
    /// * `request` - Merchant ID, hold entry ID, and non-negative magnitude
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The amount is negative (`InvalidAmount`)
    /// - The entry is missing, owned by another merchant, or not an open
    ///   hold (`TransactionNotFound`)
    /// - The amount exceeds the held magnitude (`ReverseExceedsHold`)
    pub fn reverse(&self, request: ReverseRequest) -> Result<(), LedgerError> {
        if request.amount < Decimal::ZERO {
            return Err(LedgerError::invalid_amount("reverse", request.amount));
        }

        let card = self.card_of_entry(request.transaction_id)?;
        let _guard = self.locks.acquire(card);

        let hold = self.resolve_hold(request.merchant_id, request.transaction_id)?;
        let held = hold.kind.magnitude();

        if request.amount.is_zero() {
            return Ok(());
        }
        if request.amount > held {
            tracing::warn!(
                transaction = hold.id,
                held = %held,
                requested = %request.amount,
                "reverse rejected: exceeds hold"
            );
            return Err(LedgerError::reverse_exceeds_hold(
                hold.id,
                held,
                request.amount,
            ));
        }

        if request.amount < held {
            let remaining = held
                .checked_sub(request.amount)
                .ok_or_else(|| LedgerError::arithmetic_overflow("reverse", card))?;
            self.store
                .update_entry(hold.id, |e| e.kind = EntryKind::Hold(remaining))?;
        } else {
            self.store.delete_entry(hold.id)?;
        }

        tracing::debug!(
            card,
            merchant = request.merchant_id,
            transaction = hold.id,
            amount = %request.amount,
            "hold released"
        );
        Ok(())
    }

    /// Return previously captured funds to a card
    ///
    /// The refund is bounded by the merchant's net captured total for this
    /// card: cumulative refunds can never exceed cumulative captures. On
    /// success a credit entry referencing the merchant is created, which
    /// reduces the refundable capacity for future refunds.
    ///
    /// # Arguments
    ///
    /// * `request` - Merchant ID, card number, and strictly positive amount
    ///
    /// # Returns
    ///
    /// The created refund entry
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The amount is zero or negative (`InvalidAmount`)
    /// - The merchant does not exist (`MerchantNotFound`)
    /// - No card matches the card number (`CardNotFound`)
    /// - The amount exceeds the net captured total (`RefundExceedsCaptured`)
    pub fn refund(&self, request: RefundRequest) -> Result<LedgerEntry, LedgerError> {
        if request.amount <= Decimal::ZERO {
            return Err(LedgerError::invalid_amount("refund", request.amount));
        }

        let merchant = self
            .store
            .get_merchant(request.merchant_id)
            .ok_or_else(|| LedgerError::merchant_not_found(request.merchant_id))?;

        let card = self
            .store
            .card_by_number(&request.card_number)
            .ok_or_else(|| LedgerError::card_number_not_found(&request.card_number))?;

        let _guard = self.locks.acquire(card.id);
        if self.store.get_card(card.id).is_none() {
            return Err(LedgerError::card_number_not_found(&request.card_number));
        }

        let pair = self
            .store
            .entries_for_merchant_and_card(merchant.id, card.id);
        let captured = net_captured(&pair);

        // captured is <= 0; the refund must not push the pair's net
        // position past zero
        if request.amount + captured > Decimal::ZERO {
            tracing::warn!(
                card = card.id,
                merchant = merchant.id,
                captured = %-captured,
                requested = %request.amount,
                "refund rejected: exceeds net captured"
            );
            return Err(LedgerError::refund_exceeds_captured(
                merchant.id,
                card.id,
                -captured,
                request.amount,
            ));
        }

        let entry = self.store.create_entry(NewEntry {
            card: card.id,
            merchant: Some(merchant.id),
            kind: EntryKind::Credit(request.amount),
            created_at: Utc::now(),
        });

        tracing::debug!(
            card = card.id,
            merchant = merchant.id,
            amount = %request.amount,
            "refund credited"
        );
        Ok(entry)
    }

    /// Derive a card's current balance
    ///
    /// # Errors
    ///
    /// Returns `CardNotFound` if the card does not exist.
    pub fn card_balance(&self, card_id: CardId) -> Result<Balance, LedgerError> {
        let card = self
            .store
            .get_card(card_id)
            .ok_or_else(|| LedgerError::card_not_found(card_id))?;
        Ok(Balance::derive(&self.store.entries_for_card(card.id)))
    }

    /// Snapshot of a card's ledger entries
    ///
    /// # Errors
    ///
    /// Returns `CardNotFound` if the card does not exist.
    pub fn card_entries(&self, card_id: CardId) -> Result<Vec<LedgerEntry>, LedgerError> {
        let card = self
            .store
            .get_card(card_id)
            .ok_or_else(|| LedgerError::card_not_found(card_id))?;
        Ok(self.store.entries_for_card(card.id))
    }

    /// Find the card an entry belongs to, for lock acquisition
    fn card_of_entry(&self, entry_id: EntryId) -> Result<CardId, LedgerError> {
        self.store
            .get_entry(entry_id)
            .map(|e| e.card)
            .ok_or_else(|| LedgerError::transaction_not_found(entry_id))
    }

    /// Resolve an entry as an open hold owned by the merchant
    ///
    /// Must be called inside the card's critical section; re-reads the
    /// entry so stale pre-lock state is never trusted. Missing, foreign,
    /// and already-finalized entries are indistinguishable to the caller.
    fn resolve_hold(
        &self,
        merchant: MerchantId,
        transaction: EntryId,
    ) -> Result<LedgerEntry, LedgerError> {
        let entry = self
            .store
            .get_entry(transaction)
            .ok_or_else(|| LedgerError::transaction_not_found(transaction))?;

        if entry.merchant != Some(merchant) || !entry.kind.is_held() {
            return Err(LedgerError::transaction_not_found(transaction));
        }

        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn engine() -> LedgerEngine<MemoryStore> {
        LedgerEngine::new(MemoryStore::new())
    }

    /// Card + merchant with the card topped up to the given amount
    fn funded(engine: &LedgerEngine<MemoryStore>, amount: Decimal) -> (Card, Merchant) {
        let card = engine
            .create_card(CreateCardRequest {
                name: "alice".to_string(),
                card_number: "4000".to_string(),
            })
            .unwrap();
        let merchant = engine
            .create_merchant(CreateMerchantRequest {
                name: "acme".to_string(),
            })
            .unwrap();
        if amount > Decimal::ZERO {
            engine
                .top_up(TopUpRequest {
                    card_id: card.id,
                    amount,
                })
                .unwrap();
        }
        (card, merchant)
    }

    #[test]
    fn test_top_up_creates_credit_entry() {
        let engine = engine();
        let (card, _) = funded(&engine, Decimal::ZERO);

        let entry = engine
            .top_up(TopUpRequest {
                card_id: card.id,
                amount: Decimal::new(54000, 4), // 5.4
            })
            .unwrap();

        assert_eq!(entry.kind, EntryKind::Credit(Decimal::new(54000, 4)));
        assert_eq!(entry.merchant, None);

        let balance = engine.card_balance(card.id).unwrap();
        assert_eq!(balance.available, Decimal::new(54000, 4));
    }

    #[test]
    fn test_top_up_rejects_non_positive_amounts() {
        let engine = engine();
        let (card, _) = funded(&engine, Decimal::ZERO);

        for amount in [Decimal::ZERO, Decimal::new(-10000, 4)] {
            let result = engine.top_up(TopUpRequest {
                card_id: card.id,
                amount,
            });
            assert!(matches!(
                result.unwrap_err(),
                LedgerError::InvalidAmount { .. }
            ));
        }

        assert!(engine.card_entries(card.id).unwrap().is_empty());
    }

    #[test]
    fn test_top_up_unknown_card_fails() {
        let engine = engine();
        let result = engine.top_up(TopUpRequest {
            card_id: 99,
            amount: Decimal::new(10000, 4),
        });
        assert!(matches!(
            result.unwrap_err(),
            LedgerError::CardNotFound { .. }
        ));
    }

    #[test]
    fn test_authorize_places_hold() {
        let engine = engine();
        let (card, merchant) = funded(&engine, Decimal::new(54000, 4)); // 5.4

        let hold = engine
            .authorize(AuthorizeRequest {
                merchant_id: merchant.id,
                card_number: card.card_number.clone(),
                amount: Decimal::new(50000, 4), // 5.0
            })
            .unwrap();

        assert_eq!(hold.kind, EntryKind::Hold(Decimal::new(50000, 4)));
        assert_eq!(hold.merchant, Some(merchant.id));

        let balance = engine.card_balance(card.id).unwrap();
        assert_eq!(balance.total, Decimal::new(54000, 4));
        assert_eq!(balance.blocked, Decimal::new(50000, 4));
        assert_eq!(balance.available, Decimal::new(4000, 4)); // 0.4
    }

    #[test]
    fn test_authorize_insufficient_funds_creates_nothing() {
        let engine = engine();
        let (card, merchant) = funded(&engine, Decimal::ZERO);

        let result = engine.authorize(AuthorizeRequest {
            merchant_id: merchant.id,
            card_number: card.card_number.clone(),
            amount: Decimal::new(50000, 4),
        });

        assert!(matches!(
            result.unwrap_err(),
            LedgerError::InsufficientFunds { .. }
        ));
        assert!(engine.card_entries(card.id).unwrap().is_empty());
    }

    #[test]
    fn test_authorize_unknown_merchant_fails() {
        let engine = engine();
        let (card, _) = funded(&engine, Decimal::new(10000, 4));

        let result = engine.authorize(AuthorizeRequest {
            merchant_id: 99,
            card_number: card.card_number,
            amount: Decimal::new(10000, 4),
        });
        assert!(matches!(
            result.unwrap_err(),
            LedgerError::MerchantNotFound { merchant: 99 }
        ));
    }

    #[test]
    fn test_authorize_unknown_card_number_fails() {
        let engine = engine();
        let (_, merchant) = funded(&engine, Decimal::ZERO);

        let result = engine.authorize(AuthorizeRequest {
            merchant_id: merchant.id,
            card_number: "0000".to_string(),
            amount: Decimal::new(10000, 4),
        });
        assert!(matches!(
            result.unwrap_err(),
            LedgerError::CardNotFound { .. }
        ));
    }

    #[test]
    fn test_authorize_rejects_non_positive_amounts() {
        let engine = engine();
        let (card, merchant) = funded(&engine, Decimal::new(10000, 4));

        let result = engine.authorize(AuthorizeRequest {
            merchant_id: merchant.id,
            card_number: card.card_number,
            amount: Decimal::ZERO,
        });
        assert!(matches!(
            result.unwrap_err(),
            LedgerError::InvalidAmount { .. }
        ));
    }

    #[test]
    fn test_partial_capture_shrinks_hold_and_splits_debit() {
        let engine = engine();
        let (card, merchant) = funded(&engine, Decimal::new(54000, 4));
        let hold = engine
            .authorize(AuthorizeRequest {
                merchant_id: merchant.id,
                card_number: card.card_number.clone(),
                amount: Decimal::new(50000, 4),
            })
            .unwrap();

        let updated = engine
            .capture(CaptureRequest {
                merchant_id: merchant.id,
                transaction_id: hold.id,
                amount: Decimal::new(30000, 4), // 3.0
            })
            .unwrap();

        // Hold shrinks and stays open
        assert_eq!(updated.id, hold.id);
        assert_eq!(updated.kind, EntryKind::Hold(Decimal::new(20000, 4)));

        // The split debit carries the original hold's timestamp
        let entries = engine.card_entries(card.id).unwrap();
        let debit = entries
            .iter()
            .find(|e| e.kind == EntryKind::Debit(Decimal::new(30000, 4)))
            .unwrap();
        assert_eq!(debit.created_at, hold.created_at);
        assert_eq!(debit.merchant, Some(merchant.id));

        // Available is unchanged by a capture: reserved became spent
        let balance = engine.card_balance(card.id).unwrap();
        assert_eq!(balance.available, Decimal::new(4000, 4));
        assert_eq!(balance.blocked, Decimal::new(20000, 4));
        assert_eq!(balance.total, Decimal::new(24000, 4));
    }

    #[test]
    fn test_full_capture_converts_hold_in_place() {
        let engine = engine();
        let (card, merchant) = funded(&engine, Decimal::new(54000, 4));
        let hold = engine
            .authorize(AuthorizeRequest {
                merchant_id: merchant.id,
                card_number: card.card_number.clone(),
                amount: Decimal::new(50000, 4),
            })
            .unwrap();

        let updated = engine
            .capture(CaptureRequest {
                merchant_id: merchant.id,
                transaction_id: hold.id,
                amount: Decimal::new(50000, 4),
            })
            .unwrap();

        assert_eq!(updated.id, hold.id);
        assert_eq!(updated.kind, EntryKind::Debit(Decimal::new(50000, 4)));

        // No split entry: topup + converted hold only
        assert_eq!(engine.card_entries(card.id).unwrap().len(), 2);
    }

    #[test]
    fn test_capture_exceeding_hold_changes_nothing() {
        let engine = engine();
        let (card, merchant) = funded(&engine, Decimal::new(54000, 4));
        let hold = engine
            .authorize(AuthorizeRequest {
                merchant_id: merchant.id,
                card_number: card.card_number.clone(),
                amount: Decimal::new(50000, 4),
            })
            .unwrap();

        let before = engine.card_entries(card.id).unwrap();
        let result = engine.capture(CaptureRequest {
            merchant_id: merchant.id,
            transaction_id: hold.id,
            amount: Decimal::new(60000, 4),
        });

        assert!(matches!(
            result.unwrap_err(),
            LedgerError::CaptureExceedsHold { .. }
        ));
        assert_eq!(engine.card_entries(card.id).unwrap(), before);
    }

    #[test]
    fn test_capture_zero_is_a_no_op() {
        let engine = engine();
        let (card, merchant) = funded(&engine, Decimal::new(54000, 4));
        let hold = engine
            .authorize(AuthorizeRequest {
                merchant_id: merchant.id,
                card_number: card.card_number.clone(),
                amount: Decimal::new(50000, 4),
            })
            .unwrap();

        let before = engine.card_entries(card.id).unwrap();
        let unchanged = engine
            .capture(CaptureRequest {
                merchant_id: merchant.id,
                transaction_id: hold.id,
                amount: Decimal::ZERO,
            })
            .unwrap();

        assert_eq!(unchanged, hold);
        assert_eq!(engine.card_entries(card.id).unwrap(), before);
    }

    #[test]
    fn test_capture_by_wrong_merchant_is_not_found() {
        let engine = engine();
        let (card, merchant) = funded(&engine, Decimal::new(54000, 4));
        let other = engine
            .create_merchant(CreateMerchantRequest {
                name: "globex".to_string(),
            })
            .unwrap();
        let hold = engine
            .authorize(AuthorizeRequest {
                merchant_id: merchant.id,
                card_number: card.card_number.clone(),
                amount: Decimal::new(50000, 4),
            })
            .unwrap();

        // Ownership failures are indistinguishable from missing entries
        let result = engine.capture(CaptureRequest {
            merchant_id: other.id,
            transaction_id: hold.id,
            amount: Decimal::new(10000, 4),
        });
        assert!(matches!(
            result.unwrap_err(),
            LedgerError::TransactionNotFound { .. }
        ));
    }

    #[test]
    fn test_capture_of_settled_entry_is_not_found() {
        let engine = engine();
        let (card, merchant) = funded(&engine, Decimal::new(54000, 4));
        let hold = engine
            .authorize(AuthorizeRequest {
                merchant_id: merchant.id,
                card_number: card.card_number.clone(),
                amount: Decimal::new(50000, 4),
            })
            .unwrap();

        engine
            .capture(CaptureRequest {
                merchant_id: merchant.id,
                transaction_id: hold.id,
                amount: Decimal::new(50000, 4),
            })
            .unwrap();

        // Already settled: no longer held
        let result = engine.capture(CaptureRequest {
            merchant_id: merchant.id,
            transaction_id: hold.id,
            amount: Decimal::new(10000, 4),
        });
        assert!(matches!(
            result.unwrap_err(),
            LedgerError::TransactionNotFound { .. }
        ));
    }

    #[test]
    fn test_capture_negative_amount_is_invalid() {
        let engine = engine();
        let result = engine.capture(CaptureRequest {
            merchant_id: 1,
            transaction_id: 1,
            amount: Decimal::new(-10000, 4),
        });
        assert!(matches!(
            result.unwrap_err(),
            LedgerError::InvalidAmount { .. }
        ));
    }

    #[test]
    fn test_partial_reverse_shrinks_hold() {
        let engine = engine();
        let (card, merchant) = funded(&engine, Decimal::new(54000, 4));
        let hold = engine
            .authorize(AuthorizeRequest {
                merchant_id: merchant.id,
                card_number: card.card_number.clone(),
                amount: Decimal::new(50000, 4),
            })
            .unwrap();

        engine
            .reverse(ReverseRequest {
                merchant_id: merchant.id,
                transaction_id: hold.id,
                amount: Decimal::new(20000, 4),
            })
            .unwrap();

        let entries = engine.card_entries(card.id).unwrap();
        let remaining = entries.iter().find(|e| e.id == hold.id).unwrap();
        assert_eq!(remaining.kind, EntryKind::Hold(Decimal::new(30000, 4)));

        let balance = engine.card_balance(card.id).unwrap();
        assert_eq!(balance.available, Decimal::new(24000, 4));
    }

    #[test]
    fn test_full_reverse_deletes_the_hold() {
        let engine = engine();
        let (card, merchant) = funded(&engine, Decimal::new(54000, 4));
        let hold = engine
            .authorize(AuthorizeRequest {
                merchant_id: merchant.id,
                card_number: card.card_number.clone(),
                amount: Decimal::new(50000, 4),
            })
            .unwrap();

        engine
            .reverse(ReverseRequest {
                merchant_id: merchant.id,
                transaction_id: hold.id,
                amount: Decimal::new(50000, 4),
            })
            .unwrap();

        // The reservation vacates without any residual record
        let entries = engine.card_entries(card.id).unwrap();
        assert!(entries.iter().all(|e| e.id != hold.id));
        assert_eq!(entries.len(), 1); // just the top-up

        let balance = engine.card_balance(card.id).unwrap();
        assert_eq!(balance.available, Decimal::new(54000, 4));
    }

    #[test]
    fn test_reverse_exceeding_hold_changes_nothing() {
        let engine = engine();
        let (card, merchant) = funded(&engine, Decimal::new(54000, 4));
        let hold = engine
            .authorize(AuthorizeRequest {
                merchant_id: merchant.id,
                card_number: card.card_number.clone(),
                amount: Decimal::new(50000, 4),
            })
            .unwrap();

        let before = engine.card_entries(card.id).unwrap();
        let result = engine.reverse(ReverseRequest {
            merchant_id: merchant.id,
            transaction_id: hold.id,
            amount: Decimal::new(60000, 4),
        });

        assert!(matches!(
            result.unwrap_err(),
            LedgerError::ReverseExceedsHold { .. }
        ));
        assert_eq!(engine.card_entries(card.id).unwrap(), before);
    }

    #[test]
    fn test_refund_within_captured_bound() {
        let engine = engine();
        let (card, merchant) = funded(&engine, Decimal::new(54000, 4));
        let hold = engine
            .authorize(AuthorizeRequest {
                merchant_id: merchant.id,
                card_number: card.card_number.clone(),
                amount: Decimal::new(50000, 4),
            })
            .unwrap();
        engine
            .capture(CaptureRequest {
                merchant_id: merchant.id,
                transaction_id: hold.id,
                amount: Decimal::new(50000, 4),
            })
            .unwrap();

        let refund = engine
            .refund(RefundRequest {
                merchant_id: merchant.id,
                card_number: card.card_number.clone(),
                amount: Decimal::new(30000, 4),
            })
            .unwrap();

        assert_eq!(refund.kind, EntryKind::Credit(Decimal::new(30000, 4)));
        assert_eq!(refund.merchant, Some(merchant.id));

        let balance = engine.card_balance(card.id).unwrap();
        assert_eq!(balance.available, Decimal::new(34000, 4));
    }

    #[test]
    fn test_refund_exceeding_captured_is_rejected() {
        let engine = engine();
        let (card, merchant) = funded(&engine, Decimal::new(54000, 4));
        let hold = engine
            .authorize(AuthorizeRequest {
                merchant_id: merchant.id,
                card_number: card.card_number.clone(),
                amount: Decimal::new(30000, 4),
            })
            .unwrap();
        engine
            .capture(CaptureRequest {
                merchant_id: merchant.id,
                transaction_id: hold.id,
                amount: Decimal::new(30000, 4),
            })
            .unwrap();

        let before = engine.card_balance(card.id).unwrap();
        let result = engine.refund(RefundRequest {
            merchant_id: merchant.id,
            card_number: card.card_number.clone(),
            amount: Decimal::new(40000, 4),
        });

        assert!(matches!(
            result.unwrap_err(),
            LedgerError::RefundExceedsCaptured { .. }
        ));
        assert_eq!(engine.card_balance(card.id).unwrap(), before);
    }

    #[test]
    fn test_cumulative_refunds_respect_the_bound() {
        let engine = engine();
        let (card, merchant) = funded(&engine, Decimal::new(100000, 4));
        let hold = engine
            .authorize(AuthorizeRequest {
                merchant_id: merchant.id,
                card_number: card.card_number.clone(),
                amount: Decimal::new(50000, 4),
            })
            .unwrap();
        engine
            .capture(CaptureRequest {
                merchant_id: merchant.id,
                transaction_id: hold.id,
                amount: Decimal::new(50000, 4),
            })
            .unwrap();

        // 3.0 then 2.0 exhaust the captured 5.0; the third refund must fail
        engine
            .refund(RefundRequest {
                merchant_id: merchant.id,
                card_number: card.card_number.clone(),
                amount: Decimal::new(30000, 4),
            })
            .unwrap();
        engine
            .refund(RefundRequest {
                merchant_id: merchant.id,
                card_number: card.card_number.clone(),
                amount: Decimal::new(20000, 4),
            })
            .unwrap();

        let result = engine.refund(RefundRequest {
            merchant_id: merchant.id,
            card_number: card.card_number.clone(),
            amount: Decimal::new(1, 4), // 0.0001
        });
        assert!(matches!(
            result.unwrap_err(),
            LedgerError::RefundExceedsCaptured { .. }
        ));
    }

    #[test]
    fn test_refund_ignores_open_holds() {
        let engine = engine();
        let (card, merchant) = funded(&engine, Decimal::new(100000, 4));
        engine
            .authorize(AuthorizeRequest {
                merchant_id: merchant.id,
                card_number: card.card_number.clone(),
                amount: Decimal::new(50000, 4),
            })
            .unwrap();

        // Nothing captured yet: the open hold is not refundable
        let result = engine.refund(RefundRequest {
            merchant_id: merchant.id,
            card_number: card.card_number.clone(),
            amount: Decimal::new(10000, 4),
        });
        assert!(matches!(
            result.unwrap_err(),
            LedgerError::RefundExceedsCaptured { .. }
        ));
    }

    #[test]
    fn test_create_card_duplicate_number_rejected() {
        let engine = engine();
        funded(&engine, Decimal::ZERO);

        let result = engine.create_card(CreateCardRequest {
            name: "bob".to_string(),
            card_number: "4000".to_string(),
        });
        assert!(matches!(
            result.unwrap_err(),
            LedgerError::DuplicateKey { .. }
        ));
    }

    #[test]
    fn test_create_merchant_duplicate_name_rejected() {
        let engine = engine();
        funded(&engine, Decimal::ZERO);

        let result = engine.create_merchant(CreateMerchantRequest {
            name: "acme".to_string(),
        });
        assert!(matches!(
            result.unwrap_err(),
            LedgerError::DuplicateKey { .. }
        ));
    }

    #[test]
    fn test_delete_card_removes_entries() {
        let engine = engine();
        let (card, _) = funded(&engine, Decimal::new(10000, 4));

        engine.delete_card(card.id).unwrap();

        assert!(matches!(
            engine.card_balance(card.id).unwrap_err(),
            LedgerError::CardNotFound { .. }
        ));
        assert!(engine.store().entries_for_card(card.id).is_empty());
    }

    #[test]
    fn test_delete_merchant_releases_open_holds() {
        let engine = engine();
        let (card, merchant) = funded(&engine, Decimal::new(54000, 4));
        let hold = engine
            .authorize(AuthorizeRequest {
                merchant_id: merchant.id,
                card_number: card.card_number.clone(),
                amount: Decimal::new(50000, 4),
            })
            .unwrap();

        engine.delete_merchant(merchant.id).unwrap();

        // Reservation vacated, funds back to availability
        let balance = engine.card_balance(card.id).unwrap();
        assert_eq!(balance.available, Decimal::new(54000, 4));
        assert!(engine.store().get_entry(hold.id).is_none());
        assert!(engine.store().get_merchant(merchant.id).is_none());
    }

    #[test]
    fn test_delete_merchant_keeps_settled_entries() {
        let engine = engine();
        let (card, merchant) = funded(&engine, Decimal::new(54000, 4));
        let hold = engine
            .authorize(AuthorizeRequest {
                merchant_id: merchant.id,
                card_number: card.card_number.clone(),
                amount: Decimal::new(30000, 4),
            })
            .unwrap();
        engine
            .capture(CaptureRequest {
                merchant_id: merchant.id,
                transaction_id: hold.id,
                amount: Decimal::new(30000, 4),
            })
            .unwrap();

        engine.delete_merchant(merchant.id).unwrap();

        // The captured debit survives; only open holds are released
        let entries = engine.card_entries(card.id).unwrap();
        assert!(entries
            .iter()
            .any(|e| e.kind == EntryKind::Debit(Decimal::new(30000, 4))));

        let balance = engine.card_balance(card.id).unwrap();
        assert_eq!(balance.available, Decimal::new(24000, 4));
    }

    #[test]
    fn test_delete_merchant_releases_holds_across_cards() {
        let engine = engine();
        let (first, merchant) = funded(&engine, Decimal::new(50000, 4));
        let second = engine
            .create_card(CreateCardRequest {
                name: "bob".to_string(),
                card_number: "5000".to_string(),
            })
            .unwrap();
        engine
            .top_up(TopUpRequest {
                card_id: second.id,
                amount: Decimal::new(30000, 4),
            })
            .unwrap();

        for (number, amount) in [("4000", 20000), ("5000", 10000)] {
            engine
                .authorize(AuthorizeRequest {
                    merchant_id: merchant.id,
                    card_number: number.to_string(),
                    amount: Decimal::new(amount, 4),
                })
                .unwrap();
        }

        engine.delete_merchant(merchant.id).unwrap();

        assert_eq!(
            engine.card_balance(first.id).unwrap().available,
            Decimal::new(50000, 4)
        );
        assert_eq!(
            engine.card_balance(second.id).unwrap().available,
            Decimal::new(30000, 4)
        );
    }

    #[test]
    fn test_delete_unknown_merchant_fails() {
        let engine = engine();
        assert!(matches!(
            engine.delete_merchant(99).unwrap_err(),
            LedgerError::MerchantNotFound { merchant: 99 }
        ));
    }

    #[test]
    fn test_available_amount_never_negative_through_lifecycle() {
        let engine = engine();
        let (card, merchant) = funded(&engine, Decimal::new(54000, 4));

        let hold = engine
            .authorize(AuthorizeRequest {
                merchant_id: merchant.id,
                card_number: card.card_number.clone(),
                amount: Decimal::new(50000, 4),
            })
            .unwrap();
        assert!(engine.card_balance(card.id).unwrap().available >= Decimal::ZERO);

        engine
            .capture(CaptureRequest {
                merchant_id: merchant.id,
                transaction_id: hold.id,
                amount: Decimal::new(30000, 4),
            })
            .unwrap();
        assert!(engine.card_balance(card.id).unwrap().available >= Decimal::ZERO);

        engine
            .reverse(ReverseRequest {
                merchant_id: merchant.id,
                transaction_id: hold.id,
                amount: Decimal::new(20000, 4),
            })
            .unwrap();
        assert!(engine.card_balance(card.id).unwrap().available >= Decimal::ZERO);
    }
}
