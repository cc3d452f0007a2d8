//! Refundable-capacity derivation
//!
//! A merchant may refund a card only up to the net amount it has actually
//! captured from that card. The capacity is derived from the finalized
//! entries of the (merchant, card) pair: captured debits push it down,
//! prior refunds push it back up.

use crate::types::LedgerEntry;
use rust_decimal::Decimal;

/// Net captured position for a (merchant, card) pair
///
/// Sums the signed amounts of the pair's non-held entries. Debits are
/// negative and refunds positive, so the result is at most zero for any
/// state the engine can reach; its magnitude is the amount still
/// refundable. Open holds are excluded: reserved funds have not been
/// captured and cannot be refunded.
pub fn net_captured(entries: &[LedgerEntry]) -> Decimal {
    entries
        .iter()
        .filter(|e| !e.kind.is_held())
        .map(|e| e.kind.signed_amount())
        .sum()
}
