//! Per-card critical sections
//!
//! Each card is the unit of consistency: every operation that reads a
//! card's balance and conditionally writes must do so atomically with
//! respect to any other operation on the same card's entry set. This module
//! provides the mutual-exclusion scope: one mutex per card, allocated
//! lazily in a concurrent registry, so operations on different cards never
//! contend.
//!
//! # Thread Safety
//!
//! The registry is a `DashMap`, so lock lookup itself is sharded and
//! lock-free in the common case. The returned guard owns an `Arc` to the
//! card's mutex, so the guard stays valid independently of the registry.
//! A lock is held only for the duration of one logical operation (read,
//! validate, write) and never across an external call.

use crate::types::CardId;
use dashmap::DashMap;
use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex};
use std::sync::Arc;

/// Guard for one card's critical section
pub(crate) type CardGuard = ArcMutexGuard<RawMutex, ()>;

/// Registry of per-card mutexes
#[derive(Debug, Default)]
pub(crate) struct CardLocks {
    locks: DashMap<CardId, Arc<Mutex<()>>>,
}

impl CardLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Enter the card's critical section, blocking until it is free
    pub(crate) fn acquire(&self, card: CardId) -> CardGuard {
        // Clone the Arc out of the map before locking so the shard lock is
        // not held while waiting on the card mutex.
        let mutex = self.locks.entry(card).or_default().clone();
        mutex.lock_arc()
    }
}
