//! Core ledger logic
//!
//! Pure derivations ([`balance`], [`refund`]), the per-card lock registry
//! ([`locks`]), and the engine that ties them to a store ([`engine`]).

pub mod balance;
pub mod engine;
pub(crate) mod locks;
pub mod refund;

pub use balance::Balance;
pub use engine::LedgerEngine;
