//! # opennames-store
//!
//! **State plane** for OpenNames: the byte-keyed store abstraction the
//! host provides, the pinned prefix arena, typed stores for every entity
//! family, and the reverse-lookup index maintainers.
//!
//! ## Layout
//!
//! - [`kv`]: the [`StateStore`] trait + [`MemStore`] reference impl
//! - [`keys`]: one pinned prefix byte per entity family (wire contract)
//! - [`names`] / [`orders`] / [`offers`] / [`params`]: typed codecs over
//!   the store; `orders` also carries the legacy purchase-order decode
//!   fallback
//! - [`reverse_lookup`]: owner→names, address→names, buyer→offers,
//!   goods→offers, alias→chain maintainers
//!
//! Engines in `opennames-market` compose these so every index update
//! lands in the same mutation unit as its primary write.

pub mod keys;
pub mod kv;
pub mod names;
pub mod offers;
pub mod orders;
pub mod params;
pub mod reverse_lookup;

pub use kv::{MemStore, StateStore};
