//! # opennames-types
//!
//! Shared types, errors, and parameters for the **OpenNames**
//! name-marketplace module.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`Addr`], [`AssetKind`], [`OfferId`]
//! - **Money**: [`Coin`]
//! - **Name model**: [`NameRecord`], [`ResolutionConfig`], [`ResolutionKind`]
//! - **Auction model**: [`SellOrder`], [`SellOrderBid`], [`HistoricalOrders`],
//!   [`ActiveOrdersExpiration`]
//! - **Negotiation model**: [`BuyOffer`]
//! - **Parameters**: [`Params`], [`PriceParams`], [`ChainsParams`],
//!   [`MiscParams`], [`EpochIdentifier`]
//! - **Pricing**: [`pricing::registration_cost`], [`pricing::renewal_cost`]
//! - **Events**: [`Event`], [`EventKind`], [`EventSink`]
//! - **Errors**: [`NamesError`] with `ON_ERR_` prefix codes
//! - **Constants**: system-wide defaults

pub mod coin;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod name;
pub mod offer;
pub mod order;
pub mod params;
pub mod pricing;

// Re-export all primary types at crate root for ergonomic imports:
//   use opennames_types::{SellOrder, BuyOffer, NameRecord, ...};

pub use coin::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use name::*;
pub use offer::*;
pub use order::*;
pub use params::*;

// Constants are accessed via `opennames_types::constants::FOO` and pricing
// via `opennames_types::pricing::*` (not re-exported to keep call sites
// explicit).
