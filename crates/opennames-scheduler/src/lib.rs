//! # opennames-scheduler
//!
//! **Epoch-boundary adapter** for OpenNames: the glue between the host's
//! periodic scheduler and the market engines, plus genesis import/export.
//!
//! - [`epoch`]: [`EpochProcessor`] — begin/end hooks gated on the
//!   configured identifiers, each running expire-then-prune
//! - [`genesis`]: [`GenesisState`] snapshot with refund-complete import
//!
//! The adapter runs outside user-transaction ordering but inside the same
//! serial execution model; everything it does is idempotent, so a skipped
//! or doubled boundary never corrupts state.

pub mod epoch;
pub mod genesis;

pub use epoch::{CycleOutcome, EpochProcessor};
pub use genesis::GenesisState;
