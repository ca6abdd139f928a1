//! The epoch-boundary adapter.
//!
//! The host scheduler calls [`EpochProcessor::on_epoch_begin`] and
//! [`EpochProcessor::on_epoch_end`] with the identifier of the period
//! that just ticked. Each hook is gated on its own configured identifier
//! and runs the same cycle, strictly in this order:
//!
//! 1. close and settle every sell order whose expiry has passed,
//!    refunding losing bids;
//! 2. prune historical orders past the retention window.
//!
//! Both steps are idempotent and no-op safe, so a skipped or repeated
//! boundary is harmless. The one condition that is not skipped over is an
//! active-index entry pointing at a missing order: that indicates a prior
//! invariant violation, and the cycle halts loudly instead of walking
//! past it.

use chrono::{DateTime, Utc};
use opennames_market::{BankKeeper, CloseDisposition, MarketKeeper};
use opennames_store::StateStore;
use opennames_types::{AssetKind, EpochIdentifier, Result};

/// What one scheduler cycle did.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CycleOutcome {
    /// Orders closed this cycle, with their dispositions.
    pub closed: Vec<(AssetKind, String, CloseDisposition)>,
    /// Historical orders dropped by the pruning pass.
    pub pruned: usize,
}

/// Stateless adapter between the host's epoch hooks and the market
/// keeper.
pub struct EpochProcessor;

impl EpochProcessor {
    /// Begin-of-epoch hook. Runs the cycle when `identifier` matches the
    /// configured begin identifier; otherwise a no-op returning `None`.
    pub fn on_epoch_begin<S: StateStore, B: BankKeeper>(
        keeper: &mut MarketKeeper<S, B>,
        identifier: EpochIdentifier,
        now: DateTime<Utc>,
    ) -> Result<Option<CycleOutcome>> {
        if identifier != keeper.params()?.misc.begin_epoch_hook_identifier {
            return Ok(None);
        }
        Self::run_cycle(keeper, now).map(Some)
    }

    /// End-of-epoch hook. Runs the cycle when `identifier` matches the
    /// configured end identifier; otherwise a no-op returning `None`.
    pub fn on_epoch_end<S: StateStore, B: BankKeeper>(
        keeper: &mut MarketKeeper<S, B>,
        identifier: EpochIdentifier,
        now: DateTime<Utc>,
    ) -> Result<Option<CycleOutcome>> {
        if identifier != keeper.params()?.misc.end_epoch_hook_identifier {
            return Ok(None);
        }
        Self::run_cycle(keeper, now).map(Some)
    }

    /// One cycle: expire/settle, then prune.
    fn run_cycle<S: StateStore, B: BankKeeper>(
        keeper: &mut MarketKeeper<S, B>,
        now: DateTime<Utc>,
    ) -> Result<CycleOutcome> {
        let mut outcome = CycleOutcome::default();
        for kind in [AssetKind::Name, AssetKind::Alias] {
            let closed = keeper.expire_sell_orders(now, kind).inspect_err(|err| {
                tracing::error!(%kind, %err, "epoch cycle halted: inconsistent active index");
            })?;
            outcome
                .closed
                .extend(closed.into_iter().map(|(goods, d)| (kind, goods, d)));
        }
        outcome.pruned = keeper.prune_historical_orders(now)?;
        if !outcome.closed.is_empty() || outcome.pruned > 0 {
            tracing::info!(
                closed = outcome.closed.len(),
                pruned = outcome.pruned,
                "epoch cycle complete"
            );
        }
        Ok(outcome)
    }
}
