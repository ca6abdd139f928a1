//! Domain events emitted on every state-changing action.
//!
//! The host application indexes these for telemetry and external
//! consumers. Each event carries a deterministic SHA-256 payload hash so
//! downstream indexers can de-duplicate re-delivered events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{AssetKind, Coin};

/// The kind of state change an event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    NameRegistered,
    NameRenewed,
    NameTransferred,
    ConfigUpdated,
    SellOrderPlaced,
    BidPlaced,
    SellOrderCompleted,
    SellOrderExpired,
    OfferCreated,
    OfferCountered,
    OfferAccepted,
    OfferCancelled,
    RefundIssued,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NameRegistered => write!(f, "NAME_REGISTERED"),
            Self::NameRenewed => write!(f, "NAME_RENEWED"),
            Self::NameTransferred => write!(f, "NAME_TRANSFERRED"),
            Self::ConfigUpdated => write!(f, "CONFIG_UPDATED"),
            Self::SellOrderPlaced => write!(f, "SELL_ORDER_PLACED"),
            Self::BidPlaced => write!(f, "BID_PLACED"),
            Self::SellOrderCompleted => write!(f, "SELL_ORDER_COMPLETED"),
            Self::SellOrderExpired => write!(f, "SELL_ORDER_EXPIRED"),
            Self::OfferCreated => write!(f, "OFFER_CREATED"),
            Self::OfferCountered => write!(f, "OFFER_COUNTERED"),
            Self::OfferAccepted => write!(f, "OFFER_ACCEPTED"),
            Self::OfferCancelled => write!(f, "OFFER_CANCELLED"),
            Self::RefundIssued => write!(f, "REFUND_ISSUED"),
        }
    }
}

/// One domain event: the action, the goods it touched, the acting account,
/// and the price involved (when there is one).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    pub goods_id: String,
    pub asset_kind: AssetKind,
    /// The acting account, rendered as its address string.
    pub actor: String,
    pub price: Option<Coin>,
    pub emitted_at: DateTime<Utc>,
    /// Hex-encoded SHA-256 over the identifying fields.
    pub payload_hash: String,
}

impl Event {
    /// Build an event, computing its payload hash.
    #[must_use]
    pub fn new(
        kind: EventKind,
        goods_id: impl Into<String>,
        asset_kind: AssetKind,
        actor: impl Into<String>,
        price: Option<Coin>,
        emitted_at: DateTime<Utc>,
    ) -> Self {
        let goods_id = goods_id.into();
        let actor = actor.into();
        let payload_hash = Self::hash_payload(kind, &goods_id, asset_kind, &actor, price.as_ref());
        Self {
            kind,
            goods_id,
            asset_kind,
            actor,
            price,
            emitted_at,
            payload_hash,
        }
    }

    fn hash_payload(
        kind: EventKind,
        goods_id: &str,
        asset_kind: AssetKind,
        actor: &str,
        price: Option<&Coin>,
    ) -> String {
        let mut hasher = Sha256::new();
        hasher.update(b"opennames:event:v1:");
        hasher.update(kind.to_string().as_bytes());
        hasher.update(goods_id.as_bytes());
        hasher.update(asset_kind.to_string().as_bytes());
        hasher.update(actor.as_bytes());
        if let Some(price) = price {
            hasher.update(price.to_string().as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

/// Collects events during an operation; the host drains them after the
/// enclosing transaction commits.
#[derive(Debug, Default)]
pub struct EventSink {
    events: Vec<Event>,
}

impl EventSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event.
    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Take every collected event, leaving the sink empty.
    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Events collected so far.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
