//! Error types for the OpenNames module.
//!
//! All errors use the `ON_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Name / record errors
//! - 2xx: Coin / pricing / params errors
//! - 3xx: Sell-order errors
//! - 4xx: Bid errors
//! - 5xx: Buy-offer errors
//! - 6xx: Bank / escrow errors
//! - 7xx: Store / index errors
//! - 9xx: General / internal errors

use rust_decimal::Decimal;
use thiserror::Error;

/// Central error enum for all OpenNames operations.
///
/// Validation errors are always raised before any mutation; an operation
/// that returns an error has made no state change.
#[derive(Debug, Error)]
pub enum NamesError {
    // =================================================================
    // Name / Record Errors (1xx)
    // =================================================================
    /// The requested name record was not found.
    #[error("ON_ERR_100: name not found: {0}")]
    NameNotFound(String),

    /// The name failed syntactic validation.
    #[error("ON_ERR_101: invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    /// The acting account is not the record's owner.
    #[error("ON_ERR_102: {actor} is not the owner of {name}")]
    NotOwner { name: String, actor: String },

    /// The acting account is neither owner nor controller.
    #[error("ON_ERR_103: {actor} is not a controller of {name}")]
    NotController { name: String, actor: String },

    /// The name record has expired.
    #[error("ON_ERR_104: name has expired: {0}")]
    NameExpired(String),

    /// An account address failed syntactic validation.
    #[error("ON_ERR_105: invalid address: {0}")]
    InvalidAddress(String),

    /// Two resolution configs share the same identity.
    #[error("ON_ERR_106: duplicate resolution config: {0}")]
    DuplicateConfig(String),

    /// A resolution config failed validation.
    #[error("ON_ERR_107: invalid resolution config: {reason}")]
    InvalidConfig { reason: String },

    /// A name with this identity already exists.
    #[error("ON_ERR_108: name already registered: {0}")]
    NameAlreadyRegistered(String),

    // =================================================================
    // Coin / Pricing / Params Errors (2xx)
    // =================================================================
    /// A coin failed validation (bad denom, non-positive amount).
    #[error("ON_ERR_200: invalid coin: {reason}")]
    InvalidCoin { reason: String },

    /// Two coins that must share a denom do not.
    #[error("ON_ERR_201: denom mismatch: expected {expected}, got {got}")]
    DenomMismatch { expected: String, got: String },

    /// The price tier ordering invariant was violated.
    #[error("ON_ERR_202: price tier violation: {reason}")]
    PriceTierViolation { reason: String },

    /// A params section failed validation.
    #[error("ON_ERR_203: invalid params: {reason}")]
    InvalidParams { reason: String },

    // =================================================================
    // Sell-Order Errors (3xx)
    // =================================================================
    /// No active sell order exists for the goods.
    #[error("ON_ERR_300: no active sell order for {0}")]
    OrderNotFound(String),

    /// The goods already has an active sell order.
    #[error("ON_ERR_301: sell order already active for {0}")]
    OrderAlreadyActive(String),

    /// The order has already finished (by match or expiry).
    #[error("ON_ERR_302: sell order for {0} has already finished")]
    OrderAlreadyFinished(String),

    /// The order failed structural validation.
    #[error("ON_ERR_303: invalid sell order: {reason}")]
    InvalidOrder { reason: String },

    /// A name inside its prohibit-sell window cannot be listed.
    #[error("ON_ERR_304: {name} expires within the prohibit-sell window")]
    SellProhibited { name: String },

    /// Two historical orders share the same (goods, expiry) identity.
    #[error("ON_ERR_305: duplicate historical order identity for {goods_id} at {expire_at}")]
    DuplicateHistoricalOrder { goods_id: String, expire_at: i64 },

    /// A historical collection mixes records of different goods.
    #[error("ON_ERR_306: historical collection for {expected} contains order for {got}")]
    MixedGoodsHistory { expected: String, got: String },

    // =================================================================
    // Bid Errors (4xx)
    // =================================================================
    /// The bid does not reach the order's minimum price.
    #[error("ON_ERR_400: bid {bid} is below the minimum price {min}")]
    BidBelowMinimum { bid: Decimal, min: Decimal },

    /// The bid does not strictly improve on the current highest bid.
    #[error("ON_ERR_401: bid {bid} does not improve on current highest bid {current}")]
    BidNotImproved { bid: Decimal, current: Decimal },

    /// The bid failed structural validation.
    #[error("ON_ERR_402: invalid bid: {reason}")]
    InvalidBid { reason: String },

    /// The caller addressed an order of the wrong asset kind.
    #[error("ON_ERR_403: asset kind mismatch: expected {expected}, got {got}")]
    AssetKindMismatch { expected: String, got: String },

    // =================================================================
    // Buy-Offer Errors (5xx)
    // =================================================================
    /// The requested offer was not found.
    #[error("ON_ERR_500: buy offer not found: {0}")]
    OfferNotFound(String),

    /// The caller is not the offer's buyer.
    #[error("ON_ERR_501: {actor} is not the buyer of offer {offer_id}")]
    NotOfferBuyer { offer_id: String, actor: String },

    /// The offer failed structural validation.
    #[error("ON_ERR_502: invalid buy offer: {reason}")]
    InvalidOffer { reason: String },

    /// A buyer cannot make an offer on their own goods.
    #[error("ON_ERR_503: cannot offer on own goods: {0}")]
    SelfOffer(String),

    // =================================================================
    // Bank / Escrow Errors (6xx)
    // =================================================================
    /// Not enough available balance to perform the operation.
    #[error("ON_ERR_600: insufficient available balance: need {needed}, have {available}")]
    InsufficientBalance { needed: Decimal, available: Decimal },

    /// The module escrow pool cannot cover the release.
    #[error("ON_ERR_601: insufficient escrow held by module")]
    InsufficientEscrow,

    // =================================================================
    // Store / Index Errors (7xx)
    // =================================================================
    /// Serialization / deserialization of a stored record failed.
    #[error("ON_ERR_700: codec error: {0}")]
    Codec(String),

    /// An offer id string could not be parsed.
    #[error("ON_ERR_701: malformed offer id: {0}")]
    MalformedOfferId(String),

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// An active-index entry points at state that does not exist.
    /// Indicates a prior invariant violation; the scheduler cycle that
    /// discovers it must halt rather than skip.
    #[error("ON_ERR_900: dangling active-order index entry for {goods_id}")]
    DanglingIndexEntry { goods_id: String },

    /// Unrecoverable internal error.
    #[error("ON_ERR_901: internal error: {0}")]
    Internal(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, NamesError>;

impl From<serde_json::Error> for NamesError {
    fn from(err: serde_json::Error) -> Self {
        Self::Codec(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = NamesError::NameNotFound("alice".to_string());
        let msg = format!("{err}");
        assert!(msg.starts_with("ON_ERR_100"), "Got: {msg}");
    }

    #[test]
    fn insufficient_balance_display() {
        let err = NamesError::InsufficientBalance {
            needed: Decimal::new(100, 0),
            available: Decimal::new(50, 0),
        };
        let msg = format!("{err}");
        assert!(msg.contains("ON_ERR_600"));
        assert!(msg.contains("100"));
        assert!(msg.contains("50"));
    }

    #[test]
    fn all_errors_have_on_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(NamesError::NameExpired("a".into())),
            Box::new(NamesError::OrderAlreadyActive("a".into())),
            Box::new(NamesError::BidNotImproved {
                bid: Decimal::ONE,
                current: Decimal::TWO,
            }),
            Box::new(NamesError::OfferNotFound("101".into())),
            Box::new(NamesError::InsufficientEscrow),
            Box::new(NamesError::DanglingIndexEntry {
                goods_id: "a".into(),
            }),
            Box::new(NamesError::Internal("test".into())),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(msg.starts_with("ON_ERR_"), "missing ON_ERR_ prefix: {msg}");
        }
    }
}
