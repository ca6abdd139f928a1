//! Buy-offer types for the OpenNames negotiation engine.
//!
//! A buy offer is the inverse of a sell order: the buyer escrows funds on
//! goods the owner has not listed, and the owner accepts, counters, or
//! lets it sit. Offers never expire on their own — a deliberate asymmetry
//! versus sell orders.

use serde::{Deserialize, Serialize};

use crate::{Addr, AssetKind, Coin, NamesError, OfferId, Result};

/// An escrowed, unsolicited offer to buy a name or alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyOffer {
    /// Type-prefixed, monotonically-assigned identifier.
    pub id: OfferId,
    /// The name or alias the buyer wants.
    pub goods_id: String,
    pub kind: AssetKind,
    /// The account whose funds are escrowed.
    pub buyer: Addr,
    /// Escrowed price. The amount that moves if the owner accepts.
    pub offer_price: Coin,
    /// The owner's counter-ask. Informational only: it does not close the
    /// offer and need not exceed `offer_price`.
    pub counterparty_offer_price: Option<Coin>,
}

impl BuyOffer {
    /// Validate the offer: id/goods consistency, buyer address, positive
    /// escrowed price, counter price (when set) valid and same denom.
    pub fn validate(&self) -> Result<()> {
        if self.goods_id.is_empty() {
            return Err(NamesError::InvalidOffer {
                reason: "empty goods id".to_string(),
            });
        }
        if self.id.kind != self.kind {
            return Err(NamesError::InvalidOffer {
                reason: format!(
                    "offer id prefix {} does not match goods kind {}",
                    self.id.kind, self.kind
                ),
            });
        }
        Addr::parse(self.buyer.as_str())?;
        self.offer_price.validate()?;
        if let Some(counter) = &self.counterparty_offer_price {
            self.offer_price.validate_same_denom(counter)?;
        }
        Ok(())
    }
}
