//! Pure pricing functions for registration and renewal.
//!
//! The tier amounts live in [`PriceParams`]; these helpers combine them
//! into the totals the registry charges. No state access, no side effects.

use rust_decimal::Decimal;

use crate::{Coin, PriceParams};

/// Total cost of registering `name` for `years` (first year at the tier
/// price, each further year at the extension price).
///
/// `years` is clamped to at least 1 — a registration is never free.
#[must_use]
pub fn registration_cost(price: &PriceParams, name: &str, years: u32) -> Coin {
    let years = years.max(1);
    let first = price.first_year_price(name.chars().count());
    let extend_years = Decimal::from(years - 1);
    Coin::new(
        price.price_denom.clone(),
        first.amount + price.price_extends * extend_years,
    )
}

/// Total cost of extending an existing registration by `years`.
///
/// `years` is clamped to at least 1.
#[must_use]
pub fn renewal_cost(price: &PriceParams, years: u32) -> Coin {
    let years = years.max(1);
    Coin::new(
        price.price_denom.clone(),
        price.price_extends * Decimal::from(years),
    )
}
