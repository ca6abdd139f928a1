//! System-wide constants for the OpenNames module.

/// Default denom prices are quoted in.
pub const DEFAULT_PRICE_DENOM: &str = "uopen";

/// Default days an expired name remains renewable by its owner.
pub const DEFAULT_GRACE_PERIOD_DAYS: u32 = 30;

/// Default days a sell order stays open.
pub const DEFAULT_SELL_ORDER_DURATION_DAYS: u32 = 3;

/// Default days a closed sell order is preserved in history.
pub const DEFAULT_PRESERVED_CLOSED_ORDER_DAYS: u32 = 30;

/// Default prohibit-sell window: a name expiring within this many days
/// cannot be listed.
pub const DEFAULT_PROHIBIT_SELL_DAYS: u32 = 30;

/// Days added per registration/renewal year.
pub const DAYS_PER_YEAR: u32 = 365;

/// Maximum resolution configs per name record.
pub const MAX_CONFIGS_PER_NAME: usize = 100;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Module name, also the conceptual owner of the escrow account.
pub const MODULE_NAME: &str = "opennames";
