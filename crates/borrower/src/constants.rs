use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ---------------------------------------------------------------------------
// Numeric Constants
// ---------------------------------------------------------------------------

/// Decimals of the pool's reference currency (ETH-denominated wei in Aave V2).
pub const REFERENCE_DECIMALS: u8 = 18;

/// Default fraction of the available headroom that is actually borrowed.
pub const DEFAULT_SAFETY_FACTOR: Decimal = dec!(0.95);

/// Default price staleness bound for the borrow-asset feed.
pub const DEFAULT_MAX_PRICE_AGE_SECONDS: u64 = 3_600;

/// Gas price buffer applied on top of `eth_gasPrice`, in percent.
pub const GAS_PRICE_BUFFER_PCT: u128 = 110;

// ---------------------------------------------------------------------------
// Aave V2 interest rate modes
// ---------------------------------------------------------------------------

/// Mode 1: stable rate. Disabled protocol-side, never submitted.
pub const RATE_MODE_STABLE: u8 = 1;

/// Mode 2: variable rate.
pub const RATE_MODE_VARIABLE: u8 = 2;

/// Aave referral program is inactive; every call passes zero.
pub const DEFAULT_REFERRAL_CODE: u16 = 0;
