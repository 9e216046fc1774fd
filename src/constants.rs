pub const LENDING_MARKET_PREFIX: &[u8] = b"lending_market";
pub const LENDING_MARKET_STAKE_PREFIX: &[u8] = b"stake";
pub const LENDING_MARKET_AUTHORITY_PREFIX: &[u8] = b"authority";

pub const RESERVE_PREFIX: &[u8] = b"reserve";
pub const COLLATERAL_MINT_PREFIX: &[u8] = b"collateral_mint";
pub const LIQUIDITY_MINT_PREFIX: &[u8] = b"liquidity_mint";
pub const LIQUIDITY_VAULT_PREFIX: &[u8] = b"liquidity_vault";

pub const MINT_DECIMALS: u8 = 9;

/// Current version of the program and all new accounts created
pub const PROGRAM_VERSION: u8 = 1;

/// Accounts are created zeroed, so an uninitialized state reads version 0.
pub const UNINITIALIZED_VERSION: u8 = 0;

/// Slots after which a reserve must be refreshed again
pub const STALE_AFTER_SLOTS_ELAPSED: u64 = 1;

/// Fixed point identity
pub const WAD: u64 = 1_000_000_000_000_000_000;
pub const HALF_WAD: u64 = 500_000_000_000_000_000;

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Floor for the stake delegated by the market and by each transient
/// stake account, raised to the cluster minimum when that is higher.
pub const MINIMUM_DELEGATION_FLOOR: u64 = LAMPORTS_PER_SOL;
