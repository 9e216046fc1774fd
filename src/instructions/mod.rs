pub mod deposit_reserve_liquidity;
pub mod helpers;
pub mod init_lending_market;
pub mod init_reserve;
pub mod initialize;
pub mod redeem_reserve_liquidity;
pub mod refresh_epoch;
pub mod refresh_reserve;
pub mod set_lending_market_owner;

pub use deposit_reserve_liquidity::*;
pub use helpers::*;
pub use init_lending_market::*;
pub use init_reserve::*;
pub use initialize::*;
pub use redeem_reserve_liquidity::*;
pub use refresh_epoch::*;
pub use refresh_reserve::*;
pub use set_lending_market_owner::*;
