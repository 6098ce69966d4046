pub mod aave_client;
pub mod contracts;
pub mod price_feed;
pub mod token_client;
pub mod traits;
pub mod tx_submitter;

pub use traits::{Erc20Token, LendingPool, PriceFeed};
