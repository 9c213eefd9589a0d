//! Contains models that are shared between the quote proxy and the price
//! impact calculator.

pub mod quote;
pub mod token;

pub use self::token::{Chain, Token, TradingPair};
