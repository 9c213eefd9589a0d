//! Conversions between the integer base units tokens are quoted in and the
//! human-scaled amounts the calculator works with.

pub mod serialization;
pub mod units;

pub use alloy_primitives::U256;
