pub mod arguments;
pub mod calculator;
pub mod client;
pub mod config;
pub mod render;
pub mod run;
pub mod tokens;

pub use self::run::{run, start};
