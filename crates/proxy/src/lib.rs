pub mod api;
pub mod arguments;
mod metrics;
pub mod run;
pub mod upstream;

pub use self::run::{run, start};
