//! Test helpers shared by the workspace crates.

pub mod mock;
pub mod tokens;
