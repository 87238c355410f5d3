// crates/tessera-cli/src/commands/mod.rs
//
// Command module declarations for the tessera CLI.

pub mod dataset;
pub mod fetch;
pub mod upload;
