//! CPI Service Library
//!
//! Serves monthly Consumer Price Index values from the BLS public API through
//! an in-memory read-through cache. The binary is a thin wrapper that wires
//! these modules together; integration tests use them directly.

pub mod cache;
pub mod cli;
pub mod data;
pub mod server;
