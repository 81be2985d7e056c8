//! CLI command implementations.

pub mod analyse;
