//! Error type, shared value types and the owned texture handle.

pub mod core;
pub mod error;
pub mod texture;
