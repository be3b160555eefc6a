//! Byte fetching with a per-request timeout, and URL helpers.

pub mod fetch;
