//! Cache system module
//!
//! Layered stale-while-revalidate cache with per-key in-flight
//! deduplication and passive plus scheduled expiry.

pub(crate) mod config;
pub(crate) mod coordinator;
pub(crate) mod entry;
pub(crate) mod error;
pub(crate) mod inflight;
pub mod layer;
pub(crate) mod worker;
