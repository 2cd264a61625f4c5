//! dayold - stale-while-revalidate cache coordinator
//!
//! A layered read-through cache that serves stale data immediately while
//! revalidating in the background, with at most one in-flight producer
//! call per key at any time.
//!
//! # Features
//!
//! - **Stale-while-revalidate**: fresh hits return immediately; stale hits
//!   return immediately while one background refresh runs; only misses
//!   wait on the producer
//! - **In-flight deduplication**: concurrent callers for the same key
//!   attach to one shared producer invocation
//! - **Layered storage**: fast in-process layer plus an optional
//!   caller-supplied shared layer with promote-on-hit
//! - **Failure asymmetry**: cold-path producer failures propagate verbatim
//!   to every waiter; revalidation failures keep the stale entry and are
//!   only logged
//! - **Maintenance worker**: scheduled sweep of expired entries on top of
//!   passive read-time eviction
//!
//! # Example
//!
//! ```no_run
//! use dayold::Dayold;
//! use std::time::Duration;
//!
//! # #[derive(Clone, Debug)] struct Profile { name: String }
//! # async fn fetch_profile(id: &str) -> Result<Profile, std::io::Error> {
//! #     Ok(Profile { name: id.to_string() })
//! # }
//! #[tokio::main]
//! async fn main() -> Result<(), dayold::CacheOperationError> {
//!     let cache: Dayold<Profile> = Dayold::builder()
//!         .stale_after(Duration::from_secs(5))
//!         .expire_after(Duration::from_secs(300))
//!         .build()
//!         .await?;
//!
//!     let profile = cache
//!         .get("user:7", || async { fetch_profile("user:7").await })
//!         .await?;
//!     println!("{}", profile.name);
//!     Ok(())
//! }
//! ```

// Public API modules
pub mod dayold;
pub mod prelude;

// Cache implementation modules - the layer trait is public for user
// implementations
pub mod cache;
pub(crate) mod telemetry;

// Re-export the public API at the crate root for convenience
pub use crate::dayold::{Dayold, DayoldBuilder};
pub use prelude::*;

// Public layer seam and supporting types users need for custom layers
pub mod layers {
    pub use crate::cache::entry::{CacheEntry, Freshness};
    pub use crate::cache::layer::memory::MemoryLayer;
    pub use crate::cache::layer::CacheLayer;
}
