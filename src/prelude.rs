//! dayold prelude - convenient imports for users

// Re-export the public API
pub use crate::dayold::{Dayold, DayoldBuilder};

// Re-export essential error and option types that call sites need
pub use crate::cache::config::{CacheConfig, ReadOptions};
pub use crate::cache::error::CacheOperationError;

// Re-export the layer seam for custom shared layers
pub use crate::cache::entry::{CacheEntry, Freshness};
pub use crate::cache::layer::memory::MemoryLayer;
pub use crate::cache::layer::CacheLayer;

// Re-export telemetry snapshot type
pub use crate::telemetry::StatsSnapshot;
