//! State module for classifying warm responses
//!
//! # Components
//!
//! - `CacheStatus`: parsed CDN / origin cache header values and the purge decision
//! - `WarmState`: lifecycle of one URL within a run (pending, in flight, warmed)

mod cache_status;
mod warm_state;

// Re-export main types
pub use cache_status::{CacheStatus, CDN_CACHE_HEADER, ORIGIN_CACHE_HEADER, RAY_HEADER};
pub use warm_state::WarmState;
