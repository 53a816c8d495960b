//! State module for tracking crawl progress
//!
//! This module provides state management for frontier items during the crawl process.
//!
//! # Components
//!
//! - `ItemState`: Tracks the lifecycle of a single player or match item
//! - `Frontier`: Pending queues and done sets for players and matches
//! - `WorkQueue`: The deduplicating deque behind each pending queue

mod frontier;
mod item_state;

// Re-export main types
pub use frontier::{Frontier, WorkQueue};
pub use item_state::ItemState;
