//! Derived views
//!
//! Pure functions over a task snapshot. Nothing here mutates the store.

mod filter;
mod stats;

pub use filter::{filter_tasks, TaskFilter};
pub use stats::{compute_stats, TaskStats};
