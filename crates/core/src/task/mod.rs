//! Task module
//!
//! This module contains task-related types and the task store.

mod backend;
mod model;
mod store;

pub use backend::{LocalTaskBackend, RemoteTaskBackend, TaskBackend, TaskQuery};
pub use model::*;
pub use store::TaskStore;
