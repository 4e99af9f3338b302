//! Session module
//!
//! This module contains the auth token / user profile store and the
//! key-value storage it persists to.

mod model;
mod storage;
mod store;

pub use model::{Session, User};
pub use storage::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use store::{SessionStore, TOKEN_KEY, USER_KEY};
