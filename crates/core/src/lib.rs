//! Core library for the TaskFlux task-tracking client
//!
//! This crate contains the client-side task state engine, including:
//! - Session handling (token + cached profile) over durable key-value storage
//! - The API gateway every remote call goes through
//! - The task store with local and remote-backed mutation
//! - Derived views (filters and statistics)

pub mod account;
pub mod api;
pub mod config;
pub mod error;
pub mod id;
pub mod session;
pub mod task;
pub mod view;

pub use api::ApiClient;
pub use config::ClientConfig;
pub use error::Error;
pub use id::RecordId;
pub use session::SessionStore;
pub use task::TaskStore;
pub type Result<T> = std::result::Result<T, Error>;
