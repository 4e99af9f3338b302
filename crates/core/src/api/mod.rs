//! API module
//!
//! The request gateway and the typed auth and task endpoints built on it.

mod auth;
mod client;
mod tasks;

pub use auth::AuthResponse;
pub use client::{ApiClient, Method, RequestOptions};
