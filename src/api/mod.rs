//! Typed client for the Voice Vault HTTP API.
//!
//! One method per remote operation; responses either parse into the typed
//! shapes in [`types`] or, for the cloning endpoint, come back as a raw
//! audio payload. Failures normalize into [`ApiError`].

mod client;
mod error;
mod types;

pub use client::ApiClient;
pub use error::{ApiError, Result};
pub use types::{
    ApiInfo, AuthResponse, DeleteUserResponse, EnrollResponse, UserListResponse,
};
