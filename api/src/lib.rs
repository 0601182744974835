//! # Festa API
//!
//! REST client for the Festa backend.
//!
//! [`ApiClient`] implements the four festival-detail gateway traits over a
//! JSON HTTP API. The backend wraps some payloads in a
//! `{ data, success, message }` envelope and returns others bare; the
//! client normalizes both shapes, and maps every failure into the uniform
//! [`GatewayError`](festa_detail::gateway::GatewayError) the engine
//! consumes without source-specific branching.
//!
//! ## Example
//!
//! ```ignore
//! use festa_api::ApiClient;
//! use festa_detail::environment::DetailEnvironment;
//! use festa_core::environment::SystemClock;
//! use std::sync::Arc;
//!
//! let client = ApiClient::from_env()?;
//! let env = DetailEnvironment::with_backend(client, Arc::new(SystemClock));
//! ```

mod client;

pub use client::ApiClient;
