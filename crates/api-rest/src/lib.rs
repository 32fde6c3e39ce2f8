//! # API REST
//!
//! REST API implementation for the MTF scan service.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON envelopes, status mapping, CORS)
//!
//! Uses `api-shared` for wire types and `mtf-core` for the scan pipeline.

#![warn(rust_2018_idioms)]

pub mod error;
pub mod routes;

pub use error::ApiError;
pub use routes::{router, ApiDoc, AppState};
