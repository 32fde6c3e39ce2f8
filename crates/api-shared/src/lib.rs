//! # API Shared
//!
//! Shared definitions for the MTF scan APIs.
//!
//! Contains:
//! - Request/response envelopes (`wire` module)
//! - Shared services like `HealthService`
//!
//! Used by `api-rest`; kept separate so other surfaces can reuse the same wire shapes.

pub mod health;
pub mod wire;

pub use health::{HealthRes, HealthService};
pub use wire::*;
