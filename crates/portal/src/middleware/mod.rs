//! HTTP middleware and extractors for the portal API.
//!
//! # Layer order (outermost first)
//!
//! 1. Sentry (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. CORS and path normalization
//!
//! Authentication is not a layer: handlers opt in by taking a
//! [`RequireStaff`] argument.

pub mod auth;

pub use auth::{RequireStaff, bearer_token};
