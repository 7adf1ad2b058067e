//! Salon portal library.
//!
//! The pieces a salon staff portal is built from, usable both by the HTTP
//! API binary and by other clients such as the CLI:
//!
//! - [`retry`] - Bounded retry with backoff and error classification
//! - [`permissions`] and [`gate`] - Role state and access decisions
//! - [`role_ui`] - Navigation and dashboard layout per role
//! - [`cache`] and [`realtime`] - Query cache kept fresh by the change feed
//! - [`services::auth`] - Hosted auth client and session monitor
//! - [`local_store`] - Small JSON state persisted on the client
//! - [`db`] and [`services`] - Repositories and business rules
//! - [`routes`] - The JSON API
//!
//! # Realtime
//!
//! The database is the source of truth. Clients never patch cached data;
//! they drop it when the change feed says a table moved and read again.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod gate;
pub mod local_store;
pub mod middleware;
pub mod models;
pub mod permissions;
pub mod realtime;
pub mod retry;
pub mod role_ui;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;
