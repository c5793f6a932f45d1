//! Typed client for the Marquee streaming backend.
//!
//! Every JSON endpoint wraps its payload in an [`types::Envelope`]; the
//! client unwraps it and reports non-success codes as
//! [`ApiError::Rejected`].

pub mod auth;
pub mod client;
pub mod error;
pub mod jwt;
pub mod traits;
pub mod types;

pub use client::StreamingClient;
pub use error::ApiError;
pub use traits::StreamingService;
