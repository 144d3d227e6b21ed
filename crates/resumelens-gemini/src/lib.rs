//! Gemini backend for the resumelens generation seam.
//!
//! The HTTP client lives behind the `http` feature so the rest of the
//! workspace builds without a TLS stack.

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::{DEFAULT_API_BASE, GeminiClient, GeminiError};
