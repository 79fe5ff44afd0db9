//! Twitter/X v1.1 integration used by the tracker.
//!
//! `client` wraps the shared HTTP client with OAuth 1.0a signing and implements the
//! [`crate::services`] traits; `types` holds the response models.
pub mod client;
pub mod types;

pub use client::TwitterApi;
