//! Common types and utilities shared across churn crates.
//!
//! This crate defines the shared error taxonomy and the observability helpers used
//! throughout the churn workspace. It is intentionally lightweight so that every crate
//! (HTTP plumbing, platform clients, the tracker core, the binary) can depend on it
//! without pulling in heavy transitive costs.
//!
//! # Overview
//!
//! - [`ChurnError`] and [`Result`]: shared error handling
//! - [`observability`]: centralised tracing/logging initialisation
//!
//! # Examples
//!
//! Classifying a failure:
//!
//! ```rust
//! use churn_common::ChurnError;
//!
//! let err = ChurnError::Auth("invalid or expired token".into());
//! assert!(err.is_fatal());
//! assert!(!ChurnError::LookupBatch("users/lookup failed".into()).is_fatal());
//! ```
use std::path::PathBuf;

pub mod observability;

/// Error types used across the churn system.
#[derive(thiserror::Error, Debug)]
pub enum ChurnError {
    /// Transport or HTTP failure while talking to a remote service.
    #[error("Network error: {0}")]
    Network(String),

    /// The platform rejected our credentials.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// A single bulk user lookup failed. Callers degrade instead of aborting.
    #[error("User lookup batch failed: {0}")]
    LookupBatch(String),

    /// The persisted state document could not be read back.
    #[error("State parse error in {path}: {reason}")]
    StateParse { path: PathBuf, reason: String },

    /// The persisted state document could not be written.
    #[error("Failed to write state file {path}: {source}")]
    StateWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A cycle step was invoked before the steps it depends on.
    #[error("Cycle step `{step}` requires stage {required}, but the cycle is at {actual}")]
    Stage {
        step: &'static str,
        required: &'static str,
        actual: &'static str,
    },
}

impl ChurnError {
    /// Whether the error must abort the current cycle.
    ///
    /// Only lookup batch failures and state parse failures are recovered locally.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            ChurnError::LookupBatch(_) | ChurnError::StateParse { .. }
        )
    }
}

/// Convenient alias for results that use [`ChurnError`].
pub type Result<T> = std::result::Result<T, ChurnError>;
