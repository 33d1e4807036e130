//! Error types for mixcop

use thiserror::Error;

/// mixcop error type
#[derive(Error, Debug)]
pub enum Error {
    /// Parameter outside its mathematical domain (carries the offending value).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Numerical failure (e.g. a root-find that did not converge).
    #[error("Computation error: {0}")]
    Computation(String),

    /// Parameter regime that is explicitly unsupported.
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// Configuration parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// `true` for errors a sampler should treat as "reject this point".
    pub fn is_domain_violation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
