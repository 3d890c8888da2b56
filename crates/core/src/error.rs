//! Forecasting-core error model.

use thiserror::Error;

use crate::id::ProductId;

/// Result type used across the forecasting core.
pub type DemandResult<T> = Result<T, DemandError>;

/// Core-level error.
///
/// Keep this focused on deterministic failures of the pure computations
/// (validation, missing baselines). Infrastructure concerns surface as
/// `Persistence` at the boundary and are never retried inside the core:
/// every core operation is pure, so a failed call is safe to retry verbatim
/// by the caller.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DemandError {
    /// A raw signal or computation input failed validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A product has no historical sales to derive a baseline from.
    #[error("insufficient history for product {product_id}")]
    InsufficientHistory { product_id: ProductId },

    /// The persistence collaborator failed (surfaced, not retried).
    #[error("persistence failed: {0}")]
    Persistence(String),
}

impl DemandError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn insufficient_history(product_id: ProductId) -> Self {
        Self::InsufficientHistory { product_id }
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }
}
