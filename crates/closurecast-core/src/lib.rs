//! ClosureCast Core
//!
//! Core types and error handling shared across ClosureCast components.
//!
//! This crate provides:
//! - Risk tiers and prediction results
//! - The fixed-order feature vector consumed by classifiers
//! - Knowledge-base document types produced by retrieval
//! - The error taxonomy used by every layer, from input validation to
//!   generation backend failures

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{
    DocumentEntry, FeatureVector, RiskResult, RiskTier, ScoredDocument, HIGH_RISK_THRESHOLD,
    MEDIUM_RISK_THRESHOLD,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{DocumentEntry, FeatureVector, RiskResult, RiskTier, ScoredDocument};
}
