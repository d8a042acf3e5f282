//! Core types for ClosureCast

use serde::{Deserialize, Serialize};
use std::fmt;

/// Probabilities strictly above this are High risk
pub const HIGH_RISK_THRESHOLD: f64 = 0.3;

/// Probabilities strictly above this (and not High) are Medium risk
pub const MEDIUM_RISK_THRESHOLD: f64 = 0.1;

/// Discrete bucketing of a closure probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// Map a probability onto a tier.
    ///
    /// Thresholds are exclusive: exactly 0.3 is Medium and exactly 0.1 is Low.
    /// Callers must only pass values in `[0, 1]`.
    pub fn from_probability(probability: f64) -> Self {
        if probability > HIGH_RISK_THRESHOLD {
            Self::High
        } else if probability > MEDIUM_RISK_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Stable English name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a closure-risk prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskResult {
    /// Probability of the positive (closure) class, 0.0-1.0
    pub probability: f64,

    /// Tier derived from `probability`
    pub tier: RiskTier,
}

impl RiskResult {
    /// Create a result, deriving the tier from the probability
    pub fn new(probability: f64) -> Self {
        Self {
            probability,
            tier: RiskTier::from_probability(probability),
        }
    }

    /// Probability expressed as a percentage
    pub fn percentage(&self) -> f64 {
        self.probability * 100.0
    }
}

/// Fixed-order numeric input for a classifier.
///
/// Position `i` holds the value of the i-th feature in the model's feature order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

impl AsRef<[f64]> for FeatureVector {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}

impl From<Vec<f64>> for FeatureVector {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

/// A knowledge snippet with the keywords it should be retrieved for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEntry {
    /// Body text
    pub text: String,

    /// Keywords, deduplicated, in declaration order
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl DocumentEntry {
    /// Create a new entry; blank and repeated keywords are dropped
    pub fn new<I, S>(text: impl Into<String>, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut deduped: Vec<String> = Vec::new();
        for keyword in keywords {
            let keyword = keyword.into().trim().to_string();
            if !keyword.is_empty() && !deduped.contains(&keyword) {
                deduped.push(keyword);
            }
        }

        Self {
            text: text.into(),
            keywords: deduped,
        }
    }
}

/// A document paired with its relevance score for one query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub entry: DocumentEntry,
    pub score: u32,
}

impl ScoredDocument {
    pub fn new(entry: DocumentEntry, score: u32) -> Self {
        Self { entry, score }
    }
}
