//! On-disk model artifact format

use crate::classifier::{DecisionTree, ForestModel, LogisticModel, PredictiveModel};
use crate::encoder::CategoricalEncoder;
use closurecast_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Serialized model package: classifier, feature order and fitted encoders
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Descriptive metadata
    #[serde(default)]
    pub model_info: Option<ModelInfo>,

    /// Feature names in the order the classifier was trained on
    pub feature_cols: Vec<String>,

    /// Fitted encoders for categorical features, keyed by feature name
    #[serde(default)]
    pub label_encoders: BTreeMap<String, CategoricalEncoder>,

    /// Trained classifier
    pub model: ClassifierSpec,
}

/// Model name and version, logged at load
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub version: Option<String>,
}

/// Serialized classifier, tagged by `type`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClassifierSpec {
    /// Logistic regression
    Logistic {
        intercept: f64,
        coefficients: Vec<f64>,
    },

    /// Random-forest style tree ensemble
    Forest {
        n_features: usize,
        trees: Vec<DecisionTree>,
    },
}

impl ClassifierSpec {
    /// Instantiate the classifier
    pub fn build(&self) -> Result<Arc<dyn PredictiveModel>> {
        match self {
            Self::Logistic {
                intercept,
                coefficients,
            } => Ok(Arc::new(LogisticModel::new(*intercept, coefficients.clone()))),
            Self::Forest { n_features, trees } => {
                Ok(Arc::new(ForestModel::new(*n_features, trees.clone())?))
            }
        }
    }
}

impl ModelArtifact {
    /// Parse an artifact from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load an artifact from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read model artifact {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }
}
