//! Model package loading

use crate::classifier::PredictiveModel;
use crate::config::{ModelArtifact, ModelInfo};
use crate::encoder::CategoricalEncoder;
use closurecast_core::{Error, Result};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Trained classifier together with the schema it was trained on.
///
/// Built once at startup and shared read-only between requests.
#[derive(Clone)]
pub struct ModelPackage {
    classifier: Arc<dyn PredictiveModel>,
    feature_order: Vec<String>,
    encoders: BTreeMap<String, CategoricalEncoder>,
    info: ModelInfo,
}

impl ModelPackage {
    /// Create a package, checking that feature names are unique and that the
    /// classifier accepts exactly `feature_order.len()` inputs.
    pub fn new(
        classifier: Arc<dyn PredictiveModel>,
        feature_order: Vec<String>,
        encoders: BTreeMap<String, CategoricalEncoder>,
    ) -> Result<Self> {
        let mut seen = HashSet::new();
        for name in &feature_order {
            if !seen.insert(name.as_str()) {
                return Err(Error::config(format!("duplicate feature '{}'", name)));
            }
        }

        if classifier.n_features() != feature_order.len() {
            return Err(Error::ShapeMismatch {
                expected: classifier.n_features(),
                actual: feature_order.len(),
            });
        }

        for name in encoders.keys() {
            if !seen.contains(name.as_str()) {
                warn!("Encoder for '{}' has no matching feature and will be unused", name);
            }
        }

        Ok(Self {
            classifier,
            feature_order,
            encoders,
            info: ModelInfo::default(),
        })
    }

    /// Attach descriptive metadata
    pub fn with_info(mut self, info: ModelInfo) -> Self {
        self.info = info;
        self
    }

    /// Build a package from a parsed artifact
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self> {
        let classifier = artifact.model.build()?;
        let package = Self::new(classifier, artifact.feature_cols, artifact.label_encoders)?;
        Ok(package.with_info(artifact.model_info.unwrap_or_default()))
    }

    /// Load a package from a JSON artifact on disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading model package from: {}", path.display());

        let package = Self::from_artifact(ModelArtifact::from_file(path)?)?;

        info!(
            name = package.info.name.as_deref().unwrap_or("Unknown"),
            version = package.info.version.as_deref().unwrap_or("Unknown"),
            classifier = package.classifier.name(),
            features = package.feature_order.len(),
            encoders = package.encoders.len(),
            "Model package loaded"
        );

        Ok(package)
    }

    pub fn classifier(&self) -> &dyn PredictiveModel {
        self.classifier.as_ref()
    }

    pub fn feature_order(&self) -> &[String] {
        &self.feature_order
    }

    pub fn encoders(&self) -> &BTreeMap<String, CategoricalEncoder> {
        &self.encoders
    }

    pub fn encoder(&self, feature: &str) -> Option<&CategoricalEncoder> {
        self.encoders.get(feature)
    }

    pub fn info(&self) -> &ModelInfo {
        &self.info
    }
}

impl fmt::Debug for ModelPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelPackage")
            .field("classifier", &self.classifier.name())
            .field("feature_order", &self.feature_order)
            .field("encoders", &self.encoders.keys().collect::<Vec<_>>())
            .field("info", &self.info)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::LogisticModel;

    fn features(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_duplicate_features_rejected() {
        let model = Arc::new(LogisticModel::new(0.0, vec![1.0, 1.0]));
        let err = ModelPackage::new(model, features(&["a", "a"]), BTreeMap::new()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_width_mismatch_rejected() {
        let model = Arc::new(LogisticModel::new(0.0, vec![1.0]));
        let err = ModelPackage::new(model, features(&["a", "b"]), BTreeMap::new()).unwrap_err();
        assert!(matches!(
            err,
            Error::ShapeMismatch {
                expected: 1,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(
            &path,
            r#"{
                "model_info": {"name": "closure", "version": "1.0"},
                "feature_cols": ["업종", "운영기간"],
                "label_encoders": {"업종": ["카페", "한식"]},
                "model": {"type": "logistic", "intercept": 0.0, "coefficients": [0.0, 0.0]}
            }"#,
        )
        .unwrap();

        let package = ModelPackage::load(&path).unwrap();
        assert_eq!(package.feature_order(), &features(&["업종", "운영기간"])[..]);
        assert!(package.encoder("업종").is_some());
        assert!(package.encoder("운영기간").is_none());
        assert_eq!(package.info().version.as_deref(), Some("1.0"));
    }
}
