//! Closure-risk prediction

use crate::package::ModelPackage;
use crate::schema::{FeatureVectorBuilder, RawFields};
use closurecast_core::{Error, FeatureVector, Result, RiskResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error};

/// Values a caller may submit for each categorical feature, plus the full feature order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureOptions {
    pub options: BTreeMap<String, Vec<String>>,
    pub feature_cols: Vec<String>,
}

/// Runs the classifier over validated input and buckets the result
#[derive(Debug, Clone)]
pub struct PredictionService {
    package: Arc<ModelPackage>,
    builder: FeatureVectorBuilder,
}

impl PredictionService {
    /// Create a service; the feature schema is derived from the package once here
    pub fn new(package: Arc<ModelPackage>) -> Self {
        let builder = FeatureVectorBuilder::from_package(&package);
        Self { package, builder }
    }

    pub fn package(&self) -> &ModelPackage {
        &self.package
    }

    pub fn builder(&self) -> &FeatureVectorBuilder {
        &self.builder
    }

    /// Predict from an already-built vector
    pub fn predict(&self, vector: &FeatureVector) -> Result<RiskResult> {
        let probability = self
            .package
            .classifier()
            .predict_proba(vector.as_slice())
            .map_err(|e| {
                if let Error::ShapeMismatch { expected, actual } = &e {
                    error!(expected, actual, "Feature vector does not match the classifier");
                }
                e
            })?;

        if !(0.0..=1.0).contains(&probability) {
            error!(
                probability,
                model = self.package.classifier().name(),
                "Classifier returned an invalid probability"
            );
            return Err(Error::internal(format!(
                "classifier returned {} which is not a probability",
                probability
            )));
        }

        let result = RiskResult::new(probability);
        debug!(probability, tier = %result.tier, "Prediction complete");

        Ok(result)
    }

    /// Validate a raw payload and predict. Input errors never reach the classifier.
    pub fn predict_fields(&self, raw: &RawFields) -> Result<RiskResult> {
        let vector = self.builder.build(raw)?;
        self.predict(&vector)
    }

    /// Known values for every encoder, and the feature order
    pub fn options(&self) -> FeatureOptions {
        let options = self
            .package
            .encoders()
            .iter()
            .map(|(name, encoder)| (name.clone(), encoder.known_values().to_vec()))
            .collect();

        FeatureOptions {
            options,
            feature_cols: self.package.feature_order().to_vec(),
        }
    }
}
