//! ClosureCast Model
//!
//! Closure-risk inference over a pre-trained binary classifier.
//!
//! A [`ModelPackage`] bundles the classifier with the ordered feature names it
//! was trained on and the fitted encoders for its categorical features. The
//! [`FeatureVectorBuilder`] turns loosely-typed request payloads into the
//! fixed-order vector the classifier expects, and [`PredictionService`] maps
//! the classifier's probability onto a risk tier.

pub mod classifier;
pub mod config;
pub mod encoder;
pub mod package;
pub mod prediction;
pub mod schema;

pub use classifier::{DecisionTree, ForestModel, LogisticModel, PredictiveModel, TreeNode};
pub use config::{ClassifierSpec, ModelArtifact, ModelInfo};
pub use encoder::CategoricalEncoder;
pub use package::ModelPackage;
pub use prediction::{FeatureOptions, PredictionService};
pub use schema::{FeatureField, FeatureKind, FeatureVectorBuilder, RawFields};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classifier::PredictiveModel;
    pub use crate::encoder::CategoricalEncoder;
    pub use crate::package::ModelPackage;
    pub use crate::prediction::PredictionService;
    pub use crate::schema::{FeatureVectorBuilder, RawFields};
}
