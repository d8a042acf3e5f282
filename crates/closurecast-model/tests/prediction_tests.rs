//! Prediction integration tests
//!
//! Exercises the full path from a raw payload through the feature vector
//! builder and a configurable mock classifier to a risk tier.

use closurecast_core::{Error, Result, RiskTier};
use closurecast_model::{
    CategoricalEncoder, ModelPackage, PredictionService, PredictiveModel, RawFields,
};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// A classifier that returns a fixed probability and counts its calls
struct MockModel {
    probability: f64,
    n_features: usize,
    call_count: AtomicU32,
}

impl MockModel {
    fn new(probability: f64, n_features: usize) -> Self {
        Self {
            probability,
            n_features,
            call_count: AtomicU32::new(0),
        }
    }

    fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }
}

impl PredictiveModel for MockModel {
    fn predict_proba(&self, features: &[f64]) -> Result<f64> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        self.check_shape(features)?;
        Ok(self.probability)
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn name(&self) -> &str {
        "mock"
    }
}

fn encoders() -> BTreeMap<String, CategoricalEncoder> {
    let mut encoders = BTreeMap::new();
    encoders.insert(
        "업종".to_string(),
        CategoricalEncoder::new(["카페", "한식", "편의점"]),
    );
    encoders.insert("지역".to_string(), CategoricalEncoder::new(["서울", "부산"]));
    encoders.insert(
        "상권".to_string(),
        CategoricalEncoder::new(["골목", "역세권"]),
    );
    encoders
}

fn feature_order() -> Vec<String> {
    ["업종", "운영기간", "지역", "상권"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn service_with(model: Arc<MockModel>) -> PredictionService {
    let package = ModelPackage::new(model, feature_order(), encoders()).unwrap();
    PredictionService::new(Arc::new(package))
}

fn payload(value: serde_json::Value) -> RawFields {
    value.as_object().cloned().unwrap()
}

fn valid_payload() -> RawFields {
    payload(json!({"업종": "카페", "운영기간": "24", "지역": "서울", "상권": "골목"}))
}

#[test]
fn test_tier_boundaries_through_service() {
    let cases = [
        (0.0, RiskTier::Low),
        (0.10, RiskTier::Low),
        (0.10001, RiskTier::Medium),
        (0.30, RiskTier::Medium),
        (0.30001, RiskTier::High),
        (0.99, RiskTier::High),
    ];

    for (probability, expected) in cases {
        let service = service_with(Arc::new(MockModel::new(probability, 4)));
        let result = service.predict_fields(&valid_payload()).unwrap();
        assert_eq!(result.tier, expected, "probability {}", probability);
        assert_eq!(result.probability, probability);
    }
}

#[test]
fn test_input_errors_never_reach_classifier() {
    let model = Arc::new(MockModel::new(0.5, 4));
    let service = service_with(model.clone());

    let err = service
        .predict_fields(&payload(json!({"업종": "카페"})))
        .unwrap_err();
    assert!(err.is_client_error());
    assert_eq!(model.call_count(), 0);

    service.predict_fields(&valid_payload()).unwrap();
    assert_eq!(model.call_count(), 1);
}

#[test]
fn test_all_categories_invalid_reports_first_in_order() {
    let service = service_with(Arc::new(MockModel::new(0.5, 4)));
    let raw = payload(json!({
        "상권": "바다",
        "지역": "화성",
        "운영기간": 12,
        "업종": "우주정거장"
    }));

    match service.predict_fields(&raw).unwrap_err() {
        Error::InvalidCategory { field, value } => {
            assert_eq!(field, "업종");
            assert_eq!(value, "우주정거장");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_missing_numeric_before_invalid_category() {
    let service = service_with(Arc::new(MockModel::new(0.5, 4)));
    let raw = payload(json!({"업종": "카페", "지역": "화성", "상권": "골목"}));

    let err = service.predict_fields(&raw).unwrap_err();
    assert!(matches!(err, Error::MissingField(ref f) if f == "운영기간"));
}

#[test]
fn test_artifact_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    std::fs::write(
        &path,
        json!({
            "model_info": {"name": "closure-forest", "version": "3"},
            "feature_cols": ["업종", "운영기간"],
            "label_encoders": {"업종": ["카페", "한식"]},
            "model": {
                "type": "forest",
                "n_features": 2,
                "trees": [
                    {"nodes": [
                        {"feature": 1, "threshold": 12.0, "left": 1, "right": 2},
                        {"leaf": 0.6},
                        {"leaf": 0.02}
                    ]},
                    {"nodes": [
                        {"feature": 0, "threshold": 0.5, "left": 1, "right": 2},
                        {"leaf": 0.4},
                        {"leaf": 0.1}
                    ]}
                ]
            }
        })
        .to_string(),
    )
    .unwrap();

    let service = PredictionService::new(Arc::new(ModelPackage::load(&path).unwrap()));

    // young cafe: (0.6 + 0.4) / 2
    let young = service
        .predict_fields(&payload(json!({"업종": "카페", "운영기간": 6})))
        .unwrap();
    assert!((young.probability - 0.5).abs() < 1e-12);
    assert_eq!(young.tier, RiskTier::High);

    // established restaurant: (0.02 + 0.1) / 2
    let established = service
        .predict_fields(&payload(json!({"업종": "한식", "운영기간": 60})))
        .unwrap();
    assert!((established.probability - 0.06).abs() < 1e-12);
    assert_eq!(established.tier, RiskTier::Low);

    let options = service.options();
    assert_eq!(options.feature_cols, vec!["업종", "운영기간"]);
    assert_eq!(options.options.len(), 1);
}

#[test]
fn test_non_finite_numeric_input_is_rejected_before_inference() {
    let model = Arc::new(MockModel::new(0.5, 4));
    let service = service_with(model.clone());

    for bad in ["NaN", "inf", "1e400"] {
        let raw = payload(json!({"업종": "카페", "운영기간": bad, "지역": "서울", "상권": "골목"}));
        let err = service.predict_fields(&raw).unwrap_err();
        assert!(
            matches!(err, Error::NotNumeric { ref field, .. } if field == "운영기간"),
            "{bad}: {err:?}"
        );
        assert!(err.is_client_error());
    }
    assert_eq!(model.call_count(), 0);
}

#[test]
fn test_invalid_classifier_output_is_internal_error() {
    for probability in [f64::NAN, 1.5, -0.2] {
        let service = service_with(Arc::new(MockModel::new(probability, 4)));
        let err = service.predict_fields(&valid_payload()).unwrap_err();
        assert!(matches!(err, Error::Internal(_)), "{probability}: {err:?}");
    }
}

#[test]
fn test_artifact_with_out_of_range_leaf_fails_to_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    std::fs::write(
        &path,
        json!({
            "feature_cols": ["운영기간"],
            "model": {"type": "forest", "n_features": 1, "trees": [{"nodes": [{"leaf": 1.7}]}]}
        })
        .to_string(),
    )
    .unwrap();

    assert!(matches!(ModelPackage::load(&path), Err(Error::Config(_))));
}
