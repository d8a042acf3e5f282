//! Feature schema and feature vector construction
//!
//! The schema is derived from a [`ModelPackage`] once at load time: an ordered
//! list of `(name, kind)` pairs where the kind is either categorical (with the
//! fitted encoder) or numeric. Building a vector is a single pass over that
//! list, failing on the first field that is missing or malformed.

use crate::encoder::CategoricalEncoder;
use crate::package::ModelPackage;
use closurecast_core::{Error, FeatureVector, Result};
use serde_json::Value;

/// Raw request payload: field name to submitted JSON value
pub type RawFields = serde_json::Map<String, Value>;

/// How a feature's raw value is turned into a number
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureKind {
    /// Encoded through a fitted encoder
    Categorical(CategoricalEncoder),

    /// Parsed as a floating-point number
    Numeric,
}

/// One position of the feature vector
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureField {
    pub name: String,
    pub kind: FeatureKind,
}

impl FeatureField {
    pub fn categorical(name: impl Into<String>, encoder: CategoricalEncoder) -> Self {
        Self {
            name: name.into(),
            kind: FeatureKind::Categorical(encoder),
        }
    }

    pub fn numeric(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FeatureKind::Numeric,
        }
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self.kind, FeatureKind::Categorical(_))
    }

    /// Convert a present, non-empty value into this field's numeric code
    fn convert(&self, value: &Value) -> Result<f64> {
        match &self.kind {
            FeatureKind::Categorical(encoder) => {
                let text = categorical_text(value)
                    .ok_or_else(|| Error::invalid_category(&self.name, value.to_string()))?;
                encoder.encode(&self.name, &text).map(|code| code as f64)
            }
            FeatureKind::Numeric => numeric_value(value)
                .ok_or_else(|| Error::not_numeric(&self.name, display_value(value))),
        }
    }
}

/// Converts raw payloads into fixed-order feature vectors
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVectorBuilder {
    fields: Vec<FeatureField>,
}

impl FeatureVectorBuilder {
    /// Create a builder over an explicit schema
    pub fn new(fields: Vec<FeatureField>) -> Self {
        Self { fields }
    }

    /// Derive the schema from a model package. Features without an encoder are numeric.
    pub fn from_package(package: &ModelPackage) -> Self {
        let fields = package
            .feature_order()
            .iter()
            .map(|name| match package.encoder(name) {
                Some(encoder) => FeatureField::categorical(name.clone(), encoder.clone()),
                None => FeatureField::numeric(name.clone()),
            })
            .collect();

        Self::new(fields)
    }

    pub fn fields(&self) -> &[FeatureField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Build a vector of exactly `self.len()` values, or the first field error
    /// in schema order.
    pub fn build(&self, raw: &RawFields) -> Result<FeatureVector> {
        let mut values = Vec::with_capacity(self.fields.len());

        for field in &self.fields {
            let value = raw
                .get(&field.name)
                .filter(|v| !is_blank(v))
                .ok_or_else(|| Error::missing_field(&field.name))?;

            values.push(field.convert(value)?);
        }

        Ok(FeatureVector::new(values))
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn categorical_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "True" } else { "False" }.to_string()),
        _ => None,
    }
}

/// NaN and infinities (including overflowing literals like `1e400`) are rejected
fn numeric_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
