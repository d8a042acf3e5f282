//! Fitted categorical encoders

use closurecast_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Maps a finite set of known string values to integer codes.
///
/// The code of a value is its position in the class list, so the class list
/// must be kept in the order the encoder was fitted with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct CategoricalEncoder {
    classes: Vec<String>,
    codes: HashMap<String, usize>,
}

impl CategoricalEncoder {
    /// Create an encoder from fitted classes. Repeated classes keep their first code.
    pub fn new<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ordered = Vec::new();
        let mut codes = HashMap::new();

        for class in classes {
            let class = class.into();
            if !codes.contains_key(&class) {
                codes.insert(class.clone(), ordered.len());
                ordered.push(class);
            }
        }

        Self {
            classes: ordered,
            codes,
        }
    }

    /// Known values in code order
    pub fn known_values(&self) -> &[String] {
        &self.classes
    }

    pub fn contains(&self, value: &str) -> bool {
        self.codes.contains_key(value)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Integer code for `value`, or `InvalidCategory` naming `field`
    pub fn encode(&self, field: &str, value: &str) -> Result<usize> {
        self.codes
            .get(value)
            .copied()
            .ok_or_else(|| Error::invalid_category(field, value))
    }
}

impl From<Vec<String>> for CategoricalEncoder {
    fn from(classes: Vec<String>) -> Self {
        Self::new(classes)
    }
}

impl From<CategoricalEncoder> for Vec<String> {
    fn from(encoder: CategoricalEncoder) -> Self {
        encoder.classes
    }
}
