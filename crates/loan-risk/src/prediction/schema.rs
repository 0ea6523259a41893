use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::domain::InputField;

/// Features the trained model expects but the form never collects.
pub const PLACEHOLDER_COUNT: usize = 12;

/// Where a feature's value comes from at encoding time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum FeatureSource {
    Collected { field: InputField },
    Placeholder { default: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub name: String,
    #[serde(flatten)]
    pub source: FeatureSource,
}

impl FeatureSpec {
    pub fn collected(field: InputField) -> Self {
        Self {
            name: field.name().to_string(),
            source: FeatureSource::Collected { field },
        }
    }

    pub fn placeholder(name: impl Into<String>, default: f64) -> Self {
        Self {
            name: name.into(),
            source: FeatureSource::Placeholder { default },
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SchemaError {
    #[error("feature schema must declare at least one feature")]
    Empty,
    #[error("feature '{0}' is declared more than once")]
    DuplicateName(String),
    #[error("form field '{}' feeds more than one feature", .0.name())]
    DuplicateField(InputField),
    #[error("placeholder '{name}' has a non-finite default")]
    NonFiniteDefault { name: String },
}

/// Ordered declaration of the model's input vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureSchema {
    features: Vec<FeatureSpec>,
}

impl FeatureSchema {
    pub fn new(features: Vec<FeatureSpec>) -> Result<Self, SchemaError> {
        if features.is_empty() {
            return Err(SchemaError::Empty);
        }

        validate_specs(&features)?;
        Ok(Self { features })
    }

    /// The 22-wide layout the loan model was trained on: ten form fields in
    /// form order followed by zero-valued placeholders.
    pub fn standard() -> Self {
        let mut features: Vec<FeatureSpec> = InputField::ALL
            .iter()
            .map(|field| FeatureSpec::collected(*field))
            .collect();
        features.extend(
            (1..=PLACEHOLDER_COUNT)
                .map(|index| FeatureSpec::placeholder(format!("placeholder_{index:02}"), 0.0)),
        );

        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn features(&self) -> &[FeatureSpec] {
        &self.features
    }

    pub fn names(&self) -> Vec<&str> {
        self.features.iter().map(|spec| spec.name.as_str()).collect()
    }

    pub fn position_of(&self, field: InputField) -> Option<usize> {
        self.features.iter().position(|spec| {
            matches!(spec.source, FeatureSource::Collected { field: collected } if collected == field)
        })
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::standard()
    }
}

fn validate_specs(features: &[FeatureSpec]) -> Result<(), SchemaError> {
    let mut names = HashSet::new();
    let mut fields = HashSet::new();
    for spec in features {
        if !names.insert(spec.name.as_str()) {
            return Err(SchemaError::DuplicateName(spec.name.clone()));
        }
        match spec.source {
            FeatureSource::Collected { field } => {
                if !fields.insert(field) {
                    return Err(SchemaError::DuplicateField(field));
                }
            }
            FeatureSource::Placeholder { default } if !default.is_finite() => {
                return Err(SchemaError::NonFiniteDefault {
                    name: spec.name.clone(),
                });
            }
            FeatureSource::Placeholder { .. } => {}
        }
    }
    Ok(())
}
