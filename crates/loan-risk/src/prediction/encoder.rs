use serde::{Deserialize, Serialize};

use super::domain::{InputField, LoanApplication};
use super::schema::{FeatureSchema, FeatureSource};

/// Raised when operator input cannot be mapped onto the model's encoding.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EncodingError {
    #[error("unknown {} '{value}'", .field.label().to_lowercase())]
    UnknownCategory { field: InputField, value: String },
    #[error("{} must be between {min} and {max} (found {value})", .field.label())]
    OutOfRange {
        field: InputField,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl EncodingError {
    pub fn field(&self) -> InputField {
        match self {
            EncodingError::UnknownCategory { field, .. } | EncodingError::OutOfRange { field, .. } => {
                *field
            }
        }
    }
}

/// Numeric model input laid out in schema order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

/// Pure mapping from a submitted application to the model's input vector.
#[derive(Debug, Clone, Default)]
pub struct FeatureEncoder {
    schema: FeatureSchema,
}

impl FeatureEncoder {
    pub fn new(schema: FeatureSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Category codes come from the typed enums, so an application that made it
    /// past label parsing always encodes; range checks are the caller's job.
    pub fn encode(&self, application: &LoanApplication) -> FeatureVector {
        let values = self
            .schema
            .features()
            .iter()
            .map(|spec| match spec.source {
                FeatureSource::Collected { field } => application.raw_value(field),
                FeatureSource::Placeholder { default } => default,
            })
            .collect();

        FeatureVector(values)
    }
}
