use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::encoder::FeatureVector;
use super::model::{Classifier, ModelError};
use super::schema::FeatureSchema;

/// Binary class emitted by the loan model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLabel {
    /// Class 0: loan likely to be repaid.
    Repaid,
    /// Class 1: loan likely to default.
    Default,
}

impl RiskLabel {
    pub fn class(self) -> u8 {
        match self {
            RiskLabel::Repaid => 0,
            RiskLabel::Default => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub label: RiskLabel,
}

/// Runtime fault raised while scoring a single vector.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InferenceError {
    #[error("model expects {expected} features but received {found}")]
    ShapeMismatch { expected: usize, found: usize },
    #[error("feature {index} is not a finite number")]
    NonFinite { index: usize },
    #[error("model fault: {0}")]
    Model(String),
}

/// Holds the loaded classifier and guards every call into it.
#[derive(Clone)]
pub struct InferenceInvoker {
    classifier: Arc<dyn Classifier>,
}

impl InferenceInvoker {
    /// Refuse to start when the artifact was trained on a different layout.
    pub fn new(classifier: Arc<dyn Classifier>, schema: &FeatureSchema) -> Result<Self, ModelError> {
        if classifier.input_width() != schema.len() {
            return Err(ModelError::WidthMismatch {
                schema: schema.len(),
                artifact: classifier.input_width(),
            });
        }

        if let Some(artifact_names) = classifier.feature_names() {
            if artifact_names.len() != schema.len() {
                return Err(ModelError::WidthMismatch {
                    schema: schema.len(),
                    artifact: artifact_names.len(),
                });
            }

            for (index, (expected, found)) in schema
                .names()
                .into_iter()
                .zip(artifact_names.iter())
                .enumerate()
            {
                if expected != found.as_str() {
                    return Err(ModelError::FeatureNameMismatch {
                        index,
                        schema: expected.to_string(),
                        artifact: found.clone(),
                    });
                }
            }
        }

        Ok(Self { classifier })
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    pub fn input_width(&self) -> usize {
        self.classifier.input_width()
    }

    pub fn invoke(&self, features: &FeatureVector) -> Result<PredictionResult, InferenceError> {
        let expected = self.classifier.input_width();
        if features.len() != expected {
            return Err(InferenceError::ShapeMismatch {
                expected,
                found: features.len(),
            });
        }

        if let Some(index) = features.as_slice().iter().position(|value| !value.is_finite()) {
            return Err(InferenceError::NonFinite { index });
        }

        let label = self.classifier.predict(features.as_slice())?;
        Ok(PredictionResult { label })
    }
}

impl std::fmt::Debug for InferenceInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceInvoker")
            .field("classifier", &self.classifier.name())
            .field("input_width", &self.classifier.input_width())
            .finish()
    }
}
