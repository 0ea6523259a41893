use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::invoker::{InferenceError, RiskLabel};

/// Seam between the service and whatever scores a feature vector.
pub trait Classifier: Send + Sync {
    fn name(&self) -> &str;

    /// Number of features the model was trained on.
    fn input_width(&self) -> usize;

    /// Training-time feature names, when the artifact records them.
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    fn predict(&self, features: &[f64]) -> Result<RiskLabel, InferenceError>;
}

/// Startup failures: the model cannot serve a single prediction.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("failed to read model artifact {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("model artifact {} is not valid JSON", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("model artifact is invalid: {0}")]
    Invalid(String),
    #[error("feature schema declares {schema} features but the model expects {artifact}")]
    WidthMismatch { schema: usize, artifact: usize },
    #[error("feature {index} is '{schema}' in the schema but '{artifact}' in the model")]
    FeatureNameMismatch {
        index: usize,
        schema: String,
        artifact: String,
    },
}

const DEFAULT_THRESHOLD: f64 = 0.5;

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

/// Serialized classifier exported from the training pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub name: String,
    pub feature_names: Vec<String>,
    pub model: ModelKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelKind {
    LogisticRegression(LogisticRegression),
    TreeEnsemble(TreeEnsemble),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl LogisticRegression {
    pub fn probability(&self, features: &[f64]) -> f64 {
        let margin = self
            .coefficients
            .iter()
            .zip(features)
            .map(|(weight, value)| weight * value)
            .sum::<f64>()
            + self.intercept;
        1.0 / (1.0 + (-margin).exp())
    }
}

/// Averaged probability vote across decision trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    pub trees: Vec<DecisionTree>,
}

impl TreeEnsemble {
    pub fn probability(&self, features: &[f64]) -> Result<f64, String> {
        if self.trees.is_empty() {
            return Err("tree ensemble has no trees".to_string());
        }
        let mut total = 0.0;
        for (index, tree) in self.trees.iter().enumerate() {
            total += tree
                .leaf_value(features)
                .map_err(|reason| format!("tree {index}: {reason}"))?;
        }
        Ok(total / self.trees.len() as f64)
    }
}

/// Flat node table; `children_left[i] == -1` marks a leaf whose `value` is the
/// probability of class 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<f64>,
}

const LEAF: i64 = -1;

impl DecisionTree {
    /// Walks from the root. Every index is bounds-checked and the walk is
    /// capped at one visit per node, so an artifact that skipped `validate`
    /// fails instead of panicking or looping.
    pub fn leaf_value(&self, features: &[f64]) -> Result<f64, String> {
        let mut node = 0usize;
        for _ in 0..self.children_left.len() {
            let left = *self
                .children_left
                .get(node)
                .ok_or_else(|| format!("node {node} does not exist"))?;
            if left == LEAF {
                return self
                    .value
                    .get(node)
                    .copied()
                    .ok_or_else(|| format!("leaf {node} has no value"));
            }

            let feature = self
                .feature
                .get(node)
                .and_then(|feature| usize::try_from(*feature).ok())
                .and_then(|feature| features.get(feature))
                .ok_or_else(|| format!("node {node} splits on an unknown feature"))?;
            let threshold = self
                .threshold
                .get(node)
                .ok_or_else(|| format!("node {node} has no threshold"))?;
            let next = if feature <= threshold {
                left
            } else {
                *self
                    .children_right
                    .get(node)
                    .ok_or_else(|| format!("node {node} has no right child"))?
            };
            node = usize::try_from(next).map_err(|_| format!("node {node} has a negative child"))?;
        }
        Err("walk did not reach a leaf".to_string())
    }

    fn validate(&self, width: usize) -> Result<(), String> {
        let nodes = self.children_left.len();
        if nodes == 0 {
            return Err("decision tree has no nodes".to_string());
        }
        if [
            self.children_right.len(),
            self.feature.len(),
            self.threshold.len(),
            self.value.len(),
        ]
        .iter()
        .any(|len| *len != nodes)
        {
            return Err("decision tree node arrays differ in length".to_string());
        }

        for node in 0..nodes {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left == LEAF {
                if right != LEAF {
                    return Err(format!("leaf {node} has a right child"));
                }
                if !(0.0..=1.0).contains(&self.value[node]) {
                    return Err(format!("leaf {node} value is not a probability"));
                }
                continue;
            }

            let in_order = |child: i64| child > node as i64 && (child as usize) < nodes;
            if !in_order(left) || !in_order(right) {
                return Err(format!("node {node} has out-of-order children"));
            }
            let feature = self.feature[node];
            if feature < 0 || feature as usize >= width {
                return Err(format!("node {node} splits on unknown feature {feature}"));
            }
            if !self.threshold[node].is_finite() {
                return Err(format!("node {node} has a non-finite threshold"));
            }
        }

        Ok(())
    }
}

impl ModelArtifact {
    /// Read, parse and validate an artifact from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact: Self = serde_json::from_str(&raw).map_err(|source| ModelError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        let width = self.feature_names.len();
        if width == 0 {
            return Err(ModelError::Invalid("no feature names declared".to_string()));
        }

        match &self.model {
            ModelKind::LogisticRegression(model) => {
                if model.coefficients.len() != width {
                    return Err(ModelError::Invalid(format!(
                        "{} coefficients for {} features",
                        model.coefficients.len(),
                        width
                    )));
                }
                let finite = model.coefficients.iter().all(|value| value.is_finite())
                    && model.intercept.is_finite();
                if !finite {
                    return Err(ModelError::Invalid(
                        "coefficients must be finite".to_string(),
                    ));
                }
                if !(0.0..=1.0).contains(&model.threshold) {
                    return Err(ModelError::Invalid(format!(
                        "threshold {} outside [0, 1]",
                        model.threshold
                    )));
                }
            }
            ModelKind::TreeEnsemble(ensemble) => {
                if ensemble.trees.is_empty() {
                    return Err(ModelError::Invalid("tree ensemble has no trees".to_string()));
                }
                for (index, tree) in ensemble.trees.iter().enumerate() {
                    tree.validate(width)
                        .map_err(|reason| ModelError::Invalid(format!("tree {index}: {reason}")))?;
                }
            }
        }

        Ok(())
    }

    pub fn probability(&self, features: &[f64]) -> Result<f64, InferenceError> {
        match &self.model {
            ModelKind::LogisticRegression(model) => Ok(model.probability(features)),
            ModelKind::TreeEnsemble(ensemble) => ensemble
                .probability(features)
                .map_err(|reason| InferenceError::Model(format!("{}: {reason}", self.name))),
        }
    }

    fn threshold(&self) -> f64 {
        match &self.model {
            ModelKind::LogisticRegression(model) => model.threshold,
            ModelKind::TreeEnsemble(_) => DEFAULT_THRESHOLD,
        }
    }
}

impl Classifier for ModelArtifact {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_width(&self) -> usize {
        self.feature_names.len()
    }

    fn feature_names(&self) -> Option<&[String]> {
        Some(&self.feature_names)
    }

    fn predict(&self, features: &[f64]) -> Result<RiskLabel, InferenceError> {
        if features.len() != self.input_width() {
            return Err(InferenceError::ShapeMismatch {
                expected: self.input_width(),
                found: features.len(),
            });
        }

        let probability = self.probability(features)?;
        if !probability.is_finite() {
            return Err(InferenceError::Model(format!(
                "{} produced a non-finite probability",
                self.name
            )));
        }

        Ok(if probability >= self.threshold() {
            RiskLabel::Default
        } else {
            RiskLabel::Repaid
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_feature_tree() -> DecisionTree {
        DecisionTree {
            children_left: vec![1, -1, -1],
            children_right: vec![2, -1, -1],
            feature: vec![1, -2, -2],
            threshold: vec![1.5, -2.0, -2.0],
            value: vec![0.5, 0.1, 0.9],
        }
    }

    fn artifact(model: ModelKind) -> ModelArtifact {
        ModelArtifact {
            name: "unit".to_string(),
            feature_names: vec!["credit_score".to_string(), "previous_loans".to_string()],
            model,
        }
    }

    #[test]
    fn logistic_threshold_splits_labels() {
        let model = artifact(ModelKind::LogisticRegression(LogisticRegression {
            coefficients: vec![-0.01, 0.0],
            intercept: 6.5,
            threshold: 0.5,
        }));
        model.validate().expect("valid artifact");

        assert_eq!(model.predict(&[700.0, 0.0]), Ok(RiskLabel::Repaid));
        assert_eq!(model.predict(&[600.0, 0.0]), Ok(RiskLabel::Default));
    }

    #[test]
    fn tree_walks_to_the_matching_leaf() {
        let model = artifact(ModelKind::TreeEnsemble(TreeEnsemble {
            trees: vec![two_feature_tree()],
        }));
        model.validate().expect("valid artifact");

        assert_eq!(model.predict(&[650.0, 2.0]), Ok(RiskLabel::Default));
        assert_eq!(model.predict(&[650.0, 1.0]), Ok(RiskLabel::Repaid));
    }

    #[test]
    fn ensemble_averages_tree_votes() {
        let mut lenient = two_feature_tree();
        lenient.value = vec![0.5, 0.0, 0.0];
        let ensemble = TreeEnsemble {
            trees: vec![two_feature_tree(), lenient],
        };

        let probability = ensemble.probability(&[0.0, 2.0]).expect("valid trees");
        assert!((probability - 0.45).abs() < 1e-12);
    }

    #[test]
    fn rejects_cyclic_tree() {
        let mut tree = two_feature_tree();
        tree.children_right[0] = 0;
        let model = artifact(ModelKind::TreeEnsemble(TreeEnsemble { trees: vec![tree] }));

        let err = model.validate().expect_err("cycle rejected");
        assert!(err.to_string().contains("out-of-order children"));
    }

    #[test]
    fn rejects_split_on_missing_feature() {
        let mut tree = two_feature_tree();
        tree.feature[0] = 5;
        let model = artifact(ModelKind::TreeEnsemble(TreeEnsemble { trees: vec![tree] }));

        assert!(matches!(model.validate(), Err(ModelError::Invalid(_))));
    }

    #[test]
    fn rejects_coefficient_count_mismatch() {
        let model = artifact(ModelKind::LogisticRegression(LogisticRegression {
            coefficients: vec![0.1],
            intercept: 0.0,
            threshold: 0.5,
        }));

        let err = model.validate().expect_err("width mismatch");
        assert!(err.to_string().contains("1 coefficients for 2 features"));
    }

    #[test]
    fn predict_rejects_wrong_width() {
        let model = artifact(ModelKind::LogisticRegression(LogisticRegression {
            coefficients: vec![0.0, 0.0],
            intercept: 0.0,
            threshold: 0.5,
        }));

        assert_eq!(
            model.predict(&[1.0]),
            Err(InferenceError::ShapeMismatch {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn threshold_defaults_when_absent() {
        let raw = r#"{
            "name": "defaults",
            "feature_names": ["a"],
            "model": { "kind": "logistic_regression", "coefficients": [1.0], "intercept": 0.0 }
        }"#;
        let artifact: ModelArtifact = serde_json::from_str(raw).expect("artifact parses");

        match artifact.model {
            ModelKind::LogisticRegression(model) => assert_eq!(model.threshold, 0.5),
            other => panic!("expected logistic regression, got {other:?}"),
        }
    }

    #[test]
    fn unvalidated_tree_with_dangling_child_is_a_model_fault() {
        let mut tree = two_feature_tree();
        tree.children_left[0] = 5;
        let model = artifact(ModelKind::TreeEnsemble(TreeEnsemble { trees: vec![tree] }));

        let err = model.predict(&[650.0, 1.0]).expect_err("dangling child");
        assert!(matches!(err, InferenceError::Model(_)));
        assert!(err.to_string().contains("node 5 does not exist"));
    }

    #[test]
    fn unvalidated_self_loop_terminates() {
        let mut tree = two_feature_tree();
        tree.children_right[0] = 0;
        let model = artifact(ModelKind::TreeEnsemble(TreeEnsemble { trees: vec![tree] }));

        let err = model.predict(&[650.0, 2.0]).expect_err("cycle");
        assert!(err.to_string().contains("did not reach a leaf"));
    }

    #[test]
    fn empty_ensemble_is_a_model_fault() {
        let model = artifact(ModelKind::TreeEnsemble(TreeEnsemble { trees: Vec::new() }));

        assert!(matches!(
            model.predict(&[650.0, 2.0]),
            Err(InferenceError::Model(_))
        ));
    }
}
