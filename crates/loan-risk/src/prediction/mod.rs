//! Loan default prediction: typed form records, the feature schema the model
//! was trained on, and the guarded call into the loaded classifier.

pub mod domain;
pub mod encoder;
pub mod form;
pub mod invoker;
pub mod model;
pub mod router;
pub mod schema;
pub mod service;
pub mod verdict;

#[cfg(test)]
mod tests;

pub use domain::{
    ApplicantRecord, Categorical, EmploymentStatus, FinancialRecord, InputField, LoanApplication,
    LoanApplicationRequest, LoanDuration, LoanHistory, LoanRecord,
};
pub use encoder::{EncodingError, FeatureEncoder, FeatureVector};
pub use invoker::{InferenceError, InferenceInvoker, PredictionResult, RiskLabel};
pub use model::{
    Classifier, DecisionTree, LogisticRegression, ModelArtifact, ModelError, ModelKind,
    TreeEnsemble,
};
pub use router::prediction_router;
pub use schema::{FeatureSchema, FeatureSource, FeatureSpec, SchemaError, PLACEHOLDER_COUNT};
pub use service::{AssessmentStage, LoanRiskService, PredictionServiceError, RiskAssessment};
pub use verdict::{RiskLevel, RiskVerdict};
