use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::domain::{LoanApplication, LoanApplicationRequest};
use super::encoder::{EncodingError, FeatureEncoder, FeatureVector};
use super::invoker::{InferenceError, InferenceInvoker, RiskLabel};
use super::model::{Classifier, ModelArtifact, ModelError};
use super::schema::FeatureSchema;
use super::verdict::RiskVerdict;

/// Lifecycle of one submission; nothing survives past `ResultDisplayed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssessmentStage {
    Idle,
    Encoding,
    Invoking,
    ResultDisplayed,
}

impl AssessmentStage {
    pub fn label(self) -> &'static str {
        match self {
            AssessmentStage::Idle => "idle",
            AssessmentStage::Encoding => "encoding",
            AssessmentStage::Invoking => "invoking",
            AssessmentStage::ResultDisplayed => "result_displayed",
        }
    }
}

/// Everything the presentation layer needs to render a verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub model: String,
    pub label: RiskLabel,
    pub class: u8,
    pub verdict: RiskVerdict,
    pub application: LoanApplication,
    pub features: FeatureVector,
    pub evaluated_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum PredictionServiceError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error("prediction unavailable: {0}")]
    Inference(#[from] InferenceError),
}

/// Read-only facade built once at startup and shared across requests.
#[derive(Debug, Clone)]
pub struct LoanRiskService {
    encoder: FeatureEncoder,
    invoker: InferenceInvoker,
}

impl LoanRiskService {
    pub fn new(classifier: Arc<dyn Classifier>) -> Result<Self, ModelError> {
        Self::with_schema(FeatureSchema::standard(), classifier)
    }

    pub fn with_schema(
        schema: FeatureSchema,
        classifier: Arc<dyn Classifier>,
    ) -> Result<Self, ModelError> {
        let invoker = InferenceInvoker::new(classifier, &schema)?;
        Ok(Self {
            encoder: FeatureEncoder::new(schema),
            invoker,
        })
    }

    /// Load the artifact and run the schema check; any failure is fatal to startup.
    pub fn from_artifact_path(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let artifact = ModelArtifact::load(path)?;
        let service = Self::new(Arc::new(artifact))?;
        info!(
            model = service.model_name(),
            width = service.invoker.input_width(),
            path = %path.display(),
            "loan model loaded"
        );
        Ok(service)
    }

    pub fn schema(&self) -> &FeatureSchema {
        self.encoder.schema()
    }

    pub fn model_name(&self) -> &str {
        self.invoker.classifier_name()
    }

    pub fn assess_request(
        &self,
        request: LoanApplicationRequest,
    ) -> Result<RiskAssessment, PredictionServiceError> {
        let application = request.into_application()?;
        self.assess(application)
    }

    /// Every call starts and ends in `Idle`, whichever stage it fails in.
    pub fn assess(
        &self,
        application: LoanApplication,
    ) -> Result<RiskAssessment, PredictionServiceError> {
        let mut stage = AssessmentStage::Idle;
        let outcome = self.run_stages(application, &mut stage);
        advance(&mut stage, AssessmentStage::Idle);
        outcome
    }

    fn run_stages(
        &self,
        application: LoanApplication,
        stage: &mut AssessmentStage,
    ) -> Result<RiskAssessment, PredictionServiceError> {
        advance(stage, AssessmentStage::Encoding);
        application.validate()?;
        let features = self.encoder.encode(&application);

        advance(stage, AssessmentStage::Invoking);
        let result = self.invoker.invoke(&features).map_err(|err| {
            warn!(model = self.model_name(), error = %err, "loan prediction failed");
            err
        })?;

        advance(stage, AssessmentStage::ResultDisplayed);
        info!(
            model = self.model_name(),
            label = result.label.class(),
            "loan risk assessed"
        );

        Ok(RiskAssessment {
            model: self.model_name().to_string(),
            label: result.label,
            class: result.label.class(),
            verdict: RiskVerdict::from(result),
            application,
            features,
            evaluated_at: Utc::now(),
        })
    }
}

fn advance(stage: &mut AssessmentStage, to: AssessmentStage) {
    debug!(from = %stage.label(), to = %to.label(), "assessment stage");
    *stage = to;
}
