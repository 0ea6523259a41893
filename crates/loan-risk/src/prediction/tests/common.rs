use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::prediction::domain::{
    ApplicantRecord, EmploymentStatus, FinancialRecord, LoanApplication, LoanDuration,
    LoanHistory, LoanRecord,
};
use crate::prediction::invoker::{InferenceError, RiskLabel};
use crate::prediction::model::Classifier;
use crate::prediction::schema::FeatureSchema;
use crate::prediction::{prediction_router, LoanApplicationRequest, LoanRiskService};

pub(super) const STANDARD_WIDTH: usize = 22;

/// Reference applicant used across the encoding scenarios.
pub(super) fn sample_application() -> LoanApplication {
    LoanApplication {
        applicant: ApplicantRecord {
            age: 30,
            monthly_income: 30_000,
            employment_status: EmploymentStatus::Salaried,
            credit_score: 700,
        },
        loan: LoanRecord {
            loan_amount: 500_000,
            loan_duration: LoanDuration::OneYear,
            interest_rate: 7.5,
            previous_loans: LoanHistory::NoPreviousLoans,
        },
        financial: FinancialRecord {
            total_debt: 50_000,
            savings: 100_000,
        },
    }
}

pub(super) fn sample_request() -> LoanApplicationRequest {
    LoanApplicationRequest::from(&sample_application())
}

/// Classifier that always answers with the same label.
pub(super) struct StubClassifier {
    pub(super) label: RiskLabel,
    pub(super) width: usize,
}

impl StubClassifier {
    pub(super) fn standard(label: RiskLabel) -> Self {
        Self {
            label,
            width: STANDARD_WIDTH,
        }
    }
}

impl Classifier for StubClassifier {
    fn name(&self) -> &str {
        "stub"
    }

    fn input_width(&self) -> usize {
        self.width
    }

    fn predict(&self, _features: &[f64]) -> Result<RiskLabel, InferenceError> {
        Ok(self.label)
    }
}

/// Classifier that keeps every vector it was asked to score.
#[derive(Default)]
pub(super) struct RecordingClassifier {
    pub(super) seen: Mutex<Vec<Vec<f64>>>,
}

impl Classifier for RecordingClassifier {
    fn name(&self) -> &str {
        "recording"
    }

    fn input_width(&self) -> usize {
        STANDARD_WIDTH
    }

    fn predict(&self, features: &[f64]) -> Result<RiskLabel, InferenceError> {
        self.seen
            .lock()
            .expect("recording mutex poisoned")
            .push(features.to_vec());
        Ok(RiskLabel::Repaid)
    }
}

/// Classifier that simulates an incompatible artifact at call time.
pub(super) struct FaultyClassifier;

impl Classifier for FaultyClassifier {
    fn name(&self) -> &str {
        "faulty"
    }

    fn input_width(&self) -> usize {
        STANDARD_WIDTH
    }

    fn predict(&self, _features: &[f64]) -> Result<RiskLabel, InferenceError> {
        Err(InferenceError::Model("incompatible artifact version".to_string()))
    }
}

/// Classifier that records names from a different training run.
pub(super) struct RenamedClassifier {
    pub(super) names: Vec<String>,
}

impl RenamedClassifier {
    pub(super) fn swapping(first: usize, second: usize) -> Self {
        let mut names: Vec<String> = FeatureSchema::standard()
            .names()
            .into_iter()
            .map(str::to_string)
            .collect();
        names.swap(first, second);
        Self { names }
    }
}

impl Classifier for RenamedClassifier {
    fn name(&self) -> &str {
        "renamed"
    }

    fn input_width(&self) -> usize {
        self.names.len()
    }

    fn feature_names(&self) -> Option<&[String]> {
        Some(&self.names)
    }

    fn predict(&self, _features: &[f64]) -> Result<RiskLabel, InferenceError> {
        Ok(RiskLabel::Repaid)
    }
}

pub(super) fn stub_service(label: RiskLabel) -> LoanRiskService {
    LoanRiskService::new(Arc::new(StubClassifier::standard(label))).expect("stub matches schema")
}

pub(super) fn router_with_service(service: LoanRiskService) -> axum::Router {
    prediction_router(Arc::new(service))
}

pub(super) async fn read_body(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body")
        .to_vec()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = read_body(response).await;
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = read_body(response).await;
    String::from_utf8(body).expect("utf-8 body")
}

/// Log sink shared with a thread-local fmt subscriber.
#[derive(Clone, Default)]
pub(super) struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0
            .lock()
            .expect("log buffer poisoned")
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

pub(super) fn capture_logs<T>(run: impl FnOnce() -> T) -> (T, String) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .without_time()
        .with_writer(move || writer.clone())
        .finish();

    let value = tracing::subscriber::with_default(subscriber, run);
    let bytes = logs.0.lock().expect("log buffer poisoned").clone();
    (value, String::from_utf8(bytes).expect("utf-8 logs"))
}

/// `from=.. to=..` pairs of every logged stage transition, in order.
pub(super) fn stage_transitions(logs: &str) -> Vec<String> {
    logs.lines()
        .filter(|line| line.contains("assessment stage"))
        .filter_map(|line| line.find("from=").map(|at| line[at..].trim().to_string()))
        .collect()
}
