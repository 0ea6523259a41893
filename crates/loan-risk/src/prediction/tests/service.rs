use std::sync::Arc;

use super::common::*;
use crate::prediction::encoder::EncodingError;
use crate::prediction::invoker::{InferenceError, RiskLabel};
use crate::prediction::model::{DecisionTree, ModelArtifact, ModelKind, TreeEnsemble};
use crate::prediction::schema::FeatureSchema;
use crate::prediction::service::{LoanRiskService, PredictionServiceError};
use crate::prediction::verdict::RiskLevel;
use crate::prediction::InputField;

#[test]
fn assess_returns_verdict_and_features() {
    let service = stub_service(RiskLabel::Default);

    let assessment = service
        .assess(sample_application())
        .expect("assessment succeeds");

    assert_eq!(assessment.model, "stub");
    assert_eq!(assessment.label, RiskLabel::Default);
    assert_eq!(assessment.class, 1);
    assert_eq!(assessment.verdict.level, RiskLevel::High);
    assert_eq!(assessment.features.len(), STANDARD_WIDTH);
    assert_eq!(assessment.application, sample_application());
}

#[test]
fn assess_request_parses_labels_before_encoding() {
    let service = stub_service(RiskLabel::Repaid);
    let mut request = sample_request();
    request.loan_duration = "5 years".to_string();

    let assessment = service.assess_request(request).expect("assessment succeeds");

    assert_eq!(assessment.features.get(5), Some(3.0));
    assert_eq!(assessment.verdict.level, RiskLevel::Low);
}

#[test]
fn out_of_range_input_never_reaches_the_classifier() {
    let classifier = Arc::new(RecordingClassifier::default());
    let service = LoanRiskService::new(classifier.clone()).expect("width matches");
    let mut application = sample_application();
    application.applicant.credit_score = 250;

    let err = service.assess(application).expect_err("credit score too low");

    match err {
        PredictionServiceError::Encoding(EncodingError::OutOfRange { field, .. }) => {
            assert_eq!(field, InputField::CreditScore);
        }
        other => panic!("expected range error, got {other:?}"),
    }
    assert!(classifier
        .seen
        .lock()
        .expect("recording mutex poisoned")
        .is_empty());
}

#[test]
fn unknown_label_is_an_encoding_error() {
    let service = stub_service(RiskLabel::Repaid);
    let mut request = sample_request();
    request.employment_status = "Retired".to_string();

    let err = service.assess_request(request).expect_err("unknown label");

    assert!(matches!(
        err,
        PredictionServiceError::Encoding(EncodingError::UnknownCategory { .. })
    ));
}

#[test]
fn classifier_fault_reports_prediction_unavailable() {
    let service = LoanRiskService::new(Arc::new(FaultyClassifier)).expect("width matches");

    let err = service
        .assess(sample_application())
        .expect_err("fault surfaces");

    assert!(matches!(
        err,
        PredictionServiceError::Inference(InferenceError::Model(_))
    ));
    assert_eq!(
        err.to_string(),
        "prediction unavailable: model fault: incompatible artifact version"
    );
}

#[test]
fn service_exposes_schema_and_model_name() {
    let service = stub_service(RiskLabel::Repaid);

    assert_eq!(service.model_name(), "stub");
    assert_eq!(service.schema().len(), STANDARD_WIDTH);
}

#[test]
fn successful_assessment_walks_every_stage_back_to_idle() {
    let service = stub_service(RiskLabel::Repaid);

    let (outcome, logs) = capture_logs(|| service.assess(sample_application()));

    assert!(outcome.is_ok());
    assert_eq!(
        stage_transitions(&logs),
        vec![
            "from=idle to=encoding",
            "from=encoding to=invoking",
            "from=invoking to=result_displayed",
            "from=result_displayed to=idle",
        ]
    );
}

#[test]
fn failed_assessments_return_to_idle() {
    let service = LoanRiskService::new(Arc::new(FaultyClassifier)).expect("width matches");
    let (outcome, logs) = capture_logs(|| service.assess(sample_application()));
    assert!(outcome.is_err());
    assert_eq!(
        stage_transitions(&logs),
        vec![
            "from=idle to=encoding",
            "from=encoding to=invoking",
            "from=invoking to=idle",
        ]
    );

    let mut application = sample_application();
    application.applicant.age = 12;
    let (outcome, logs) = capture_logs(|| service.assess(application));
    assert!(outcome.is_err());
    assert_eq!(
        stage_transitions(&logs),
        vec!["from=idle to=encoding", "from=encoding to=idle"]
    );
}

#[test]
fn unvalidated_artifact_fault_reaches_caller_as_inference_error() {
    let artifact = ModelArtifact {
        name: "hand-built".to_string(),
        feature_names: FeatureSchema::standard()
            .names()
            .into_iter()
            .map(str::to_string)
            .collect(),
        model: ModelKind::TreeEnsemble(TreeEnsemble {
            trees: vec![DecisionTree {
                children_left: vec![5],
                children_right: vec![6],
                feature: vec![3],
                threshold: vec![650.0],
                value: vec![0.5],
            }],
        }),
    };
    let service = LoanRiskService::new(Arc::new(artifact)).expect("names match schema");

    let err = service
        .assess(sample_application())
        .expect_err("broken tree");

    assert!(matches!(
        err,
        PredictionServiceError::Inference(InferenceError::Model(_))
    ));
    assert!(err.to_string().starts_with("prediction unavailable"));
}
