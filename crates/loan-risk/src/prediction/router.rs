use std::sync::Arc;

use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Serialize;
use serde_json::json;

use super::domain::LoanApplicationRequest;
use super::form::{render_error_page, render_form_page, render_result_page};
use super::schema::FeatureSpec;
use super::service::{LoanRiskService, PredictionServiceError};

#[derive(Debug, Serialize)]
pub(crate) struct SchemaView<'a> {
    pub(crate) model: &'a str,
    pub(crate) width: usize,
    pub(crate) features: &'a [FeatureSpec],
}

/// Router exposing the loan form and the JSON prediction API.
pub fn prediction_router(service: Arc<LoanRiskService>) -> Router {
    Router::new()
        .route("/", get(form_handler))
        .route("/predict", post(form_submit_handler))
        .route("/api/v1/loan/predict", post(predict_handler))
        .route("/api/v1/loan/schema", get(schema_handler))
        .with_state(service)
}

pub(crate) async fn form_handler() -> Html<String> {
    Html(render_form_page(&LoanApplicationRequest::default()))
}

pub(crate) async fn form_submit_handler(
    State(service): State<Arc<LoanRiskService>>,
    submission: Result<Form<LoanApplicationRequest>, FormRejection>,
) -> Response {
    let request = match submission {
        Ok(Form(request)) => request,
        Err(rejection) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Html(render_error_page(
                    "Invalid input",
                    &rejection.body_text(),
                    &LoanApplicationRequest::default(),
                )),
            )
                .into_response();
        }
    };

    match service.assess_request(request.clone()) {
        Ok(assessment) => Html(render_result_page(&assessment)).into_response(),
        Err(PredictionServiceError::Encoding(error)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Html(render_error_page(
                "Invalid input",
                &error.to_string(),
                &request,
            )),
        )
            .into_response(),
        Err(PredictionServiceError::Inference(error)) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Html(render_error_page(
                "Prediction unavailable",
                &error.to_string(),
                &request,
            )),
        )
            .into_response(),
    }
}

pub(crate) async fn predict_handler(
    State(service): State<Arc<LoanRiskService>>,
    payload: Result<Json<LoanApplicationRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let payload = json!({
                "error": rejection.body_text(),
            });
            return (rejection.status(), Json(payload)).into_response();
        }
    };

    match service.assess_request(request) {
        Ok(assessment) => (StatusCode::OK, Json(assessment)).into_response(),
        Err(PredictionServiceError::Encoding(error)) => {
            let payload = json!({
                "error": error.to_string(),
                "field": error.field().name(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::SERVICE_UNAVAILABLE, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn schema_handler(State(service): State<Arc<LoanRiskService>>) -> Response {
    let schema = service.schema();
    let view = SchemaView {
        model: service.model_name(),
        width: schema.len(),
        features: schema.features(),
    };
    (StatusCode::OK, Json(view)).into_response()
}
