use loan_risk::config::AppConfig;
use loan_risk::error::AppError;
use loan_risk::prediction::LoanRiskService;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// CLI flag first, then `LOAN_MODEL_PATH`.
pub(crate) fn resolve_model_path(flag: Option<PathBuf>, config: &AppConfig) -> PathBuf {
    flag.unwrap_or_else(|| config.model.artifact_path.clone())
}

/// Load the classifier once; the returned handle is shared read-only.
pub(crate) fn load_service(path: &Path) -> Result<Arc<LoanRiskService>, AppError> {
    let service = LoanRiskService::from_artifact_path(path)?;
    Ok(Arc::new(service))
}
