use crate::infra::{load_service, resolve_model_path};
use clap::Args;
use loan_risk::config::AppConfig;
use loan_risk::error::AppError;
use loan_risk::prediction::{
    FeatureSchema, FeatureSource, LoanApplicationRequest, LoanRiskService, RiskAssessment,
    RiskLevel,
};
use loan_risk::telemetry;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct PredictArgs {
    /// Applicant age in years (18-70)
    #[arg(long, default_value_t = 30)]
    pub(crate) age: u32,
    /// Monthly income (1,000-1,000,000)
    #[arg(long, default_value_t = 30_000)]
    pub(crate) monthly_income: u32,
    /// Salaried, Self-Employed or Unemployed
    #[arg(long, default_value = "Salaried")]
    pub(crate) employment_status: String,
    /// Credit score (300-900)
    #[arg(long, default_value_t = 700)]
    pub(crate) credit_score: u32,
    /// Requested loan amount (5,000-5,000,000)
    #[arg(long, default_value_t = 500_000)]
    pub(crate) loan_amount: u32,
    /// 6 months, 1 year, 3 years, 5 years or 10 years
    #[arg(long, default_value = "6 months")]
    pub(crate) loan_duration: String,
    /// Interest rate in percent (1.0-20.0)
    #[arg(long, default_value_t = 7.5)]
    pub(crate) interest_rate: f64,
    /// No Previous Loans, Paid on Time or Missed Payments
    #[arg(long, default_value = "No Previous Loans")]
    pub(crate) previous_loans: String,
    /// Total outstanding debt
    #[arg(long, default_value_t = 50_000)]
    pub(crate) total_debt: u32,
    /// Savings balance
    #[arg(long, default_value_t = 100_000)]
    pub(crate) savings: u32,
    /// Override LOAN_MODEL_PATH
    #[arg(long)]
    pub(crate) model: Option<PathBuf>,
    /// Print the full assessment as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

impl PredictArgs {
    fn request(&self) -> LoanApplicationRequest {
        LoanApplicationRequest {
            age: self.age,
            monthly_income: self.monthly_income,
            employment_status: self.employment_status.clone(),
            credit_score: self.credit_score,
            loan_amount: self.loan_amount,
            loan_duration: self.loan_duration.clone(),
            interest_rate: self.interest_rate,
            previous_loans: self.previous_loans.clone(),
            total_debt: self.total_debt,
            savings: self.savings,
        }
    }
}

#[derive(Args, Debug, Default)]
pub(crate) struct CheckModelArgs {
    /// Override LOAN_MODEL_PATH
    #[arg(long)]
    pub(crate) model: Option<PathBuf>,
}

/// Config, telemetry and model load shared by the one-shot commands.
fn prepare(model: Option<PathBuf>) -> Result<(PathBuf, Arc<LoanRiskService>), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    let path = resolve_model_path(model, &config);
    let service = load_service(&path)?;
    Ok((path, service))
}

pub(crate) fn run_predict(mut args: PredictArgs) -> Result<(), AppError> {
    let (_, service) = prepare(args.model.take())?;

    let assessment = service.assess_request(args.request())?;
    if args.json {
        let rendered = serde_json::to_string_pretty(&assessment)
            .map_err(|err| AppError::Io(err.into()))?;
        println!("{rendered}");
    } else {
        print!("{}", render_assessment(&assessment));
    }

    Ok(())
}

pub(crate) fn run_schema() -> Result<(), AppError> {
    print!("{}", render_schema(&FeatureSchema::standard()));
    Ok(())
}

pub(crate) fn run_check_model(args: CheckModelArgs) -> Result<(), AppError> {
    let (path, service) = prepare(args.model)?;

    println!(
        "Model '{}' at {} matches the {}-feature schema",
        service.model_name(),
        path.display(),
        service.schema().len()
    );
    Ok(())
}

fn render_assessment(assessment: &RiskAssessment) -> String {
    let mut out = String::new();
    let marker = match assessment.verdict.level {
        RiskLevel::Low => "LOW RISK",
        RiskLevel::High => "HIGH RISK",
    };
    let _ = writeln!(out, "Loan default prediction ({})", assessment.model);
    let _ = writeln!(out, "[{marker}] {}", assessment.verdict.headline);
    let filled = usize::from(assessment.verdict.gauge_percent) / 5;
    let _ = writeln!(
        out,
        "Risk gauge: [{}{}] {}%",
        "#".repeat(filled),
        "-".repeat(20 - filled),
        assessment.verdict.gauge_percent
    );
    out
}

fn render_schema(schema: &FeatureSchema) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Feature layout ({} features)", schema.len());
    for (index, spec) in schema.features().iter().enumerate() {
        let source = match spec.source {
            FeatureSource::Collected { field } => format!("form field: {}", field.label()),
            FeatureSource::Placeholder { default } => format!("placeholder, default {default}"),
        };
        let _ = writeln!(out, "{index:>2} {} ({source})", spec.name);
    }
    out
}
