//! Server-rendered loan form and result pages.

use std::fmt::Write as _;

use super::domain::{
    Categorical, EmploymentStatus, InputField, LoanApplicationRequest, LoanDuration, LoanHistory,
};
use super::service::RiskAssessment;
use super::verdict::RiskLevel;

const STYLE: &str = "body{font-family:sans-serif;max-width:960px;margin:2rem auto;padding:0 1rem}\
h1{text-align:center;color:#1E3A8A}\
.columns{display:grid;grid-template-columns:1fr 1fr;gap:2rem}\
label{display:block;margin-top:.75rem}\
input,select{width:100%;padding:.35rem}\
button{margin-top:1.5rem;width:100%;padding:.6rem;font-size:1rem}\
.low{background:#DCFCE7;padding:1rem}.high{background:#FEE2E2;padding:1rem}\
.error{background:#FEF3C7;padding:1rem}\
progress{width:100%;height:1.25rem}";

pub(crate) fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn page(body: &str) -> String {
    format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
<title>Loan Default Predictor</title><style>{STYLE}</style></head>\
<body><h1>Loan Default Prediction</h1>{body}</body></html>"
    )
}

fn number_input(out: &mut String, field: InputField, value: f64, step: f64) {
    let (min, max) = field.range().unwrap_or((0.0, f64::MAX));
    let _ = write!(
        out,
        "<label for=\"{name}\">{label}</label>\
<input type=\"number\" id=\"{name}\" name=\"{name}\" min=\"{min}\" max=\"{max}\" step=\"{step}\" value=\"{value}\" required>",
        name = field.name(),
        label = field.label(),
    );
}

fn select_input<C: Categorical>(out: &mut String, selected: &str) {
    let field = C::FIELD;
    let _ = write!(
        out,
        "<label for=\"{name}\">{label}</label><select id=\"{name}\" name=\"{name}\">",
        name = field.name(),
        label = field.label(),
    );
    for option in C::ALL {
        let label = option.label();
        let marker = if label == selected || option.key() == selected {
            " selected"
        } else {
            ""
        };
        let _ = write!(out, "<option value=\"{label}\"{marker}>{label}</option>");
    }
    out.push_str("</select>");
}

fn form(values: &LoanApplicationRequest) -> String {
    let mut out = String::from("<form method=\"post\" action=\"/predict\"><div class=\"columns\"><section>");
    out.push_str("<h2>Applicant Information</h2>");
    number_input(&mut out, InputField::Age, f64::from(values.age), 1.0);
    number_input(
        &mut out,
        InputField::MonthlyIncome,
        f64::from(values.monthly_income),
        1000.0,
    );
    select_input::<EmploymentStatus>(&mut out, &values.employment_status);
    number_input(
        &mut out,
        InputField::CreditScore,
        f64::from(values.credit_score),
        1.0,
    );

    out.push_str("</section><section><h2>Loan Information</h2>");
    number_input(
        &mut out,
        InputField::LoanAmount,
        f64::from(values.loan_amount),
        5000.0,
    );
    select_input::<LoanDuration>(&mut out, &values.loan_duration);
    number_input(&mut out, InputField::InterestRate, values.interest_rate, 0.1);
    select_input::<LoanHistory>(&mut out, &values.previous_loans);

    out.push_str("</section></div><section><h2>Financial &amp; Other Details</h2>");
    number_input(
        &mut out,
        InputField::TotalDebt,
        f64::from(values.total_debt),
        1000.0,
    );
    number_input(&mut out, InputField::Savings, f64::from(values.savings), 1000.0);
    out.push_str("</section><button type=\"submit\">Predict Loan Default</button></form>");
    out
}

/// Empty form with the default answers pre-filled.
pub fn render_form_page(values: &LoanApplicationRequest) -> String {
    let mut body =
        String::from("<p>Enter the required details below to check the loan risk prediction.</p>");
    body.push_str(&form(values));
    page(&body)
}

pub fn render_result_page(assessment: &RiskAssessment) -> String {
    let class = match assessment.verdict.level {
        RiskLevel::Low => "low",
        RiskLevel::High => "high",
    };
    let values = LoanApplicationRequest::from(&assessment.application);
    let body = format!(
        "<h2>Prediction Result</h2><div class=\"verdict {class}\" data-risk=\"{class}\">\
<p>{headline}</p><progress value=\"{gauge}\" max=\"100\">{gauge}%</progress></div>{form}",
        headline = escape(&assessment.verdict.headline),
        gauge = assessment.verdict.gauge_percent,
        form = form(&values),
    );
    page(&body)
}

/// Re-render the submitted form with the failure above it.
pub fn render_error_page(title: &str, detail: &str, values: &LoanApplicationRequest) -> String {
    let body = format!(
        "<div class=\"error\" data-risk=\"unavailable\"><h2>{title}</h2><p>{detail}</p></div>{form}",
        title = escape(title),
        detail = escape(detail),
        form = form(values),
    );
    page(&body)
}
