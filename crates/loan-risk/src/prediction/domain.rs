use serde::{Deserialize, Serialize};

use super::encoder::EncodingError;

/// Fields collected by the loan form, in the order the operator fills them in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputField {
    Age,
    MonthlyIncome,
    EmploymentStatus,
    CreditScore,
    LoanAmount,
    LoanDuration,
    InterestRate,
    PreviousLoans,
    TotalDebt,
    Savings,
}

impl InputField {
    pub const ALL: [InputField; 10] = [
        InputField::Age,
        InputField::MonthlyIncome,
        InputField::EmploymentStatus,
        InputField::CreditScore,
        InputField::LoanAmount,
        InputField::LoanDuration,
        InputField::InterestRate,
        InputField::PreviousLoans,
        InputField::TotalDebt,
        InputField::Savings,
    ];

    pub fn name(self) -> &'static str {
        match self {
            InputField::Age => "age",
            InputField::MonthlyIncome => "monthly_income",
            InputField::EmploymentStatus => "employment_status",
            InputField::CreditScore => "credit_score",
            InputField::LoanAmount => "loan_amount",
            InputField::LoanDuration => "loan_duration",
            InputField::InterestRate => "interest_rate",
            InputField::PreviousLoans => "previous_loans",
            InputField::TotalDebt => "total_debt",
            InputField::Savings => "savings",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            InputField::Age => "Age",
            InputField::MonthlyIncome => "Monthly Income",
            InputField::EmploymentStatus => "Employment Type",
            InputField::CreditScore => "Credit Score",
            InputField::LoanAmount => "Loan Amount",
            InputField::LoanDuration => "Loan Duration",
            InputField::InterestRate => "Interest Rate (%)",
            InputField::PreviousLoans => "Previous Loan History",
            InputField::TotalDebt => "Total Debt",
            InputField::Savings => "Savings",
        }
    }

    /// Inclusive bounds for numeric fields; categorical fields have none.
    pub fn range(self) -> Option<(f64, f64)> {
        match self {
            InputField::Age => Some((18.0, 70.0)),
            InputField::MonthlyIncome => Some((1_000.0, 1_000_000.0)),
            InputField::CreditScore => Some((300.0, 900.0)),
            InputField::LoanAmount => Some((5_000.0, 5_000_000.0)),
            InputField::InterestRate => Some((1.0, 20.0)),
            InputField::TotalDebt | InputField::Savings => Some((0.0, 10_000_000.0)),
            InputField::EmploymentStatus | InputField::LoanDuration | InputField::PreviousLoans => {
                None
            }
        }
    }

    pub(crate) fn check(self, value: f64) -> Result<(), EncodingError> {
        let Some((min, max)) = self.range() else {
            return Ok(());
        };

        // NaN fails both comparisons and lands here as well.
        if value >= min && value <= max {
            Ok(())
        } else {
            Err(EncodingError::OutOfRange {
                field: self,
                value,
                min,
                max,
            })
        }
    }
}

/// Categorical answers whose integer codes are fixed by the trained model.
pub trait Categorical: Copy + Sized + 'static {
    const FIELD: InputField;
    const ALL: &'static [Self];

    /// Integer code used in the feature vector.
    fn code(self) -> u8;
    /// Label shown to the operator.
    fn label(self) -> &'static str;
    /// Machine identifier accepted by the JSON API.
    fn key(self) -> &'static str;

    fn parse(raw: &str) -> Result<Self, EncodingError> {
        let trimmed = raw.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|candidate| candidate.label() == trimmed || candidate.key() == trimmed)
            .ok_or_else(|| EncodingError::UnknownCategory {
                field: Self::FIELD,
                value: raw.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentStatus {
    Salaried,
    SelfEmployed,
    Unemployed,
}

impl Categorical for EmploymentStatus {
    const FIELD: InputField = InputField::EmploymentStatus;
    const ALL: &'static [Self] = &[
        EmploymentStatus::Salaried,
        EmploymentStatus::SelfEmployed,
        EmploymentStatus::Unemployed,
    ];

    fn code(self) -> u8 {
        match self {
            EmploymentStatus::Salaried => 0,
            EmploymentStatus::SelfEmployed => 1,
            EmploymentStatus::Unemployed => 2,
        }
    }

    fn label(self) -> &'static str {
        match self {
            EmploymentStatus::Salaried => "Salaried",
            EmploymentStatus::SelfEmployed => "Self-Employed",
            EmploymentStatus::Unemployed => "Unemployed",
        }
    }

    fn key(self) -> &'static str {
        match self {
            EmploymentStatus::Salaried => "salaried",
            EmploymentStatus::SelfEmployed => "self_employed",
            EmploymentStatus::Unemployed => "unemployed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanDuration {
    SixMonths,
    OneYear,
    ThreeYears,
    FiveYears,
    TenYears,
}

impl Categorical for LoanDuration {
    const FIELD: InputField = InputField::LoanDuration;
    const ALL: &'static [Self] = &[
        LoanDuration::SixMonths,
        LoanDuration::OneYear,
        LoanDuration::ThreeYears,
        LoanDuration::FiveYears,
        LoanDuration::TenYears,
    ];

    fn code(self) -> u8 {
        match self {
            LoanDuration::SixMonths => 0,
            LoanDuration::OneYear => 1,
            LoanDuration::ThreeYears => 2,
            LoanDuration::FiveYears => 3,
            LoanDuration::TenYears => 4,
        }
    }

    fn label(self) -> &'static str {
        match self {
            LoanDuration::SixMonths => "6 months",
            LoanDuration::OneYear => "1 year",
            LoanDuration::ThreeYears => "3 years",
            LoanDuration::FiveYears => "5 years",
            LoanDuration::TenYears => "10 years",
        }
    }

    fn key(self) -> &'static str {
        match self {
            LoanDuration::SixMonths => "six_months",
            LoanDuration::OneYear => "one_year",
            LoanDuration::ThreeYears => "three_years",
            LoanDuration::FiveYears => "five_years",
            LoanDuration::TenYears => "ten_years",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanHistory {
    NoPreviousLoans,
    PaidOnTime,
    MissedPayments,
}

impl Categorical for LoanHistory {
    const FIELD: InputField = InputField::PreviousLoans;
    const ALL: &'static [Self] = &[
        LoanHistory::NoPreviousLoans,
        LoanHistory::PaidOnTime,
        LoanHistory::MissedPayments,
    ];

    fn code(self) -> u8 {
        match self {
            LoanHistory::NoPreviousLoans => 0,
            LoanHistory::PaidOnTime => 1,
            LoanHistory::MissedPayments => 2,
        }
    }

    fn label(self) -> &'static str {
        match self {
            LoanHistory::NoPreviousLoans => "No Previous Loans",
            LoanHistory::PaidOnTime => "Paid on Time",
            LoanHistory::MissedPayments => "Missed Payments",
        }
    }

    fn key(self) -> &'static str {
        match self {
            LoanHistory::NoPreviousLoans => "no_previous_loans",
            LoanHistory::PaidOnTime => "paid_on_time",
            LoanHistory::MissedPayments => "missed_payments",
        }
    }
}

/// Personal attributes of the applicant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApplicantRecord {
    pub age: u32,
    pub monthly_income: u32,
    pub employment_status: EmploymentStatus,
    pub credit_score: u32,
}

/// Terms of the requested loan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanRecord {
    pub loan_amount: u32,
    pub loan_duration: LoanDuration,
    pub interest_rate: f64,
    pub previous_loans: LoanHistory,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinancialRecord {
    pub total_debt: u32,
    pub savings: u32,
}

/// Structured record produced when the operator submits the form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub applicant: ApplicantRecord,
    pub loan: LoanRecord,
    pub financial: FinancialRecord,
}

impl LoanApplication {
    /// Reject the first numeric field that falls outside the form bounds.
    pub fn validate(&self) -> Result<(), EncodingError> {
        InputField::ALL
            .iter()
            .try_for_each(|field| field.check(self.raw_value(*field)))
    }

    /// Value of a field as the model sees it; categorical fields yield their code.
    pub fn raw_value(&self, field: InputField) -> f64 {
        match field {
            InputField::Age => f64::from(self.applicant.age),
            InputField::MonthlyIncome => f64::from(self.applicant.monthly_income),
            InputField::EmploymentStatus => f64::from(self.applicant.employment_status.code()),
            InputField::CreditScore => f64::from(self.applicant.credit_score),
            InputField::LoanAmount => f64::from(self.loan.loan_amount),
            InputField::LoanDuration => f64::from(self.loan.loan_duration.code()),
            InputField::InterestRate => self.loan.interest_rate,
            InputField::PreviousLoans => f64::from(self.loan.previous_loans.code()),
            InputField::TotalDebt => f64::from(self.financial.total_debt),
            InputField::Savings => f64::from(self.financial.savings),
        }
    }
}

/// Flat payload accepted from the HTML form and the JSON API.
///
/// Categorical answers arrive as labels and only become typed values through
/// [`LoanApplicationRequest::into_application`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanApplicationRequest {
    pub age: u32,
    pub monthly_income: u32,
    pub employment_status: String,
    pub credit_score: u32,
    pub loan_amount: u32,
    pub loan_duration: String,
    pub interest_rate: f64,
    pub previous_loans: String,
    pub total_debt: u32,
    pub savings: u32,
}

impl Default for LoanApplicationRequest {
    fn default() -> Self {
        Self {
            age: 30,
            monthly_income: 30_000,
            employment_status: EmploymentStatus::Salaried.label().to_string(),
            credit_score: 700,
            loan_amount: 500_000,
            loan_duration: LoanDuration::SixMonths.label().to_string(),
            interest_rate: 7.5,
            previous_loans: LoanHistory::NoPreviousLoans.label().to_string(),
            total_debt: 50_000,
            savings: 100_000,
        }
    }
}

impl LoanApplicationRequest {
    pub fn into_application(self) -> Result<LoanApplication, EncodingError> {
        Ok(LoanApplication {
            applicant: ApplicantRecord {
                age: self.age,
                monthly_income: self.monthly_income,
                employment_status: EmploymentStatus::parse(&self.employment_status)?,
                credit_score: self.credit_score,
            },
            loan: LoanRecord {
                loan_amount: self.loan_amount,
                loan_duration: LoanDuration::parse(&self.loan_duration)?,
                interest_rate: self.interest_rate,
                previous_loans: LoanHistory::parse(&self.previous_loans)?,
            },
            financial: FinancialRecord {
                total_debt: self.total_debt,
                savings: self.savings,
            },
        })
    }
}

impl From<&LoanApplication> for LoanApplicationRequest {
    fn from(application: &LoanApplication) -> Self {
        Self {
            age: application.applicant.age,
            monthly_income: application.applicant.monthly_income,
            employment_status: application.applicant.employment_status.label().to_string(),
            credit_score: application.applicant.credit_score,
            loan_amount: application.loan.loan_amount,
            loan_duration: application.loan.loan_duration.label().to_string(),
            interest_rate: application.loan.interest_rate,
            previous_loans: application.loan.previous_loans.label().to_string(),
            total_debt: application.financial.total_debt,
            savings: application.financial.savings,
        }
    }
}
