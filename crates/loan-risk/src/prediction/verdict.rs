use serde::{Deserialize, Serialize};

use super::invoker::{PredictionResult, RiskLabel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    High,
}

/// One of the two mutually exclusive display states for a prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskVerdict {
    pub level: RiskLevel,
    pub headline: String,
    /// Fill level of the risk gauge, 0-100.
    pub gauge_percent: u8,
}

impl RiskVerdict {
    pub fn low() -> Self {
        Self {
            level: RiskLevel::Low,
            headline: "Low Risk! Loan Likely to be Repaid.".to_string(),
            gauge_percent: 20,
        }
    }

    pub fn high() -> Self {
        Self {
            level: RiskLevel::High,
            headline: "High Risk! Loan Likely to Default.".to_string(),
            gauge_percent: 85,
        }
    }

    pub fn is_high_risk(&self) -> bool {
        self.level == RiskLevel::High
    }
}

impl From<PredictionResult> for RiskVerdict {
    fn from(result: PredictionResult) -> Self {
        match result.label {
            RiskLabel::Repaid => RiskVerdict::low(),
            RiskLabel::Default => RiskVerdict::high(),
        }
    }
}
