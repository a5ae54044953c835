//! Score aggregation
//!
//! Reduces a result list to a 0-100 compliance score and a status. The
//! status outranks the score for display: one CRITICAL finding makes the
//! whole run CRITICAL no matter how many checks passed.

use crate::inspection::{InspectionLevel, InspectionResult};
use serde::{Deserialize, Serialize};

/// Overall compliance classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceStatus {
    Compliant,
    ActionRequired,
    Critical,
}

impl std::fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Compliant => write!(f, "COMPLIANT"),
            Self::ActionRequired => write!(f, "ACTION_REQUIRED"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// `round(100 · passed / total)`; 100 when there is nothing to score
pub fn compliance_score(results: &[InspectionResult]) -> u8 {
    if results.is_empty() {
        return 100;
    }
    let passed = results.iter().filter(|r| r.is_pass()).count();
    (100.0 * passed as f64 / results.len() as f64).round() as u8
}

pub fn classify(results: &[InspectionResult]) -> ComplianceStatus {
    if results.iter().any(|r| r.level() == InspectionLevel::Critical) {
        ComplianceStatus::Critical
    } else if results.iter().any(|r| !r.is_pass()) {
        ComplianceStatus::ActionRequired
    } else {
        ComplianceStatus::Compliant
    }
}

/// Score and status in one pass over the results
pub fn aggregate(results: &[InspectionResult]) -> (u8, ComplianceStatus) {
    (compliance_score(results), classify(results))
}
