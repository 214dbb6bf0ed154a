// Classifier - level + profile to category and compliance
//
// Category bucketing uses strict `<` against LOW and MEDIUM while compliance
// uses `<=` against MEDIUM. A level exactly at MEDIUM is therefore `High`
// and still `WithinLimit`.

use serde::{Deserialize, Serialize};

use super::profile::ThresholdProfile;

/// Noise category used for visualization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Low,
    Medium,
    High,
}

/// Whether the level is at or below the MEDIUM threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceState {
    WithinLimit,
    Exceeding,
}

impl ComplianceState {
    pub fn is_compliant(self) -> bool {
        matches!(self, ComplianceState::WithinLimit)
    }
}

/// Result of classifying one level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: Category,
    pub compliance: ComplianceState,
}

pub fn categorize(level: f64, profile: &ThresholdProfile) -> Category {
    if level < profile.low() {
        Category::Low
    } else if level < profile.medium() {
        Category::Medium
    } else {
        Category::High
    }
}

pub fn compliance(level: f64, profile: &ThresholdProfile) -> ComplianceState {
    if level <= profile.medium() {
        ComplianceState::WithinLimit
    } else {
        ComplianceState::Exceeding
    }
}

pub fn classify(level: f64, profile: &ThresholdProfile) -> Classification {
    Classification {
        category: categorize(level, profile),
        compliance: compliance(level, profile),
    }
}
