//! Validation Report Types
//!
//! Output structures of the parameter validator.

use serde::Serialize;

use super::comparator::RangeFit;
use super::tables::RangeSpec;

/// Cycle/variety duration summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubTypeInfo {
    /// e.g. "12-14 months"
    pub duration_range: String,
    pub description: String,
}

/// Reference bounds echoed back to the caller
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RecommendedRange {
    pub min: f64,
    /// `null` when open-ended
    pub max: Option<f64>,
    pub ideal: f64,
}

impl From<&RangeSpec> for RecommendedRange {
    fn from(spec: &RangeSpec) -> Self {
        RecommendedRange {
            min: spec.min,
            max: spec.max,
            ideal: spec.ideal,
        }
    }
}

/// Classification of one numeric parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterCheck {
    pub status: RangeFit,
    pub message: String,
    pub recommended: RecommendedRange,
}

impl ParameterCheck {
    pub fn is_within(&self) -> bool {
        self.status == RangeFit::Within
    }
}

/// Irrigation guidance for the sub-type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IrrigationAdvice {
    pub active: bool,
    pub message: String,
    pub system: String,
    pub frequency: String,
    pub volume: String,
    pub efficiency: String,
}

/// Complete recommendation report for one record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub sub_type_info: SubTypeInfo,
    pub spacing: ParameterCheck,
    pub area: ParameterCheck,
    pub irrigation: IrrigationAdvice,
}

impl ValidationReport {
    /// Messages worth surfacing to a user: out-of-range parameters, then the
    /// irrigation reminder when irrigation is off
    pub fn alerts(&self) -> Vec<String> {
        let mut alerts = Vec::new();
        if !self.spacing.is_within() {
            alerts.push(self.spacing.message.clone());
        }
        if !self.area.is_within() {
            alerts.push(self.area.message.clone());
        }
        if !self.irrigation.active {
            alerts.push(self.irrigation.message.clone());
        }
        alerts
    }
}
