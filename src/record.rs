//! Crop Record Types
//!
//! `CropType` and its sub-type axes, the assembled `CultureRecord`, and the
//! `CultureUpdate` patch used when editing a stored record.

use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::analysis::summary::AnalysisSummary;
use crate::error::{CultureError, Result};
use crate::geometry::GeometryStrategy;
use crate::recommendations::report::ValidationReport;

/// Supported crops. Codes 1 and 2 are the wire values used by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CropType {
    Soybean,
    Sugarcane,
}

impl CropType {
    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            1 => Ok(CropType::Soybean),
            2 => Ok(CropType::Sugarcane),
            other => Err(CultureError::invalid(format!(
                "unknown crop type {} (expected 1 for soybean or 2 for sugarcane)",
                other
            ))),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            CropType::Soybean => 1,
            CropType::Sugarcane => 2,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CropType::Soybean => "Soybean",
            CropType::Sugarcane => "Sugarcane",
        }
    }

    /// Geometry strategy is fixed by crop type
    pub fn strategy(&self) -> GeometryStrategy {
        match self {
            CropType::Soybean => GeometryStrategy::Square,
            CropType::Sugarcane => GeometryStrategy::Rectangular,
        }
    }

    /// Herbicide dose in L/ha (glyphosate for soybean)
    pub fn herbicide_dose_per_ha(&self) -> f64 {
        match self {
            CropType::Soybean => 2.5,
            CropType::Sugarcane => 3.0,
        }
    }

    /// Fertilizer dose in kg/ha (NPK, NPK + micronutrients for sugarcane)
    pub fn fertilizer_dose_per_ha(&self) -> f64 {
        match self {
            CropType::Soybean => 300.0,
            CropType::Sugarcane => 400.0,
        }
    }

    /// Name of the sub-type parameter in forms
    pub fn sub_type_param(&self) -> &'static str {
        match self {
            CropType::Soybean => "variety",
            CropType::Sugarcane => "cycle",
        }
    }

    pub fn default_sub_type(&self) -> SubType {
        match self {
            CropType::Soybean => SubType::Variety(SoybeanVariety::Conventional),
            CropType::Sugarcane => SubType::Cycle(SugarcaneCycle::Medium),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SugarcaneCycle {
    Short,
    Medium,
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoybeanVariety {
    Conventional,
    Transgenic,
}

/// Resolved sub-type: a sugarcane cycle or a soybean variety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubType {
    Cycle(SugarcaneCycle),
    Variety(SoybeanVariety),
}

impl SubType {
    /// Canonical lowercase key
    pub fn key(&self) -> &'static str {
        match self {
            SubType::Cycle(SugarcaneCycle::Short) => "short",
            SubType::Cycle(SugarcaneCycle::Medium) => "medium",
            SubType::Cycle(SugarcaneCycle::Long) => "long",
            SubType::Variety(SoybeanVariety::Conventional) => "conventional",
            SubType::Variety(SoybeanVariety::Transgenic) => "transgenic",
        }
    }

    /// Phrase used inside recommendation messages
    pub fn label(&self) -> &'static str {
        match self {
            SubType::Cycle(SugarcaneCycle::Short) => "short cycle",
            SubType::Cycle(SugarcaneCycle::Medium) => "medium cycle",
            SubType::Cycle(SugarcaneCycle::Long) => "long cycle",
            SubType::Variety(SoybeanVariety::Conventional) => "conventional soybean",
            SubType::Variety(SoybeanVariety::Transgenic) => "transgenic soybean",
        }
    }

    pub fn crop(&self) -> CropType {
        match self {
            SubType::Cycle(_) => CropType::Sugarcane,
            SubType::Variety(_) => CropType::Soybean,
        }
    }

    /// Exact key match after trimming and lowercasing.
    ///
    /// Portuguese keys (`curto`, `médio`, `longo`, `convencional`, `transgênica`)
    /// are accepted alongside the English ones.
    pub fn parse(crop: CropType, key: &str) -> Option<Self> {
        let key = key.trim().to_lowercase();
        match crop {
            CropType::Sugarcane => match key.as_str() {
                "short" | "curto" => Some(SubType::Cycle(SugarcaneCycle::Short)),
                "medium" | "médio" | "medio" => Some(SubType::Cycle(SugarcaneCycle::Medium)),
                "long" | "longo" => Some(SubType::Cycle(SugarcaneCycle::Long)),
                _ => None,
            },
            CropType::Soybean => match key.as_str() {
                "conventional" | "convencional" => Some(SubType::Variety(SoybeanVariety::Conventional)),
                "transgenic" | "transgênica" | "transgenica" => {
                    Some(SubType::Variety(SoybeanVariety::Transgenic))
                }
                _ => None,
            },
        }
    }

    /// Parse with fallback to the crop default; unknown keys are logged, never rejected
    pub fn resolve(crop: CropType, key: Option<&str>) -> Self {
        match key.map(str::trim).filter(|k| !k.is_empty()) {
            None => crop.default_sub_type(),
            Some(raw) => Self::parse(crop, raw).unwrap_or_else(|| {
                let fallback = crop.default_sub_type();
                tracing::warn!(
                    "Unknown {} '{}' for {}, using default '{}'",
                    crop.sub_type_param(),
                    raw,
                    crop.display_name(),
                    fallback.key()
                );
                fallback
            }),
        }
    }
}

impl Serialize for SubType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

/// A fully derived crop record.
///
/// Built in one shot by `CultureRecordBuilder::create`; edits go through
/// `CultureRecordBuilder::revalidate`, which replaces whole fields and re-derives
/// everything except the external analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CultureRecord {
    pub crop_type: CropType,
    pub sub_type: SubType,
    /// Hectares
    pub area: f64,
    /// Meters between rows
    pub spacing: f64,
    pub irrigation_enabled: bool,
    pub strategy: GeometryStrategy,
    pub herbicide_dose_per_ha: f64,
    pub fertilizer_dose_per_ha: f64,

    pub row_count: u64,
    pub herbicide_total: f64,
    pub fertilizer_total: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_length_estimate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_linear_meters: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub water_consumption_liters: Option<f64>,

    pub recommendation_report: ValidationReport,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_analysis: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_summary: Option<AnalysisSummary>,

    /// Set on generated sample records only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planting_date: Option<NaiveDate>,
}

/// Whole-field replacements applied to an existing record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CultureUpdate {
    pub area: Option<f64>,
    pub spacing: Option<f64>,
    pub sub_type: Option<String>,
    pub irrigation_enabled: Option<bool>,
}

impl CultureUpdate {
    pub fn is_empty(&self) -> bool {
        self.area.is_none()
            && self.spacing.is_none()
            && self.sub_type.is_none()
            && self.irrigation_enabled.is_none()
    }
}
