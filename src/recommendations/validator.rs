//! Parameter Validator
//!
//! Classifies spacing and area against the sub-type's reference ranges and
//! writes the irrigation guidance. Out-of-range values are reported, never
//! rejected: rejecting non-positive input is the builder's job.
//!
//! Irrigation messaging is deliberately asymmetric. With irrigation on we list
//! the recommended practice; with it off we urge the grower to add it.

use super::comparator::{compare_to_range, RangeFit};
use super::report::{IrrigationAdvice, ParameterCheck, SubTypeInfo, ValidationReport};
use super::tables::{self, SubTypeProfile};
use crate::record::{CropType, SubType};

/// Validate raw parameters; the sub-type key is resolved with default fallback.
pub fn validate(
    crop: CropType,
    sub_type: Option<&str>,
    area: f64,
    spacing: f64,
    irrigation_enabled: bool,
) -> ValidationReport {
    let (sub_type, _) = tables::lookup(crop, sub_type);
    validate_sub_type(sub_type, area, spacing, irrigation_enabled)
}

/// Validate against an already resolved sub-type
pub fn validate_sub_type(
    sub_type: SubType,
    area: f64,
    spacing: f64,
    irrigation_enabled: bool,
) -> ValidationReport {
    let profile = tables::profile(sub_type);

    ValidationReport {
        sub_type_info: SubTypeInfo {
            duration_range: format!("{} months", profile.duration.range_text),
            description: profile.duration.description.to_string(),
        },
        spacing: check_spacing(sub_type, profile, spacing),
        area: check_area(sub_type, profile, area),
        irrigation: irrigation_advice(sub_type, profile, irrigation_enabled),
    }
}

fn check_spacing(sub_type: SubType, profile: &SubTypeProfile, spacing: f64) -> ParameterCheck {
    let spec = &profile.spacing;
    let comp = compare_to_range(spacing, spec.min, spec.max);

    // Above only ever comes with a bounded max
    let message = match (comp.fit, spec.max) {
        (RangeFit::Below, _) => format!(
            "Spacing is below the recommended minimum ({} m) for {}. {}",
            spec.min,
            target_phrase(sub_type),
            narrow_spacing_consequence(sub_type.crop()),
        ),
        (RangeFit::Above, Some(max)) => format!(
            "Spacing is above the recommended maximum ({} m) for {}. {}",
            max,
            target_phrase(sub_type),
            wide_spacing_consequence(sub_type.crop()),
        ),
        _ => "Spacing is within the recommended range.".to_string(),
    };

    ParameterCheck {
        status: comp.fit,
        message,
        recommended: spec.into(),
    }
}

fn check_area(sub_type: SubType, profile: &SubTypeProfile, area: f64) -> ParameterCheck {
    let spec = &profile.area;
    let comp = compare_to_range(area, spec.min, spec.max);

    let message = match (comp.fit, spec.max) {
        (RangeFit::Below, _) => format!(
            "Area is below the recommended minimum ({} ha) for {}. {}",
            spec.min,
            target_phrase(sub_type),
            spec.description.unwrap_or_default(),
        )
        .trim_end()
        .to_string(),
        (RangeFit::Above, Some(max)) => format!(
            "Area is above the recommended maximum ({} ha) for {}. \
             Consider whether you have enough resources for proper management.",
            max,
            target_phrase(sub_type),
        ),
        _ => "Area is within the recommended range.".to_string(),
    };

    ParameterCheck {
        status: comp.fit,
        message,
        recommended: spec.into(),
    }
}

fn irrigation_advice(sub_type: SubType, profile: &SubTypeProfile, active: bool) -> IrrigationAdvice {
    let spec = &profile.irrigation;

    let message = if active {
        format!(
            "Recommended irrigation system: {}. Frequency: {}. Volume: {}. Efficiency: {}.",
            spec.system, spec.frequency, spec.volume, spec.efficiency
        )
    } else {
        match sub_type.crop() {
            CropType::Sugarcane => format!(
                "Irrigation is highly recommended for the {}. Ideal system: {}. \
                 Without irrigation, productivity may be significantly reduced.",
                sub_type.label(),
                spec.system
            ),
            CropType::Soybean => format!(
                "Irrigation is recommended to maximize the productivity of {}. Ideal system: {}. \
                 Without irrigation, productivity may drop during dry spells.",
                sub_type.label(),
                spec.system
            ),
        }
    };

    IrrigationAdvice {
        active,
        message,
        system: spec.system.to_string(),
        frequency: spec.frequency.to_string(),
        volume: spec.volume.to_string(),
        efficiency: spec.efficiency.to_string(),
    }
}

/// "the medium cycle" / "conventional soybean"
fn target_phrase(sub_type: SubType) -> String {
    match sub_type {
        SubType::Cycle(_) => format!("the {}", sub_type.label()),
        SubType::Variety(_) => sub_type.label().to_string(),
    }
}

fn narrow_spacing_consequence(crop: CropType) -> &'static str {
    match crop {
        CropType::Sugarcane => "Very narrow spacing can hinder mechanization and reduce productivity.",
        CropType::Soybean => "Very narrow spacing can hinder plant development.",
    }
}

fn wide_spacing_consequence(crop: CropType) -> &'static str {
    match crop {
        CropType::Sugarcane => "Very wide spacing can reduce land use efficiency.",
        CropType::Soybean => "Very wide spacing can reduce productivity.",
    }
}
