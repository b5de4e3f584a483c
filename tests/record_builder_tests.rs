// Record Builder Integration Tests
//
// Purpose: End-to-end checks of record creation, row geometry and revalidation
// through the public API only.
// Run with: cargo test --test record_builder_tests

use std::sync::Arc;

use approx::assert_relative_eq;
use crop_planner_rust::{
    compute_rows, validate, AnalysisError, AnalysisProvider, CropType, CultureError, CultureRecord,
    CultureRecordBuilder, CultureUpdate, RangeFit,
};
use serde_json::{json, Value};

struct StaticAnalysis;

impl AnalysisProvider for StaticAnalysis {
    fn analyze(&self, record: &CultureRecord) -> Result<Value, AnalysisError> {
        Ok(json!({
            "status": "success",
            "input_summary": {
                "area": {"mean": record.area, "std_dev": 0.0, "n": 1}
            }
        }))
    }
}

struct BrokenAnalysis;

impl AnalysisProvider for BrokenAnalysis {
    fn analyze(&self, _record: &CultureRecord) -> Result<Value, AnalysisError> {
        Err(AnalysisError::MalformedOutput("unexpected token".to_string()))
    }
}

// =========================================================================
// Section 1: Row geometry
// =========================================================================

#[test]
fn test_square_rows_follow_formula() {
    for &(area, spacing) in &[(1.0, 0.5), (50.0, 0.45), (12.34, 0.6), (250.0, 0.4), (0.5, 3.0)] {
        let expected = ((area * 10_000.0_f64).sqrt() / spacing).floor() as u64;
        assert_eq!(compute_rows("square", area, spacing), expected, "area={} spacing={}", area, spacing);
    }
}

#[test]
fn test_rectangular_rows_follow_formula() {
    for &(area, spacing) in &[(15.0, 1.55), (3.0, 1.2), (500.0, 1.7), (7.5, 1.45)] {
        let expected = ((area * 10_000.0_f64 / 1.5).sqrt() / spacing).floor() as u64;
        assert_eq!(compute_rows("rectangular", area, spacing), expected, "area={} spacing={}", area, spacing);
    }
}

#[test]
fn test_row_fallbacks() {
    assert_eq!(compute_rows("hexagonal", 50.0, 0.45), compute_rows("square", 50.0, 0.45));
    assert_eq!(compute_rows("square", 1.0, 0.0), 100);
    assert_eq!(compute_rows("square", 1.0, -2.0), 100);
}

// =========================================================================
// Section 2: Validation scenarios
// =========================================================================

#[test]
fn test_soybean_scenario() {
    let record = CultureRecordBuilder::new().create(1, 50.0, 0.45, false, Some("conventional")).unwrap();
    assert_eq!(record.row_count, 1571);
    assert_eq!(record.recommendation_report.spacing.status, RangeFit::Within);
    assert_eq!(record.recommendation_report.area.status, RangeFit::Within);
    assert!(!record.recommendation_report.irrigation.active);
    assert!(record.water_consumption_liters.is_none());
}

#[test]
fn test_small_sugarcane_plot_is_below_on_both_axes() {
    let record = CultureRecordBuilder::new().create(2, 3.0, 1.2, false, Some("medium")).unwrap();
    let report = &record.recommendation_report;
    assert_eq!(report.area.status, RangeFit::Below);
    assert_eq!(report.spacing.status, RangeFit::Below);
    assert!(report.area.message.contains("medium cycle"));
    assert!(report.spacing.message.contains("medium cycle"));
    assert!(report.area.message.contains("10"));
    assert!(report.spacing.message.contains("1.5"));
}

#[test]
fn test_long_cycle_area_never_above() {
    let report = validate(CropType::Sugarcane, Some("long"), 500.0, 1.7, true);
    assert_eq!(report.area.status, RangeFit::Within);
    assert_eq!(report.area.recommended.max, None);
}

#[test]
fn test_unknown_sub_type_matches_default() {
    let unknown = validate(CropType::Sugarcane, Some("invalid_value"), 15.0, 1.55, true);
    let medium = validate(CropType::Sugarcane, Some("medium"), 15.0, 1.55, true);
    assert_eq!(unknown, medium);
    assert_eq!(validate(CropType::Sugarcane, Some("MEDIUM"), 15.0, 1.55, true), medium);
}

#[test]
fn test_bounds_are_inclusive() {
    // medium cycle spacing band is 1.5..=1.6
    for spacing in [1.5, 1.6] {
        let report = validate(CropType::Sugarcane, Some("medium"), 15.0, spacing, false);
        assert_eq!(report.spacing.status, RangeFit::Within, "spacing={}", spacing);
    }
}

#[test]
fn test_validate_is_pure() {
    let a = validate(CropType::Soybean, Some("transgenic"), 400.0, 0.3, false);
    let b = validate(CropType::Soybean, Some("transgenic"), 400.0, 0.3, false);
    assert_eq!(a, b);
    assert_eq!(a.area.status, RangeFit::Above);
    assert_eq!(a.spacing.status, RangeFit::Below);
}

// =========================================================================
// Section 3: Builder contract
// =========================================================================

#[test]
fn test_invalid_inputs_produce_no_record() {
    let builder = CultureRecordBuilder::new();
    for (crop, area, spacing) in [(3, 10.0, 0.5), (0, 10.0, 0.5), (1, 0.0, 0.5), (2, 10.0, 0.0), (1, -5.0, 0.5)] {
        match builder.create(crop, area, spacing, false, None) {
            Err(CultureError::InvalidParameter(_)) => {}
            other => panic!("expected InvalidParameter for {:?}, got {:?}", (crop, area, spacing), other),
        }
    }
}

#[test]
fn test_input_quantities() {
    let record = CultureRecordBuilder::new().create(2, 15.0, 1.55, true, None).unwrap();
    assert_relative_eq!(record.herbicide_total, 45.0);
    assert_relative_eq!(record.fertilizer_total, 6_000.0);
    assert_relative_eq!(record.water_consumption_liters.unwrap(), 120_000.0, epsilon = 1e-6);

    let row_length = record.row_length_estimate.unwrap();
    assert_relative_eq!(row_length, 150_000.0 / (record.row_count as f64 * 1.55), epsilon = 1e-9);
    assert_relative_eq!(
        record.total_linear_meters.unwrap(),
        record.row_count as f64 * row_length,
        epsilon = 1e-6
    );
}

#[test]
fn test_tiny_plot_omits_linear_meters() {
    let record = CultureRecordBuilder::new().create(1, 0.0001, 2.0, false, None).unwrap();
    assert_eq!(record.row_count, 0);
    assert!(record.row_length_estimate.is_none());

    let json = serde_json::to_value(&record).unwrap();
    assert!(json.get("row_length_estimate").is_none());
    assert!(json.get("total_linear_meters").is_none());
    assert!(json.get("water_consumption_liters").is_none());
}

#[test]
fn test_revalidate_roundtrip_is_exact() {
    let builder = CultureRecordBuilder::new();
    let record = builder.create(1, 37.5, 0.47, true, Some("transgenic")).unwrap();
    let same = builder.revalidate(&record, CultureUpdate::default()).unwrap();
    assert_eq!(same.row_count, record.row_count);
    assert_eq!(same.herbicide_total, record.herbicide_total);
    assert_eq!(same.fertilizer_total, record.fertilizer_total);
    assert_eq!(CultureRecordBuilder::compute_rows(&same), record.row_count);
}

// =========================================================================
// Section 4: Enrichment
// =========================================================================

#[test]
fn test_enrichment_attached() {
    let builder = CultureRecordBuilder::with_analysis(Arc::new(StaticAnalysis));
    let record = builder.create(1, 20.0, 0.5, false, None).unwrap();
    assert_eq!(record.external_analysis.as_ref().unwrap()["status"], "success");
    let summary = record.analysis_summary.as_ref().unwrap();
    assert_eq!(summary.formatted_statistics["area"].mean, 20.0);

    // edits keep the original analysis
    let updated = builder
        .revalidate(&record, CultureUpdate { area: Some(40.0), ..Default::default() })
        .unwrap();
    assert_eq!(updated.external_analysis, record.external_analysis);
}

#[test]
fn test_enrichment_failure_degrades() {
    let builder = CultureRecordBuilder::with_analysis(Arc::new(BrokenAnalysis));
    let record = builder.create(2, 15.0, 1.55, false, None).unwrap();
    assert!(record.external_analysis.is_none());
    assert!(record.analysis_summary.is_none());
    assert_eq!(record.row_count, compute_rows("rectangular", 15.0, 1.55));
}
