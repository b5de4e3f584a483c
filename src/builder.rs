//! Culture Record Builder
//!
//! Single entry point for building records: validates raw inputs, runs the
//! validator, row count and input quantity steps, then asks the analysis
//! collaborator for best-effort enrichment.
//!
//! `revalidate` re-derives everything from replaced fields but leaves the
//! external analysis untouched.

use std::sync::Arc;

use crate::analysis::{AnalysisProvider, AnalysisSummary, NoAnalysis};
use crate::error::{AnalysisError, CultureError, Result};
use crate::inputs::{water_consumption_liters, InputQuantities};
use crate::recommendations::validate_sub_type;
use crate::record::{CropType, CultureRecord, CultureUpdate, SubType};

#[derive(Clone)]
pub struct CultureRecordBuilder {
    analysis: Arc<dyn AnalysisProvider>,
}

impl Default for CultureRecordBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CultureRecordBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CultureRecordBuilder").finish_non_exhaustive()
    }
}

impl CultureRecordBuilder {
    /// Builder without external analysis
    pub fn new() -> Self {
        Self {
            analysis: Arc::new(NoAnalysis),
        }
    }

    pub fn with_analysis(analysis: Arc<dyn AnalysisProvider>) -> Self {
        Self { analysis }
    }

    /// Build a complete record.
    ///
    /// Fails with `InvalidParameter` for an unknown crop code or a non-positive
    /// (or non-finite) area or spacing. Analysis failures only drop the
    /// enrichment fields.
    pub fn create(
        &self,
        crop_code: i64,
        area: f64,
        spacing: f64,
        irrigation_enabled: bool,
        sub_type: Option<&str>,
    ) -> Result<CultureRecord> {
        let crop = CropType::from_code(crop_code)?;
        check_positive("area", area)?;
        check_positive("spacing", spacing)?;

        let sub_type = SubType::resolve(crop, sub_type);
        let mut record = derive(crop, sub_type, area, spacing, irrigation_enabled);
        self.enrich(&mut record);

        tracing::info!(
            "Created {} record: {} ha, {} m spacing, {} rows",
            crop.display_name(),
            record.area,
            record.spacing,
            record.row_count
        );
        Ok(record)
    }

    /// Apply whole-field replacements and re-derive the record.
    ///
    /// The external analysis of the original record is carried over as is.
    pub fn revalidate(&self, record: &CultureRecord, update: CultureUpdate) -> Result<CultureRecord> {
        let area = update.area.unwrap_or(record.area);
        let spacing = update.spacing.unwrap_or(record.spacing);
        check_positive("area", area)?;
        check_positive("spacing", spacing)?;

        let sub_type = match update.sub_type.as_deref() {
            Some(key) => SubType::resolve(record.crop_type, Some(key)),
            None => record.sub_type,
        };
        let irrigation_enabled = update.irrigation_enabled.unwrap_or(record.irrigation_enabled);

        let mut updated = derive(record.crop_type, sub_type, area, spacing, irrigation_enabled);
        updated.external_analysis = record.external_analysis.clone();
        updated.analysis_summary = record.analysis_summary.clone();
        updated.sample_label = record.sample_label.clone();
        updated.planting_date = record.planting_date;

        tracing::debug!("Revalidated {} record", record.crop_type.display_name());
        Ok(updated)
    }

    /// Row count of an existing record, recomputed from its own fields
    pub fn compute_rows(record: &CultureRecord) -> u64 {
        record.strategy.rows(record.area, record.spacing)
    }

    fn enrich(&self, record: &mut CultureRecord) {
        match self.analysis.analyze(record) {
            Ok(analysis) => {
                record.analysis_summary = AnalysisSummary::from_analysis(&analysis);
                record.external_analysis = Some(analysis);
            }
            Err(AnalysisError::Unavailable(reason)) => {
                tracing::debug!("Skipping external analysis: {}", reason);
            }
            Err(e) => {
                tracing::warn!("External analysis failed, continuing without it: {}", e);
            }
        }
    }
}

fn check_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(CultureError::invalid(format!("{} must be a positive number, got {}", name, value)))
    }
}

/// Everything that follows from the raw fields; no collaborator calls
fn derive(
    crop: CropType,
    sub_type: SubType,
    area: f64,
    spacing: f64,
    irrigation_enabled: bool,
) -> CultureRecord {
    let strategy = crop.strategy();
    let row_count = strategy.rows(area, spacing);

    let mut record = CultureRecord {
        crop_type: crop,
        sub_type,
        area,
        spacing,
        irrigation_enabled,
        strategy,
        herbicide_dose_per_ha: crop.herbicide_dose_per_ha(),
        fertilizer_dose_per_ha: crop.fertilizer_dose_per_ha(),
        row_count,
        herbicide_total: 0.0,
        fertilizer_total: 0.0,
        row_length_estimate: None,
        total_linear_meters: None,
        water_consumption_liters: irrigation_enabled.then(|| water_consumption_liters(area)),
        recommendation_report: validate_sub_type(sub_type, area, spacing, irrigation_enabled),
        external_analysis: None,
        analysis_summary: None,
        sample_label: None,
        planting_date: None,
    };
    InputQuantities::for_record(&record).apply_to(&mut record);
    record
}
