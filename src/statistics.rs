//! Local Statistics and Sample Batches
//!
//! Descriptive statistics over plain `f64` slices, and batches of randomly
//! generated records for exercising the analysis pipeline.
//!
//! ## Sample distributions
//! - area: `lognormal(0, 0.5) * (max - min) / 3 + min`, 2 decimals
//! - spacing: uniform over the crop's band, 2 decimals
//! - irrigation: 30% of records
//! - sub-type: uniform over the crop's sub-types
//! - planting date: uniform over the last 180 days

use std::collections::BTreeMap;

use chrono::{Duration, Local, NaiveDate};
use rand::Rng;
use rand_distr::{Distribution, LogNormal};
use rayon::prelude::*;
use serde::Serialize;

use crate::builder::CultureRecordBuilder;
use crate::error::{CultureError, Result};
use crate::recommendations::tables;
use crate::record::{CropType, CultureRecord, SubType};

pub const MAX_SAMPLES: usize = 100;
const IRRIGATION_PROBABILITY: f64 = 0.3;
const PLANTING_WINDOW_DAYS: i64 = 180;
const LOGNORMAL_MU: f64 = 0.0;
const LOGNORMAL_SIGMA: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptiveStats {
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation
    pub std_dev: f64,
    pub variance: f64,
    pub std_error: f64,
    /// Percent; 0 when the mean is 0
    pub coefficient_of_variation: f64,
    pub min: f64,
    pub max: f64,
    pub range: f64,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub count: usize,
}

/// `None` for an empty slice
pub fn describe(values: &[f64]) -> Option<DescriptiveStats> {
    if values.is_empty() {
        return None;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let min = sorted[0];
    let max = sorted[sorted.len() - 1];
    let q1 = percentile(&sorted, 25.0);
    let q3 = percentile(&sorted, 75.0);

    Some(DescriptiveStats {
        mean,
        median: percentile(&sorted, 50.0),
        std_dev,
        variance,
        std_error: std_dev / n.sqrt(),
        coefficient_of_variation: if mean != 0.0 { std_dev / mean * 100.0 } else { 0.0 },
        min,
        max,
        range: max - min,
        q1,
        q3,
        iqr: q3 - q1,
        count: values.len(),
    })
}

/// Linear interpolation between closest ranks; `sorted` must be ascending and non-empty
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let pos = (p / 100.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

// ============================================================================
// Batch statistics
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IrrigationCounts {
    pub with_irrigation: usize,
    pub without_irrigation: usize,
    pub irrigation_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalStats {
    /// Keyed by sub-type key
    pub sub_types: BTreeMap<String, usize>,
    pub irrigation: IrrigationCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchStatistics {
    pub numeric: BTreeMap<&'static str, DescriptiveStats>,
    pub categorical: CategoricalStats,
    pub sample_size: usize,
}

type FieldFn = fn(&CultureRecord) -> f64;

const NUMERIC_FIELDS: [(&str, FieldFn); 6] = [
    ("area", |r: &CultureRecord| r.area),
    ("spacing", |r: &CultureRecord| r.spacing),
    ("row_count", |r: &CultureRecord| r.row_count as f64),
    ("herbicide_total", |r: &CultureRecord| r.herbicide_total),
    ("fertilizer_total", |r: &CultureRecord| r.fertilizer_total),
    ("total_linear_meters", |r: &CultureRecord| r.total_linear_meters.unwrap_or(0.0)),
];

/// Statistics over a set of records; `None` when there are none.
///
/// Numeric fields that are zero on every record are left out.
pub fn batch_statistics(records: &[CultureRecord]) -> Option<BatchStatistics> {
    if records.is_empty() {
        return None;
    }

    let mut numeric = BTreeMap::new();
    for (name, field) in NUMERIC_FIELDS {
        let values: Vec<f64> = records.iter().map(field).collect();
        if values.iter().all(|v| *v == 0.0) {
            continue;
        }
        if let Some(stats) = describe(&values) {
            numeric.insert(name, stats);
        }
    }

    let mut sub_types: BTreeMap<String, usize> = BTreeMap::new();
    for record in records {
        *sub_types.entry(record.sub_type.key().to_string()).or_insert(0) += 1;
    }

    let with_irrigation = records.iter().filter(|r| r.irrigation_enabled).count();
    let percentage = with_irrigation as f64 / records.len() as f64 * 100.0;

    Some(BatchStatistics {
        numeric,
        categorical: CategoricalStats {
            sub_types,
            irrigation: IrrigationCounts {
                with_irrigation,
                without_irrigation: records.len() - with_irrigation,
                irrigation_percentage: (percentage * 100.0).round() / 100.0,
            },
        },
        sample_size: records.len(),
    })
}

// ============================================================================
// Sample generation
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleBatch {
    pub crop_type: CropType,
    pub count: usize,
    pub cultures: Vec<CultureRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<BatchStatistics>,
}

struct SampleBand {
    area: (f64, f64),
    spacing: (f64, f64),
}

fn sample_band(crop: CropType) -> SampleBand {
    match crop {
        CropType::Soybean => SampleBand { area: (5.0, 100.0), spacing: (0.4, 0.6) },
        CropType::Sugarcane => SampleBand { area: (5.0, 50.0), spacing: (1.4, 1.8) },
    }
}

/// Raw draws for one record, taken before the parallel build
struct SampleDraw {
    area: f64,
    spacing: f64,
    irrigation: bool,
    sub_type: SubType,
    days_ago: i64,
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn draw<R: Rng>(rng: &mut R, crop: CropType, area_factor: &LogNormal<f64>) -> SampleDraw {
    let band = sample_band(crop);
    let lognormal = area_factor.sample(rng);
    let options = tables::sub_types(crop);

    SampleDraw {
        area: round2(lognormal * (band.area.1 - band.area.0) / 3.0 + band.area.0),
        spacing: round2(rng.gen_range(band.spacing.0..=band.spacing.1)),
        irrigation: rng.gen_bool(IRRIGATION_PROBABILITY),
        sub_type: options[rng.gen_range(0..options.len())],
        days_ago: rng.gen_range(0..=PLANTING_WINDOW_DAYS),
    }
}

/// Generate `n` random records of one crop using the thread RNG and today's date
pub fn generate_samples(
    builder: &CultureRecordBuilder,
    crop_code: i64,
    n: usize,
    with_statistics: bool,
) -> Result<SampleBatch> {
    let today = Local::now().date_naive();
    generate_samples_with(builder, crop_code, n, with_statistics, &mut rand::thread_rng(), today)
}

/// Same as `generate_samples` with an explicit RNG and reference date
pub fn generate_samples_with<R: Rng>(
    builder: &CultureRecordBuilder,
    crop_code: i64,
    n: usize,
    with_statistics: bool,
    rng: &mut R,
    today: NaiveDate,
) -> Result<SampleBatch> {
    let crop = CropType::from_code(crop_code)?;
    if n == 0 || n > MAX_SAMPLES {
        return Err(CultureError::invalid(format!(
            "number of samples must be between 1 and {}, got {}",
            MAX_SAMPLES, n
        )));
    }

    let area_factor = LogNormal::new(LOGNORMAL_MU, LOGNORMAL_SIGMA)
        .map_err(|e| CultureError::invalid(format!("area distribution: {}", e)))?;
    let draws: Vec<SampleDraw> = (0..n).map(|_| draw(rng, crop, &area_factor)).collect();
    let label_prefix = crop.display_name().to_lowercase();

    // Records are independent; the analysis collaborator may be slow
    let cultures = draws
        .into_par_iter()
        .enumerate()
        .map(|(i, d)| -> Result<CultureRecord> {
            let mut record = builder.create(
                crop.code() as i64,
                d.area,
                d.spacing,
                d.irrigation,
                Some(d.sub_type.key()),
            )?;
            record.sample_label = Some(format!("{}_{}", label_prefix, i + 1));
            record.planting_date = Some(today - Duration::days(d.days_ago));
            Ok(record)
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::info!("Generated {} {} samples", cultures.len(), crop.display_name());

    let statistics = if with_statistics {
        batch_statistics(&cultures)
    } else {
        None
    };

    Ok(SampleBatch {
        crop_type: crop,
        count: cultures.len(),
        cultures,
        statistics,
    })
}
