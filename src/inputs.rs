//! Input Quantity Calculator
//!
//! Agrochemical totals from per-hectare doses, plus a row length estimate.
//!
//! The row length is an approximation: the plot area is spread evenly over the
//! rows at the given spacing, `(area_m2) / (rows * spacing)`. It is not the
//! exact length of a row in the square/rectangle model and must stay this way
//! for compatibility with existing consumers.

use serde::Serialize;

use crate::geometry::M2_PER_HECTARE;
use crate::record::CultureRecord;

/// Irrigation water per application, L/m²
pub const IRRIGATION_RATE_L_PER_M2: f64 = 0.8;

/// Derived input quantities for one record
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InputQuantities {
    /// Liters
    pub herbicide_total: f64,
    /// Kilograms
    pub fertilizer_total: f64,
    /// Meters per row; absent when there are no rows
    pub row_length_estimate: Option<f64>,
    pub total_linear_meters: Option<f64>,
}

/// Compute totals. No rounding is applied.
pub fn compute_inputs(
    area: f64,
    spacing: f64,
    row_count: u64,
    herbicide_dose_per_ha: f64,
    fertilizer_dose_per_ha: f64,
) -> InputQuantities {
    let herbicide_total = area * herbicide_dose_per_ha;
    let fertilizer_total = area * fertilizer_dose_per_ha;

    let (row_length_estimate, total_linear_meters) = if row_count > 0 && spacing > 0.0 {
        let rows = row_count as f64;
        let row_length = (area * M2_PER_HECTARE) / (rows * spacing);
        (Some(row_length), Some(rows * row_length))
    } else {
        (None, None)
    };

    InputQuantities {
        herbicide_total,
        fertilizer_total,
        row_length_estimate,
        total_linear_meters,
    }
}

/// Liters of water for one application over the whole plot
pub fn water_consumption_liters(area: f64) -> f64 {
    area * M2_PER_HECTARE * IRRIGATION_RATE_L_PER_M2
}

impl InputQuantities {
    pub fn for_record(record: &CultureRecord) -> Self {
        compute_inputs(
            record.area,
            record.spacing,
            record.row_count,
            record.herbicide_dose_per_ha,
            record.fertilizer_dose_per_ha,
        )
    }

    /// Overwrite the derived input fields of a record
    pub fn apply_to(&self, record: &mut CultureRecord) {
        record.herbicide_total = self.herbicide_total;
        record.fertilizer_total = self.fertilizer_total;
        record.row_length_estimate = self.row_length_estimate;
        record.total_linear_meters = self.total_linear_meters;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_totals() {
        let q = compute_inputs(50.0, 0.45, 1571, 2.5, 300.0);
        assert_eq!(q.herbicide_total, 125.0);
        assert_eq!(q.fertilizer_total, 15_000.0);

        let row_length = q.row_length_estimate.unwrap();
        assert_relative_eq!(row_length, 500_000.0 / (1571.0 * 0.45), epsilon = 1e-9);
        assert_relative_eq!(q.total_linear_meters.unwrap(), 1571.0 * row_length, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_rows_omits_lengths() {
        let q = compute_inputs(0.0001, 5.0, 0, 3.0, 400.0);
        assert_eq!(q.row_length_estimate, None);
        assert_eq!(q.total_linear_meters, None);
        assert_relative_eq!(q.herbicide_total, 0.0003, epsilon = 1e-12);
    }

    #[test]
    fn test_water() {
        assert_relative_eq!(water_consumption_liters(15.0), 120_000.0, epsilon = 1e-6);
    }
}
