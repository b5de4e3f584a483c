//! Row Count Engine
//!
//! Converts a plot area and row spacing into a number of planting rows using a
//! notional plot shape. The strategy set is closed: soybean plots are modeled
//! as squares, sugarcane plots as 1.5:1 rectangles planted across the width.
//!
//! The engine degrades instead of failing: unknown strategy ids use `square`
//! and non-positive spacing uses 1.0 m, each with a logged warning.

use serde::Serialize;

/// Length:width ratio of the rectangular plot model
pub const RECTANGLE_ASPECT_RATIO: f64 = 1.5;

/// Square meters per hectare
pub const M2_PER_HECTARE: f64 = 10_000.0;

/// Spacing used when a non-positive spacing reaches the engine
pub const FALLBACK_SPACING_M: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryStrategy {
    Square,
    Rectangular,
}

impl GeometryStrategy {
    pub fn id(&self) -> &'static str {
        match self {
            GeometryStrategy::Square => "square",
            GeometryStrategy::Rectangular => "rectangular",
        }
    }

    /// Exact id lookup (English or Portuguese ids)
    pub fn parse(id: &str) -> Option<Self> {
        match id.trim().to_lowercase().as_str() {
            "square" | "quadrado" => Some(GeometryStrategy::Square),
            "rectangular" | "retangular" => Some(GeometryStrategy::Rectangular),
            _ => None,
        }
    }

    /// Lookup with fallback to `square`
    pub fn from_id(id: &str) -> Self {
        Self::parse(id).unwrap_or_else(|| {
            tracing::warn!("Strategy '{}' not found, using default 'square'", id);
            GeometryStrategy::Square
        })
    }

    /// Number of rows for `area_ha` hectares at `spacing_m` meters
    pub fn rows(&self, area_ha: f64, spacing_m: f64) -> u64 {
        let spacing = if spacing_m > 0.0 {
            spacing_m
        } else {
            tracing::warn!("Invalid spacing {}, using {} m", spacing_m, FALLBACK_SPACING_M);
            FALLBACK_SPACING_M
        };

        let area_m2 = area_ha * M2_PER_HECTARE;
        match self {
            GeometryStrategy::Square => square_rows(area_m2, spacing),
            GeometryStrategy::Rectangular => rectangular_rows(area_m2, spacing),
        }
    }
}

/// Side of the equivalent square divided by spacing
fn square_rows(area_m2: f64, spacing: f64) -> u64 {
    let side = area_m2.sqrt();
    truncate(side / spacing)
}

/// Rows run along the length, so only the width is divided
fn rectangular_rows(area_m2: f64, spacing: f64) -> u64 {
    let width = (area_m2 / RECTANGLE_ASPECT_RATIO).sqrt();
    truncate(width / spacing)
}

/// Toward zero; NaN and negatives become 0
fn truncate(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.trunc() as u64
    } else {
        0
    }
}

/// Row count by strategy id
pub fn compute_rows(strategy_id: &str, area_ha: f64, spacing_m: f64) -> u64 {
    GeometryStrategy::from_id(strategy_id).rows(area_ha, spacing_m)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_soybean_scenario() {
        // sqrt(500000) = 707.106..., / 0.45 = 1571.35
        assert_eq!(compute_rows("square", 50.0, 0.45), 1571);
    }

    #[test]
    fn test_square_matches_formula() {
        for &(area, spacing) in &[(1.0, 0.5), (12.5, 0.45), (300.0, 0.6), (0.01, 2.0)] {
            let expected = ((area * 10_000.0_f64).sqrt() / spacing).floor() as u64;
            assert_eq!(compute_rows("square", area, spacing), expected);
        }
    }

    #[test]
    fn test_rectangular_matches_formula() {
        for &(area, spacing) in &[(15.0, 1.55), (3.0, 1.2), (500.0, 1.7)] {
            let expected = ((area * 10_000.0_f64 / 1.5).sqrt() / spacing).floor() as u64;
            assert_eq!(compute_rows("rectangular", area, spacing), expected);
        }
        // sqrt(150000 / 1.5) = 316.22..., / 1.55 = 204.0
        assert_eq!(compute_rows("rectangular", 15.0, 1.55), 204);
    }

    #[test]
    fn test_unknown_strategy_falls_back_to_square() {
        assert_eq!(compute_rows("hexagonal", 50.0, 0.45), compute_rows("square", 50.0, 0.45));
        assert_eq!(GeometryStrategy::from_id("retangular"), GeometryStrategy::Rectangular);
    }

    #[test]
    fn test_non_positive_spacing_uses_one_meter() {
        assert_eq!(compute_rows("square", 1.0, 0.0), 100);
        assert_eq!(compute_rows("square", 1.0, -3.0), 100);
    }

    #[test]
    fn test_degenerate_area() {
        assert_eq!(compute_rows("square", 0.0, 0.5), 0);
        assert_eq!(compute_rows("rectangular", -4.0, 0.5), 0);
        assert_eq!(compute_rows("square", f64::NAN, 0.5), 0);
    }
}
