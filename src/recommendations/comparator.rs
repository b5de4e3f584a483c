//! Range Comparator
//!
//! Tri-state comparison of a planting parameter against a reference range.
//! Bounds are inclusive; an open upper bound never yields `Above`.

use serde::Serialize;

/// Where a value sits relative to a reference range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeFit {
    /// value < min
    Below,
    /// min <= value <= max
    Within,
    /// value > max (only possible when max is bounded)
    Above,
}

impl RangeFit {
    pub fn display_text(&self) -> &'static str {
        match self {
            RangeFit::Below => "Below recommended range",
            RangeFit::Within => "Within recommended range",
            RangeFit::Above => "Above recommended range",
        }
    }
}

/// Result of a range comparison with distance context
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeComparison {
    pub fit: RangeFit,
    pub value: f64,
    pub min: f64,
    pub max: Option<f64>,
    /// Distance to the violated bound, 0 when within
    pub distance_from_range: f64,
}

impl RangeComparison {
    pub fn is_within_range(&self) -> bool {
        self.fit == RangeFit::Within
    }
}

/// Classify `value` against `[min, max]`
pub fn compare_to_range(value: f64, min: f64, max: Option<f64>) -> RangeComparison {
    let (fit, distance) = if value < min {
        (RangeFit::Below, min - value)
    } else {
        match max {
            Some(max) if value > max => (RangeFit::Above, value - max),
            _ => (RangeFit::Within, 0.0),
        }
    };

    RangeComparison {
        fit,
        value,
        min,
        max,
        distance_from_range: distance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_within_range() {
        let comp = compare_to_range(1.55, 1.5, Some(1.6));
        assert_eq!(comp.fit, RangeFit::Within);
        assert_eq!(comp.distance_from_range, 0.0);
        assert!(comp.is_within_range());
    }

    #[test]
    fn test_bounds_are_inclusive() {
        assert_eq!(compare_to_range(1.5, 1.5, Some(1.6)).fit, RangeFit::Within);
        assert_eq!(compare_to_range(1.6, 1.5, Some(1.6)).fit, RangeFit::Within);
    }

    #[test]
    fn test_below_and_above() {
        let comp = compare_to_range(3.0, 10.0, Some(20.0));
        assert_eq!(comp.fit, RangeFit::Below);
        assert_eq!(comp.distance_from_range, 7.0);

        let comp = compare_to_range(25.0, 10.0, Some(20.0));
        assert_eq!(comp.fit, RangeFit::Above);
        assert_eq!(comp.distance_from_range, 5.0);
    }

    #[test]
    fn test_open_upper_bound() {
        let comp = compare_to_range(10_000.0, 20.0, None);
        assert_eq!(comp.fit, RangeFit::Within);
    }
}
