//! Analysis Summary
//!
//! Turns the statistics engine's raw output into display-ready figures:
//! per-field descriptive statistics (`input_summary`), detected outliers and
//! trends (`statistical_analysis`). Entries with non-numeric inputs are dropped.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// z for a two-sided 95% interval
const Z_95: f64 = 1.96;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedStatistics {
    pub mean: f64,
    pub std_dev: f64,
    /// Percent; absent when the mean is zero
    pub coefficient_of_variation: Option<f64>,
    pub std_error: Option<f64>,
    pub confidence_interval: Option<[f64; 2]>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub range: Option<f64>,
    pub median: Option<f64>,
    pub q1: Option<f64>,
    pub q3: Option<f64>,
    pub iqr: Option<f64>,
    pub sample_size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierInfo {
    pub count: u64,
    pub percentage: f64,
    pub values: Vec<Value>,
    pub method: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendInfo {
    pub trend: Value,
    pub slope: Option<Value>,
    pub significance: Option<Value>,
    pub method: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisSummary {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub formatted_statistics: BTreeMap<String, FormattedStatistics>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub outliers: BTreeMap<String, OutlierInfo>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub trends: BTreeMap<String, TrendInfo>,
}

impl AnalysisSummary {
    /// `None` when the document carries nothing we can summarize
    pub fn from_analysis(analysis: &Value) -> Option<Self> {
        let mut summary = AnalysisSummary::default();

        if let Some(fields) = analysis.get("input_summary").and_then(Value::as_object) {
            for (field, stats) in fields {
                if let Some(formatted) = format_statistics(stats) {
                    summary.formatted_statistics.insert(field.clone(), formatted);
                }
            }
        }

        if let Some(entries) = analysis.get("statistical_analysis").and_then(Value::as_object) {
            for (key, value) in entries {
                if let Some(field) = key.strip_suffix("_outliers") {
                    if let Some(info) = outlier_info(value) {
                        summary.outliers.insert(field.to_string(), info);
                    }
                } else if let Some(field) = key.strip_suffix("_trend") {
                    if let Some(info) = trend_info(value) {
                        summary.trends.insert(field.to_string(), info);
                    }
                }
            }
        }

        if summary.is_empty() {
            None
        } else {
            Some(summary)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.formatted_statistics.is_empty() && self.outliers.is_empty() && self.trends.is_empty()
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn num(stats: &Value, key: &str) -> Option<f64> {
    stats.get(key).and_then(Value::as_f64)
}

fn format_statistics(stats: &Value) -> Option<FormattedStatistics> {
    let mean = num(stats, "mean")?;
    let std_dev = num(stats, "std_dev")?;
    let n = num(stats, "n").unwrap_or(0.0);

    let std_error = (n > 0.0).then(|| std_dev / n.sqrt());
    let confidence_interval = std_error.map(|se| {
        let low = num(stats, "conf_low").unwrap_or(mean - Z_95 * se);
        let high = num(stats, "conf_high").unwrap_or(mean + Z_95 * se);
        [round2(low), round2(high)]
    });

    let min = num(stats, "min");
    let max = num(stats, "max");

    Some(FormattedStatistics {
        mean: round2(mean),
        std_dev: round2(std_dev),
        coefficient_of_variation: (mean != 0.0).then(|| round2(std_dev / mean * 100.0)),
        std_error: std_error.map(round2),
        confidence_interval,
        min,
        max,
        range: min.zip(max).map(|(lo, hi)| round2(hi - lo)),
        median: num(stats, "median"),
        q1: num(stats, "q1"),
        q3: num(stats, "q3"),
        iqr: num(stats, "iqr"),
        sample_size: if n > 0.0 { n as u64 } else { 0 },
    })
}

fn outlier_info(value: &Value) -> Option<OutlierInfo> {
    let count = num(value, "n_outliers").filter(|n| *n > 0.0)?;
    Some(OutlierInfo {
        count: count as u64,
        percentage: round2(num(value, "percentage").unwrap_or(0.0)),
        values: value
            .get("outliers")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
        method: value
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string(),
    })
}

fn trend_info(value: &Value) -> Option<TrendInfo> {
    let trend = value.get("trend")?.clone();
    Some(TrendInfo {
        trend,
        slope: value.get("slope").cloned(),
        significance: value.get("significance").cloned(),
        method: value
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or("simple analysis")
            .to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_formatted_statistics() {
        let doc = json!({
            "input_summary": {
                "area": {"mean": 20.0, "std_dev": 4.0, "n": 16, "min": 12.0, "max": 31.5,
                         "median": 19.0, "q1": 16.0, "q3": 24.0, "iqr": 8.0},
                "label": {"mean": "n/a", "std_dev": 1.0}
            }
        });
        let summary = AnalysisSummary::from_analysis(&doc).unwrap();
        assert_eq!(summary.formatted_statistics.len(), 1);

        let area = &summary.formatted_statistics["area"];
        assert_eq!(area.coefficient_of_variation, Some(20.0));
        assert_eq!(area.std_error, Some(1.0));
        assert_eq!(area.confidence_interval, Some([18.04, 21.96]));
        assert_eq!(area.range, Some(19.5));
        assert_eq!(area.sample_size, 16);
    }

    #[test]
    fn test_zero_mean_and_missing_n() {
        let doc = json!({"input_summary": {"x": {"mean": 0.0, "std_dev": 2.0}}});
        let summary = AnalysisSummary::from_analysis(&doc).unwrap();
        let x = &summary.formatted_statistics["x"];
        assert_eq!(x.coefficient_of_variation, None);
        assert_eq!(x.std_error, None);
        assert_eq!(x.confidence_interval, None);
        assert_eq!(x.sample_size, 0);
    }

    #[test]
    fn test_explicit_confidence_bounds() {
        let doc = json!({"input_summary": {"x": {"mean": 10.0, "std_dev": 2.0, "n": 4,
                                                 "conf_low": 7.123, "conf_high": 12.877}}});
        let summary = AnalysisSummary::from_analysis(&doc).unwrap();
        assert_eq!(summary.formatted_statistics["x"].confidence_interval, Some([7.12, 12.88]));
    }

    #[test]
    fn test_outliers_and_trends() {
        let doc = json!({
            "statistical_analysis": {
                "area_outliers": {"n_outliers": 2, "percentage": 13.3333, "outliers": [90.1, 95.0], "method": "IQR"},
                "spacing_outliers": {"n_outliers": 0},
                "area_trend": {"trend": "increasing", "slope": 0.4},
                "unrelated": {"trend": "flat"}
            }
        });
        let summary = AnalysisSummary::from_analysis(&doc).unwrap();
        assert_eq!(summary.outliers.len(), 1);
        assert_eq!(summary.outliers["area"].count, 2);
        assert_eq!(summary.outliers["area"].percentage, 13.33);
        assert_eq!(summary.trends.len(), 1);
        assert_eq!(summary.trends["area"].method, "simple analysis");
        assert_eq!(summary.trends["area"].significance, None);
    }

    #[test]
    fn test_nothing_to_summarize() {
        assert!(AnalysisSummary::from_analysis(&json!({"status": "success"})).is_none());
    }
}
