//! Weather-Based Recommendations
//!
//! The weather engine answers with a nested document:
//! `{"data": {"weather": [current, ...], "analysis": {...}}}`. We unwrap it
//! defensively, hand the flattened current conditions to the recommendation
//! engine, and fall back to a generic, data-free recommendation when the shape
//! is not what we expect.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{json, Map, Value};

use super::{Coordinates, RecommendationProvider, WeatherProvider};
use crate::error::AnalysisError;
use crate::record::{CropType, CultureRecord, SoybeanVariety, SubType, SugarcaneCycle};
use crate::recommendations::tables;

/// Analysis sub-blocks merged into the current conditions, with their new names
const ANALYSIS_BLOCKS: [(&str, &str); 4] = [
    ("temperature", "temperature_analysis"),
    ("humidity", "humidity_analysis"),
    ("wind", "wind_analysis"),
    ("agricultural_impact", "agricultural_impact"),
];

/// Flatten `data.weather` into a single current-conditions object.
pub fn extract_current_conditions(doc: &Value) -> Option<Value> {
    let data = doc.get("data")?;

    match data.get("weather")? {
        Value::Array(items) => {
            let mut current: Map<String, Value> = items.first()?.as_object()?.clone();
            if let Some(analysis) = data.get("analysis") {
                for (source, target) in ANALYSIS_BLOCKS {
                    if let Some(block) = analysis.get(source) {
                        current.insert(target.to_string(), block.clone());
                    }
                }
            }
            Some(Value::Object(current))
        }
        Value::Object(current) if !current.is_empty() => Some(Value::Object(current.clone())),
        _ => None,
    }
}

/// Recommendation document used when no weather data could be extracted
pub fn fallback_recommendations(record: &CultureRecord) -> Value {
    json!({
        "status": "warning",
        "message": "Incomplete weather data for detailed recommendations",
        "data": {
            "summary": {
                "message": "Limited recommendations due to missing weather data",
                "can_apply_chemicals": null,
                "needs_irrigation": record.irrigation_enabled,
                "ideal_for_fieldwork": null
            },
            "basic": {
                "irrigation": "Check local conditions before deciding on irrigation.",
                "chemicals_application": "Check the weather forecast before applying pesticides.",
                "fieldwork": "Plan field activities based on the local weather forecast."
            }
        }
    })
}

/// Recommendations for a record, degrading to the generic document when the
/// weather shape is unusable and to `None` when the engine fails.
pub fn recommend(
    record: &CultureRecord,
    weather_doc: &Value,
    provider: &dyn RecommendationProvider,
) -> Option<Value> {
    let Some(current) = extract_current_conditions(weather_doc) else {
        tracing::warn!("Could not extract current conditions for recommendations");
        return Some(fallback_recommendations(record));
    };

    match provider.recommend(record, &current) {
        Ok(recommendations) => Some(recommendations),
        Err(e) => {
            tracing::warn!("Recommendation engine failed: {}", e);
            None
        }
    }
}

// ============================================================================
// Productivity and planting window
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductivityEstimate {
    /// Per hectare
    pub value: f64,
    pub unit: &'static str,
    pub total: f64,
}

fn productivity_unit(crop: CropType) -> &'static str {
    match crop {
        CropType::Soybean => "bags/ha",
        CropType::Sugarcane => "t/ha",
    }
}

fn crop_section(crop: CropType) -> &'static str {
    match crop {
        CropType::Soybean => "soy_specific",
        CropType::Sugarcane => "sugarcane_specific",
    }
}

/// Per-hectare figure in a forecast sentence ("Estimated productivity: 58.5 bags/ha")
static SOYBEAN_FORECAST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:estimated productivity|produtividade estimada):\s*(\d+(?:\.\d+)?)\s*(?:bags|sacas)/ha")
        .expect("soybean forecast pattern")
});
static SUGARCANE_FORECAST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:estimated productivity|produtividade estimada):\s*(\d+(?:\.\d+)?)\s*(?:t|ton|tons)/ha")
        .expect("sugarcane forecast pattern")
});

/// Whole-plot figure in a key-metrics sentence ("2925 total bags estimated")
static SOYBEAN_PRODUCTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+)\s*(?:total bags|sacas totais)").expect("soybean production pattern"));
static SUGARCANE_PRODUCTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+)\s*(?:total tons|toneladas totais)").expect("sugarcane production pattern"));

fn forecast_pattern(crop: CropType) -> &'static Regex {
    match crop {
        CropType::Soybean => &SOYBEAN_FORECAST,
        CropType::Sugarcane => &SUGARCANE_FORECAST,
    }
}

fn production_pattern(crop: CropType) -> &'static Regex {
    match crop {
        CropType::Soybean => &SOYBEAN_PRODUCTION,
        CropType::Sugarcane => &SUGARCANE_PRODUCTION,
    }
}

fn capture_number(re: &Regex, text: &str) -> Option<f64> {
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

/// Productivity from the recommendation text, then from the record's own analysis
pub fn productivity_estimate(record: &CultureRecord, recommendations: Option<&Value>) -> ProductivityEstimate {
    let crop = record.crop_type;
    let mut estimate = ProductivityEstimate {
        value: 0.0,
        unit: productivity_unit(crop),
        total: 0.0,
    };

    if let Some(data) = recommendations.and_then(|r| r.get("data")) {
        let forecast = data
            .pointer("/statistical_models/productivity_forecast")
            .and_then(Value::as_str);
        if let Some(value) = forecast.and_then(|text| capture_number(forecast_pattern(crop), text)) {
            estimate.value = value;
            estimate.total = value * record.area;
        }

        let production = data
            .pointer("/data_analysis/key_metrics/potential_production")
            .and_then(Value::as_str);
        if let Some(total) = production.and_then(|text| capture_number(production_pattern(crop), text)) {
            estimate.total = total;
            if record.area > 0.0 {
                estimate.value = total / record.area;
            }
        }
    }

    if estimate.value == 0.0 {
        let structured = record
            .external_analysis
            .as_ref()
            .and_then(|a| a.get(crop_section(crop)))
            .and_then(|s| s.get("productivity_estimate"));
        if let Some(prod) = structured {
            let (per_ha_key, total_key) = match crop {
                CropType::Soybean => ("sacas_por_hectare", "total_sacas"),
                CropType::Sugarcane => ("toneladas_por_hectare", "total_toneladas"),
            };
            estimate.value = prod
                .get(per_ha_key)
                .or_else(|| prod.get("per_hectare"))
                .and_then(Value::as_f64)
                .unwrap_or(0.0);
            estimate.total = prod
                .get(total_key)
                .or_else(|| prod.get("total"))
                .and_then(Value::as_f64)
                .unwrap_or(0.0);
        }
    }

    estimate
}

/// Default planting window when no engine supplied one
pub fn default_planting_period(sub_type: SubType) -> &'static str {
    match sub_type {
        SubType::Variety(SoybeanVariety::Conventional | SoybeanVariety::Transgenic) => "September to November",
        SubType::Cycle(SugarcaneCycle::Short) => "February to April",
        SubType::Cycle(SugarcaneCycle::Medium) => "January to March",
        SubType::Cycle(SugarcaneCycle::Long) => "October to December",
    }
}

/// Optimal planting window: recommendations, then record analysis, then defaults
pub fn optimal_planting_period(record: &CultureRecord, recommendations: Option<&Value>) -> String {
    let section = crop_section(record.crop_type);

    let from_recommendations = recommendations
        .and_then(|r| r.get("data"))
        .and_then(|d| d.get(section))
        .and_then(|s| s.get("optimal_planting_period"))
        .and_then(Value::as_str);

    let from_analysis = record
        .external_analysis
        .as_ref()
        .and_then(|a| a.get(section))
        .and_then(|s| s.get("optimal_planting_period"))
        .and_then(Value::as_str);

    from_recommendations
        .or(from_analysis)
        .unwrap_or_else(|| default_planting_period(record.sub_type))
        .to_string()
}

// ============================================================================
// Weather report for one record
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Productivity {
    pub estimate: ProductivityEstimate,
    pub optimal_period: String,
}

/// Geometry and reference figures shown next to the weather analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CultureStats {
    pub area: f64,
    pub spacing: f64,
    pub row_count: u64,
    pub row_length_estimate: f64,
    pub total_linear_meters: f64,
    pub efficiency_metrics: Value,
    pub sub_type_reference: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_totals: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linear_meters: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReport {
    pub crop_type: CropType,
    pub weather_data: Value,
    pub recommendations: Option<Value>,
    pub current_weather: Option<Value>,
    pub weather_analysis: Option<Value>,
    pub productivity: Productivity,
    pub stats: CultureStats,
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn culture_stats(record: &CultureRecord, recommendations: Option<&Value>) -> CultureStats {
    let profile = tables::profile(record.sub_type);
    let report = &record.recommendation_report;

    let sub_type_reference = json!({
        "sub_type": record.sub_type,
        "duration": report.sub_type_info.duration_range,
        "description": report.sub_type_info.description,
        "recommended_spacing": report.spacing.recommended,
        "recommended_area": report.area.recommended,
        "irrigation": profile.irrigation,
    });

    let mut stats = CultureStats {
        area: record.area,
        spacing: record.spacing,
        row_count: record.row_count,
        row_length_estimate: round2(record.row_length_estimate.unwrap_or(0.0)),
        total_linear_meters: round2(record.total_linear_meters.unwrap_or(0.0)),
        efficiency_metrics: json!({}),
        sub_type_reference,
        input_totals: None,
        linear_meters: None,
    };

    let analysis = recommendations
        .and_then(|r| r.get("data"))
        .and_then(|d| d.get("data_analysis"));
    if let Some(analysis) = analysis {
        if let Some(metrics) = analysis.get("efficiency_metrics") {
            stats.efficiency_metrics = metrics.clone();
        }
        if let Some(key_metrics) = analysis.get("key_metrics") {
            stats.input_totals = Some(key_metrics.get("input_totals").cloned().unwrap_or_else(|| {
                json!({
                    "herbicide": format!("{} L", record.herbicide_total),
                    "fertilizer": format!("{} kg", record.fertilizer_total),
                })
            }));
            stats.linear_meters = Some(
                key_metrics
                    .get("linear_meters")
                    .cloned()
                    .unwrap_or_else(|| json!(record.total_linear_meters.unwrap_or(0.0))),
            );
        }
    }

    stats
}

/// Fetch weather, get recommendations and assemble the report.
///
/// Only a weather failure is an error; recommendation failures leave
/// `recommendations` empty.
pub fn build_weather_report(
    record: &CultureRecord,
    weather_doc: Value,
    recommender: &dyn RecommendationProvider,
) -> WeatherReport {
    let recommendations = recommend(record, &weather_doc, recommender);
    let current_weather = extract_current_conditions(&weather_doc);
    let weather_analysis = weather_doc.pointer("/data/analysis").cloned();

    WeatherReport {
        crop_type: record.crop_type,
        productivity: Productivity {
            estimate: productivity_estimate(record, recommendations.as_ref()),
            optimal_period: optimal_planting_period(record, recommendations.as_ref()),
        },
        stats: culture_stats(record, recommendations.as_ref()),
        weather_data: weather_doc,
        recommendations,
        current_weather,
        weather_analysis,
    }
}

/// Full round trip through both external engines
pub fn analyze_weather(
    record: &CultureRecord,
    coordinates: Coordinates,
    weather: &dyn WeatherProvider,
    recommender: &dyn RecommendationProvider,
) -> Result<WeatherReport, AnalysisError> {
    let weather_doc = weather.current_weather(coordinates)?;
    Ok(build_weather_report(record, weather_doc, recommender))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::CultureRecordBuilder;

    struct EchoRecommender;

    impl RecommendationProvider for EchoRecommender {
        fn recommend(&self, _record: &CultureRecord, weather: &Value) -> Result<Value, AnalysisError> {
            Ok(json!({"status": "success", "data": {"echo": weather}}))
        }
    }

    struct FailingRecommender;

    impl RecommendationProvider for FailingRecommender {
        fn recommend(&self, _record: &CultureRecord, _weather: &Value) -> Result<Value, AnalysisError> {
            Err(AnalysisError::EmptyOutput)
        }
    }

    fn soybean() -> CultureRecord {
        CultureRecordBuilder::new().create(1, 50.0, 0.45, false, None).unwrap()
    }

    fn sugarcane(cycle: &str) -> CultureRecord {
        CultureRecordBuilder::new().create(2, 15.0, 1.55, true, Some(cycle)).unwrap()
    }

    fn weather_doc() -> Value {
        json!({
            "data": {
                "weather": [{"temp": 24.5, "humidity": 70}, {"temp": 20.0}],
                "analysis": {"temperature": {"status": "ideal"}, "wind": {"speed": "low"}}
            }
        })
    }

    #[test]
    fn test_extract_list_merges_analysis() {
        let current = extract_current_conditions(&weather_doc()).unwrap();
        assert_eq!(current["temp"], 24.5);
        assert_eq!(current["temperature_analysis"]["status"], "ideal");
        assert_eq!(current["wind_analysis"]["speed"], "low");
        assert!(current.get("humidity_analysis").is_none());
    }

    #[test]
    fn test_extract_object_and_bad_shapes() {
        let doc = json!({"data": {"weather": {"temp": 30}}});
        assert_eq!(extract_current_conditions(&doc).unwrap()["temp"], 30);

        assert!(extract_current_conditions(&json!({"data": {"weather": []}})).is_none());
        assert!(extract_current_conditions(&json!({"weather": [{"temp": 1}]})).is_none());
        assert!(extract_current_conditions(&json!({"data": {"weather": "sunny"}})).is_none());
    }

    #[test]
    fn test_recommend_degrades() {
        let record = soybean();
        let fallback = recommend(&record, &json!({}), &EchoRecommender).unwrap();
        assert_eq!(fallback["status"], "warning");
        assert_eq!(fallback["data"]["summary"]["needs_irrigation"], false);

        let echoed = recommend(&record, &weather_doc(), &EchoRecommender).unwrap();
        assert_eq!(echoed["data"]["echo"]["temp"], 24.5);

        assert!(recommend(&record, &weather_doc(), &FailingRecommender).is_none());
    }

    #[test]
    fn test_productivity_from_forecast_text() {
        let record = soybean();
        let recs = json!({"data": {"statistical_models": {
            "productivity_forecast": "Estimated productivity: 58.5 bags/ha under current conditions"
        }}});
        let est = productivity_estimate(&record, Some(&recs));
        assert_eq!(est.unit, "bags/ha");
        assert_eq!(est.value, 58.5);
        assert_eq!(est.total, 58.5 * 50.0);
    }

    #[test]
    fn test_productivity_from_potential_production() {
        let record = sugarcane("medium");
        let recs = json!({"data": {"data_analysis": {"key_metrics": {
            "potential_production": "1200 toneladas totais estimadas"
        }}}});
        let est = productivity_estimate(&record, Some(&recs));
        assert_eq!(est.unit, "t/ha");
        assert_eq!(est.total, 1200.0);
        assert_eq!(est.value, 80.0);
    }

    #[test]
    fn test_productivity_patterns_per_crop() {
        let soy = forecast_pattern(CropType::Soybean);
        assert_eq!(capture_number(soy, "Produtividade estimada: 62 sacas/ha"), Some(62.0));
        assert_eq!(capture_number(soy, "estimated productivity: 58.5 bags/ha"), Some(58.5));
        assert_eq!(capture_number(soy, "Estimated productivity: 80 t/ha"), None);

        let cane = forecast_pattern(CropType::Sugarcane);
        assert_eq!(capture_number(cane, "Estimated productivity: 85.5 tons/ha"), Some(85.5));
        assert_eq!(capture_number(cane, "Produtividade estimada: 90 t/ha"), Some(90.0));
        assert_eq!(capture_number(cane, "Estimated productivity: 60 bags/ha"), None);

        let soy_total = production_pattern(CropType::Soybean);
        assert_eq!(capture_number(soy_total, "2925 total bags estimated"), Some(2925.0));
        assert_eq!(capture_number(soy_total, "3000 sacas totais"), Some(3000.0));

        let cane_total = production_pattern(CropType::Sugarcane);
        assert_eq!(capture_number(cane_total, "1275 Total Tons expected"), Some(1275.0));
        assert_eq!(capture_number(cane_total, "1200 toneladas totais"), Some(1200.0));
        assert_eq!(capture_number(cane_total, "no figure here"), None);

        // Statics are shared between calls
        assert!(std::ptr::eq(soy, forecast_pattern(CropType::Soybean)));
    }

    #[test]
    fn test_productivity_from_record_analysis() {
        let mut record = sugarcane("long");
        record.external_analysis = Some(json!({"sugarcane_specific": {"productivity_estimate": {
            "toneladas_por_hectare": 85.0, "total_toneladas": 1275.0
        }}}));
        let est = productivity_estimate(&record, None);
        assert_eq!(est.value, 85.0);
        assert_eq!(est.total, 1275.0);
    }

    #[test]
    fn test_planting_period_sources() {
        assert_eq!(optimal_planting_period(&soybean(), None), "September to November");
        assert_eq!(optimal_planting_period(&sugarcane("short"), None), "February to April");
        assert_eq!(optimal_planting_period(&sugarcane("long"), None), "October to December");

        let recs = json!({"data": {"sugarcane_specific": {"optimal_planting_period": "March"}}});
        assert_eq!(optimal_planting_period(&sugarcane("medium"), Some(&recs)), "March");
    }

    #[test]
    fn test_build_weather_report() {
        let record = sugarcane("medium");
        let report = build_weather_report(&record, weather_doc(), &EchoRecommender);
        assert_eq!(report.current_weather.as_ref().unwrap()["temp"], 24.5);
        assert_eq!(report.weather_analysis.as_ref().unwrap()["wind"]["speed"], "low");
        assert_eq!(report.productivity.optimal_period, "January to March");
        assert_eq!(report.stats.row_count, record.row_count);
        assert_eq!(report.stats.sub_type_reference["duration"], "12-14 months");
        assert!(report.stats.input_totals.is_none());
    }

    #[test]
    fn test_analyze_weather_propagates_weather_failure() {
        let record = soybean();
        let coords = Coordinates { latitude: -23.5505, longitude: -46.6333 };
        let result = analyze_weather(&record, coords, &crate::analysis::NoAnalysis, &EchoRecommender);
        assert!(result.is_err());
    }
}
