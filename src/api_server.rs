// Axum API Server Module
//
// Purpose: REST API over the record builder and the in-memory store.
// Record creation may run the external statistics script, so it goes through
// spawn_blocking; weather documents are cached per coordinate pair.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use moka::future::Cache;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::analysis::weather::build_weather_report;
use crate::analysis::{
    AnalysisProvider, Coordinates, RecommendationProvider, ScriptBridge, WeatherProvider,
};
use crate::builder::CultureRecordBuilder;
use crate::config::EngineConfig;
use crate::error::CultureError;
use crate::format::envelope;
use crate::recommendations::tables::{self, TABLES_VERSION};
use crate::record::{CropType, CultureUpdate};
use crate::statistics::generate_samples;
use crate::store::{CultureStore, StoredCulture};

const DEFAULT_SAMPLE_COUNT: usize = 10;

#[derive(Clone)]
pub struct AppState {
    pub builder: CultureRecordBuilder,
    pub store: Arc<CultureStore>,
    pub weather: Arc<dyn WeatherProvider>,
    pub recommender: Arc<dyn RecommendationProvider>,
    /// Weather documents keyed by "lat,lon"
    pub weather_cache: Cache<String, Value>,
    pub default_coordinates: Coordinates,
}

impl AppState {
    /// State backed by the R script bridge
    pub fn new(config: &EngineConfig) -> Self {
        tracing::info!("Initializing script bridge ({})...", config.scripts_dir.display());
        let bridge = Arc::new(ScriptBridge::from_config(config));

        Self::with_providers(
            bridge.clone(),
            bridge.clone(),
            bridge,
            config.default_coordinates,
            config.weather_cache_ttl,
        )
    }

    pub fn with_providers(
        analysis: Arc<dyn AnalysisProvider>,
        weather: Arc<dyn WeatherProvider>,
        recommender: Arc<dyn RecommendationProvider>,
        default_coordinates: Coordinates,
        weather_cache_ttl: Duration,
    ) -> Self {
        tracing::info!("Initializing Moka weather cache...");
        let weather_cache = Cache::builder()
            .max_capacity(1_000)
            .time_to_live(weather_cache_ttl)
            .build();

        Self {
            builder: CultureRecordBuilder::with_analysis(analysis),
            store: Arc::new(CultureStore::new()),
            weather,
            recommender,
            weather_cache,
            default_coordinates,
        }
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))

        // Reference tables
        .route("/api/recommendations", get(get_recommendations))

        // Culture records
        // generate must come before :id
        .route("/api/cultures", get(list_cultures).post(create_culture))
        .route("/api/cultures/generate", post(generate_cultures))
        .route(
            "/api/cultures/:id",
            get(get_culture)
                .put(update_culture)
                .patch(update_culture)
                .delete(delete_culture),
        )
        .route("/api/cultures/:id/lines", get(get_culture_lines))
        .route("/api/cultures/:id/weather-analysis", get(get_weather_analysis))

        // Middleware (applied in reverse order)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Request parsing
// ============================================================================

/// Create/update body. Numbers may arrive as strings, flags as words.
#[derive(Debug, Default, Deserialize)]
pub struct CultureForm {
    #[serde(alias = "culture_type")]
    pub crop_type: Option<Value>,
    pub area: Option<Value>,
    #[serde(alias = "espacamento")]
    pub spacing: Option<Value>,
    #[serde(alias = "irrigacao", alias = "irrigation_enabled")]
    pub irrigation: Option<Value>,
    #[serde(alias = "variedade")]
    pub variety: Option<String>,
    #[serde(alias = "ciclo")]
    pub cycle: Option<String>,
    pub sub_type: Option<String>,
}

impl CultureForm {
    /// Sub-type key for `crop`: the neutral `sub_type` field, then the crop's own
    /// axis (variety for soybean, cycle for sugarcane). The other axis is ignored.
    fn sub_type(&self, crop: CropType) -> Option<String> {
        let axis = match crop {
            CropType::Soybean => &self.variety,
            CropType::Sugarcane => &self.cycle,
        };
        [&self.sub_type, axis]
            .into_iter()
            .flatten()
            .map(|key| key.trim())
            .find(|key| !key.is_empty())
            .map(str::to_string)
    }

    fn to_update(&self, crop: CropType) -> Result<CultureUpdate, CultureError> {
        Ok(CultureUpdate {
            area: self.area.as_ref().map(|v| parse_number("area", v)).transpose()?,
            spacing: self.spacing.as_ref().map(|v| parse_number("spacing", v)).transpose()?,
            sub_type: self.sub_type(crop),
            irrigation_enabled: self.irrigation.as_ref().map(parse_flag),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateForm {
    #[serde(alias = "culture_type")]
    pub crop_type: Option<Value>,
    pub num_samples: Option<Value>,
    pub with_statistics: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CoordinateQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

fn parse_number(name: &str, value: &Value) -> Result<f64, CultureError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| CultureError::invalid(format!("{} must be a number, got {}", name, value)))
}

fn parse_integer(name: &str, value: &Value) -> Result<i64, CultureError> {
    let number = parse_number(name, value)?;
    if number.fract() != 0.0 {
        return Err(CultureError::invalid(format!("{} must be an integer, got {}", name, value)));
    }
    Ok(number as i64)
}

/// `true, sim, s, yes, y, 1, on`, case-insensitive; anything else is false
fn parse_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() == Some(1.0),
        Value::String(s) => matches!(
            s.trim().to_lowercase().as_str(),
            "true" | "sim" | "s" | "yes" | "y" | "1" | "on"
        ),
        _ => false,
    }
}

fn required<'a>(name: &str, value: &'a Option<Value>) -> Result<&'a Value, CultureError> {
    value
        .as_ref()
        .ok_or_else(|| CultureError::invalid(format!("missing field '{}'", name)))
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn get_recommendations() -> impl IntoResponse {
    Json(envelope(
        "success",
        "Reference tables",
        json!({
            "version": TABLES_VERSION,
            "soybean": tables::table_json(CropType::Soybean),
            "sugarcane": tables::table_json(CropType::Sugarcane),
        }),
    ))
}

async fn list_cultures(State(state): State<AppState>) -> impl IntoResponse {
    let cultures = state.store.list();
    let message = format!("{} cultures found", cultures.len());
    Json(envelope("success", message, cultures))
}

fn with_alerts(mut body: Value, stored: &StoredCulture) -> Value {
    body["alerts"] = json!(stored.record.recommendation_report.alerts());
    body
}

async fn create_culture(
    State(state): State<AppState>,
    Json(form): Json<CultureForm>,
) -> Result<Json<Value>, AppError> {
    let crop_code = parse_integer("crop_type", required("crop_type", &form.crop_type)?)?;
    let area = parse_number("area", required("area", &form.area)?)?;
    let spacing = parse_number("spacing", required("spacing", &form.spacing)?)?;
    let irrigation = form.irrigation.as_ref().map(parse_flag).unwrap_or(false);
    let sub_type = form.sub_type(CropType::from_code(crop_code)?);

    let builder = state.builder.clone();
    let record = tokio::task::spawn_blocking(move || {
        builder.create(crop_code, area, spacing, irrigation, sub_type.as_deref())
    })
    .await
    .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))??;

    let stored = state.store.insert(record);
    tracing::info!("Culture {} created", stored.id);

    let body = envelope("success", "Culture created successfully", &stored);
    Ok(Json(with_alerts(body, &stored)))
}

async fn generate_cultures(
    State(state): State<AppState>,
    Json(form): Json<GenerateForm>,
) -> Result<Json<Value>, AppError> {
    let crop_code = parse_integer("crop_type", required("crop_type", &form.crop_type)?)?;
    let n = match &form.num_samples {
        Some(v) => parse_integer("num_samples", v)?,
        None => DEFAULT_SAMPLE_COUNT as i64,
    };
    if n <= 0 {
        return Err(CultureError::invalid("num_samples must be greater than zero").into());
    }
    let with_statistics = form.with_statistics.as_ref().map(parse_flag).unwrap_or(true);

    let builder = state.builder.clone();
    let batch = tokio::task::spawn_blocking(move || {
        generate_samples(&builder, crop_code, n as usize, with_statistics)
    })
    .await
    .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))??;

    let ids: Vec<u64> = batch
        .cultures
        .iter()
        .map(|record| state.store.insert(record.clone()).id)
        .collect();

    let message = format!("{} {} samples generated", batch.count, batch.crop_type.display_name());
    let mut body = envelope("success", message, &batch);
    body["ids"] = json!(ids);
    Ok(Json(body))
}

async fn get_culture(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, AppError> {
    let stored = state.store.get(id)?;
    Ok(Json(envelope("success", "Culture found", stored)))
}

async fn update_culture(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(form): Json<CultureForm>,
) -> Result<Json<Value>, AppError> {
    let crop = state.store.get(id)?.record.crop_type;
    let update = form.to_update(crop)?;
    let stored = state.store.update(&state.builder, id, update)?;

    let body = envelope("success", "Culture updated successfully", &stored);
    Ok(Json(with_alerts(body, &stored)))
}

async fn delete_culture(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, AppError> {
    let removed = state.store.delete(id)?;
    Ok(Json(envelope("success", "Culture removed successfully", removed)))
}

async fn get_culture_lines(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, AppError> {
    let lines = state.store.compute_lines(id)?;
    Ok(Json(envelope("success", "Lines computed", lines)))
}

async fn get_weather_analysis(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(query): Query<CoordinateQuery>,
) -> Result<Json<Value>, AppError> {
    let stored = state.store.get(id)?;
    let coordinates = Coordinates {
        latitude: query.lat.unwrap_or(state.default_coordinates.latitude),
        longitude: query.lon.unwrap_or(state.default_coordinates.longitude),
    };

    let cache_key = format!("{:.4},{:.4}", coordinates.latitude, coordinates.longitude);
    let weather_doc = match state.weather_cache.get(&cache_key).await {
        Some(doc) => doc,
        None => {
            let weather = state.weather.clone();
            let doc = tokio::task::spawn_blocking(move || weather.current_weather(coordinates))
                .await
                .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))?
                .map_err(|e| {
                    tracing::warn!("Weather lookup failed: {}", e);
                    AppError::Unavailable("Weather data unavailable".to_string())
                })?;
            state.weather_cache.insert(cache_key, doc.clone()).await;
            doc
        }
    };

    let recommender = state.recommender.clone();
    let record = stored.record;
    let report = tokio::task::spawn_blocking(move || {
        build_weather_report(&record, weather_doc, recommender.as_ref())
    })
    .await
    .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))?;

    let mut body = envelope("success", "Weather analysis completed", report);
    body["id"] = json!(id);
    Ok(Json(body))
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Unavailable(String),
    Internal(String),
}

impl From<CultureError> for AppError {
    fn from(err: CultureError) -> Self {
        match err {
            CultureError::InvalidParameter(_) => AppError::BadRequest(err.to_string()),
            CultureError::NotFound(_) => AppError::NotFound(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(envelope("error", message, Value::Null))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag_words() {
        for yes in ["true", "Sim", "s", "YES", "y", "1", " on "] {
            assert!(parse_flag(&json!(yes)), "{}", yes);
        }
        for no in ["false", "nao", "0", ""] {
            assert!(!parse_flag(&json!(no)), "{}", no);
        }
        assert!(parse_flag(&json!(true)));
        assert!(parse_flag(&json!(1)));
        assert!(!parse_flag(&Value::Null));
    }

    #[test]
    fn test_parse_number_accepts_strings() {
        assert_eq!(parse_number("area", &json!("12,5")), Ok(12.5));
        assert_eq!(parse_number("area", &json!(3)), Ok(3.0));
        assert!(parse_number("area", &json!("lots")).is_err());
        assert!(parse_integer("crop_type", &json!(1.5)).is_err());
        assert_eq!(parse_integer("crop_type", &json!("2")), Ok(2));
    }

    #[test]
    fn test_form_sub_type_follows_crop_axis() {
        let form: CultureForm = serde_json::from_value(json!({
            "culture_type": 2, "area": 10, "espacamento": "1.5", "ciclo": "longo", "variedade": "transgenica"
        }))
        .unwrap();
        assert_eq!(form.sub_type(CropType::Sugarcane).as_deref(), Some("longo"));
        assert_eq!(form.sub_type(CropType::Soybean).as_deref(), Some("transgenica"));

        let update = form.to_update(CropType::Sugarcane).unwrap();
        assert_eq!(update.sub_type.as_deref(), Some("longo"));
        assert_eq!(update.spacing, Some(1.5));
        assert_eq!(update.irrigation_enabled, None);

        let neutral: CultureForm =
            serde_json::from_value(json!({"sub_type": "short", "ciclo": "longo"})).unwrap();
        assert_eq!(neutral.sub_type(CropType::Sugarcane).as_deref(), Some("short"));

        let blank: CultureForm = serde_json::from_value(json!({"sub_type": " ", "ciclo": "longo"})).unwrap();
        assert_eq!(blank.sub_type(CropType::Sugarcane).as_deref(), Some("longo"));

        let wrong_axis: CultureForm = serde_json::from_value(json!({"area": 35, "variedade": "transgenica"})).unwrap();
        assert_eq!(wrong_axis.to_update(CropType::Sugarcane).unwrap().sub_type, None);
    }
}
