//! External Analysis Collaborators
//!
//! Statistics, weather and recommendation engines live outside this crate. The
//! core only sees the narrow traits below; any implementation (local script,
//! HTTP service, in-process library) can stand behind them.
//!
//! Every collaborator is best-effort. A failure is an `AnalysisError` that the
//! caller logs and turns into "enrichment absent".
//!
//! ## Architecture
//! - `bridge.rs` - script runner implementing all three traits
//! - `summary.rs` - statistics/outlier/trend extraction from analysis output
//! - `weather.rs` - weather document unwrapping and recommendation extraction

pub mod bridge;
pub mod summary;
pub mod weather;

use serde::Serialize;
use serde_json::Value;

use crate::error::AnalysisError;
use crate::record::CultureRecord;

pub use bridge::ScriptBridge;
pub use summary::AnalysisSummary;
pub use weather::{WeatherReport, build_weather_report};

/// Location for weather lookups
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Statistical enrichment of a single record
pub trait AnalysisProvider: Send + Sync {
    fn analyze(&self, record: &CultureRecord) -> Result<Value, AnalysisError>;
}

/// Current weather document for a location
pub trait WeatherProvider: Send + Sync {
    fn current_weather(&self, coordinates: Coordinates) -> Result<Value, AnalysisError>;
}

/// Recommendations for a record given flattened current conditions
pub trait RecommendationProvider: Send + Sync {
    fn recommend(&self, record: &CultureRecord, weather: &Value) -> Result<Value, AnalysisError>;
}

/// Stand-in used when no analysis engine is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAnalysis;

impl AnalysisProvider for NoAnalysis {
    fn analyze(&self, _record: &CultureRecord) -> Result<Value, AnalysisError> {
        Err(AnalysisError::Unavailable("analysis disabled".to_string()))
    }
}

impl WeatherProvider for NoAnalysis {
    fn current_weather(&self, _coordinates: Coordinates) -> Result<Value, AnalysisError> {
        Err(AnalysisError::Unavailable("weather disabled".to_string()))
    }
}

impl RecommendationProvider for NoAnalysis {
    fn recommend(&self, _record: &CultureRecord, _weather: &Value) -> Result<Value, AnalysisError> {
        Err(AnalysisError::Unavailable("recommendations disabled".to_string()))
    }
}
