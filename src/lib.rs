//! Crop Planner Rust Implementation
//!
//! Validation and derivation engine for soybean and sugarcane planting records.
//!
//! Layout:
//! - `recommendations/`: reference tables and the parameter validator
//! - `geometry`: row count strategies (square, rectangular)
//! - `inputs`: agrochemical totals and linear meters
//! - `builder`: assembles complete records, the main entry point
//! - `analysis/`: best-effort external statistics, weather and recommendations
//! - `statistics`, `store`, `format`, `config`: supporting pieces for the binaries
//!
//! HTTP API behind the `api` feature.

pub mod error;
pub mod record;
pub mod recommendations;
pub mod geometry;
pub mod inputs;
pub mod builder;
pub mod analysis;
pub mod statistics;
pub mod store;
pub mod format;
pub mod config;

#[cfg(feature = "api")]
pub mod api_server;

// Re-export commonly used types
pub use error::{AnalysisError, CultureError, Result};
pub use record::{CropType, CultureRecord, CultureUpdate, SoybeanVariety, SubType, SugarcaneCycle};
pub use recommendations::{validate, RangeFit, ValidationReport};
pub use geometry::{compute_rows, GeometryStrategy};
pub use inputs::{compute_inputs, InputQuantities};
pub use builder::CultureRecordBuilder;
pub use analysis::{AnalysisProvider, Coordinates, NoAnalysis, RecommendationProvider, ScriptBridge, WeatherProvider};
pub use statistics::{describe, generate_samples, DescriptiveStats, SampleBatch};
pub use store::{CultureStore, StoredCulture};
pub use format::{format_output, OutputFormat};
pub use config::EngineConfig;

#[cfg(feature = "api")]
pub use api_server::{AppState, create_router};
