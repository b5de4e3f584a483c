//! Environment-driven configuration shared by the binaries

use std::path::PathBuf;
use std::time::Duration;

use crate::analysis::Coordinates;

/// São Paulo
pub const DEFAULT_LATITUDE: f64 = -23.5505;
pub const DEFAULT_LONGITUDE: f64 = -46.6333;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub port: u16,
    pub scripts_dir: PathBuf,
    pub rscript_bin: PathBuf,
    pub analysis_timeout: Duration,
    pub default_coordinates: Coordinates,
    pub weather_cache_ttl: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            scripts_dir: PathBuf::from("r"),
            rscript_bin: PathBuf::from("Rscript"),
            analysis_timeout: Duration::from_secs(60),
            default_coordinates: Coordinates {
                latitude: DEFAULT_LATITUDE,
                longitude: DEFAULT_LONGITUDE,
            },
            weather_cache_ttl: Duration::from_secs(300),
        }
    }
}

impl EngineConfig {
    /// Read from the process environment; unset or unparsable values keep their defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<f64>().ok());

        Self {
            port: lookup("PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(defaults.port),
            scripts_dir: lookup("SCRIPTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.scripts_dir),
            rscript_bin: lookup("RSCRIPT_BIN")
                .map(PathBuf::from)
                .unwrap_or(defaults.rscript_bin),
            analysis_timeout: lookup("ANALYSIS_TIMEOUT_SECS")
                .and_then(|s| s.trim().parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.analysis_timeout),
            default_coordinates: Coordinates {
                latitude: parsed("WEATHER_LATITUDE").unwrap_or(DEFAULT_LATITUDE),
                longitude: parsed("WEATHER_LONGITUDE").unwrap_or(DEFAULT_LONGITUDE),
            },
            weather_cache_ttl: lookup("WEATHER_CACHE_TTL_SECS")
                .and_then(|s| s.trim().parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.weather_cache_ttl),
        }
    }

    pub fn log_summary(&self) {
        tracing::info!("Configuration:");
        tracing::info!("  PORT: {}", self.port);
        tracing::info!("  SCRIPTS_DIR: {}", self.scripts_dir.display());
        tracing::info!("  RSCRIPT_BIN: {}", self.rscript_bin.display());
        tracing::info!("  ANALYSIS_TIMEOUT_SECS: {}", self.analysis_timeout.as_secs());
        tracing::info!(
            "  WEATHER: lat={}, lon={} (cache TTL {}s)",
            self.default_coordinates.latitude,
            self.default_coordinates.longitude,
            self.weather_cache_ttl.as_secs()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_unset() {
        let config = EngineConfig::from_lookup(|_| None);
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.port, 5000);
        assert_eq!(config.analysis_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_overrides_and_bad_values() {
        let env: HashMap<&str, &str> = [
            ("PORT", "8080"),
            ("SCRIPTS_DIR", "/opt/analysis"),
            ("ANALYSIS_TIMEOUT_SECS", "soon"),
            ("WEATHER_LATITUDE", " -15.79 "),
        ]
        .into_iter()
        .collect();
        let config = EngineConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.port, 8080);
        assert_eq!(config.scripts_dir, PathBuf::from("/opt/analysis"));
        assert_eq!(config.analysis_timeout, Duration::from_secs(60));
        assert_eq!(config.default_coordinates.latitude, -15.79);
        assert_eq!(config.default_coordinates.longitude, DEFAULT_LONGITUDE);
    }
}
