//! Script Bridge
//!
//! Runs the external R analysis scripts. Input goes to a temporary JSON file
//! whose path is the script's only argument; the script answers with a JSON
//! document on stdout.
//!
//! One attempt per call, bounded by `timeout`. On expiry the child is killed.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::{json, Value};

use super::{AnalysisProvider, Coordinates, RecommendationProvider, WeatherProvider};
use crate::config::EngineConfig;
use crate::error::AnalysisError;
use crate::record::CultureRecord;

const STATISTICS_SCRIPT: &str = "api.R";
const WEATHER_SCRIPT: &str = "modules/weather_analysis.R";
const RECOMMENDATIONS_SCRIPT: &str = "modules/recommendations.R";

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Characters of stderr/stdout kept in error messages
const PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone)]
pub struct ScriptBridge {
    interpreter: PathBuf,
    scripts_dir: PathBuf,
    timeout: Duration,
}

impl ScriptBridge {
    pub fn new(interpreter: impl Into<PathBuf>, scripts_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            interpreter: interpreter.into(),
            scripts_dir: scripts_dir.into(),
            timeout,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(&config.rscript_bin, &config.scripts_dir, config.analysis_timeout)
    }

    pub fn script_path(&self, name: &str) -> PathBuf {
        self.scripts_dir.join(name)
    }

    /// Run `script` on `input` and parse its stdout as JSON
    pub fn run_script<T: Serialize + ?Sized>(&self, script: &Path, input: &T) -> Result<Value, AnalysisError> {
        if !script.exists() {
            return Err(AnalysisError::ScriptNotFound(script.to_path_buf()));
        }

        // Removed on drop, whichever way we leave this function
        let mut input_file = tempfile::Builder::new()
            .prefix("culture_")
            .suffix(".json")
            .tempfile()?;
        serde_json::to_writer(&mut input_file, input)?;
        input_file.flush()?;

        tracing::debug!("Running script {:?} {:?}", script, input_file.path());

        let mut child = Command::new(&self.interpreter)
            .arg(script)
            .arg(input_file.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Drain pipes on their own threads so a chatty child cannot block on a full pipe
        let stdout_reader = spawn_reader(child.stdout.take());
        let stderr_reader = spawn_reader(child.stderr.take());

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait()? {
                Some(status) => break status,
                None if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(AnalysisError::Timeout(self.timeout));
                }
                None => thread::sleep(POLL_INTERVAL),
            }
        };

        let stdout = stdout_reader.join().unwrap_or_default();
        let stderr = stderr_reader.join().unwrap_or_default();

        if !status.success() {
            return Err(AnalysisError::NonZeroExit {
                code: status.code(),
                stderr: preview(&stderr),
            });
        }

        if stdout.trim().is_empty() {
            return Err(AnalysisError::EmptyOutput);
        }

        if stdout.len() > 1024 * 1024 {
            tracing::info!("Large script response: {:.2} MB", stdout.len() as f64 / (1024.0 * 1024.0));
        }

        serde_json::from_str(&stdout).map_err(|e| {
            AnalysisError::MalformedOutput(format!("{} (output starts with: {})", e, preview(&stdout)))
        })
    }
}

fn spawn_reader<R: Read + Send + 'static>(source: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = String::new();
        if let Some(mut source) = source {
            let _ = source.read_to_string(&mut buf);
        }
        buf
    })
}

fn preview(text: &str) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

impl AnalysisProvider for ScriptBridge {
    fn analyze(&self, record: &CultureRecord) -> Result<Value, AnalysisError> {
        self.run_script(&self.script_path(STATISTICS_SCRIPT), record)
    }
}

impl WeatherProvider for ScriptBridge {
    fn current_weather(&self, coordinates: Coordinates) -> Result<Value, AnalysisError> {
        if !coordinates.latitude.is_finite() || !coordinates.longitude.is_finite() {
            return Err(AnalysisError::MalformedOutput(format!(
                "invalid coordinates: lat={}, lon={}",
                coordinates.latitude, coordinates.longitude
            )));
        }
        self.run_script(&self.script_path(WEATHER_SCRIPT), &coordinates)
    }
}

impl RecommendationProvider for ScriptBridge {
    fn recommend(&self, record: &CultureRecord, weather: &Value) -> Result<Value, AnalysisError> {
        let combined = json!({
            "culture": record,
            "weather": weather,
        });
        self.run_script(&self.script_path(RECOMMENDATIONS_SCRIPT), &combined)
    }
}
