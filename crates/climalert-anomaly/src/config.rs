//! Configuration parsing for seasonal anomaly detection

use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Environment variable consulted when the config file carries no API key
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

// Main config structure. every section is optional
#[derive(Debug, Deserialize, Default)]
pub struct AnomalyConfig {
    #[serde(default)]
    pub detection: DetectionConfig,

    // live weather lookup
    #[serde(default)]
    pub weather: WeatherConfig,
}

// anomaly band and smoothing parameters
#[derive(Debug, Deserialize)]
pub struct DetectionConfig {
    // width of the anomaly band in standard deviations
    #[serde(default)]
    pub sensitivity: Sensitivity,

    // number of same-city observations in the trailing average
    #[serde(default = "default_smoothing_window")]
    pub smoothing_window: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            sensitivity: Sensitivity::default(),
            smoothing_window: default_smoothing_window(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    Low,    // 3 standard deviations means fewer anomalies
    #[default]
    Medium, // balanced
    High,   // more anomalies
}

impl Sensitivity {
    // convert sensitivity to standard deviation multiplier
    pub fn to_sigma(&self) -> f64 {
        match self {
            Sensitivity::Low => 3.0,
            Sensitivity::Medium => 2.0,
            Sensitivity::High => 1.5,
        }
    }
}

// OpenWeatherMap current weather endpoint
#[derive(Debug, Deserialize, Clone)]
pub struct WeatherConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    // empty or missing falls back to OPENWEATHER_API_KEY
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_units")]
    pub units: String,

    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_base_url(),
            api_key: None,
            units: default_units(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl WeatherConfig {
    /// API key from the file, else from the environment
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty()))
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("smoothing_window must be at least 1")]
    ZeroSmoothingWindow,

    #[error("weather.timeout_seconds must be at least 1")]
    ZeroTimeout,
}

impl AnomalyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.detection.smoothing_window == 0 {
            return Err(ConfigError::ZeroSmoothingWindow);
        }
        if self.weather.timeout_seconds == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}

// default value helpers for serde
fn default_true() -> bool {
    true
}

fn default_smoothing_window() -> usize {
    30
}

fn default_base_url() -> String {
    "http://api.openweathermap.org/data/2.5/weather".to_string()
}

fn default_units() -> String {
    "metric".to_string()
}

fn default_timeout_seconds() -> u64 {
    10
}

// Load configuration from a TOML file

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AnomalyConfig, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    let config: AnomalyConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}
