//! OpenWeatherMap current-weather integration

use crate::config::WeatherConfig;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Weather API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    #[error("Unexpected weather response: {0}")]
    MalformedResponse(String),

    #[error("Missing API key (set weather.api_key or OPENWEATHER_API_KEY)")]
    MissingApiKey,

    #[error("Live weather lookup is disabled")]
    Disabled,
}

// Client for the current temperature of a city
pub struct WeatherClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    units: String,
    enabled: bool,
}

// the only part of the response body we read
#[derive(Deserialize)]
struct CurrentWeather {
    main: MainBlock,
}

#[derive(Deserialize)]
struct MainBlock {
    temp: f64,
}

impl WeatherClient {
    pub fn new(config: &WeatherConfig) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.resolved_api_key(),
            units: config.units.clone(),
            enabled: config.enabled,
        })
    }

    // override the key from config/env (e.g. a CLI flag)
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Request URL for a city; the key is part of the query string
    pub fn request_url(&self, city: &str) -> Result<String, WeatherError> {
        let api_key = self.api_key.as_deref().ok_or(WeatherError::MissingApiKey)?;
        Ok(format!(
            "{}?q={}&appid={}&units={}",
            self.base_url,
            urlencoding::encode(city),
            urlencoding::encode(api_key),
            urlencoding::encode(&self.units)
        ))
    }

    /// Current temperature for a city. Any error means no reading is available.
    pub async fn current_temperature(&self, city: &str) -> Result<f64, WeatherError> {
        //skip if disabled
        if !self.enabled {
            return Err(WeatherError::Disabled);
        }
        let url = self.request_url(city)?;

        info!(city = %city, "Requesting current weather");
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(city = %city, status = status.as_u16(), "Weather API returned an error");
            return Err(WeatherError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        parse_temperature(&body)
    }
}

/// Extract `main.temp` from a current-weather response body
pub fn parse_temperature(body: &str) -> Result<f64, WeatherError> {
    let weather: CurrentWeather =
        serde_json::from_str(body).map_err(|e| WeatherError::MalformedResponse(e.to_string()))?;
    Ok(weather.main.temp)
}
