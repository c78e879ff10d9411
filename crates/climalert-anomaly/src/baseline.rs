//! Per (city, season) baseline statistics

use crate::detection::AnomalyBand;
use climalert_core::{Observation, Season};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq)]
pub enum BaselineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Mean and sample standard deviation of one city's temperatures in one season
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalBaseline {
    pub location: String,
    pub season: Season,
    pub mean: f64,
    pub sample_std: Option<f64>, // None for a single observation (n-1 = 0)
    pub count: usize,
    pub min: f64,
    pub max: f64,
}

impl SeasonalBaseline {
    /// Summarise a non-empty group of temperatures. Values are sorted first
    /// so the result does not depend on input order.
    pub fn from_temperatures(location: impl Into<String>, season: Season, temperatures: &[f64]) -> Option<Self> {
        if temperatures.is_empty() {
            return None;
        }

        let mut values = temperatures.to_vec();
        values.sort_by(f64::total_cmp);

        let n = values.len();
        let min = values[0];
        let max = values[n - 1];
        let mean = values.iter().sum::<f64>() / n as f64;
        // rounding can push the quotient a hair outside the observed range;
        // clamp panics on NaN bounds, so only finite means are clamped
        let mean = if mean.is_finite() { mean.clamp(min, max) } else { mean };

        let sample_std = if n >= 2 {
            let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            Some((sum_sq / (n - 1) as f64).sqrt())
        } else {
            None
        };

        Some(Self {
            location: location.into(),
            season,
            mean,
            sample_std,
            count: n,
            min,
            max,
        })
    }

    /// Band at `sigma` standard deviations, if the deviation is defined
    pub fn band(&self, sigma: f64) -> Option<AnomalyBand> {
        self.sample_std.map(|std| AnomalyBand::new(self.mean, std, sigma))
    }
}

/// Exactly one baseline per (location, season)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BaselineSet {
    by_location: BTreeMap<String, BTreeMap<Season, SeasonalBaseline>>,
}

impl BaselineSet {
    pub fn new() -> Self {
        Self::default()
    }

    // insert or replace the baseline for its key
    pub fn insert(&mut self, baseline: SeasonalBaseline) -> Option<SeasonalBaseline> {
        self.by_location
            .entry(baseline.location.clone())
            .or_default()
            .insert(baseline.season, baseline)
    }

    pub fn get(&self, location: &str, season: Season) -> Option<&SeasonalBaseline> {
        self.by_location.get(location).and_then(|seasons| seasons.get(&season))
    }

    /// Seasonal profile of one city, winter first
    pub fn for_location(&self, location: &str) -> Vec<&SeasonalBaseline> {
        self.by_location
            .get(location)
            .map(|seasons| seasons.values().collect())
            .unwrap_or_default()
    }

    pub fn locations(&self) -> impl Iterator<Item = &str> {
        self.by_location.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SeasonalBaseline> {
        self.by_location.values().flat_map(|seasons| seasons.values())
    }

    pub fn len(&self) -> usize {
        self.by_location.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_location.is_empty()
    }
}

/// Group observations by (location, season) and summarise each group.
/// Fails when there is nothing to summarise or a temperature is not finite.
pub fn build_baselines(observations: &[Observation]) -> Result<BaselineSet, BaselineError> {
    if observations.is_empty() {
        return Err(BaselineError::InvalidInput("historical dataset is empty".to_string()));
    }
    if let Some(bad) = observations.iter().find(|o| !o.temperature.is_finite()) {
        return Err(BaselineError::InvalidInput(format!(
            "non-finite temperature {} for {} at {}",
            bad.temperature, bad.location, bad.timestamp
        )));
    }

    let mut groups: BTreeMap<(&str, Season), Vec<f64>> = BTreeMap::new();
    for obs in observations {
        groups
            .entry((obs.location.as_str(), obs.season))
            .or_default()
            .push(obs.temperature);
    }

    let mut set = BaselineSet::new();
    for ((location, season), temperatures) in groups {
        if let Some(baseline) = SeasonalBaseline::from_temperatures(location, season, &temperatures) {
            if baseline.sample_std.is_none() {
                debug!(city = %location, season = %season, "Single observation, no deviation");
            }
            set.insert(baseline);
        }
    }

    debug!(groups = set.len(), observations = observations.len(), "Baselines built");
    Ok(set)
}
