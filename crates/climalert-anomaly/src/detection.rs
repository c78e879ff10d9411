//! Statistical anomaly detection logic

use crate::baseline::{BaselineSet, SeasonalBaseline};
use crate::config::DetectionConfig;
use climalert_core::{LiveReading, Observation};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use tracing::{debug, warn};

pub const DEFAULT_SIGMA: f64 = 2.0;
pub const DEFAULT_SMOOTHING_WINDOW: usize = 30;

/// Two-sided band around a seasonal mean. A temperature on or beyond
/// either edge is anomalous.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnomalyBand {
    pub lower: f64,
    pub upper: f64,
}

impl AnomalyBand {
    pub fn new(mean: f64, std: f64, sigma: f64) -> Self {
        Self {
            lower: mean - sigma * std,
            upper: mean + sigma * std,
        }
    }

    pub fn is_anomalous(&self, temperature: f64) -> bool {
        temperature >= self.upper || temperature <= self.lower
    }
}

/// Outcome of judging one reading against history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Normal,
    Anomalous,
    NoBaseline, // not enough history to judge; distinct from Normal
}

impl Verdict {
    fn from_flag(is_anomaly: bool) -> Self {
        if is_anomaly { Verdict::Anomalous } else { Verdict::Normal }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Normal => write!(f, "normal"),
            Verdict::Anomalous => write!(f, "anomalous"),
            Verdict::NoBaseline => write!(f, "no baseline"),
        }
    }
}

/// Historical observation with its baseline, anomaly flag and trend value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledObservation {
    #[serde(flatten)]
    pub observation: Observation,
    pub mean: Option<f64>,
    pub sample_std: Option<f64>,
    // None when no baseline matched (unlabeled)
    pub is_anomaly: Option<bool>,
    // None until the city has a full window of history
    pub smoothed_temperature: Option<f64>,
}

impl LabeledObservation {
    pub fn is_labeled(&self) -> bool {
        self.is_anomaly.is_some()
    }

    pub fn is_anomalous(&self) -> bool {
        self.is_anomaly == Some(true)
    }

    /// Same mapping `classify_live` uses, so a replayed observation agrees
    pub fn verdict(&self) -> Verdict {
        match (self.is_anomaly, self.sample_std) {
            (Some(flag), Some(_)) => Verdict::from_flag(flag),
            _ => Verdict::NoBaseline,
        }
    }
}

// main anomaly classifier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnomalyClassifier {
    sigma: f64,
    window: usize,
}

impl Default for AnomalyClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_SIGMA, DEFAULT_SMOOTHING_WINDOW)
    }
}

impl AnomalyClassifier {
    pub fn new(sigma: f64, window: usize) -> Self {
        Self {
            sigma,
            window: window.max(1),
        }
    }

    pub fn from_config(config: &DetectionConfig) -> Self {
        Self::new(config.sensitivity.to_sigma(), config.smoothing_window)
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Shared band rule for historical and live values. `None` when the
    /// baseline has no deviation, which callers treat as "no evidence".
    pub fn check(&self, temperature: f64, baseline: &SeasonalBaseline) -> Option<bool> {
        baseline.band(self.sigma).map(|band| band.is_anomalous(temperature))
    }

    /// Label every observation. Input must already be in timestamp order
    /// within each location; order across locations does not matter.
    pub fn label(&self, observations: &[Observation], baselines: &BaselineSet) -> Vec<LabeledObservation> {
        let smoothed = self.smooth(observations);
        let mut unlabeled = 0usize;

        let labeled: Vec<LabeledObservation> = observations
            .iter()
            .zip(smoothed)
            .map(|(obs, smoothed_temperature)| {
                let baseline = baselines.get(&obs.location, obs.season);
                let is_anomaly = match baseline {
                    // undefined deviation never flags
                    Some(b) => Some(self.check(obs.temperature, b).unwrap_or(false)),
                    None => {
                        unlabeled += 1;
                        debug!(city = %obs.location, season = %obs.season, "No baseline for observation");
                        None
                    }
                };

                LabeledObservation {
                    observation: obs.clone(),
                    mean: baseline.map(|b| b.mean),
                    sample_std: baseline.and_then(|b| b.sample_std),
                    is_anomaly,
                    smoothed_temperature,
                }
            })
            .collect();

        if unlabeled > 0 {
            warn!(unlabeled, total = observations.len(), "Observations left unlabeled");
        }
        labeled
    }

    /// Judge one externally supplied reading against its season's baseline
    pub fn classify_live(&self, reading: &LiveReading, baselines: &BaselineSet) -> Verdict {
        match baselines
            .get(&reading.location, reading.observed_season)
            .and_then(|b| self.check(reading.temperature, b))
        {
            Some(flag) => Verdict::from_flag(flag),
            None => Verdict::NoBaseline,
        }
    }

    /// Trailing mean over the last `window` observations of the same
    /// location, aligned with the input. Positions before a full window
    /// are `None`.
    pub fn smooth(&self, observations: &[Observation]) -> Vec<Option<f64>> {
        let mut windows: HashMap<&str, VecDeque<f64>> = HashMap::new();

        observations
            .iter()
            .map(|obs| {
                let window = windows.entry(obs.location.as_str()).or_default();
                window.push_back(obs.temperature);
                if window.len() > self.window {
                    window.pop_front();
                }

                if window.len() == self.window {
                    Some(window.iter().sum::<f64>() / self.window as f64)
                } else {
                    None
                }
            })
            .collect()
    }
}

/// Label with the default 2σ band and 30-observation window
pub fn label(observations: &[Observation], baselines: &BaselineSet) -> Vec<LabeledObservation> {
    AnomalyClassifier::default().label(observations, baselines)
}

/// Classify a live reading with the default 2σ band
pub fn classify_live(reading: &LiveReading, baselines: &BaselineSet) -> Verdict {
    AnomalyClassifier::default().classify_live(reading, baselines)
}
