use crate::baseline::{build_baselines, BaselineError, BaselineSet, SeasonalBaseline};
use crate::config::{load_config, AnomalyConfig};
use crate::detection::{AnomalyBand, AnomalyClassifier, LabeledObservation, Verdict};
use crate::summary::DatasetSummary;
use crate::weather::{WeatherClient, WeatherError};
use climalert_core::{sort_by_timestamp, LiveReading, Observation};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

// everything derived from one historical dataset
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub baselines: BaselineSet,
    pub labeled: Vec<LabeledObservation>,
    pub summary: Option<DatasetSummary>,
}

impl AnalysisReport {
    pub fn anomaly_count(&self) -> usize {
        self.labeled.iter().filter(|l| l.is_anomalous()).count()
    }

    // distinct cities in the dataset, sorted
    pub fn cities(&self) -> Vec<&str> {
        self.labeled
            .iter()
            .map(|l| l.observation.location.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// One city's labeled series in timestamp order
    pub fn city_series(&self, city: &str) -> Vec<&LabeledObservation> {
        self.labeled
            .iter()
            .filter(|l| l.observation.location == city)
            .collect()
    }

    pub fn anomalies_for(&self, city: &str) -> Vec<&LabeledObservation> {
        self.labeled
            .iter()
            .filter(|l| l.observation.location == city && l.is_anomalous())
            .collect()
    }

    pub fn seasonal_profile(&self, city: &str) -> Vec<&SeasonalBaseline> {
        self.baselines.for_location(city)
    }
}

// result of judging one live reading
#[derive(Debug, Clone, Serialize)]
pub struct LiveCheck {
    pub reading: LiveReading,
    pub verdict: Verdict,
    pub baseline: Option<SeasonalBaseline>,
    pub band: Option<AnomalyBand>,
}

// main runner that orchestrates an analysis pass

pub struct AnalysisRunner {
    classifier: AnomalyClassifier,
    weather: WeatherClient,
}

impl AnalysisRunner {
    pub fn new(config: &AnomalyConfig) -> Result<Self, Box<dyn std::error::Error>> {
        config.validate()?;

        Ok(Self {
            classifier: AnomalyClassifier::from_config(&config.detection),
            weather: WeatherClient::new(&config.weather)?,
        })
    }

    // create a new runner from config file
    pub fn from_config_file<P: AsRef<Path>>(config_path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let config = load_config(config_path)?;
        Self::new(&config)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.weather = self.weather.with_api_key(api_key);
        self
    }

    pub fn classifier(&self) -> &AnomalyClassifier {
        &self.classifier
    }

    /// Build baselines and label the dataset. Observations are stable-sorted
    /// by timestamp first so each city's smoothing window runs in order.
    pub fn analyze(&self, mut observations: Vec<Observation>) -> Result<AnalysisReport, BaselineError> {
        sort_by_timestamp(&mut observations);

        let baselines = build_baselines(&observations)?;
        let labeled = self.classifier.label(&observations, &baselines);
        let summary = DatasetSummary::from_labeled(&labeled);

        let report = AnalysisReport {
            baselines,
            labeled,
            summary,
        };

        info!(
            observations = report.labeled.len(),
            baselines = report.baselines.len(),
            anomalies = report.anomaly_count(),
            "Analysis complete"
        );
        Ok(report)
    }

    /// Judge a reading against the report's baselines; no I/O
    pub fn evaluate(&self, report: &AnalysisReport, reading: LiveReading) -> LiveCheck {
        let verdict = self.classifier.classify_live(&reading, &report.baselines);
        let baseline = report
            .baselines
            .get(&reading.location, reading.observed_season)
            .cloned();
        let band = baseline.as_ref().and_then(|b| b.band(self.classifier.sigma()));

        info!(
            city = %reading.location,
            season = %reading.observed_season,
            temperature = reading.temperature,
            verdict = %verdict,
            "Live reading evaluated"
        );

        LiveCheck {
            reading,
            verdict,
            baseline,
            band,
        }
    }

    /// Fetch the current temperature and judge it for today's season.
    /// A failed lookup is returned as-is; no verdict is produced for it.
    pub async fn check_city(&self, report: &AnalysisReport, city: &str) -> Result<LiveCheck, WeatherError> {
        let temperature = self.weather.current_temperature(city).await?;
        Ok(self.evaluate(report, LiveReading::now(city, temperature)))
    }
}
