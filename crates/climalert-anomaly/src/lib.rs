//! Seasonal temperature anomaly detection

pub mod config;
pub mod baseline;
pub mod detection;
pub mod summary;
pub mod weather;
pub mod runner;

pub use config::AnomalyConfig;
pub use baseline::{build_baselines, BaselineError, BaselineSet, SeasonalBaseline};
pub use detection::{classify_live, label, AnomalyBand, AnomalyClassifier, LabeledObservation, Verdict};
pub use summary::DatasetSummary;
pub use weather::{WeatherClient, WeatherError};
pub use runner::{AnalysisReport, AnalysisRunner, LiveCheck};
