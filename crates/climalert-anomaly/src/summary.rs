//! Descriptive statistics over a labeled dataset

use crate::detection::LabeledObservation;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub count: usize,
    pub cities: usize,
    pub mean: f64,
    pub std: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
    pub anomalies: usize,
    pub unlabeled: usize,
}

impl DatasetSummary {
    /// `None` for an empty slice
    pub fn from_labeled(labeled: &[LabeledObservation]) -> Option<Self> {
        if labeled.is_empty() {
            return None;
        }

        let mut temps: Vec<f64> = labeled.iter().map(|l| l.observation.temperature).collect();
        temps.sort_by(f64::total_cmp);

        let n = temps.len();
        let mean = temps.iter().sum::<f64>() / n as f64;
        let std = (n >= 2).then(|| {
            let sum_sq: f64 = temps.iter().map(|t| (t - mean).powi(2)).sum();
            (sum_sq / (n - 1) as f64).sqrt()
        });

        let cities: BTreeSet<&str> = labeled.iter().map(|l| l.observation.location.as_str()).collect();

        Some(Self {
            count: n,
            cities: cities.len(),
            mean,
            std,
            min: temps[0],
            q25: percentile(&temps, 0.25),
            median: percentile(&temps, 0.5),
            q75: percentile(&temps, 0.75),
            max: temps[n - 1],
            anomalies: labeled.iter().filter(|l| l.is_anomalous()).count(),
            unlabeled: labeled.iter().filter(|l| !l.is_labeled()).count(),
        })
    }
}

// linear interpolation between closest ranks; `sorted` must be non-empty
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let pos = p * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}
