use chrono::{DateTime, Duration, TimeZone, Utc};
use climalert_anomaly::config::AnomalyConfig;
use climalert_anomaly::{
    build_baselines, classify_live, label, AnalysisRunner, AnomalyClassifier, BaselineError, Verdict,
    WeatherError,
};
use climalert_core::parser::{into_observations, CsvParser, DatasetParser};
use climalert_core::{LiveReading, Observation, Season};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap()
}

// a year of daily readings per city with a seasonal swing and some noise
fn synthetic_year(city: &str, offset: f64) -> Vec<Observation> {
    (0..365)
        .map(|day| {
            let ts = start() + Duration::days(day);
            let season = Season::from_date(&ts);
            let base = match season {
                Season::Winter => -5.0,
                Season::Spring => 8.0,
                Season::Summer => 20.0,
                Season::Autumn => 7.0,
            };
            let noise = ((day * 37) % 11) as f64 - 5.0;
            Observation::new(city, ts, base + offset + noise, season)
        })
        .collect()
}

fn winter(city: &str, day: i64, temp: f64) -> Observation {
    Observation::new(city, start() + Duration::days(day), temp, Season::Winter)
}

#[test]
fn test_end_to_end_winter_scenario() {
    let data = vec![winter("A", 0, 10.0), winter("A", 1, 12.0), winter("A", 2, 14.0)];
    let baselines = build_baselines(&data).unwrap();

    let b = baselines.get("A", Season::Winter).unwrap();
    assert_eq!(b.mean, 12.0);
    assert_eq!(b.sample_std, Some(2.0));

    let hot = LiveReading::new("A", 16.5, Season::Winter);
    assert_eq!(classify_live(&hot, &baselines), Verdict::Anomalous);

    let mild = LiveReading::new("A", 15.9, Season::Winter);
    assert_eq!(classify_live(&mild, &baselines), Verdict::Normal);
}

#[test]
fn test_mean_within_group_range() {
    let mut data = synthetic_year("Moscow", 0.0);
    data.extend(synthetic_year("Cairo", 18.0));
    let baselines = build_baselines(&data).unwrap();

    for b in baselines.iter() {
        let temps: Vec<f64> = data
            .iter()
            .filter(|o| o.location == b.location && o.season == b.season)
            .map(|o| o.temperature)
            .collect();
        let min = temps.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = temps.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert!(b.mean >= min && b.mean <= max, "{} {}", b.location, b.season);
        assert_eq!(b.count, temps.len());
    }
}

#[test]
fn test_single_observation_group_has_no_std() {
    let data = vec![winter("A", 0, 3.0), winter("A", 1, 5.0), winter("B", 0, 4.0)];
    let baselines = build_baselines(&data).unwrap();
    let single = baselines.get("B", Season::Winter).unwrap();
    assert_eq!(single.sample_std, None);
    assert_eq!(single.mean, 4.0);

    // never flagged, and live readings get no verdict
    let labeled = label(&data, &baselines);
    assert_eq!(labeled[2].is_anomaly, Some(false));
    let reading = LiveReading::new("B", 400.0, Season::Winter);
    assert_eq!(classify_live(&reading, &baselines), Verdict::NoBaseline);
}

#[test]
fn test_build_is_order_independent() {
    let mut data = synthetic_year("Moscow", 0.0);
    data.extend(synthetic_year("Berlin", 4.3));
    let first = build_baselines(&data).unwrap();

    let mut reversed = data.clone();
    reversed.reverse();
    let mut rotated = data.clone();
    rotated.rotate_left(173);

    assert_eq!(build_baselines(&reversed).unwrap(), first);
    assert_eq!(build_baselines(&rotated).unwrap(), first);
    assert_eq!(build_baselines(&data).unwrap(), first);
}

#[test]
fn test_empty_dataset_is_invalid_input() {
    assert!(matches!(build_baselines(&[]), Err(BaselineError::InvalidInput(_))));
}

#[test]
fn test_live_and_batch_agree() {
    let mut data = synthetic_year("Moscow", 0.0);
    // a few spikes so both verdicts occur
    data[10].temperature = 40.0;
    data[200].temperature = -30.0;
    let baselines = build_baselines(&data).unwrap();
    let labeled = label(&data, &baselines);

    assert!(labeled.iter().any(|l| l.is_anomalous()));
    assert!(labeled.iter().any(|l| l.is_anomaly == Some(false)));

    for l in &labeled {
        let obs = &l.observation;
        let replay = LiveReading::new(obs.location.clone(), obs.temperature, obs.season);
        let expected = if l.is_anomalous() { Verdict::Anomalous } else { Verdict::Normal };
        assert_eq!(classify_live(&replay, &baselines), expected);
        assert_eq!(l.verdict(), expected);
    }
}

#[test]
fn test_labels_carry_baseline_values() {
    let data = vec![winter("A", 0, 10.0), winter("A", 1, 12.0), winter("A", 2, 14.0)];
    let baselines = build_baselines(&data).unwrap();
    let labeled = label(&data, &baselines);
    assert_eq!(labeled.len(), 3);
    for l in &labeled {
        assert_eq!(l.mean, Some(12.0));
        assert_eq!(l.sample_std, Some(2.0));
        assert_eq!(l.is_anomaly, Some(false));
        assert_eq!(l.smoothed_temperature, None);
    }
}

#[test]
fn test_rolling_constant_series() {
    let data: Vec<Observation> = (0..40).map(|d| winter("A", d, -2.25)).collect();
    let baselines = build_baselines(&data).unwrap();
    let labeled = label(&data, &baselines);

    for (i, l) in labeled.iter().enumerate() {
        if i < 29 {
            assert_eq!(l.smoothed_temperature, None, "position {}", i);
        } else {
            assert!((l.smoothed_temperature.unwrap() + 2.25).abs() < 1e-12);
        }
    }
}

#[test]
fn test_unknown_baseline_is_partial_failure() {
    let history = vec![winter("A", 0, 1.0), winter("A", 1, 2.0)];
    let baselines = build_baselines(&history).unwrap();

    let batch = vec![winter("A", 2, 1.5), winter("B", 2, 9.0)];
    let labeled = AnomalyClassifier::default().label(&batch, &baselines);
    assert!(labeled[0].is_labeled());
    assert!(!labeled[1].is_labeled());
    assert_eq!(labeled[1].verdict(), Verdict::NoBaseline);
}

#[test]
fn test_runner_report_from_csv() {
    let csv = "\
city,timestamp,temperature,season
A,2015-01-03,14.0,winter
A,2015-01-01,10.0,winter
A,2015-01-02,12.0,winter
B,2015-06-01,25.0,summer
B,2015-06-02,26.0,summer
";
    let rows = CsvParser::new().parse(csv).unwrap();
    let observations = into_observations(rows).unwrap();

    let runner = AnalysisRunner::new(&AnomalyConfig::default()).unwrap();
    let report = runner.analyze(observations).unwrap();

    assert_eq!(report.cities(), vec!["A", "B"]);
    assert_eq!(report.city_series("A").len(), 3);
    assert_eq!(report.seasonal_profile("B").len(), 1);
    assert_eq!(report.anomaly_count(), 0);

    let summary = report.summary.as_ref().unwrap();
    assert_eq!(summary.count, 5);
    assert_eq!(summary.cities, 2);

    let hot = runner.evaluate(&report, LiveReading::new("A", 16.5, Season::Winter));
    assert_eq!(hot.verdict, Verdict::Anomalous);
    let band = hot.band.unwrap();
    assert_eq!(band.lower, 8.0);
    assert_eq!(band.upper, 16.0);

    let unknown = runner.evaluate(&report, LiveReading::new("C", 16.5, Season::Winter));
    assert_eq!(unknown.verdict, Verdict::NoBaseline);
    assert!(unknown.baseline.is_none());
}

#[tokio::test]
async fn test_check_city_with_lookups_disabled_produces_no_verdict() {
    let mut config = AnomalyConfig::default();
    config.weather.enabled = false;
    let runner = AnalysisRunner::new(&config).unwrap();
    let report = runner.analyze(vec![winter("A", 0, 1.0), winter("A", 1, 2.0)]).unwrap();

    let err = runner.check_city(&report, "A").await.unwrap_err();
    assert!(matches!(err, WeatherError::Disabled));
}

#[test]
fn test_sample_config_loads() {
    let config = climalert_anomaly::config::load_config("../../config/climalert.toml")
        .expect("Failed to load config");
    assert_eq!(config.detection.smoothing_window, 30);
    assert_eq!(config.detection.sensitivity.to_sigma(), 2.0);
    assert!(AnalysisRunner::new(&config).is_ok());
}

#[test]
fn test_sample_dataset_flags_spikes() {
    let observations = climalert_core::parser::load_dataset("../../sample-data/temperatures.csv", "csv")
        .expect("sample data not found");
    let runner = AnalysisRunner::new(&AnomalyConfig::default()).unwrap();
    let report = runner.analyze(observations).unwrap();

    assert_eq!(report.cities(), vec!["Berlin", "Moscow"]);
    assert_eq!(report.baselines.len(), 8);

    let moscow_heat = report
        .anomalies_for("Moscow")
        .into_iter()
        .any(|l| l.observation.temperature == 35.2);
    let berlin_frost = report
        .anomalies_for("Berlin")
        .into_iter()
        .any(|l| l.observation.temperature == -19.4);
    assert!(moscow_heat);
    assert!(berlin_frost);

    // a full window is available by the end of the year
    let series = report.city_series("Moscow");
    assert_eq!(series.len(), 365);
    assert!(series[28].smoothed_temperature.is_none());
    assert!(series[29].smoothed_temperature.is_some());
}
