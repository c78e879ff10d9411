//! Benchmark for baseline building and batch labeling
//! Run: cargo bench -p climalert-anomaly --bench baseline

use chrono::{Duration, TimeZone, Utc};
use climalert_anomaly::{build_baselines, AnomalyClassifier};
use climalert_core::{LiveReading, Observation, Season};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

const CITIES: [&str; 8] = [
    "Moscow", "Berlin", "Cairo", "Tokyo", "Dubai", "Beijing", "Singapore", "New York",
];

// daily readings for every city, already in timestamp order
fn dataset(years: i64) -> Vec<Observation> {
    let start = Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap();
    let mut out = Vec::new();
    for day in 0..years * 365 {
        let ts = start + Duration::days(day);
        for (i, city) in CITIES.iter().enumerate() {
            let temp = ((day * 31 + i as i64 * 7) % 40) as f64 - 10.0;
            out.push(Observation::new(*city, ts, temp, Season::from_date(&ts)));
        }
    }
    out
}

fn bench_build_baselines(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_baselines");
    for years in [1i64, 10] {
        let data = dataset(years);
        group.throughput(Throughput::Elements(data.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(years), &data, |b, data| {
            b.iter(|| build_baselines(black_box(data)))
        });
    }
    group.finish();
}

fn bench_label(c: &mut Criterion) {
    let data = dataset(10);
    let baselines = build_baselines(&data).unwrap();
    let classifier = AnomalyClassifier::default();

    c.bench_function("label_10y", |b| {
        b.iter(|| classifier.label(black_box(&data), black_box(&baselines)))
    });
}

fn bench_classify_live(c: &mut Criterion) {
    let data = dataset(1);
    let baselines = build_baselines(&data).unwrap();
    let classifier = AnomalyClassifier::default();
    let reading = LiveReading::new("Tokyo", 31.0, Season::Summer);

    c.bench_function("classify_live", |b| {
        b.iter(|| classifier.classify_live(black_box(&reading), black_box(&baselines)))
    });
}

criterion_group!(benches, bench_build_baselines, bench_label, bench_classify_live);
criterion_main!(benches);
