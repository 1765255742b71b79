//! Benchmarks for model fitting, forecasting and procurement planning.

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use supply_forecast::core::MonthlySeries;
use supply_forecast::models::arima::{ARIMASpec, FitConfig, SeasonalSpec, SARIMA};
use supply_forecast::models::forecast;
use supply_forecast::procurement::{plan, recommend, RecommendationConfig};

fn generate_consumption(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            100.0
                + 20.0 * (2.0 * std::f64::consts::PI * i as f64 / 12.0).sin()
                + rng.gen_range(-3.0..3.0)
        })
        .collect()
}

fn make_series(values: Vec<f64>) -> MonthlySeries {
    let start = NaiveDate::from_ymd_opt(2018, 1, 1).unwrap();
    MonthlySeries::new(start, values).unwrap()
}

fn bench_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("sarima_fit");

    for size in [36, 48, 72, 120].iter() {
        let values = generate_consumption(*size, 7);

        group.bench_with_input(BenchmarkId::new("full_seasonal", size), size, |b, _| {
            let model = SARIMA::new(ARIMASpec::new(1, 1, 1), SeasonalSpec::new(1, 1, 1, 12));
            let config = FitConfig::default();
            b.iter(|| model.fit(black_box(&values), &config))
        });

        group.bench_with_input(BenchmarkId::new("differencing_only", size), size, |b, _| {
            let model = SARIMA::new(ARIMASpec::new(1, 1, 1), SeasonalSpec::new(0, 1, 0, 12));
            let config = FitConfig::default();
            b.iter(|| model.fit(black_box(&values), &config))
        });
    }

    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    let series = make_series(generate_consumption(48, 11));

    group.bench_function("forecast_48", |b| {
        b.iter(|| forecast(black_box(&series), 1, 1, 1, true))
    });

    if let Ok((table, _)) = forecast(&series, 1, 1, 1, true) {
        group.bench_function("plan", |b| {
            b.iter(|| plan(black_box(&table), 0.10, 5000.0))
        });
    }

    group.bench_function("recommend_48", |b| {
        let config = RecommendationConfig::default();
        b.iter(|| recommend(black_box(&series), &config))
    });

    group.finish();
}

criterion_group!(benches, bench_fit, bench_pipeline);
criterion_main!(benches);
