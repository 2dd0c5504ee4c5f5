// Benchmark: model fit and objective evaluation at realistic history lengths

use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::{Array1, Array2};
use oilseer::core::optimizer::{MapProblem, Prior};
use oilseer::core::{HolidayCalendar, HolidayConfig, Seer, TimeSeriesData};

fn create_test_data(n: usize) -> TimeSeriesData {
    let start = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
    let ds: Vec<NaiveDate> = (0..n).map(|i| start + Duration::days(i as i64)).collect();
    let y = (0..n)
        .map(|i| {
            let t = i as f64;
            70.0 + 0.01 * t
                + 4.0 * (2.0 * std::f64::consts::PI * t / 365.25).sin()
                + 0.5 * (t * 1.3).sin()
        })
        .collect();
    TimeSeriesData::new(ds, y).unwrap()
}

fn bench_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("fit");
    group.sample_size(10);
    let holidays = HolidayCalendar::united_kingdom(2015..=2025).dates();

    for n in [365, 1000, 2500] {
        let data = create_test_data(n);
        group.bench_with_input(BenchmarkId::new("seer", n), &data, |b, data| {
            b.iter(|| {
                let mut model = Seer::new();
                model
                    .add_holidays(
                        HolidayConfig::new("uk_holidays", holidays.clone()).with_windows(0, 1),
                    )
                    .unwrap();
                model.fit(black_box(data)).unwrap();
                model
            })
        });
    }
    group.finish();
}

fn bench_gradient_computation(c: &mut Criterion) {
    let mut group = c.benchmark_group("gradient");

    for n in [1000, 5000] {
        let p = 40;
        let x = Array2::from_shape_fn((n, p), |(i, j)| ((i * (j + 1)) as f64 * 0.01).sin());
        let y = Array1::from_shape_fn(n, |i| (i as f64 * 0.02).cos());
        let problem = MapProblem::new(x, y, vec![Prior::Normal(10.0); p]).unwrap();
        let params = Array1::from_elem(p + 1, 0.1);

        group.bench_with_input(BenchmarkId::new("analytic", n), &params, |b, params| {
            b.iter(|| problem.gradient(black_box(params.view())))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_fit, bench_gradient_computation);
criterion_main!(benches);
