use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use survplot::stats::{BoxStats, ViolinStats, VIOLIN_POINTS};
use survplot::{logrank_test, KaplanMeierFitter, SurvivalData, Table};

fn generate_survival_data(n_samples: usize, rate: f64, seed: u64) -> SurvivalData {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut times = Vec::with_capacity(n_samples);
    let mut events = Vec::with_capacity(n_samples);

    for _ in 0..n_samples {
        let time = (-rng.r#gen::<f64>().ln() / rate).max(0.01);
        let censoring_time = rng.gen_range(1.0..10.0);

        if time < censoring_time {
            times.push(time);
            events.push(true);
        } else {
            times.push(censoring_time);
            events.push(false);
        }
    }

    SurvivalData::new(times, events).unwrap()
}

fn benchmark_km_fitting(c: &mut Criterion) {
    let mut group = c.benchmark_group("km_fitting");

    for &n_samples in [100, 1_000, 10_000].iter() {
        let data = generate_survival_data(n_samples, 0.2, 42);
        group.bench_with_input(
            BenchmarkId::from_parameter(n_samples),
            &data,
            |b, data| {
                b.iter(|| KaplanMeierFitter::new().fit(black_box(data)).unwrap());
            },
        );
    }
    group.finish();
}

fn benchmark_logrank(c: &mut Criterion) {
    let mut group = c.benchmark_group("logrank");

    for &n_groups in [2, 4, 8].iter() {
        let groups: Vec<SurvivalData> = (0..n_groups)
            .map(|g| generate_survival_data(250, 0.1 * (g as f64 + 1.0), g as u64))
            .collect();

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_groups", n_groups)),
            &groups,
            |b, groups| {
                b.iter(|| logrank_test(black_box(groups)).unwrap());
            },
        );
    }
    group.finish();
}

fn benchmark_distribution_stats(c: &mut Criterion) {
    let mut group = c.benchmark_group("distribution_stats");

    let mut rng = StdRng::seed_from_u64(7);
    let values: Vec<f64> = (0..2_000).map(|_| rng.gen_range(0.0..10.0)).collect();

    group.bench_function("box_stats", |b| {
        b.iter(|| BoxStats::from_data(black_box(&values)).unwrap());
    });

    group.bench_function("violin_kde", |b| {
        b.iter(|| ViolinStats::from_data(black_box(&values), VIOLIN_POINTS).unwrap());
    });

    group.finish();
}

fn benchmark_join(c: &mut Criterion) {
    let mut group = c.benchmark_group("join");

    for &n_rows in [1_000, 10_000].iter() {
        let mut left = String::from("sample_id,Time\n");
        let mut right = String::from("id,label\n");
        for i in 0..n_rows {
            left.push_str(&format!("s{},{}\n", i, i % 17));
            right.push_str(&format!("s{},g{}\n", n_rows - 1 - i, i % 5));
        }
        let left = Table::from_reader(left.as_bytes(), b',').unwrap();
        let right = Table::from_reader(right.as_bytes(), b',').unwrap();

        group.bench_with_input(
            BenchmarkId::from_parameter(n_rows),
            &(left, right),
            |b, (left, right)| {
                b.iter(|| left.inner_join(black_box(right), "sample_id", "id").unwrap());
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_km_fitting,
    benchmark_logrank,
    benchmark_distribution_stats,
    benchmark_join
);
criterion_main!(benches);
