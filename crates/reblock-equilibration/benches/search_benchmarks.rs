use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rand_distr::Normal;
use reblock_blocking::BlockingReducer;
use reblock_core::{CalcType, CalculationRecord, Metadata, Observable, Reducer, TimeSeries};
use reblock_equilibration::{find_starting_iteration, SearchParameters};

/// AR(1) series with unit innovations
fn generate_ar1(size: usize, phi: f64, seed: u64) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0).unwrap();
    let mut x = 0.0;
    (0..size)
        .map(|_| {
            x = phi * x + normal.sample(&mut rng);
            x
        })
        .collect()
}

fn generate_run(rows: usize, flat: usize, seed: u64) -> CalculationRecord {
    let noise = generate_ar1(4 * rows, 0.5, seed);
    let its: Vec<i64> = (1..=rows as i64).collect();
    let shift = (0..rows)
        .map(|i| if i < flat { 0.0 } else { -0.1 + 0.01 * noise[i] })
        .collect();
    let n0: Vec<f64> = (0..rows).map(|i| 500.0 + 20.0 * noise[rows + i]).collect();
    let num = n0.iter().enumerate().map(|(i, n)| -0.1 * n + noise[2 * rows + i]).collect();
    let psips = (0..rows).map(|i| 1.0e5 + 1000.0 * noise[3 * rows + i]).collect();
    let series = TimeSeries::new(its, shift, n0, num)
        .unwrap()
        .with_column(Observable::TotalPopulation, psips)
        .unwrap();
    CalculationRecord::new(Metadata::new(CalcType::Fciqmc), series)
}

fn bench_reduce(c: &mut Criterion) {
    let mut group = c.benchmark_group("BlockingReducer");
    for size in [1_000, 10_000, 100_000] {
        let columns: Vec<Vec<f64>> = (0..4).map(|k| generate_ar1(size, 0.7, k)).collect();
        let named: Vec<(Observable, &[f64])> = Observable::RAW
            .iter()
            .copied()
            .zip(columns.iter().map(Vec::as_slice))
            .collect();
        group.bench_with_input(BenchmarkId::new("four_columns", size), &named, |b, named| {
            b.iter(|| BlockingReducer.reduce(black_box(named)))
        });
    }
    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("BlockWindowSearch");
    group.sample_size(10);
    for rows in [5_000, 20_000] {
        let record = generate_run(rows, rows / 4, 42);
        let params = SearchParameters::default();
        group.bench_with_input(BenchmarkId::new("default_parameters", rows), &record, |b, record| {
            b.iter(|| find_starting_iteration(black_box(record), &params))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_reduce, bench_search);
criterion_main!(benches);
