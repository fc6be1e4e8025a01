use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gipe::indices::{EVI, NDVI};
use gipe::io::reader::{Strip, StripBand};
use gipe::processing::parallel::evaluate_strip;
use gipe::processing::Formula;

/// Synthetic strip simulating NIR, RED and BLUE bands
fn synthetic_strip(size: (usize, usize)) -> Strip {
    let len = size.0 * size.1;
    let band = |slot: usize, base: f64, modulo: usize| StripBand {
        slot,
        nodata: None,
        data: (0..len).map(|i| base + (i % modulo) as f64).collect(),
    };

    Strip {
        row: 0,
        rows: size.1,
        bands: vec![band(0, 5000.0, 100), band(1, 2500.0, 50), band(2, 1200.0, 25)],
    }
}

/// Benchmark the formula evaluation in isolation
fn benchmark_formula_evaluation(c: &mut Criterion) {
    let strip = synthetic_strip((1024, 256));
    let ndvi = Formula::parse(NDVI.formula).unwrap();
    let evi = Formula::parse(EVI.formula).unwrap();

    c.bench_function("ndvi_strip_evaluation", |b| {
        b.iter(|| evaluate_strip(black_box(&ndvi), black_box(&strip), 0.0))
    });
    c.bench_function("evi_strip_evaluation", |b| {
        b.iter(|| evaluate_strip(black_box(&evi), black_box(&strip), 0.0))
    });
}

fn benchmark_formula_parsing(c: &mut Criterion) {
    c.bench_function("evi_parse", |b| b.iter(|| Formula::parse(black_box(EVI.formula))));
}

criterion_group!(benches, benchmark_formula_evaluation, benchmark_formula_parsing);
criterion_main!(benches);
