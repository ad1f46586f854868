use criterion::{black_box, criterion_group, criterion_main, Criterion};
use devis::config::Configuration;
use devis::convergence::{search, throughput_cost, AxisRange};
use devis::data::{TypologyCount, TypologyKey};
use devis::estimation::estimate;

fn capped_grid(c: &mut Criterion) {
    let rows = AxisRange::new(1.0, 100.0, 1.0);
    let cols = AxisRange::new(1.0, 100.0, 1.0);
    c.bench_function("search 100x100", |b| {
        b.iter(|| {
            search(
                black_box(&rows),
                black_box(&cols),
                |col| throughput_cost(2_000.0, col, 840.0),
                |row| row * 2_000.0,
            )
        })
    });
}

fn four_methods(c: &mut Criterion) {
    let config = Configuration::default();
    let counts = TypologyCount::builder()
        .count(TypologyKey::T1, 12)
        .count(TypologyKey::T3, 30)
        .count(TypologyKey::T5, 4)
        .build();
    c.bench_function("estimate", |b| {
        b.iter(|| estimate(black_box(&counts), black_box(0.0), 3, &config))
    });
}

criterion_group!(benches, capped_grid, four_methods);
criterion_main!(benches);
