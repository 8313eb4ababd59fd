use criterion::{criterion_group, criterion_main, Criterion};

use formcast::config::Config;
use formcast::dataset::build_inference_table;
use formcast::derive::derive_features;
use formcast::model::{rank, ModelSet};
use formcast::projector::predict_points;

mod common;

fn criterion_benchmark(c: &mut Criterion) {
    let config = Config::default();
    let mut source = common::league(20);
    let rows = build_inference_table(&mut source, 19, &config).unwrap();
    assert!(!rows.is_empty());
    let models = ModelSet::heuristic(&config.projection);

    c.bench_function("cri_project_heuristic", |b| {
        b.iter(|| {
            rows.iter()
                .map(|row| predict_points(row, &config.projection))
                .sum::<f64>()
        });
    });
    c.bench_function("cri_project_rank", |b| {
        b.iter(|| rank(&rows, &models, &config.dampening).unwrap());
    });
    c.bench_function("cri_project_derive", |b| {
        let mut rows = rows.clone();
        b.iter(|| derive_features(&mut rows, &config.relative));
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
