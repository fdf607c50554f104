use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use semtree::expander::{Expander, ExpanderConfig};
use semtree::model::{EmbeddingOracle, TermVectors};
use semtree::oracle::NeighborOracle;

fn generate_oracle(count: usize, dimension: usize) -> EmbeddingOracle {
    let mut vectors = TermVectors::with_capacity(dimension, count).unwrap();
    for i in 0..count {
        let data: Vec<f32> = (0..dimension)
            .map(|j| ((i as f32 * 0.1 + j as f32 * 0.01).sin() * 0.5 + 0.5) * 2.0 - 1.0)
            .collect();
        vectors.insert(format!("term{i}"), &data).unwrap();
    }
    EmbeddingOracle::new(vectors)
}

fn bench_neighbors(c: &mut Criterion) {
    let oracle = generate_oracle(5000, 100);

    let mut group = c.benchmark_group("neighbors");
    for top_k in [10, 100] {
        group.bench_function(format!("top_{top_k}"), |b| {
            b.iter(|| black_box(oracle.neighbors(black_box("term42"), top_k).unwrap()))
        });
    }
    group.finish();
}

fn bench_expand(c: &mut Criterion) {
    let oracle = generate_oracle(2000, 64);
    let config = ExpanderConfig::default()
        .max_neighbors(15)
        .min_similarity(0.3)
        .max_size(200);

    let mut group = c.benchmark_group("expand");
    group.sample_size(20);
    group.bench_function("sequential", |b| {
        b.iter(|| {
            let mut expander = Expander::new(&oracle, config.clone()).unwrap();
            black_box(expander.expand("term0").unwrap())
        })
    });
    group.bench_function("parallel", |b| {
        b.iter(|| {
            let mut expander = Expander::new(&oracle, config.clone()).unwrap();
            black_box(expander.expand_parallel("term0").unwrap())
        })
    });
    group.finish();
}

criterion_group!(benches, bench_neighbors, bench_expand);
criterion_main!(benches);
