//! Criterion benchmarks for Proxima query evaluation.
//!
//! Covers the merge-joins behind the document-level operators, the
//! position-level proximity operators, and full query evaluation under each
//! retrieval model.

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use proxima::prelude::*;
use proxima::query::{Intersection, ScoreEntry, Union, near_positions, window_positions};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

const VOCABULARY: &[&str] = &[
    "search", "engine", "index", "query", "document", "field", "term", "phrase", "boolean",
    "score", "ranking", "retrieval", "posting", "window", "proximity", "model",
];

/// Generate a docid-ascending score list with roughly `density` of `universe` documents.
fn generate_scores(rng: &mut StdRng, universe: u64, density: f64) -> Vec<ScoreEntry> {
    (0..universe)
        .filter(|_| rng.random_bool(density))
        .map(|doc_id| ScoreEntry { doc_id, score: 1.0 })
        .collect()
}

/// Generate an ascending position list inside a document of `length` tokens.
fn generate_positions(rng: &mut StdRng, length: u32, count: usize) -> Vec<u32> {
    let mut positions: Vec<u32> = (0..count).map(|_| rng.random_range(1..=length)).collect();
    positions.sort_unstable();
    positions.dedup();
    positions
}

/// Build an index of `count` documents drawn from a small vocabulary.
fn generate_index(rng: &mut StdRng, count: usize) -> MemoryIndex {
    let mut index = MemoryIndex::new();
    for i in 0..count {
        let length = rng.random_range(20..200);
        let words: Vec<&str> = (0..length)
            .map(|_| VOCABULARY[rng.random_range(0..VOCABULARY.len())])
            .collect();
        let body = words.join(" ");
        let _ = index.add_document(format!("doc-{i}"), &[("body", body.as_str())]);
    }
    index
}

/// Benchmark document-level merge-joins.
fn bench_merge_joins(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_joins");
    let mut rng = StdRng::seed_from_u64(42);

    let universe = 100_000;
    let lists: Vec<Vec<ScoreEntry>> = [0.5, 0.1, 0.01]
        .iter()
        .map(|&density| generate_scores(&mut rng, universe, density))
        .collect();

    group.throughput(Throughput::Elements(universe));
    group.bench_function("intersection_three_lists", |b| {
        b.iter(|| {
            let slices: Vec<&[ScoreEntry]> = lists.iter().map(Vec::as_slice).collect();
            black_box(Intersection::new(black_box(slices)).count())
        })
    });

    group.bench_function("union_three_lists", |b| {
        b.iter(|| {
            let slices: Vec<&[ScoreEntry]> = lists.iter().map(Vec::as_slice).collect();
            black_box(Union::new(black_box(slices)).count())
        })
    });

    group.finish();
}

/// Benchmark position-level proximity matching.
fn bench_proximity(c: &mut Criterion) {
    let mut group = c.benchmark_group("proximity");
    let mut rng = StdRng::seed_from_u64(7);

    let length = 10_000;
    let first = generate_positions(&mut rng, length, 500);
    let second = generate_positions(&mut rng, length, 500);
    let third = generate_positions(&mut rng, length, 500);

    group.bench_function("near_three_terms", |b| {
        b.iter(|| {
            let positions = [first.as_slice(), second.as_slice(), third.as_slice()];
            black_box(near_positions(black_box(&positions), 8))
        })
    });

    group.bench_function("window_three_terms", |b| {
        b.iter(|| {
            let positions = [first.as_slice(), second.as_slice(), third.as_slice()];
            black_box(window_positions(black_box(&positions), 8))
        })
    });

    group.finish();
}

/// Benchmark full query evaluation under each retrieval model.
fn bench_query_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_evaluation");
    group.sample_size(20);

    let mut rng = StdRng::seed_from_u64(1);
    let index = generate_index(&mut rng, 2_000);

    let cases = [
        (RetrievalModel::RankedBoolean, "#and(search #or(engine index))"),
        (
            RetrievalModel::Bm25(Default::default()),
            "search engine #near/2(query document)",
        ),
        (
            RetrievalModel::Indri(Default::default()),
            "#wand(2 search 1 #window/8(posting proximity) 0.5 model)",
        ),
    ];

    for (model, text) in cases {
        let query = match QueryParser::for_model(&model).parse(text) {
            Ok(query) => query,
            Err(e) => panic!("benchmark query {text:?} failed to parse: {e}"),
        };
        let searcher = Searcher::new(&index, model);
        group.bench_function(model.name(), |b| {
            b.iter(|| black_box(searcher.search(black_box(&query))))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_merge_joins,
    bench_proximity,
    bench_query_evaluation
);
criterion_main!(benches);
