//! Criterion benchmarks for Versio.
//!
//! Covers the hot paths of an evaluation:
//! - BLEU tokenization
//! - corpus BLEU and chrF
//! - word and character diffs

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use versio::analysis::language::TokenizerKind;
use versio::diff::{DiffMode, annotate};
use versio::metrics::{Bleu, BleuConfig, Chrf, ChrfConfig, Metric};

/// Generate pseudo-random sentences for benchmarking.
fn generate_segments(count: usize, seed: usize) -> Vec<String> {
    let words = [
        "the", "council", "agreed", "on", "a", "new", "budget", "for", "next", "year", ",",
        "while", "critics", "warned", "that", "costs", "could", "rise", "by", "12.5", "%", ".",
        "ministers", "met", "in", "Brussels", "on", "Tuesday", "to", "discuss", "trade",
    ];

    let mut segments = Vec::with_capacity(count);
    for i in 0..count {
        let length = 10 + (i % 25);
        let segment: Vec<&str> = (0..length)
            .map(|j| words[(i * 7 + j * 13 + seed * j) % words.len()])
            .collect();
        segments.push(segment.join(" "));
    }
    segments
}

/// Benchmark tokenizers.
fn bench_tokenization(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokenization");
    let segments = generate_segments(100, 0);

    for kind in [TokenizerKind::Mteval13a, TokenizerKind::Zh, TokenizerKind::Char] {
        let tokenizer = kind.tokenizer();
        group.throughput(Throughput::Elements(segments.len() as u64));
        group.bench_function(format!("tokenize_{kind}"), |b| {
            b.iter(|| {
                for segment in &segments {
                    let words = tokenizer.words(black_box(segment)).unwrap();
                    black_box(words);
                }
            })
        });
    }

    group.finish();
}

/// Benchmark corpus metrics.
fn bench_metrics(c: &mut Criterion) {
    let mut group = c.benchmark_group("metrics");
    group.sample_size(20);

    let hyps = generate_segments(1000, 1);
    let refs = generate_segments(1000, 2);
    group.throughput(Throughput::Elements(hyps.len() as u64));

    let bleu = Bleu::new(BleuConfig::default(), TokenizerKind::Mteval13a.tokenizer());
    group.bench_function("corpus_bleu", |b| {
        b.iter(|| black_box(bleu.corpus_score(black_box(&hyps), black_box(&refs)).unwrap()))
    });

    let chrf = Chrf::new(ChrfConfig::default());
    group.bench_function("corpus_chrf", |b| {
        b.iter(|| black_box(chrf.corpus_score(black_box(&hyps), black_box(&refs)).unwrap()))
    });

    group.finish();
}

/// Benchmark diff annotation.
fn bench_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff");

    let a = generate_segments(100, 3);
    let b = generate_segments(100, 4);

    group.throughput(Throughput::Elements(a.len() as u64));
    group.bench_function("annotate_words", |bench| {
        bench.iter(|| {
            for (left, right) in a.iter().zip(&b) {
                black_box(annotate(black_box(left), black_box(right), DiffMode::Word));
            }
        })
    });

    group.bench_function("annotate_characters", |bench| {
        bench.iter(|| {
            for (left, right) in a.iter().zip(&b).take(20) {
                black_box(annotate(black_box(left), black_box(right), DiffMode::Character));
            }
        })
    });

    group.finish();
}

criterion_group!(benches, bench_tokenization, bench_metrics, bench_diff);
criterion_main!(benches);
