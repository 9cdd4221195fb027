use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use source_coding::arithmetic::ArithmeticCoder;
use source_coding::config::{ArithmeticConfig, DecodeStrategy, Precision};
use source_coding::frequency::analyze;
use source_coding::{huffman, shannon_fano, SourceCoder};

fn sample_text(len: usize) -> String {
    "the quick brown fox jumps over the lazy dog "
        .chars()
        .cycle()
        .take(len)
        .collect()
}

fn bench_prefix_tables(c: &mut Criterion) {
    let mut group = c.benchmark_group("prefix_tables");
    let text = sample_text(10_000);
    let analysis = analyze(&text).unwrap();

    group.bench_function("shannon_fano", |b| b.iter(|| shannon_fano::build(&analysis.model)));
    group.bench_function("huffman", |b| b.iter(|| huffman::build(&analysis.frequencies)));
    group.finish();
}

fn bench_arithmetic(c: &mut Criterion) {
    let mut group = c.benchmark_group("arithmetic");
    for len in [64, 256] {
        let text = sample_text(len);
        let model = analyze(&text).unwrap().model;
        for (name, precision) in [
            ("exact", Precision::Exact),
            ("decimal30", Precision::Decimal { digits: 30 }),
        ] {
            let coder = ArithmeticCoder::new(ArithmeticConfig {
                precision,
                strategy: DecodeStrategy::TrackInterval,
            })
            .with_traces(false);
            group.bench_with_input(
                BenchmarkId::new(format!("encode_{name}"), len),
                &text,
                |b, text| b.iter(|| coder.encode(text, &model)),
            );
        }

        let coder = ArithmeticCoder::default().with_traces(false);
        let encoding = coder.encode(&text, &model).unwrap();
        group.bench_with_input(BenchmarkId::new("decode_exact", len), &encoding, |b, encoding| {
            b.iter(|| coder.decode(&encoding.code, encoding.length, &model).unwrap())
        });
    }
    group.finish();
}

fn bench_full_report(c: &mut Criterion) {
    let coder = SourceCoder::default();
    let text = sample_text(512);
    c.bench_function("analyze_report", |b| b.iter(|| coder.analyze(&text).unwrap()));
}

criterion_group!(benches, bench_prefix_tables, bench_arithmetic, bench_full_report);
criterion_main!(benches);
