use criterion::{criterion_group, criterion_main, Criterion};
use docforge::Document;

include!("support/synthetic.rs");

fn bench_parse_small(c: &mut Criterion) {
    let buffer = synthetic_pdf(5);
    c.bench_function("parse_small_document", |b| {
        b.iter(|| Document::load_mem(&buffer).unwrap());
    });
}

fn bench_parse_large(c: &mut Criterion) {
    let buffer = synthetic_pdf(500);
    c.bench_function("parse_large_document", |b| {
        b.iter(|| Document::load_mem(&buffer).unwrap());
    });
}

criterion_group!(benches, bench_parse_small, bench_parse_large);
criterion_main!(benches);
