use criterion::{criterion_group, criterion_main, Criterion};
use docforge::{write, Document, WriteOptions, XrefFormat};

include!("support/synthetic.rs");

fn bench_save_table(c: &mut Criterion) {
    let buffer = synthetic_pdf(200);
    let doc = Document::load_mem(&buffer).unwrap();

    c.bench_function("save_xref_table", |b| {
        b.iter(|| write(&doc, WriteOptions { xref_format: XrefFormat::Table, ..Default::default() }).unwrap());
    });
}

fn bench_save_xref_stream(c: &mut Criterion) {
    let buffer = synthetic_pdf(200);
    let doc = Document::load_mem(&buffer).unwrap();

    c.bench_function("save_xref_stream", |b| {
        b.iter(|| write(&doc, WriteOptions { xref_format: XrefFormat::Stream, ..Default::default() }).unwrap());
    });
}

criterion_group!(benches, bench_save_table, bench_save_xref_stream);
criterion_main!(benches);
