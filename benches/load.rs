use std::io::Cursor;

use criterion::{criterion_group, criterion_main, Criterion};
use docforge::{Document, IncrementalDocument, Object};

include!("support/synthetic.rs");

fn bench_load_from_reader(c: &mut Criterion) {
    let buffer = synthetic_pdf(200);
    c.bench_function("load_from_reader", |b| {
        b.iter(|| Document::load_from(Cursor::new(&buffer)).unwrap());
    });
}

fn bench_load_incremental_revision(c: &mut Criterion) {
    let base = synthetic_pdf(50);
    let mut incremental = IncrementalDocument::load_mem(&base).unwrap();
    incremental.add_object(Object::Integer(42));
    let appended = incremental.save_to_bytes().unwrap();

    c.bench_function("load_incremental_revision", |b| {
        b.iter(|| Document::load_mem(&appended).unwrap());
    });
}

criterion_group!(benches, bench_load_from_reader, bench_load_incremental_revision);
criterion_main!(benches);
