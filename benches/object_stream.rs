use criterion::{criterion_group, criterion_main, Criterion};
use docforge::object::Stream;
use docforge::object_stream::ObjectStream;
use docforge::Dictionary;

/// Builds a raw `/Type /ObjStm` stream body packing `count` simple
/// dictionary objects, uncompressed, matching the header/body layout
/// `ObjectStream::new` expects (ISO 32000-1 §7.5.7).
fn synthetic_object_stream(count: u32) -> Stream {
    let mut header = String::new();
    let mut body = String::new();
    for i in 0..count {
        header.push_str(&format!("{i} {} ", body.len()));
        body.push_str(&format!("<</Type/TestObj/Value {i}>>"));
    }
    let first = header.len();
    let content = format!("{header}{body}").into_bytes();

    let mut dict = Dictionary::new();
    dict.set("Type", docforge::Object::Name(b"ObjStm".to_vec()));
    dict.set("N", docforge::Object::Integer(count as i64));
    dict.set("First", docforge::Object::Integer(first as i64));
    Stream::new(dict, content)
}

fn bench_object_stream_parse_small(c: &mut Criterion) {
    c.bench_function("object_stream_parse_small", |b| {
        b.iter(|| {
            let mut stream = synthetic_object_stream(20);
            ObjectStream::new(&mut stream).unwrap()
        });
    });
}

fn bench_object_stream_parse_large(c: &mut Criterion) {
    c.bench_function("object_stream_parse_large", |b| {
        b.iter(|| {
            let mut stream = synthetic_object_stream(2000);
            ObjectStream::new(&mut stream).unwrap()
        });
    });
}

criterion_group!(benches, bench_object_stream_parse_small, bench_object_stream_parse_large);
criterion_main!(benches);
