use criterion::{black_box, criterion_group, criterion_main, Criterion};
use winregistry::codec::{decode, encode};
use winregistry::{Value, ValueType};

fn bench_encode(c: &mut Criterion) {
    let text = Value::from("C:\\Program Files\\Vendor\\App\\bin\\app.exe");
    let list = Value::from((0..32).map(|i| format!("C:\\plugins\\{i:02}")).collect::<Vec<_>>());

    c.bench_function("encode_string", |b| {
        b.iter(|| encode(black_box(&text), ValueType::String))
    });
    c.bench_function("encode_multi_string_32", |b| {
        b.iter(|| encode(black_box(&list), ValueType::MultiString))
    });
}

fn bench_decode(c: &mut Criterion) {
    let list = Value::from((0..32).map(|i| format!("C:\\plugins\\{i:02}")).collect::<Vec<_>>());
    let buf = encode(&list, ValueType::MultiString).unwrap_or_default();
    let dword = [0x78, 0x56, 0x34, 0x12];

    c.bench_function("decode_multi_string_32", |b| {
        b.iter(|| decode(black_box(&buf), ValueType::MultiString))
    });
    c.bench_function("decode_dword", |b| {
        b.iter(|| decode(black_box(&dword), ValueType::Dword))
    });
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
