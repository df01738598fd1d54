use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use cmesh_cipher::codec::{decode, decode_with, encode};
use cmesh_cipher::generator::generate;
use std::hint::black_box;

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");

    let key = generate().unwrap();
    let inverse = key.map.invert();

    for size in [64usize, 1024, 16_384] {
        let plain: String =
            "the quick brown fox jumps over 13 lazy dogs ".chars().cycle().take(size).collect();
        let encoded = encode(&plain, &key);

        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("encode", size), &plain, |b, plain| {
            b.iter(|| black_box(encode(plain, &key)));
        });

        group.bench_with_input(BenchmarkId::new("decode", size), &encoded, |b, encoded| {
            b.iter(|| black_box(decode(encoded, &key)));
        });

        group.bench_with_input(
            BenchmarkId::new("decode_prederived", size),
            &encoded,
            |b, encoded| {
                b.iter(|| black_box(decode_with(encoded, &inverse)));
            },
        );
    }

    group.finish();
}

fn bench_generate(c: &mut Criterion) {
    c.bench_function("generate_key", |b| {
        b.iter(|| black_box(generate().unwrap()));
    });
}

criterion_group!(benches, bench_codec, bench_generate);
criterion_main!(benches);
