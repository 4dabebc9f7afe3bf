use codepoint_trie::{CodePointTrie, CodePointTrieBuilder, TrieType, ValueWidth};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Bencher, Benchmark, Criterion};

/// Roughly script-property-shaped: a handful of wide low-plane runs plus a
/// sparse scattering of single code points above the BMP, so both the fast
/// index and the three-level slow path get exercised.
fn sample_trie(trie_type: TrieType) -> CodePointTrie {
    let mut builder = CodePointTrieBuilder::new(0, 0xFFFF);
    builder.set_range(0x41, 0x5A, 1).unwrap();
    builder.set_range(0x61, 0x7A, 1).unwrap();
    builder.set_range(0x370, 0x3FF, 2).unwrap();
    builder.set_range(0x4E00, 0x9FFF, 3).unwrap();
    for cp in (0x1_0000..0x1_FFFF).step_by(37) {
        builder.set(cp, 4).unwrap();
    }
    builder.set_range(0x2_0000, 0x2_A6DF, 5).unwrap();
    builder.build(trie_type, ValueWidth::Bits8).unwrap()
}

fn bench_get(c: &mut Criterion) {
    let fast = sample_trie(TrieType::Fast);
    let small = sample_trie(TrieType::Small);
    let probes: Vec<i32> = (0..0x11_0000).step_by(997).collect();

    fn bench(b: &mut Bencher, trie: &CodePointTrie, probes: &[i32]) {
        b.iter_batched(
            || probes,
            |probes| {
                for &cp in probes {
                    black_box(trie.get(black_box(cp)));
                }
            },
            BatchSize::SmallInput,
        )
    }

    c.bench(
        "CodePointTrie::get",
        Benchmark::new("fast", |b| bench(b, &fast, &probes))
            .with_function("small", |b| bench(b, &small, &probes)),
    );
}

fn bench_ranges(c: &mut Criterion) {
    let fast = sample_trie(TrieType::Fast);

    c.bench(
        "CodePointTrie::ranges",
        Benchmark::new("full domain", |b| {
            b.iter(|| black_box(&fast).ranges().for_each(|r| black_box(r)))
        }),
    );
}

fn bench_serialize(c: &mut Criterion) {
    let fast = sample_trie(TrieType::Fast);
    let mut bytes = Vec::new();
    fast.serialize_le(&mut bytes).unwrap();

    c.bench(
        "CodePointTrie (serde-io)",
        Benchmark::new("serialize_le", |b| {
            b.iter(|| {
                let mut out = Vec::new();
                black_box(&fast).serialize_le(&mut out).unwrap();
                black_box(out);
            })
        })
        .with_function("deserialize", |b| {
            b.iter(|| {
                let mut slice = bytes.as_slice();
                black_box(CodePointTrie::deserialize(&mut slice)).unwrap()
            })
        }),
    );
}

criterion_group!(benches, bench_get, bench_ranges, bench_serialize);
criterion_main!(benches);
