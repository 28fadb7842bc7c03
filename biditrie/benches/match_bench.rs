//! Trie benchmarks.
//!
//! Measures:
//! - Insert throughput (intern + add + annotate)
//! - Match latency at hit and miss positions
//! - Image serialize/restore time

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use biditrie::{BidiTrieContainer, BidiTrieOptions, TrieRef};

const PATTERN_COUNT: usize = 10_000;

/// URL-path-like patterns: a short directory prefix, an "ad"-ish token, a
/// suffix. Pivot sits at the token.
fn generate_patterns(count: usize, seed: u64) -> Vec<(Vec<u8>, u32)> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let prefixes: [&[u8]; 6] = [b"/images/", b"/static/", b"-banner/", b"/js/", b"_cdn/", b"/a/"];
    let tokens: [&[u8]; 4] = [b"ad", b"ads", b"track", b"pixel"];
    (0..count)
        .map(|i| {
            let prefix = prefixes[rng.gen_range(0..prefixes.len())];
            let token = tokens[rng.gen_range(0..tokens.len())];
            let mut text = prefix.to_vec();
            let pivot = text.len() as u32;
            text.extend_from_slice(token);
            text.extend_from_slice(format!("-{i}.gif").as_bytes());
            (text, pivot)
        })
        .collect()
}

fn build_container(patterns: &[(Vec<u8>, u32)]) -> (BidiTrieContainer, TrieRef) {
    let mut ctr = BidiTrieContainer::new(BidiTrieOptions::default());
    let mut trie = TrieRef::new(ctr.create_trie());
    for (text, pivot) in patterns {
        let b = trie.add_pattern(&mut ctr, text, *pivot);
        ctr.set_extra(b, 1);
    }
    (ctr, trie)
}

fn bench_insert(c: &mut Criterion) {
    let patterns = generate_patterns(PATTERN_COUNT, 7);
    let mut group = c.benchmark_group("insert");
    group.throughput(Throughput::Elements(PATTERN_COUNT as u64));
    group.bench_function("10k_patterns", |b| {
        b.iter(|| {
            let (ctr, trie) = build_container(&patterns);
            black_box((ctr.used_bytes(), trie.size()))
        })
    });
    group.finish();
}

fn bench_match(c: &mut Criterion) {
    let patterns = generate_patterns(PATTERN_COUNT, 7);
    let (mut ctr, trie) = build_container(&patterns);

    let (text, pivot) = &patterns[PATTERN_COUNT / 2];
    let mut url = b"http://host".to_vec();
    let base = url.len() as u32;
    url.extend_from_slice(text);
    ctr.set_haystack(&url);

    let mut group = c.benchmark_group("match");
    group.bench_function("hit", |b| {
        b.iter(|| black_box(trie.matches(&ctr, base + pivot)))
    });
    group.bench_function("miss", |b| b.iter(|| black_box(trie.matches(&ctr, 0))));
    group.finish();
}

fn bench_selfie(c: &mut Criterion) {
    let patterns = generate_patterns(PATTERN_COUNT, 7);
    let (ctr, _) = build_container(&patterns);
    let image = ctr.serialize().to_vec();

    let mut group = c.benchmark_group("image");
    group.throughput(Throughput::Bytes(image.len() as u64));
    group.bench_function("serialize", |b| b.iter(|| black_box(ctr.serialize().len())));
    group.bench_function("restore", |b| {
        b.iter(|| {
            let mut fresh = BidiTrieContainer::new(BidiTrieOptions::default());
            black_box(fresh.deserialize(&image))
        })
    });
    group.finish();
}

criterion_group!(benches, bench_insert, bench_match, bench_selfie);
criterion_main!(benches);
