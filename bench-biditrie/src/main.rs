//! Biditrie insert/match/memory benchmark with a tracking allocator.
//!
//! Measures insert throughput, match throughput at hit and miss positions,
//! container memory (buffer plus peak allocation), and selfie round-trip
//! time at two pattern-set scales.
//!
//! Run with: cargo run --release -p bench-biditrie

use std::alloc::{GlobalAlloc, Layout, System};
use std::hint::black_box;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use biditrie::{from_selfie, to_selfie, BidiTrieContainer, BidiTrieOptions, TrieRef};

// ============================================================================
// Tracking allocator
// ============================================================================

struct TrackingAllocator;

static ALLOCATED: AtomicUsize = AtomicUsize::new(0);
static PEAK: AtomicUsize = AtomicUsize::new(0);

#[global_allocator]
static ALLOC: TrackingAllocator = TrackingAllocator;

unsafe impl GlobalAlloc for TrackingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            let current = ALLOCATED.fetch_add(layout.size(), Ordering::Relaxed) + layout.size();
            let mut peak = PEAK.load(Ordering::Relaxed);
            while current > peak {
                match PEAK.compare_exchange_weak(
                    peak,
                    current,
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => break,
                    Err(p) => peak = p,
                }
            }
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        ALLOCATED.fetch_sub(layout.size(), Ordering::Relaxed);
        unsafe { System.dealloc(ptr, layout) };
    }
}

fn reset_peak() {
    PEAK.store(ALLOCATED.load(Ordering::Relaxed), Ordering::Relaxed);
}

// ============================================================================
// Data generation
// ============================================================================

/// Generate URL-filter-like patterns: a path prefix, an anchor token, a
/// distinguishing suffix. The pivot sits at the token.
fn generate_patterns(count: usize, seed: u64) -> Vec<(Vec<u8>, u32)> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let prefixes: [&[u8]; 8] = [
        b"/images/",
        b"/static/img/",
        b"-banner/",
        b"/js/lib/",
        b"_cdn/",
        b"/assets/",
        b"/media/",
        b"/a/",
    ];
    let tokens: [&[u8]; 5] = [b"ad", b"ads", b"track", b"pixel", b"beacon"];
    let suffixes: [&[u8]; 4] = [b".gif", b".js", b".png", b"/"];
    (0..count)
        .map(|i| {
            let mut text = Vec::new();
            if rng.gen_bool(0.8) {
                text.extend_from_slice(prefixes[rng.gen_range(0..prefixes.len())]);
            }
            let pivot = text.len() as u32;
            text.extend_from_slice(tokens[rng.gen_range(0..tokens.len())]);
            text.extend_from_slice(format!("-{i}").as_bytes());
            text.extend_from_slice(suffixes[rng.gen_range(0..suffixes.len())]);
            (text, pivot)
        })
        .collect()
}

// ============================================================================
// Benchmark
// ============================================================================

struct Report {
    scale: usize,
    insert_ms: f64,
    hit_ns: f64,
    miss_ns: f64,
    used_bytes: usize,
    buffer_bytes: usize,
    optimized_bytes: usize,
    peak_bytes: usize,
    selfie_ms: f64,
    restore_ms: f64,
}

fn bench_scale(scale: usize) -> Report {
    let patterns = generate_patterns(scale, 0xb1d1);

    reset_peak();
    let start = Instant::now();
    let mut ctr = BidiTrieContainer::new(BidiTrieOptions::default());
    let mut trie = TrieRef::new(ctr.create_trie());
    for (text, pivot) in &patterns {
        let b = trie.add_pattern(&mut ctr, text, *pivot);
        ctr.set_extra(b, 1);
    }
    let insert_ms = start.elapsed().as_secs_f64() * 1e3;
    let peak_bytes = PEAK.load(Ordering::Relaxed);
    let used_bytes = ctr.used_bytes();
    let buffer_bytes = ctr.buffer_len();

    // Hit probes: each pattern embedded in a URL, pivot aligned.
    let probes: Vec<(Vec<u8>, u32)> = patterns
        .iter()
        .take(1000)
        .map(|(text, pivot)| {
            let mut url = b"http://host".to_vec();
            let base = url.len() as u32;
            url.extend_from_slice(text);
            (url, base + pivot)
        })
        .collect();

    let start = Instant::now();
    let mut hits = 0usize;
    for _ in 0..100 {
        for (url, i) in &probes {
            ctr.set_haystack(url);
            if trie.matches(&ctr, *i).is_some() {
                hits += 1;
            }
        }
    }
    let hit_ns = start.elapsed().as_nanos() as f64 / (100 * probes.len()) as f64;
    assert_eq!(hits, 100 * probes.len());

    // Miss probes: pivot aligned at the URL start, where nothing anchors.
    let start = Instant::now();
    for _ in 0..100 {
        for (url, _) in &probes {
            ctr.set_haystack(url);
            black_box(trie.matches(&ctr, 0));
        }
    }
    let miss_ns = start.elapsed().as_nanos() as f64 / (100 * probes.len()) as f64;

    ctr.optimize();
    let optimized_bytes = ctr.buffer_len();

    let start = Instant::now();
    let selfie = to_selfie(&ctr);
    let selfie_ms = start.elapsed().as_secs_f64() * 1e3;

    let start = Instant::now();
    let mut restored = BidiTrieContainer::new(BidiTrieOptions::default());
    from_selfie(&mut restored, &selfie).expect("selfie must restore");
    let restore_ms = start.elapsed().as_secs_f64() * 1e3;

    // Restored container answers identically.
    let (url, i) = &probes[0];
    restored.set_haystack(url);
    assert!(restored.matches(trie.root(), *i).is_some());

    Report {
        scale,
        insert_ms,
        hit_ns,
        miss_ns,
        used_bytes,
        buffer_bytes,
        optimized_bytes,
        peak_bytes,
        selfie_ms,
        restore_ms,
    }
}

fn main() {
    println!("biditrie benchmark");
    println!("==================");
    println!();

    for scale in [10_000, 100_000] {
        let r = bench_scale(scale);
        println!("{} patterns", r.scale);
        println!("  insert:        {:>10.2} ms", r.insert_ms);
        println!("  match hit:     {:>10.1} ns/op", r.hit_ns);
        println!("  match miss:    {:>10.1} ns/op", r.miss_ns);
        println!(
            "  memory:        {:>10} used / {} buffer / {} optimized",
            r.used_bytes, r.buffer_bytes, r.optimized_bytes
        );
        println!("  peak alloc:    {:>10} bytes", r.peak_bytes);
        println!("  selfie encode: {:>10.2} ms", r.selfie_ms);
        println!("  selfie decode: {:>10.2} ms", r.restore_ms);
        println!();
    }
}
