//! Benchmarks for nettrie lookup performance.
//!
//! Run with: cargo bench
//!
//! This benchmark suite measures:
//! - Longest-prefix-match throughput for IPv4 and IPv6
//! - Scalability with different table sizes
//! - Insert and erase cost
//! - Hot reload of a shared set

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use nettrie::{Endpoint, Prefix, PrefixSet, PrefixSetConfig, PrefixTrie, SharedPrefixSet};
use std::net::{Ipv4Addr, Ipv6Addr};

/// Deterministic pseudo-random sequence (xorshift) so runs are comparable.
fn xorshift(state: &mut u64) -> u64 {
    *state ^= *state << 13;
    *state ^= *state >> 7;
    *state ^= *state << 17;
    *state
}

/// Generate `count` IPv4 prefixes with lengths between 8 and 32.
fn generate_v4_prefixes(count: usize) -> Vec<Prefix> {
    let mut state = 0x9e37_79b9_7f4a_7c15;
    (0..count)
        .map(|_| {
            let r = xorshift(&mut state);
            let addr = Ipv4Addr::from(r as u32);
            let length = 8 + (r >> 32) as u8 % 25;
            Prefix::new(addr.into(), length)
        })
        .collect()
}

/// Generate `count` IPv6 prefixes with lengths between 16 and 64.
fn generate_v6_prefixes(count: usize) -> Vec<Prefix> {
    let mut state = 0x2545_f491_4f6c_dd1d;
    (0..count)
        .map(|_| {
            let hi = xorshift(&mut state);
            let addr = Ipv6Addr::from(u128::from(hi) << 64 | 0x2001_0db8_0000_0000);
            let length = 16 + (xorshift(&mut state) % 49) as u8;
            Prefix::new(addr.into(), length)
        })
        .collect()
}

/// Generate query addresses: half inside stored prefixes, half random.
fn generate_queries(prefixes: &[Prefix], count: usize) -> Vec<Endpoint> {
    let mut state = 0x1234_5678_9abc_def0;
    (0..count)
        .map(|i| {
            if i % 2 == 0 && !prefixes.is_empty() {
                *prefixes[i % prefixes.len()].network()
            } else {
                Ipv4Addr::from(xorshift(&mut state) as u32).into()
            }
        })
        .collect()
}

fn build_trie(prefixes: &[Prefix]) -> PrefixTrie<u32> {
    prefixes
        .iter()
        .enumerate()
        .map(|(i, prefix)| (*prefix, i as u32))
        .collect()
}

/// Benchmark IPv4 longest-prefix match.
fn bench_v4_lookup(c: &mut Criterion) {
    let prefixes = generate_v4_prefixes(10_000);
    let trie = build_trie(&prefixes);
    let queries = generate_queries(&prefixes, 1000);

    let mut group = c.benchmark_group("v4_lookup");
    group.throughput(Throughput::Elements(queries.len() as u64));

    group.bench_function("mixed_queries", |b| {
        b.iter(|| {
            for query in &queries {
                black_box(trie.lookup(black_box(query)));
            }
        })
    });

    group.finish();
}

/// Benchmark IPv6 longest-prefix match.
fn bench_v6_lookup(c: &mut Criterion) {
    let prefixes = generate_v6_prefixes(10_000);
    let trie = build_trie(&prefixes);
    let queries: Vec<Endpoint> = prefixes.iter().take(1000).map(|p| *p.network()).collect();

    let mut group = c.benchmark_group("v6_lookup");
    group.throughput(Throughput::Elements(queries.len() as u64));

    group.bench_function("stored_networks", |b| {
        b.iter(|| {
            for query in &queries {
                black_box(trie.lookup(black_box(query)));
            }
        })
    });

    group.finish();
}

/// Benchmark lookup scalability with different table sizes.
fn bench_scalability(c: &mut Criterion) {
    let mut group = c.benchmark_group("scalability");

    for size in [100, 1_000, 10_000, 100_000].iter() {
        let prefixes = generate_v4_prefixes(*size);
        let trie = build_trie(&prefixes);
        let queries = generate_queries(&prefixes, 100);

        group.throughput(Throughput::Elements(100));
        group.bench_with_input(BenchmarkId::new("prefixes", size), size, |b, _| {
            b.iter(|| {
                for query in &queries {
                    black_box(trie.lookup(black_box(query)));
                }
            })
        });
    }

    group.finish();
}

/// Benchmark building and tearing down a table.
fn bench_insert_erase(c: &mut Criterion) {
    let prefixes = generate_v4_prefixes(10_000);

    let mut group = c.benchmark_group("mutation");
    group.throughput(Throughput::Elements(prefixes.len() as u64));

    group.bench_function("insert_10k", |b| {
        b.iter(|| black_box(build_trie(&prefixes)))
    });

    group.bench_function("insert_erase_10k", |b| {
        b.iter(|| {
            let mut trie = build_trie(&prefixes);
            for prefix in &prefixes {
                trie.erase(prefix);
            }
            black_box(trie.len())
        })
    });

    group.finish();
}

/// Benchmark set matching and hot reload.
fn bench_shared_set(c: &mut Criterion) {
    let entries: Vec<String> = generate_v4_prefixes(10_000)
        .iter()
        .enumerate()
        .map(|(i, p)| if i % 5 == 0 { format!("!{}", p) } else { p.to_string() })
        .collect();
    let config = PrefixSetConfig::new("bench", entries);
    let set: PrefixSet = config.build().unwrap();
    let queries = generate_queries(&generate_v4_prefixes(1000), 1000);
    let shared = SharedPrefixSet::new(set);

    let mut group = c.benchmark_group("shared_set");

    group.throughput(Throughput::Elements(queries.len() as u64));
    group.bench_function("matches", |b| {
        b.iter(|| {
            for query in &queries {
                black_box(shared.matches(black_box(query)));
            }
        })
    });

    group.throughput(Throughput::Elements(1));
    group.bench_function("reload_10k_entries", |b| {
        b.iter(|| shared.reload(black_box(&config)).unwrap())
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_v4_lookup,
    bench_v6_lookup,
    bench_scalability,
    bench_insert_erase,
    bench_shared_set,
);

criterion_main!(benches);
