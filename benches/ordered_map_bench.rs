use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use ordered_bucket_map::OrderedHashMap;
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn bench_insert_fresh_100k(c: &mut Criterion) {
    c.bench_function("ordered::insert_fresh_100k", |b| {
        b.iter_batched(
            OrderedHashMap::<String, u64>::new,
            |mut m| {
                for (i, x) in lcg(1).take(100_000).enumerate() {
                    m.insert(key(x), i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_erase_random_10k(c: &mut Criterion) {
    c.bench_function("ordered::erase_random_10k_of_110k", |b| {
        b.iter_batched(
            || {
                let keys: Vec<String> = lcg(5).take(110_000).map(key).collect();
                let m: OrderedHashMap<String, u64> =
                    keys.iter().cloned().zip(0u64..).collect();
                // Precompute 10k unique victims via LCG
                let n = keys.len();
                let mut sel = std::collections::HashSet::with_capacity(10_000);
                let mut s = 0x9e3779b97f4a7c15u64;
                while sel.len() < 10_000 {
                    s = s.wrapping_mul(2862933555777941757).wrapping_add(3037000493);
                    sel.insert((s as usize) % n);
                }
                let victims: Vec<String> = sel.into_iter().map(|i| keys[i].clone()).collect();
                (m, victims)
            },
            |(mut m, victims)| {
                for k in &victims {
                    black_box(m.erase(k));
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_find_hit_10k(c: &mut Criterion) {
    c.bench_function("ordered::find_hit_10k_on_100k", |b| {
        let keys: Vec<_> = lcg(7).take(100_000).map(key).collect();
        let m: OrderedHashMap<String, u64> = keys.iter().cloned().zip(0u64..).collect();
        let n = keys.len();
        let mut s = 0x9e3779b97f4a7c15u64;
        let queries: Vec<String> = (0..10_000)
            .map(|_| {
                s = s.wrapping_mul(2862933555777941757).wrapping_add(3037000493);
                keys[(s as usize) % n].clone()
            })
            .collect();
        b.iter(|| {
            for q in &queries {
                black_box(m.find(q));
            }
        })
    });
}

fn bench_find_miss_10k(c: &mut Criterion) {
    c.bench_function("ordered::find_miss_10k_on_100k", |b| {
        let m: OrderedHashMap<String, u64> = lcg(11).take(100_000).map(key).zip(0u64..).collect();
        let misses: Vec<String> = lcg(0xdead_beef).take(10_000).map(key).collect();
        b.iter(|| {
            for q in &misses {
                black_box(m.find(q));
            }
        })
    });
}

fn bench_iterate_100k(c: &mut Criterion) {
    c.bench_function("ordered::iterate_100k", |b| {
        let m: OrderedHashMap<u64, u64> = lcg(13).take(100_000).zip(0u64..).collect();
        b.iter(|| black_box(m.values().copied().fold(0u64, u64::wrapping_add)))
    });
}

// Grow past several expands, then erase back down through the shrinks.
fn bench_churn_resize(c: &mut Criterion) {
    c.bench_function("ordered::churn_grow_shrink_20k", |b| {
        b.iter(|| {
            let mut m = OrderedHashMap::new();
            for i in 0..20_000u64 {
                m.insert(i, i);
            }
            for i in 0..20_000u64 {
                m.erase(&i);
            }
            black_box(m.bucket_count())
        })
    });
}

fn config() -> Criterion {
    Criterion::default()
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches;
    config = config();
    targets = bench_insert_fresh_100k, bench_erase_random_10k, bench_find_hit_10k,
        bench_find_miss_10k, bench_iterate_100k, bench_churn_resize
}
criterion_main!(benches);
