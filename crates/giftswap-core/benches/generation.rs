//! Generation and audit throughput benchmarks.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use giftswap_core::StrategyKind;
use giftswap_core::audit::audit;

fn roster(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("F{i:02}")).collect()
}

fn bench_generate(c: &mut Criterion) {
    let ids = roster(12);
    let mut group = c.benchmark_group("generate");
    for kind in StrategyKind::ALL {
        group.bench_with_input(BenchmarkId::from_parameter(kind), &kind, |b, &kind| {
            b.iter(|| kind.generate(black_box(ids.clone()), Some(7)).unwrap());
        });
    }
    group.finish();
}

fn bench_audit(c: &mut Criterion) {
    let ids = roster(4);
    c.bench_function("audit/removal-shuffled/1k", |b| {
        b.iter(|| audit(black_box(&ids), StrategyKind::RemovalShuffled, 0..1_000).unwrap());
    });
}

criterion_group!(benches, bench_generate, bench_audit);
criterion_main!(benches);
