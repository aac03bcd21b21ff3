//! Private set intersection benchmarks using `criterion`.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use dh_psi::{compute_intersection, GroupParameters, Party};
use rand::rngs::OsRng;
use std::time::Duration;

fn sets(size: usize, overlap: usize) -> (Vec<String>, Vec<String>) {
    let common = (0..overlap).map(|i| format!("common_{}", i));
    let a = common
        .clone()
        .chain((overlap..size).map(|i| format!("A_{}", i)))
        .collect();
    let b = common.chain((overlap..size).map(|i| format!("B_{}", i))).collect();
    (a, b)
}

fn bench_blind(c: &mut Criterion) {
    let params = GroupParameters::reference();
    let (a, _) = sets(1 << 8, 0);
    let party = Party::new("Alice", &params, a, &mut OsRng).unwrap();
    c.bench_function("psi::Party::blind (256)", move |bench| {
        bench.iter(|| criterion::black_box(party.blind()))
    });
}

fn bench_protocol(c: &mut Criterion) {
    let params = GroupParameters::reference();
    let mut group = c.benchmark_group("psi::compute_intersection");
    for size in [100usize, 500, 1000] {
        let (a, b) = sets(size, size / 10);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |bench, _| {
            bench.iter(|| {
                compute_intersection(&params, a.iter().cloned(), b.iter().cloned(), &mut OsRng)
                    .unwrap()
            })
        });
    }
    group.finish();
}

criterion_group! {
    name = psi;
    config = Criterion::default().warm_up_time(Duration::from_millis(100)).sample_size(10);
    targets = bench_blind, bench_protocol
}
criterion_main!(psi);
