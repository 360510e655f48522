//! Key-exchange benchmarks.
//!
//! Run with: cargo bench

use criterion::{criterion_group, criterion_main, Criterion};
use newhope_kex::{create_offer, process_accept, process_offer};
use rand::rngs::OsRng;

fn bench_kex(c: &mut Criterion) {
    let mut group = c.benchmark_group("newhope");

    group.bench_function("create_offer", |b| {
        b.iter(|| create_offer(&mut OsRng).unwrap());
    });

    let (offermsg, _) = create_offer(&mut OsRng).unwrap();
    group.bench_function("process_offer", |b| {
        b.iter(|| process_offer(&mut OsRng, &offermsg).unwrap());
    });

    let (acceptmsg, _) = process_offer(&mut OsRng, &offermsg).unwrap();
    group.bench_function("process_accept", |b| {
        b.iter_batched(
            || create_offer(&mut OsRng).unwrap().1,
            |sk| {
                // The message belongs to another handshake, so the derived
                // key is garbage, but the work performed is identical.
                process_accept(sk, &acceptmsg).unwrap()
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_kex);
criterion_main!(benches);
