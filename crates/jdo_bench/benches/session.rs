//! Session commit cycle benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use jdo_bench::utils::{bench_class, random_values, stored_session};
use jdo_core::{FieldValue, Session, TransactionOptions};
use rand::Rng;

/// Benchmark persisting a batch of new instances and committing.
fn bench_persist_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("persist_commit");
    let class = bench_class().unwrap();

    for batch_size in [10, 100, 1000] {
        group.throughput(Throughput::Elements(batch_size as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(batch_size),
            &batch_size,
            |b, &batch_size| {
                let rows: Vec<_> = (0..batch_size).map(|key| random_values(key as i64)).collect();
                b.iter_batched(
                    || (Session::in_memory(TransactionOptions::default()), rows.clone()),
                    |(mut session, rows)| {
                        session.begin().unwrap();
                        for values in rows {
                            session.persist(&class, values).unwrap();
                        }
                        session.commit().unwrap();
                        black_box(session.len());
                    },
                    criterion::BatchSize::SmallInput,
                );
            },
        );
    }
    group.finish();
}

/// Benchmark a read-modify-write transaction over stored instances.
fn bench_update_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_commit");

    for count in [10, 100, 1000] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let (mut session, ids) =
                stored_session(TransactionOptions::default().retain_values(true), count)
                    .unwrap();
            let mut rng = rand::thread_rng();

            b.iter(|| {
                session.begin().unwrap();
                for id in &ids {
                    let sm = session.object_mut(*id).unwrap();
                    let current = sm.read_field(1).unwrap();
                    black_box(current);
                    sm.write_field(1, FieldValue::Integer(rng.gen())).unwrap();
                }
                session.commit().unwrap();
            });
        });
    }
    group.finish();
}

/// Benchmark rolling back with restored values.
fn bench_rollback_restore(c: &mut Criterion) {
    c.bench_function("rollback_restore", |b| {
        let options = TransactionOptions::default()
            .retain_values(true)
            .restore_values(true);
        let (mut session, ids) = stored_session(options, 100).unwrap();

        b.iter(|| {
            session.begin().unwrap();
            for id in &ids {
                session
                    .object_mut(*id)
                    .unwrap()
                    .write_field(2, FieldValue::Integer(0))
                    .unwrap();
            }
            session.rollback().unwrap();
        });
    });
}

criterion_group!(
    benches,
    bench_persist_commit,
    bench_update_commit,
    bench_rollback_restore,
);
criterion_main!(benches);
