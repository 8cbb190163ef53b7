//! Transition table dispatch benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use jdo_bench::utils::{bench_class, random_accesses};
use jdo_core::{
    RecordingController, StateType, TransactionOptions, Transaction, TransitionRequest,
};

/// Benchmark a read of a loaded field from each readable state.
fn bench_read_field(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_field");
    let class = bench_class().unwrap();

    for state in [
        StateType::Hollow,
        StateType::PersistentClean,
        StateType::PersistentDirty,
        StateType::PersistentNontransactional,
        StateType::TransientClean,
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(state), &state, |b, &state| {
            let options = TransactionOptions::default().nontransactional_read(true);
            let mut ctl = RecordingController::with_options(class.as_ref().clone(), options, true);
            b.iter(|| {
                let next = state
                    .state()
                    .transition_read_field(&mut ctl, black_box(true))
                    .unwrap();
                ctl.take_calls();
                black_box(next);
            });
        });
    }
    group.finish();
}

/// Benchmark a write from each writable state.
fn bench_write_field(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_field");
    let class = bench_class().unwrap();

    for state in [
        StateType::PersistentClean,
        StateType::PersistentDirty,
        StateType::PersistentNew,
        StateType::TransientDirty,
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(state), &state, |b, &state| {
            let mut ctl = RecordingController::with_options(
                class.as_ref().clone(),
                TransactionOptions::default(),
                true,
            );
            b.iter(|| {
                let next = state.state().transition_write_field(&mut ctl).unwrap();
                ctl.take_calls();
                black_box(next);
            });
        });
    }
    group.finish();
}

/// Benchmark generic dispatch through `apply` over a random access mix.
fn bench_apply_mix(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_mix");
    let class = bench_class().unwrap();

    for count in [100, 1000, 10000] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let requests = random_accesses(count);
            let options = TransactionOptions::default().optimistic(true);
            let mut ctl = RecordingController::with_options(class.as_ref().clone(), options, true);
            let tx = ctl.transaction_handle();

            b.iter(|| {
                let mut state = StateType::Hollow.state();
                for request in &requests {
                    state = state.apply(&mut ctl, tx.as_ref(), black_box(request)).unwrap();
                }
                ctl.take_calls();
                black_box(state);
            });
        });
    }
    group.finish();
}

/// Benchmark the end-of-transaction transitions of a dirty instance.
fn bench_commit_rollback(c: &mut Criterion) {
    let mut group = c.benchmark_group("end_of_transaction");
    let class = bench_class().unwrap();

    for (name, request) in [
        ("commit", TransitionRequest::Commit),
        ("rollback", TransitionRequest::Rollback),
    ] {
        group.bench_function(name, |b| {
            let options = TransactionOptions::default()
                .retain_values(true)
                .restore_values(true);
            let mut ctl = RecordingController::with_options(class.as_ref().clone(), options, true);
            let tx = ctl.transaction_handle();
            b.iter(|| {
                let next = StateType::PersistentDirty
                    .state()
                    .apply(&mut ctl, tx.as_ref(), black_box(&request))
                    .unwrap();
                ctl.take_calls();
                black_box((next, tx.is_active()));
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_read_field,
    bench_write_field,
    bench_apply_mix,
    bench_commit_rollback,
);
criterion_main!(benches);
