use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use std::sync::Arc;

use flowstate::{Lens, Observable, RelayLens, Store};

#[derive(Clone, PartialEq)]
struct State {
    counter: usize,
    name: String,
}

fn reducer(state: &State, counter: usize) -> State {
    State {
        counter,
        name: state.name.clone(),
    }
}

fn state_store() -> Store<State, usize> {
    Store::new(
        State {
            counter: 0,
            name: "test".to_string(),
        },
        reducer,
    )
}

fn store_creation_benchmark(c: &mut Criterion) {
    c.bench_function("store_creation", |b| {
        b.iter(|| Store::new(black_box(42), |n: &i32, step: i32| n + step));
    });
}

fn store_read_benchmark(c: &mut Criterion) {
    let store = state_store();

    c.bench_function("store_read", |b| {
        b.iter(|| {
            black_box(store.read(|state| state.counter));
        });
    });
}

fn store_dispatch_benchmark(c: &mut Criterion) {
    let store = state_store();

    c.bench_function("store_dispatch", |b| {
        let mut i = 0;
        b.iter(|| {
            store.dispatch(black_box(i));
            i += 1;
        });
    });
}

fn store_unchanged_dispatch_benchmark(c: &mut Criterion) {
    let store = state_store();
    let subscriber = Arc::new(|_: &State| {});
    let _unsubscribe = store.subscribe(&subscriber);

    c.bench_function("store_unchanged_dispatch", |b| {
        b.iter(|| store.dispatch(black_box(0)));
    });
}

fn store_subscribe_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_subscribe");

    for subscriber_count in [1, 10, 100].iter() {
        let store = state_store();

        let subscribers: Vec<_> = (0..*subscriber_count)
            .map(|_| {
                Arc::new(|_: &State| {
                    // Empty subscriber
                })
            })
            .collect();
        let _registrations: Vec<_> = subscribers.iter().map(|s| store.subscribe(s)).collect();

        group.bench_with_input(
            BenchmarkId::from_parameter(subscriber_count),
            subscriber_count,
            |b, _| {
                let mut i = 0;
                b.iter(|| {
                    store.dispatch(black_box(i));
                    i += 1;
                });
            },
        );
    }
    group.finish();
}

fn lens_chain_benchmark(c: &mut Criterion) {
    let store = state_store();
    let parity = RelayLens::new(&store, |state: &State| state.counter % 2);
    let label = Lens::new(&parity, |parity: &usize| {
        if *parity == 0 {
            "even"
        } else {
            "odd"
        }
    });

    c.bench_function("lens_chain_dispatch", |b| {
        let mut i = 0;
        b.iter(|| {
            store.dispatch(black_box(i));
            i += 1;
        });
    });
    black_box(label.get());
}

fn observable_set_benchmark(c: &mut Criterion) {
    let mut observable = Observable::new(0usize);

    c.bench_function("observable_set", |b| {
        let mut i = 0;
        b.iter(|| {
            observable.set(black_box(i));
            i += 1;
        });
    });
}

criterion_group!(
    benches,
    store_creation_benchmark,
    store_read_benchmark,
    store_dispatch_benchmark,
    store_unchanged_dispatch_benchmark,
    store_subscribe_benchmark,
    lens_chain_benchmark,
    observable_set_benchmark,
);
criterion_main!(benches);
