//! Counter application: a store, a lens, a relay lens and async dispatch
//!
//! Run with `RUST_LOG=flowstate=trace` to see dispatch and worker events.

use flowstate::{Lens, RelayLens, Store};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug, PartialEq)]
struct Counter {
    value: i32,
}

#[derive(Clone, Copy, Debug)]
enum CounterAction {
    Increment,
    Decrement,
    Reset,
}

fn counter_reducer(counter: &Counter, action: CounterAction) -> Counter {
    let value = match action {
        CounterAction::Increment => counter.value + 1,
        CounterAction::Decrement => counter.value - 1,
        CounterAction::Reset => 0,
    };
    Counter { value }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .init();
}

fn main() {
    init_tracing();
    println!("=== Counter Application ===\n");

    let store = Store::builder(Counter { value: 0 }, counter_reducer)
        .worker_name("counter-dispatch")
        .build();

    let printer = Arc::new(|counter: &Counter| {
        println!("   [State] counter {{value: {}}}", counter.value);
    });
    let mut unsubscribe = store.subscribe(&printer);

    let magnitude = Lens::new(&store, |counter: &Counter| counter.value.abs());
    let sign = RelayLens::new(&store, |counter: &Counter| counter.value.signum());
    let sign_printer = Arc::new(|sign: &i32| {
        let label = match *sign {
            1 => "positive",
            -1 => "negative",
            _ => "zero",
        };
        println!("   [Sign] now {label}");
    });
    let _sign_unsubscribe = sign.subscribe(&sign_printer);

    println!("1. Incrementing ten times");
    for _ in 0..10 {
        store.dispatch(CounterAction::Increment);
    }
    println!("   magnitude = {}\n", magnitude.get());

    println!("2. Decrementing ten times");
    for _ in 0..10 {
        store.dispatch(CounterAction::Decrement);
    }

    println!("\n3. Resetting an already zero counter (no notification)");
    store.dispatch(CounterAction::Reset);

    println!("\n4. Dispatching asynchronously");
    unsubscribe.unsubscribe();
    let (done_tx, done_rx) = mpsc::sync_channel(1);
    let done = Arc::new(move |counter: &Counter| {
        if counter.value == -3 {
            let _ = done_tx.try_send(());
        }
    });
    let _done_unsubscribe = store.subscribe(&done);

    for _ in 0..3 {
        if let Err(err) = store.dispatch_async(CounterAction::Decrement) {
            eprintln!("   dispatch failed: {err}");
        }
    }
    if done_rx.recv_timeout(Duration::from_secs(5)).is_err() {
        eprintln!("   timed out waiting for the worker");
    }
    println!("   state = {:?}, magnitude = {}", store.state(), magnitude.get());

    store.shutdown();
    if let Err(err) = store.dispatch_async(CounterAction::Increment) {
        println!("\n5. After shutdown: {err}");
    }
}
