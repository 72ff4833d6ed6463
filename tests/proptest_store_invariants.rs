//! Property-based invariant tests for stores and lenses.
//!
//! 1. Final state equals the left fold of the reducer over the actions.
//! 2. Subscribers see exactly the changing states, in dispatch order.
//! 3. Async dispatch from one thread applies actions in FIFO order.
//! 4. A lens always equals its transform of the last notified state.
//! 5. A relay lens notifies iff its projected value changed.
//! 6. A subscriber that dispatches into its own store does not leave later
//!    subscribers or lenses behind the committed state.

use flowstate::{Lens, RelayLens, Store, Subscriber};
use parking_lot::Mutex;
use proptest::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug)]
enum Op {
    Add(i64),
    Mul(i64),
    Set(i64),
    Noop,
}

fn reduce(state: &i64, op: Op) -> i64 {
    match op {
        Op::Add(n) => state.wrapping_add(n),
        Op::Mul(n) => state.wrapping_mul(n),
        Op::Set(n) => n,
        Op::Noop => *state,
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (-5i64..5).prop_map(Op::Add),
        (-2i64..3).prop_map(Op::Mul),
        (-3i64..3).prop_map(Op::Set),
        Just(Op::Noop),
    ]
}

fn changing_states(initial: i64, ops: &[Op]) -> (i64, Vec<i64>) {
    let mut state = initial;
    let mut changes = Vec::new();
    for op in ops {
        let next = reduce(&state, *op);
        if next != state {
            changes.push(next);
        }
        state = next;
    }
    (state, changes)
}

fn recorder() -> (Arc<Mutex<Vec<i64>>>, Arc<impl Subscriber<i64>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let subscriber = {
        let seen = seen.clone();
        Arc::new(move |v: &i64| seen.lock().push(*v))
    };
    (seen, subscriber)
}

fn recording_store(initial: i64) -> (Store<i64, Op>, Arc<Mutex<Vec<i64>>>, Arc<impl Subscriber<i64>>) {
    let (seen, subscriber) = recorder();
    (Store::new(initial, reduce), seen, subscriber)
}

fn eventually(cond: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    cond()
}

// ── Properties ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn sync_dispatch_is_a_left_fold(initial in -10i64..10, ops in prop::collection::vec(op_strategy(), 0..64)) {
        let (store, seen, subscriber) = recording_store(initial);
        let _unsubscribe = store.subscribe(&subscriber);

        for op in &ops {
            store.dispatch(*op);
        }

        let (expected, changes) = changing_states(initial, &ops);
        prop_assert_eq!(store.state(), expected);
        prop_assert_eq!(seen.lock().clone(), changes);
    }

    #[test]
    fn async_dispatch_is_fifo(initial in -10i64..10, ops in prop::collection::vec(op_strategy(), 1..32)) {
        let (store, seen, subscriber) = recording_store(initial);
        let _unsubscribe = store.subscribe(&subscriber);

        for op in &ops {
            store.dispatch_async(*op).unwrap();
        }

        let (expected, changes) = changing_states(initial, &ops);
        prop_assert!(eventually(|| seen.lock().len() == changes.len() && store.pending_actions() == 0));
        prop_assert!(eventually(|| store.state() == expected));
        prop_assert_eq!(seen.lock().clone(), changes);
    }

    #[test]
    fn lens_matches_transform_of_state(initial in -10i64..10, ops in prop::collection::vec(op_strategy(), 0..64)) {
        let store = Store::new(initial, reduce);
        let bucket = Lens::new(&store, |n: &i64| n.rem_euclid(7));
        prop_assert_eq!(bucket.get(), initial.rem_euclid(7));

        for op in &ops {
            store.dispatch(*op);
            prop_assert_eq!(bucket.get(), store.state().rem_euclid(7));
        }
    }

    #[test]
    fn relay_notifies_iff_projection_changes(initial in -10i64..10, ops in prop::collection::vec(op_strategy(), 0..64)) {
        let store = Store::new(initial, reduce);
        let positive = RelayLens::new(&store, |n: &i64| *n > 0);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let subscriber = {
            let seen = seen.clone();
            Arc::new(move |v: &bool| seen.lock().push(*v))
        };
        let _unsubscribe = positive.subscribe(&subscriber);

        let mut expected = Vec::new();
        let mut last = initial > 0;
        let mut state = initial;
        for op in &ops {
            store.dispatch(*op);
            state = reduce(&state, *op);
            if (state > 0) != last {
                last = state > 0;
                expected.push(last);
            }
        }

        prop_assert_eq!(seen.lock().clone(), expected);
    }

    #[test]
    fn reentrant_dispatch_keeps_lenses_current(initial in -10i64..10, ops in prop::collection::vec(op_strategy(), 0..64)) {
        let store = Store::new(initial, reduce);
        let clamp = {
            let store = store.clone();
            Arc::new(move |n: &i64| {
                if *n < 0 {
                    store.dispatch(Op::Set(0));
                }
            })
        };
        let _clamp = store.subscribe(&clamp);
        let bucket = Lens::new(&store, |n: &i64| n.rem_euclid(7));
        let (seen, recording) = recorder();
        let _record = store.subscribe(&recording);

        let mut expected = Vec::new();
        let mut state = initial;
        for op in &ops {
            store.dispatch(*op);

            let next = reduce(&state, *op);
            if next != state {
                expected.push(next);
            }
            state = next;
            if state < 0 {
                expected.push(0);
                state = 0;
            }

            prop_assert_eq!(store.state(), state);
            prop_assert_eq!(bucket.get(), state.rem_euclid(7));
        }

        prop_assert_eq!(seen.lock().clone(), expected);
    }
}
