#![forbid(unsafe_code)]

//! # Flowstate
//!
//! Reducer-driven state containers with change notification and memoized
//! projections.
//!
//! ## Store
//!
//! - `Store<S, A>` - Thread-safe state container changed only by a reducer
//! - Synchronous `dispatch` and FIFO `dispatch_async` on a background worker
//! - Subscribers notified once per actual change, in commit order
//!
//! ## Lenses
//!
//! - `Lens<S, V>` - Cached projection of a store's state
//! - `RelayLens<S, V>` - A lens that republishes its own changes
//!
//! ## Observable
//!
//! - `Observable<T>` - Single-owner value with the same notify-on-change rule
//!
//! Reducers, transforms and subscribers run synchronously inside the
//! dispatch that triggered them. They must not block for long, and a reducer
//! must never dispatch into its own store. A subscriber may; its action is
//! applied after the current change has reached every subscriber.

pub mod error;
pub mod lens;
pub mod observable;
pub mod store;
pub mod subscriber;

// Re-export main types for convenience
pub use error::DispatchError;
pub use lens::{Lens, RelayLens};
pub use observable::Observable;
pub use store::{Dispatch, Reducer, Store, StoreBuilder};
pub use subscriber::{Source, Subscriber, SubscriberId, SubscriberSet, Unsubscribe};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_works() {
        // Basic smoke test
        let store = Store::new(0, |n: &i32, step: i32| n + step);
        let doubled = Lens::new(&store, |n: &i32| n * 2);
        assert_eq!(store.state(), 0);
        store.dispatch(21);
        assert_eq!(doubled.get(), 42);
    }
}
