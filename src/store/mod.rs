//! Reducer-driven state management with stores.
//!
//! A [`Store`] owns one state value and changes it only by running its
//! [`Reducer`] over dispatched actions, either on the caller's thread or on a
//! lazily started background worker.

mod config;
mod reducer;
mod store;
mod worker;

pub use config::StoreBuilder;
pub use reducer::{Dispatch, Reducer};
pub use store::Store;
