use super::{Subscriber, Unsubscribe};
use std::any::Any;
use std::sync::{Arc, Weak};

/// A publisher that a lens can attach to.
///
/// Implemented by [`Store`](crate::Store) and [`RelayLens`](crate::RelayLens),
/// which is what lets relay lenses be chained.
pub trait Source<T>: Send + Sync {
    /// Snapshot of the value currently published.
    fn current(&self) -> T;

    /// Register `sink` and hand it the current value.
    ///
    /// No change can be published between the registration and that first
    /// delivery, so the sink never starts from a stale value.
    fn attach(&self, sink: Weak<dyn Subscriber<T>>) -> Unsubscribe;

    /// A strong reference that keeps the publisher alive.
    fn keep_alive(&self) -> Arc<dyn Any + Send + Sync>;
}
