/// A sink that is told about every accepted change of an observed value.
///
/// Any `Fn(&T) + Send + Sync` closure is a subscriber, so most callers never
/// implement this by hand. Implement it on a struct when the sink carries its
/// own state, as lenses do.
///
/// Notifications for asynchronous dispatches arrive on the store's worker
/// thread, not on the thread that dispatched.
pub trait Subscriber<T>: Send + Sync {
    /// Called with the new value after it has been committed.
    fn handle_change(&self, value: &T);
}

impl<T, F> Subscriber<T> for F
where
    F: Fn(&T) + Send + Sync,
{
    fn handle_change(&self, value: &T) {
        self(value)
    }
}
