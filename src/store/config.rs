use super::reducer::Reducer;
use super::store::Store;

pub(crate) const DEFAULT_WORKER_NAME: &str = "flowstate-dispatch";

/// Configures a [`Store`] before it is built.
///
/// ```
/// use flowstate::Store;
///
/// let store = Store::builder(0, |count: &i32, delta: i32| count + delta)
///     .worker_name("counter-dispatch")
///     .queue_capacity(64)
///     .build();
///
/// store.dispatch(5);
/// assert_eq!(store.state(), 5);
/// ```
pub struct StoreBuilder<S, A> {
    initial: S,
    reducer: Box<dyn Reducer<S, A>>,
    worker_name: String,
    queue_capacity: Option<usize>,
}

impl<S, A> StoreBuilder<S, A>
where
    S: Clone + PartialEq + Send + Sync + 'static,
    A: Send + 'static,
{
    pub(crate) fn new<R>(initial: S, reducer: R) -> Self
    where
        R: Reducer<S, A>,
    {
        Self {
            initial,
            reducer: Box::new(reducer),
            worker_name: DEFAULT_WORKER_NAME.to_string(),
            queue_capacity: None,
        }
    }

    /// Name given to the async dispatch thread.
    pub fn worker_name(mut self, name: impl Into<String>) -> Self {
        self.worker_name = name.into();
        self
    }

    /// Bound the number of async actions waiting for the worker.
    ///
    /// Without a bound the queue grows as long as callers outpace the
    /// reducer. Once `capacity` actions are pending, `dispatch_async` fails
    /// with [`DispatchError::QueueFull`](crate::DispatchError::QueueFull).
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }

    pub fn build(self) -> Store<S, A> {
        Store::from_parts(
            self.initial,
            self.reducer,
            self.worker_name,
            self.queue_capacity,
        )
    }
}
