use crate::subscriber::{Subscriber, SubscriberSet, Unsubscribe};
use std::fmt;
use std::sync::{Arc, Weak};

/// A value that notifies its subscribers when it changes.
///
/// Mutation takes `&mut self`, so an `Observable` has a single owner and
/// needs no locking around its value. Use a [`Store`](crate::Store) when
/// several threads must change the state.
///
/// ```
/// use flowstate::Observable;
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicI32, Ordering};
///
/// let last = Arc::new(AtomicI32::new(0));
/// let subscriber = {
///     let last = last.clone();
///     Arc::new(move |v: &i32| last.store(*v, Ordering::SeqCst))
/// };
///
/// let mut value = Observable::new(1);
/// let _unsubscribe = value.subscribe(&subscriber);
///
/// value.set(5);
/// assert_eq!(last.load(Ordering::SeqCst), 5);
/// assert_eq!(*value.get(), 5);
/// ```
pub struct Observable<T> {
    value: T,
    version: u64,
    subscribers: SubscriberSet<T>,
}

impl<T> Observable<T>
where
    T: PartialEq + 'static,
{
    pub fn new(value: T) -> Self {
        Self {
            value,
            version: 0,
            subscribers: SubscriberSet::new(),
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Replace the value, notifying subscribers if it differs from the
    /// current one.
    pub fn set(&mut self, value: T) {
        if self.value == value {
            return;
        }
        self.value = value;
        self.version += 1;
        self.notify_all();
    }

    /// Modify the value in place, notifying subscribers if it changed.
    pub fn update<F>(&mut self, f: F)
    where
        T: Clone,
        F: FnOnce(&mut T),
    {
        let previous = self.value.clone();
        f(&mut self.value);
        if self.value != previous {
            self.version += 1;
            self.notify_all();
        }
    }

    /// Notify every subscriber of the current value, changed or not.
    pub fn notify_all(&self) {
        self.subscribers.notify(&self.value);
    }

    /// Number of accepted changes since construction.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn subscribe<S>(&self, subscriber: &Arc<S>) -> Unsubscribe
    where
        S: Subscriber<T> + 'static,
    {
        self.subscribers.subscribe(subscriber)
    }

    pub fn subscribe_weak(&self, subscriber: Weak<dyn Subscriber<T>>) -> Unsubscribe {
        self.subscribers.subscribe_weak(subscriber)
    }

    pub fn unsubscribe<S>(&self, subscriber: &Arc<S>)
    where
        S: ?Sized,
    {
        self.subscribers.unsubscribe(subscriber);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl<T> Default for Observable<T>
where
    T: Default + PartialEq + 'static,
{
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> From<T> for Observable<T>
where
    T: PartialEq + 'static,
{
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &self.value)
            .field("version", &self.version)
            .finish()
    }
}
