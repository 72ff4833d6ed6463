use super::lens::{Projection, Registration};
use crate::subscriber::{Source, Subscriber, SubscriberSet, Unsubscribe};
use parking_lot::ReentrantMutex;
use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::trace;

struct RelayInner<S, V> {
    projection: Projection<S, V>,
    subscribers: SubscriberSet<V>,
    relaying: ReentrantMutex<()>,
    registration: Registration,
}

impl<S, V> Subscriber<S> for RelayInner<S, V>
where
    S: 'static,
    V: Clone + PartialEq + Send + Sync + 'static,
{
    fn handle_change(&self, state: &S) {
        let _turn = self.relaying.lock();
        if let Some(value) = self.projection.refresh(state) {
            let notified = self.subscribers.notify(&value);
            trace!(notified, "relay lens changed");
        }
    }
}

/// A lens that republishes its own changes.
///
/// Subscribers of a relay lens are notified only when the projected value
/// changes, not on every change of the source. A relay lens is itself a
/// [`Source`], so lenses and relay lenses can be chained from it.
///
/// ```
/// use flowstate::{RelayLens, Store};
/// use parking_lot::Mutex;
/// use std::sync::Arc;
///
/// let store = Store::new(0, |n: &i32, step: i32| n + step);
/// let parity = RelayLens::new(&store, |n: &i32| n % 2 == 0);
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let subscriber = {
///     let seen = seen.clone();
///     Arc::new(move |even: &bool| seen.lock().push(*even))
/// };
/// let _unsubscribe = parity.subscribe(&subscriber);
///
/// store.dispatch(2); // still even
/// store.dispatch(1);
/// assert_eq!(*seen.lock(), vec![false]);
/// ```
pub struct RelayLens<S, V> {
    inner: Arc<RelayInner<S, V>>,
}

impl<S, V> RelayLens<S, V>
where
    S: 'static,
    V: Clone + PartialEq + Send + Sync + 'static,
{
    /// Attach a relay lens to `source`, seeding it from the current value.
    pub fn new<Src, F>(source: &Src, transform: F) -> Self
    where
        Src: Source<S> + ?Sized,
        F: Fn(&S) -> V + Send + Sync + 'static,
    {
        let inner = Arc::new(RelayInner {
            projection: Projection::new(&source.current(), transform),
            subscribers: SubscriberSet::new(),
            relaying: ReentrantMutex::new(()),
            registration: Registration::new(source.keep_alive()),
        });

        let sink: Weak<dyn Subscriber<S>> = Arc::downgrade(&inner) as Weak<dyn Subscriber<S>>;
        inner.registration.bind(source.attach(sink));

        Self { inner }
    }

    pub fn get(&self) -> V {
        self.inner.projection.get()
    }

    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&V) -> R,
    {
        self.inner.projection.with(f)
    }

    /// Subscribe to changes of the projected value.
    pub fn subscribe<T>(&self, subscriber: &Arc<T>) -> Unsubscribe
    where
        T: Subscriber<V> + 'static,
    {
        self.inner.subscribers.subscribe(subscriber)
    }

    pub fn subscribe_weak(&self, subscriber: Weak<dyn Subscriber<V>>) -> Unsubscribe {
        self.inner.subscribers.subscribe_weak(subscriber)
    }

    pub fn unsubscribe<T>(&self, subscriber: &Arc<T>)
    where
        T: ?Sized,
    {
        self.inner.subscribers.unsubscribe(subscriber);
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }
}

impl<S, V> Clone for RelayLens<S, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, V> Source<V> for RelayLens<S, V>
where
    S: 'static,
    V: Clone + PartialEq + Send + Sync + 'static,
{
    fn current(&self) -> V {
        self.get()
    }

    fn attach(&self, sink: Weak<dyn Subscriber<V>>) -> Unsubscribe {
        let _turn = self.inner.relaying.lock();

        let unsubscribe = self.inner.subscribers.subscribe_weak(sink.clone());
        if !unsubscribe.is_inert() {
            if let Some(sink) = sink.upgrade() {
                sink.handle_change(&self.get());
            }
        }
        unsubscribe
    }

    fn keep_alive(&self) -> Arc<dyn Any + Send + Sync> {
        Arc::clone(&self.inner) as Arc<dyn Any + Send + Sync>
    }
}

impl<S, V> fmt::Debug for RelayLens<S, V>
where
    S: 'static,
    V: fmt::Debug + Clone + PartialEq + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with(|value| {
            f.debug_struct("RelayLens")
                .field("value", value)
                .field("subscribers", &self.subscriber_count())
                .finish()
        })
    }
}
