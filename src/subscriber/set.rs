use super::Subscriber;
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};

/// Identity of a registered subscriber: the address of its allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(usize);

impl SubscriberId {
    /// Identity of the subscriber behind `subscriber`.
    pub fn of<S: ?Sized>(subscriber: &Arc<S>) -> Self {
        Self(Arc::as_ptr(subscriber).cast::<()>() as usize)
    }

    fn of_weak<S: ?Sized>(subscriber: &Weak<S>) -> Self {
        Self(subscriber.as_ptr().cast::<()>() as usize)
    }
}

struct Entry<T> {
    id: SubscriberId,
    sink: Weak<dyn Subscriber<T>>,
}

type Entries<T> = Mutex<Vec<Entry<T>>>;

/// Registration-ordered set of weakly held subscribers.
///
/// The set never extends a subscriber's lifetime. Entries whose subscriber
/// has been dropped are pruned the next time the set is touched.
pub struct SubscriberSet<T> {
    entries: Arc<Entries<T>>,
}

impl<T: 'static> SubscriberSet<T> {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Register `subscriber`.
    ///
    /// Registering an identity that is already present is a no-op and
    /// returns an inert [`Unsubscribe`].
    pub fn subscribe<S>(&self, subscriber: &Arc<S>) -> Unsubscribe
    where
        S: Subscriber<T> + 'static,
    {
        let sink: Weak<S> = Arc::downgrade(subscriber);
        self.subscribe_weak(sink)
    }

    /// Register an already-downgraded subscriber.
    ///
    /// A dangling `Weak` plays the role of a null reference: nothing is
    /// registered and the returned [`Unsubscribe`] is inert.
    pub fn subscribe_weak(&self, sink: Weak<dyn Subscriber<T>>) -> Unsubscribe {
        if sink.strong_count() == 0 {
            return Unsubscribe::inert();
        }

        let id = SubscriberId::of_weak(&sink);
        {
            let mut entries = self.entries.lock();
            entries.retain(|entry| entry.sink.strong_count() > 0);
            if entries.iter().any(|entry| entry.id == id) {
                return Unsubscribe::inert();
            }
            entries.push(Entry {
                id,
                sink: sink.clone(),
            });
        }

        // The captured `Weak` keeps the allocation, and with it the address,
        // from being reused while this capability exists.
        let entries = Arc::downgrade(&self.entries);
        Unsubscribe::new(move || {
            if let Some(entries) = entries.upgrade() {
                remove_sink(&entries, &sink);
            }
        })
    }

    /// Remove `subscriber` if it is registered.
    pub fn unsubscribe<S>(&self, subscriber: &Arc<S>) -> bool
    where
        S: ?Sized,
    {
        self.remove(SubscriberId::of(subscriber))
    }

    /// Remove the registration with the given identity, if any.
    pub fn remove(&self, id: SubscriberId) -> bool {
        remove_entry(&self.entries, id)
    }

    /// Call every live subscriber with `value`, in registration order.
    ///
    /// The set is unlocked while subscribers run, so they may subscribe or
    /// unsubscribe from inside the callback. Such changes take effect from
    /// the next notification.
    pub fn notify(&self, value: &T) -> usize {
        let live: Vec<Arc<dyn Subscriber<T>>> = {
            let mut entries = self.entries.lock();
            entries.retain(|entry| entry.sink.strong_count() > 0);
            entries
                .iter()
                .filter_map(|entry| entry.sink.upgrade())
                .collect()
        };

        for subscriber in &live {
            subscriber.handle_change(value);
        }
        live.len()
    }

    /// Number of registered subscribers that are still alive.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|entry| entry.sink.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn remove_entry<T>(entries: &Entries<T>, id: SubscriberId) -> bool {
    let mut entries = entries.lock();
    match entries.iter().position(|entry| entry.id == id) {
        Some(index) => {
            entries.remove(index);
            true
        }
        None => false,
    }
}

fn remove_sink<T>(entries: &Entries<T>, sink: &Weak<dyn Subscriber<T>>) -> bool {
    let mut entries = entries.lock();
    match entries
        .iter()
        .position(|entry| Weak::ptr_eq(&entry.sink, sink))
    {
        Some(index) => {
            entries.remove(index);
            true
        }
        None => false,
    }
}

impl<T: 'static> Default for SubscriberSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> fmt::Debug for SubscriberSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberSet")
            .field("len", &self.len())
            .finish()
    }
}

/// Capability that removes one registration.
///
/// Invoking it more than once, or after the publisher is gone, does nothing.
/// Dropping it does *not* unsubscribe; keep it and call
/// [`unsubscribe`](Unsubscribe::unsubscribe) when the subscriber goes away.
#[must_use = "dropping an Unsubscribe leaves the subscriber registered"]
pub struct Unsubscribe {
    action: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Unsubscribe {
    pub(crate) fn new<F>(action: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        Self {
            action: Some(Box::new(action)),
        }
    }

    /// An unsubscribe that does nothing.
    pub fn inert() -> Self {
        Self { action: None }
    }

    /// Whether calling [`unsubscribe`](Unsubscribe::unsubscribe) can still
    /// have an effect.
    pub fn is_inert(&self) -> bool {
        self.action.is_none()
    }

    /// Remove the registration this capability was issued for.
    pub fn unsubscribe(&mut self) {
        if let Some(action) = self.action.take() {
            action();
        }
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("inert", &self.is_inert())
            .finish()
    }
}
