use crate::subscriber::{Source, Subscriber, Unsubscribe};
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

type Transform<S, V> = Box<dyn Fn(&S) -> V + Send + Sync>;

/// Cached result of a transform.
pub(crate) struct Projection<S, V> {
    cached: RwLock<V>,
    transform: Transform<S, V>,
}

impl<S, V> Projection<S, V>
where
    V: Clone + PartialEq,
{
    pub(crate) fn new<F>(source: &S, transform: F) -> Self
    where
        F: Fn(&S) -> V + Send + Sync + 'static,
    {
        Self {
            cached: RwLock::new(transform(source)),
            transform: Box::new(transform),
        }
    }

    /// Recompute from `state`. Returns the new value only if it differs
    /// from the cached one.
    pub(crate) fn refresh(&self, state: &S) -> Option<V> {
        let result = (self.transform)(state);
        let mut cached = self.cached.write();
        if *cached == result {
            return None;
        }
        *cached = result.clone();
        Some(result)
    }

    pub(crate) fn get(&self) -> V {
        self.cached.read().clone()
    }

    pub(crate) fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&V) -> R,
    {
        let cached = self.cached.read();
        f(&cached)
    }
}

/// A lens's registration with its source, released on drop.
pub(crate) struct Registration {
    unsubscribe: Mutex<Unsubscribe>,
    _source: Arc<dyn Any + Send + Sync>,
}

impl Registration {
    pub(crate) fn new(source: Arc<dyn Any + Send + Sync>) -> Self {
        Self {
            unsubscribe: Mutex::new(Unsubscribe::inert()),
            _source: source,
        }
    }

    pub(crate) fn bind(&self, unsubscribe: Unsubscribe) {
        *self.unsubscribe.lock() = unsubscribe;
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.unsubscribe.get_mut().unsubscribe();
    }
}

struct LensInner<S, V> {
    projection: Projection<S, V>,
    registration: Registration,
}

impl<S, V> Subscriber<S> for LensInner<S, V>
where
    S: 'static,
    V: Clone + PartialEq + Send + Sync + 'static,
{
    fn handle_change(&self, state: &S) {
        self.projection.refresh(state);
    }
}

/// A read-only, memoized projection of a store's state.
///
/// The lens keeps its source alive and stays subscribed until the last
/// clone is dropped.
///
/// ```
/// use flowstate::{Lens, Store};
///
/// let store = Store::new((1, 10), |state: &(i32, i32), n: i32| (n, state.1));
/// let number = Lens::new(&store, |state: &(i32, i32)| state.0 * 100);
/// assert_eq!(number.get(), 100);
///
/// store.dispatch(2);
/// assert_eq!(number.get(), 200);
/// ```
pub struct Lens<S, V> {
    inner: Arc<LensInner<S, V>>,
}

impl<S, V> Lens<S, V>
where
    S: 'static,
    V: Clone + PartialEq + Send + Sync + 'static,
{
    /// Attach a lens to `source`.
    ///
    /// The transform runs once against the current value before this
    /// returns, so the lens is usable without any dispatch.
    pub fn new<Src, F>(source: &Src, transform: F) -> Self
    where
        Src: Source<S> + ?Sized,
        F: Fn(&S) -> V + Send + Sync + 'static,
    {
        let inner = Arc::new(LensInner {
            projection: Projection::new(&source.current(), transform),
            registration: Registration::new(source.keep_alive()),
        });

        let sink: Weak<dyn Subscriber<S>> = Arc::downgrade(&inner) as Weak<dyn Subscriber<S>>;
        inner.registration.bind(source.attach(sink));

        Self { inner }
    }

    /// Get a clone of the cached value.
    ///
    /// This reflects the last change the lens was notified of.
    pub fn get(&self) -> V {
        self.inner.projection.get()
    }

    /// Read the cached value without cloning.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&V) -> R,
    {
        self.inner.projection.with(f)
    }
}

impl<S, V> Clone for Lens<S, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, V> fmt::Debug for Lens<S, V>
where
    S: 'static,
    V: fmt::Debug + Clone + PartialEq + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with(|value| f.debug_tuple("Lens").field(value).finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Store;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Debug, PartialEq)]
    struct Profile {
        name: String,
        visits: u32,
    }

    fn profile_store() -> Store<Profile, u32> {
        Store::new(
            Profile {
                name: "ada".to_string(),
                visits: 0,
            },
            |profile: &Profile, visits: u32| Profile {
                visits,
                ..profile.clone()
            },
        )
    }

    #[test]
    fn lens_is_seeded_at_construction() {
        let store = profile_store();
        let name = Lens::new(&store, |p: &Profile| p.name.to_uppercase());
        assert_eq!(name.get(), "ADA");
    }

    #[test]
    fn lens_follows_store() {
        let store = profile_store();
        let visits = Lens::new(&store, |p: &Profile| p.visits);

        store.dispatch(3);
        assert_eq!(visits.get(), 3);
        assert!(visits.with(|v| *v == 3));
    }

    #[test]
    fn transform_runs_once_per_change() {
        let store = profile_store();
        let runs = Arc::new(AtomicUsize::new(0));
        let _parity = {
            let runs = runs.clone();
            Lens::new(&store, move |p: &Profile| {
                runs.fetch_add(1, Ordering::SeqCst);
                p.visits % 2
            })
        };
        let after_construction = runs.load(Ordering::SeqCst);

        store.dispatch(1);
        store.dispatch(1);
        store.dispatch(2);
        assert_eq!(runs.load(Ordering::SeqCst), after_construction + 2);
    }

    #[test]
    fn dropping_lens_unsubscribes() {
        let store = profile_store();
        let lens = Lens::new(&store, |p: &Profile| p.visits);
        let copy = lens.clone();
        assert_eq!(store.subscriber_count(), 1);

        drop(lens);
        assert_eq!(store.subscriber_count(), 1);
        drop(copy);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn lens_outlives_store_handles() {
        let visits = {
            let store = profile_store();
            let visits = Lens::new(&store, |p: &Profile| p.visits);
            store.dispatch(9);
            visits
        };
        assert_eq!(visits.get(), 9);
        assert_eq!(format!("{visits:?}"), "Lens(9)");
    }
}
