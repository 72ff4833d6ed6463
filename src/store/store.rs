use super::config::{StoreBuilder, DEFAULT_WORKER_NAME};
use super::reducer::{Dispatch, Reducer};
use super::worker::{ActionQueue, Worker};
use crate::error::DispatchError;
use crate::subscriber::{Source, Subscriber, SubscriberSet, Unsubscribe};
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use std::any::Any;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

/// Bookkeeping for the thread that currently holds a store's turn.
struct Turn<A> {
    notifying: bool,
    // Actions dispatched by subscribers while a notification pass runs.
    deferred: VecDeque<A>,
}

/// Restores `Turn::notifying` when a notification pass ends.
struct Notifying<'a, A> {
    turn: &'a RefCell<Turn<A>>,
    previous: bool,
}

impl<'a, A> Notifying<'a, A> {
    fn enter(turn: &'a RefCell<Turn<A>>) -> Self {
        let previous = std::mem::replace(&mut turn.borrow_mut().notifying, true);
        Self { turn, previous }
    }
}

impl<A> Drop for Notifying<'_, A> {
    fn drop(&mut self) {
        let mut turn = self.turn.borrow_mut();
        turn.notifying = self.previous;
        if std::thread::panicking() && !self.previous {
            turn.deferred.clear();
        }
    }
}

/// State, reducer and subscribers; shared with the async worker.
struct Core<S, A> {
    state: RwLock<S>,
    reducer: Box<dyn Reducer<S, A>>,
    // Serializes commit-then-notify so subscribers see changes in commit
    // order. Re-entrant so a subscriber may dispatch into the same store;
    // such dispatches are deferred until the running pass has finished.
    turn: ReentrantMutex<RefCell<Turn<A>>>,
    subscribers: SubscriberSet<S>,
}

impl<S, A> Core<S, A>
where
    S: Clone + PartialEq + Send + Sync + 'static,
    A: Send + 'static,
{
    fn new(initial: S, reducer: Box<dyn Reducer<S, A>>) -> Self {
        Self {
            state: RwLock::new(initial),
            reducer,
            turn: ReentrantMutex::new(RefCell::new(Turn {
                notifying: false,
                deferred: VecDeque::new(),
            })),
            subscribers: SubscriberSet::new(),
        }
    }

    fn apply(&self, action: A) {
        let turn = self.turn.lock();

        if turn.borrow().notifying {
            trace!("deferring action dispatched during notification");
            turn.borrow_mut().deferred.push_back(action);
            return;
        }

        self.commit(&turn, action);
        self.drain(&turn);
    }

    fn commit(&self, turn: &RefCell<Turn<A>>, action: A) {
        let next = {
            let mut state = self.state.write();
            let next = self.reducer.reduce(&state, action);
            if next == *state {
                trace!("action left state unchanged");
                return;
            }
            *state = next.clone();
            next
        };

        // The state lock is released: subscribers may read the store.
        let _notifying = Notifying::enter(turn);
        let notified = self.subscribers.notify(&next);
        trace!(notified, "state changed");
    }

    fn drain(&self, turn: &RefCell<Turn<A>>) {
        loop {
            let deferred = turn.borrow_mut().deferred.pop_front();
            match deferred {
                Some(action) => self.commit(turn, action),
                None => break,
            }
        }
    }

    fn attach(&self, sink: Weak<dyn Subscriber<S>>) -> Unsubscribe {
        let turn = self.turn.lock();

        let unsubscribe = self.subscribers.subscribe_weak(sink.clone());
        if !unsubscribe.is_inert() {
            if let Some(sink) = sink.upgrade() {
                let snapshot = self.state.read().clone();
                let outermost = !turn.borrow().notifying;
                {
                    let _notifying = Notifying::enter(&*turn);
                    sink.handle_change(&snapshot);
                }
                if outermost {
                    self.drain(&turn);
                }
            }
        }
        unsubscribe
    }
}

struct StoreInner<S, A> {
    core: Arc<Core<S, A>>,
    queue: Arc<ActionQueue<A>>,
    worker: Mutex<Option<Worker>>,
    worker_name: String,
}

impl<S, A> StoreInner<S, A>
where
    S: Clone + PartialEq + Send + Sync + 'static,
    A: Send + 'static,
{
    fn ensure_worker(&self) -> Result<(), DispatchError> {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            return Ok(());
        }
        if self.queue.is_closed() {
            return Err(DispatchError::ShutDown);
        }

        debug!(name = %self.worker_name, "spawning dispatch worker");
        let core = Arc::clone(&self.core);
        *worker = Some(Worker::spawn(
            self.worker_name.clone(),
            Arc::clone(&self.queue),
            move |action| core.apply(action),
        )?);
        Ok(())
    }
}

impl<S, A> StoreInner<S, A> {
    fn shutdown(&self) {
        if self.queue.close() {
            debug!("store shutting down");
        }
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            worker.join();
        }
    }
}

impl<S, A> Drop for StoreInner<S, A> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// A thread-safe store whose state only changes through its reducer.
///
/// `Store` is a cheap handle: clones share the same state, subscribers and
/// worker. The worker is stopped when the last handle, or the last lens
/// attached to the store, is dropped.
///
/// Subscribers are notified after the state lock is released, once per
/// change, in the order the changes were committed. Dispatches that leave
/// the state equal to what it was are not observable.
///
/// ```
/// use flowstate::Store;
///
/// #[derive(Clone, Copy)]
/// enum Action {
///     Increment,
///     Reset,
/// }
///
/// let store = Store::new(0, |count: &i32, action: Action| match action {
///     Action::Increment => count + 1,
///     Action::Reset => 0,
/// });
///
/// store.dispatch(Action::Increment);
/// store.dispatch(Action::Increment);
/// assert_eq!(store.state(), 2);
///
/// store.dispatch(Action::Reset);
/// assert_eq!(store.state(), 0);
/// ```
pub struct Store<S, A> {
    inner: Arc<StoreInner<S, A>>,
}

impl<S, A> Store<S, A>
where
    S: Clone + PartialEq + Send + Sync + 'static,
    A: Send + 'static,
{
    /// Create a store with an initial state and its reducer.
    pub fn new<R>(initial: S, reducer: R) -> Self
    where
        R: Reducer<S, A>,
    {
        Self::from_parts(initial, Box::new(reducer), DEFAULT_WORKER_NAME.to_string(), None)
    }

    /// Create a store starting from `S::default()`.
    pub fn with_default<R>(reducer: R) -> Self
    where
        S: Default,
        R: Reducer<S, A>,
    {
        Self::new(S::default(), reducer)
    }

    /// Configure a store before building it.
    pub fn builder<R>(initial: S, reducer: R) -> StoreBuilder<S, A>
    where
        R: Reducer<S, A>,
    {
        StoreBuilder::new(initial, reducer)
    }

    pub(crate) fn from_parts(
        initial: S,
        reducer: Box<dyn Reducer<S, A>>,
        worker_name: String,
        queue_capacity: Option<usize>,
    ) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                core: Arc::new(Core::new(initial, reducer)),
                queue: Arc::new(ActionQueue::new(queue_capacity)),
                worker: Mutex::new(None),
                worker_name,
            }),
        }
    }

    /// Apply `action` now and notify subscribers if the state changed.
    ///
    /// A panic in the reducer propagates to the caller and leaves the state
    /// untouched.
    ///
    /// Called from a subscriber while the store is notifying, the action is
    /// queued and applied once every subscriber has seen the current change,
    /// before the outermost `dispatch` returns.
    pub fn dispatch(&self, action: A) {
        self.inner.core.apply(action);
    }

    /// Queue `action` for the background worker and return immediately.
    ///
    /// Actions queued from one thread are applied in the order they were
    /// queued. The worker is started on the first call. Notifications for
    /// these actions arrive on the worker thread.
    pub fn dispatch_async(&self, action: A) -> Result<(), DispatchError> {
        self.inner.ensure_worker()?;
        self.inner.queue.push(action)
    }

    /// Get a clone of the current state.
    pub fn state(&self) -> S {
        self.inner.core.state.read().clone()
    }

    /// Read state without cloning it.
    ///
    /// Dispatching from inside `f` deadlocks.
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&S) -> R,
    {
        let state = self.inner.core.state.read();
        f(&state)
    }

    /// Subscribe to state changes.
    ///
    /// The store only holds a weak reference; keep `subscriber` alive for as
    /// long as it should be notified. Subscribing the same subscriber twice
    /// returns an inert [`Unsubscribe`].
    pub fn subscribe<T>(&self, subscriber: &Arc<T>) -> Unsubscribe
    where
        T: Subscriber<S> + 'static,
    {
        self.inner.core.subscribers.subscribe(subscriber)
    }

    pub fn subscribe_weak(&self, subscriber: Weak<dyn Subscriber<S>>) -> Unsubscribe {
        self.inner.core.subscribers.subscribe_weak(subscriber)
    }

    /// Remove `subscriber`. Does nothing if it is not registered.
    pub fn unsubscribe<T>(&self, subscriber: &Arc<T>)
    where
        T: ?Sized,
    {
        self.inner.core.subscribers.unsubscribe(subscriber);
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.core.subscribers.len()
    }

    /// Number of async actions waiting for the worker.
    pub fn pending_actions(&self) -> usize {
        self.inner.queue.len()
    }

    /// Stop the async worker.
    ///
    /// The action being applied, if any, completes; actions still queued are
    /// dropped. Later `dispatch_async` calls fail with
    /// [`DispatchError::ShutDown`]. Synchronous `dispatch` keeps working.
    ///
    /// Blocks until the worker has stopped, so it must not be called from a
    /// subscriber of a synchronous dispatch.
    pub fn shutdown(&self) {
        self.inner.shutdown();
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.queue.is_closed()
    }
}

impl<S, A> Clone for Store<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, A> Dispatch<A> for Store<S, A>
where
    S: Clone + PartialEq + Send + Sync + 'static,
    A: Send + 'static,
{
    fn dispatch(&self, action: A) {
        Store::dispatch(self, action);
    }

    fn dispatch_async(&self, action: A) -> Result<(), DispatchError> {
        Store::dispatch_async(self, action)
    }
}

impl<S, A> Source<S> for Store<S, A>
where
    S: Clone + PartialEq + Send + Sync + 'static,
    A: Send + 'static,
{
    fn current(&self) -> S {
        self.state()
    }

    fn attach(&self, sink: Weak<dyn Subscriber<S>>) -> Unsubscribe {
        self.inner.core.attach(sink)
    }

    fn keep_alive(&self) -> Arc<dyn Any + Send + Sync> {
        Arc::clone(&self.inner) as Arc<dyn Any + Send + Sync>
    }
}

impl<S, A> fmt::Debug for Store<S, A>
where
    S: fmt::Debug + Clone + PartialEq + Send + Sync + 'static,
    A: Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &*self.inner.core.state.read())
            .field("subscribers", &self.subscriber_count())
            .field("pending_actions", &self.pending_actions())
            .finish()
    }
}
