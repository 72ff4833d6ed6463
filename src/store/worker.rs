use crate::error::DispatchError;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

struct QueueState<A> {
    pending: VecDeque<A>,
    closed: bool,
    worker_died: bool,
}

/// FIFO of actions waiting for the background worker.
pub(crate) struct ActionQueue<A> {
    state: Mutex<QueueState<A>>,
    ready: Condvar,
    capacity: Option<usize>,
}

impl<A> ActionQueue<A> {
    pub(crate) fn new(capacity: Option<usize>) -> Self {
        Self {
            state: Mutex::new(QueueState {
                pending: VecDeque::new(),
                closed: false,
                worker_died: false,
            }),
            ready: Condvar::new(),
            capacity,
        }
    }

    pub(crate) fn push(&self, action: A) -> Result<(), DispatchError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(DispatchError::ShutDown);
        }
        if state.worker_died {
            return Err(DispatchError::WorkerGone);
        }
        if let Some(capacity) = self.capacity {
            if state.pending.len() >= capacity {
                return Err(DispatchError::QueueFull { capacity });
            }
        }
        state.pending.push_back(action);
        drop(state);

        self.ready.notify_one();
        Ok(())
    }

    /// Stop accepting actions and wake the worker. Returns `false` if the
    /// queue was already closed.
    pub(crate) fn close(&self) -> bool {
        let mut state = self.state.lock();
        if state.closed {
            return false;
        }
        state.closed = true;
        drop(state);

        self.ready.notify_all();
        true
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub(crate) fn len(&self) -> usize {
        self.state.lock().pending.len()
    }

    // Oldest first. Only waits once the queue has been drained.
    fn next(&self) -> Option<A> {
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return None;
            }
            if let Some(action) = state.pending.pop_front() {
                return Some(action);
            }
            self.ready.wait(&mut state);
        }
    }

    fn discard_pending(&self) -> usize {
        let pending = std::mem::take(&mut self.state.lock().pending);
        pending.len()
    }

    fn mark_died(&self) {
        self.state.lock().worker_died = true;
    }
}

/// Handle to the thread that drains an [`ActionQueue`].
pub(crate) struct Worker {
    handle: JoinHandle<()>,
}

impl Worker {
    pub(crate) fn spawn<A, F>(
        name: String,
        queue: Arc<ActionQueue<A>>,
        apply: F,
    ) -> Result<Self, DispatchError>
    where
        A: Send + 'static,
        F: Fn(A) + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name(name)
            .spawn(move || run(&*queue, apply))?;
        Ok(Self { handle })
    }

    /// Wait for the worker to finish the action it is applying.
    ///
    /// When called from the worker itself (the last store handle was dropped
    /// inside a callback) the thread is detached instead; it exits as soon as
    /// the current action returns.
    pub(crate) fn join(self) {
        if self.handle.thread().id() == thread::current().id() {
            debug!("dispatch worker released from its own thread, detaching");
            return;
        }
        if self.handle.join().is_err() {
            warn!("dispatch worker exited with a panic");
        }
    }
}

fn run<A, F>(queue: &ActionQueue<A>, apply: F)
where
    F: Fn(A),
{
    let _watch = DeathWatch(queue);
    debug!("dispatch worker started");

    while let Some(action) = queue.next() {
        apply(action);
    }

    let discarded = queue.discard_pending();
    debug!(discarded, "dispatch worker stopped");
}

struct DeathWatch<'a, A>(&'a ActionQueue<A>);

impl<A> Drop for DeathWatch<'_, A> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.mark_died();
        }
    }
}
