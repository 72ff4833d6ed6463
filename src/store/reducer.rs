use crate::error::DispatchError;

/// Pure transition from the current state and an action to the next state.
///
/// Every closure `Fn(&S, A) -> S + Send + Sync` is a reducer. A reducer must
/// not dispatch into the store that owns it: it runs while that store's state
/// lock is held.
pub trait Reducer<S, A>: Send + Sync + 'static {
    fn reduce(&self, state: &S, action: A) -> S;
}

impl<S, A, F> Reducer<S, A> for F
where
    F: Fn(&S, A) -> S + Send + Sync + 'static,
{
    fn reduce(&self, state: &S, action: A) -> S {
        self(state, action)
    }
}

/// Something actions can be sent to.
///
/// Hands a view the ability to dispatch without exposing the state type.
pub trait Dispatch<A> {
    /// Apply `action` before returning.
    fn dispatch(&self, action: A);

    /// Queue `action` for the background worker.
    fn dispatch_async(&self, action: A) -> Result<(), DispatchError>;
}
