//! Notification sinks and the registries that hold them.
//!
//! Stores, relay lenses and observables all publish through a
//! [`SubscriberSet`]. Registrations are weak: a set never keeps a subscriber
//! alive, and identity is the address of the subscriber's allocation.

mod set;
mod source;
mod subscriber;

pub use set::{SubscriberId, SubscriberSet, Unsubscribe};
pub use source::Source;
pub use subscriber::Subscriber;
