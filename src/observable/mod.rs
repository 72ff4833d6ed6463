//! A standalone observable value.
//!
//! [`Observable`] shares the store's notify-on-change contract but has no
//! reducer and no worker: whoever owns it sets the value directly.

mod observable;

pub use observable::Observable;
