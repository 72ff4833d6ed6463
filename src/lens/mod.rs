//! Memoized projections of a source's value.
//!
//! A [`Lens`] caches `transform(state)` and refreshes it whenever its source
//! publishes a change. A [`RelayLens`] also republishes its own changes, so
//! further lenses and subscribers can hang off it.
//!
//! Lenses are refreshed synchronously inside the source's notification, on
//! whichever thread dispatched. A slow transform delays every other
//! subscriber of that source.

mod lens;
mod relay;

pub use lens::Lens;
pub use relay::RelayLens;
