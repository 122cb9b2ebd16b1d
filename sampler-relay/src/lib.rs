//! The sampling relay between the host runtime and the next tool of the chain.
//!
//! A [`Relay`] receives every kernel event of the host. For each begin-event it assigns an
//! identifier, asks its [`Sampler`](sampler_sampling::Sampler) whether to forward the event, and
//! if so forwards it to the [`Downstream`](sampler_chain::Downstream) tool. The matching end-event
//! is only forwarded if its begin-event was.
//!
//! When global fences are enabled, every forwarded begin-event and end-event is preceded by a fence
//! through the [`FenceCoordinator`], which holds the fence function provided by the host.
#![warn(missing_docs)]

mod error;
mod fence;
mod relay;

pub use crate::error::*;
pub use crate::fence::*;
pub use crate::relay::*;
