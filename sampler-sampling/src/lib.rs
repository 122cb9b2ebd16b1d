//! Sampling decisions for kernel events.
//!
//! The sampler tool observes every kernel launched by the host runtime but only forwards a subset
//! of them to the next tool in the chain. Which kernels are forwarded is decided per begin-event by
//! a [`Sampler`], which combines two tests:
//!
//! - **Periodic test**: every event kind keeps its own invocation counter. An invocation passes if
//!   the counter is a multiple of the sampling period. A period of `1` passes every invocation.
//! - **Probability test**: invocations that pass the periodic test draw a random number in
//!   `[0, 1)` and are forwarded if it is below the configured probability. Invocations that fail
//!   the periodic test never draw.
//!
//! The [`SamplingPolicy`] resolves the period and the probability from the configuration, applying
//! the precedence rules between the skip rate and the probability.
//!
//! Forwarded begin-events are paired with their end-events through the [`CorrespondenceTable`],
//! which maps the identifier handed to the host to the identifier returned by the next tool. Its
//! contents are the only record of which events were sampled.
#![warn(missing_docs)]

mod policy;
mod sampler;
mod table;

pub use crate::policy::*;
pub use crate::sampler::*;
pub use crate::table::*;
