//! Kokkos tools library exporting the sampler's callbacks.
//!
//! Build this crate and list the resulting `libkp_sampler.so` in `KOKKOS_TOOLS_LIBS`, followed by
//! the tool that should receive the sampled kernels:
//!
//! ```text
//! export KOKKOS_TOOLS_LIBS="libkp_sampler.so;libkp_kernel_timer.so"
//! export KOKKOS_TOOLS_SAMPLER_SKIP=50
//! ```
//!
//! The host calls the exported `kokkosp_*` functions. All of them are wrapped in
//! [`sampler_ffi::run`], so errors terminate the process with a diagnostic instead of unwinding
//! into the host.
#![allow(clippy::missing_safety_doc)]

mod core;
mod events;
mod interface;
#[cfg(test)]
mod testutils;

pub use crate::core::*;
pub use crate::events::*;
pub use crate::interface::*;
