//! Common types shared by the sampler crates.
//!
//! This crate contains the vocabulary every other crate speaks: the [`EventKind`] of a kernel
//! event, the Kokkos encoding of device identifiers in [`DeviceId`], and the raw function pointer
//! types of the Kokkos Tools callback interface in [`abi`].
#![warn(missing_docs)]

pub mod abi;
mod device;
mod kind;

pub use crate::device::*;
pub use crate::kind::*;
