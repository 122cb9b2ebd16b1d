//! Resolution of the next tool library in a chain of Kokkos tools.
//!
//! Kokkos loads the first library listed in `KOKKOS_TOOLS_LIBS` and tells it its position through
//! the load sequence of the init handshake. Each tool in the chain that wants to pass events on
//! loads the library at the next position itself. The sampler does this in three steps:
//!
//!  1. [`ChainConfig`] splits the `;`-separated list and validates the position.
//!  2. [`ChainLink::resolve`] opens the next library and looks up its callbacks into a
//!     [`ToolCallbacks`] table. Missing callbacks are not an error, the corresponding events are
//!     simply never forwarded.
//!  3. The init handshake is forwarded with the position advanced by one.
//!
//! The relay talks to the next library only through the [`Downstream`] trait, which allows tests to
//! substitute a recording implementation.
#![warn(missing_docs)]

mod chain;
mod downstream;
mod error;
mod link;

pub use crate::chain::*;
pub use crate::downstream::*;
pub use crate::error::*;
pub use crate::link::*;
