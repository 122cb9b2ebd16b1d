//! Logging facade for the sampler tool.
//!
//! # Setup
//!
//! To enable logging, invoke the [`init`] function with a [`LogConfig`]. The tool derives the
//! configuration from its verbosity setting:
//!
//! ```
//! # #[cfg(feature = "init")] {
//! let config = sampler_log::LogConfig::from_verbosity(1);
//! sampler_log::init(&config);
//! # }
//! ```
//!
//! Initialization never fails. If another tool in the same process already installed a global
//! subscriber, that subscriber stays in place and receives our events.
//!
//! # Logging
//!
//! Use the five logging macros re-exported from `tracing`: [`error!`], [`warn!`], [`info!`],
//! [`debug!`] and [`trace!`].
//!
//! ## Conventions
//!
//! Log messages should start lowercase and end without punctuation, except for the per-sample
//! lifecycle lines, which keep the wording of Kokkos tools output. Choose the log level according
//! to the verbosity at which the message should appear:
//!
//! - [`error!`] for conditions that terminate the process.
//! - [`warn!`] for sanitized input and deprecations. Always shown.
//! - [`info!`] for lifecycle messages and per-sample forwarding. Shown from verbosity 1.
//! - [`debug!`] for fences and raw configuration inputs. Shown from verbosity 2.
//! - [`trace!`] for full auxiliary information, such as suppressed events.
//!
//! # Testing
//!
//! For unit testing, there is a separate initialization macro [`init_test!`] that should be called
//! at the beginning of test method. It enables test mode of the logger and customizes log levels
//! for the current crate.
//!
//! ```
//! # #[cfg(feature = "test")] {
//! sampler_log::init_test!();
//! # }
//! ```

#![warn(missing_docs)]

#[cfg(feature = "init")]
mod setup;
#[cfg(feature = "init")]
pub use setup::*;

#[cfg(feature = "test")]
mod test;
#[cfg(feature = "test")]
pub use test::*;

mod utils;
pub use utils::*;

// Expose the minimal log facade.
#[doc(inline)]
pub use tracing::{Level, debug, enabled, error, info, trace, warn};
