//! Configuration of the sampler tool.
//!
//! The host runtime loads the tool as a shared library and passes no arguments, so all
//! configuration comes from environment variables. [`Config::from_env`] reads them through the
//! [`Environment`] abstraction, which is implemented for the process environment and for maps in
//! tests.
//!
//! Reading the configuration never fails. Values that cannot be used are collected as
//! [`ConfigError`] warnings, since the logger can only be set up after the verbosity is known.
#![warn(missing_docs)]

mod config;
mod env;

pub use crate::config::*;
pub use crate::env::*;
