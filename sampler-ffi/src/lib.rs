//! Utilities for error handling at the C boundary.
//!
//! Every callback the host runtime invokes is a plain C function without a way to report errors.
//! This crate defines how the tool behaves when something goes wrong inside such a callback:
//!
//!  - Errors and panics are caught at the boundary, so that no unwinding ever crosses into the
//!    host. A panic is converted into a [`Panic`] error carrying its message and location.
//!  - The most recent panic is kept in a thread-local slot and can be taken with
//!    [`take_last_error`], similar to `errno`.
//!  - Errors that reach the boundary are fatal. [`run`] reports them as a single diagnostic line
//!    and terminates the process with a non-zero status, since a relay that keeps running after a
//!    configuration error would silently drop all telemetry.
//!
//! # Examples
//!
//! Use [`try_catch`] to observe errors and panics without terminating:
//!
//! ```
//! sampler_ffi::set_panic_hook();
//!
//! let result = sampler_ffi::try_catch(|| -> anyhow::Result<u64> {
//!     let number: u64 = "42".parse()?;
//!     Ok(number * 2)
//! });
//!
//! assert_eq!(result.ok(), Some(84));
//! ```
//!
//! Exported functions wrap their body in [`run`]:
//!
//! ```
//! #[unsafe(no_mangle)]
//! pub extern "C" fn example_parse(value: u32) -> u64 {
//!     sampler_ffi::run(|| Ok(u64::from(value) + 1))
//! }
//! ```

#![warn(missing_docs)]

use std::cell::RefCell;
use std::error::Error;
use std::fmt;
use std::panic::{self, AssertUnwindSafe, UnwindSafe};
use std::process;
use std::thread;

/// Exit status used for fatal errors.
pub const FATAL_EXIT_CODE: i32 = -1;

thread_local! {
    static LAST_ERROR: RefCell<Option<anyhow::Error>> = const { RefCell::new(None) };
}

fn set_last_error(err: anyhow::Error) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = Some(err);
    });
}

/// Takes the last error, leaving `None` in its place.
pub fn take_last_error() -> Option<anyhow::Error> {
    LAST_ERROR.with(|e| e.borrow_mut().take())
}

/// An error representing a panic carrying the message as payload.
///
/// To capture panics, register the hook using [`set_panic_hook`].
#[derive(Debug)]
pub struct Panic(String);

impl Panic {
    fn new(info: &panic::PanicHookInfo<'_>) -> Self {
        let thread = thread::current();
        let thread = thread.name().unwrap_or("unnamed");

        let message = match info.payload().downcast_ref::<&str>() {
            Some(s) => *s,
            None => match info.payload().downcast_ref::<String>() {
                Some(s) => &**s,
                None => "Box<Any>",
            },
        };

        let description = match info.location() {
            Some(location) => format!(
                "thread '{}' panicked with '{}' at {}:{}",
                thread,
                message,
                location.file(),
                location.line()
            ),
            None => format!("thread '{thread}' panicked with '{message}'"),
        };

        Self(description)
    }

    /// Returns a description containing the location and message of the panic.
    #[inline]
    pub fn description(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Panic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "panic: {}", self.description())
    }
}

impl Error for Panic {}

/// Registers a hook for capturing panics.
///
/// This function must be registered early when the tool is initialized, before any other calls
/// are made. Without the hook, a caught panic is reported without its message.
pub fn set_panic_hook() {
    panic::set_hook(Box::new(|info| set_last_error(Panic::new(info).into())));
}

/// Runs the closure and catches errors and panics.
///
/// A panic is returned as [`Panic`] error if the hook from [`set_panic_hook`] is registered.
pub fn try_catch<F, T>(f: F) -> anyhow::Result<T>
where
    F: FnOnce() -> anyhow::Result<T> + UnwindSafe,
{
    match panic::catch_unwind(f) {
        Ok(result) => result,
        Err(_) => Err(take_last_error().unwrap_or_else(|| anyhow::anyhow!("panic: unknown payload"))),
    }
}

/// Reports a fatal error and terminates the process.
///
/// The diagnostic is a single line. It goes to the logger if one is installed, otherwise to
/// `stderr`.
pub fn fatal(error: anyhow::Error) -> ! {
    sampler_log::ensure_error(&*error);
    process::exit(FATAL_EXIT_CODE)
}

/// Runs the body of an exported function.
///
/// Returns the value of the closure on success. Errors and panics are fatal, see [`fatal`]. No
/// state is observed after a failure, which is why the closure need not be unwind safe.
pub fn run<F, T>(f: F) -> T
where
    F: FnOnce() -> anyhow::Result<T>,
{
    match try_catch(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(error) => fatal(error),
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    #[test]
    fn test_try_catch_ok() {
        let result = try_catch(|| Ok(42));
        assert_eq!(result.ok(), Some(42));
    }

    #[test]
    fn test_try_catch_error() {
        let result = try_catch(|| -> anyhow::Result<u32> { Ok("invalid".parse::<u32>()?) });
        assert_eq!(
            result.map_err(|e| e.to_string()),
            Err("invalid digit found in string".to_owned())
        );
    }

    #[test]
    fn test_try_catch_panic() {
        set_panic_hook();

        let result = try_catch(|| -> anyhow::Result<()> { panic!("this is fine") });
        let message = result.unwrap_err().to_string();

        assert!(message.starts_with("panic: thread"), "{message}");
        assert!(message.contains("this is fine"), "{message}");

        // The panic was handed over, not left behind.
        assert!(take_last_error().is_none());

        let _ = panic::take_hook();
    }
}
