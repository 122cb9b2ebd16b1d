use std::error::Error;
use std::fmt;

/// Logs an error to the configured logger or `stderr` if not yet configured.
///
/// Prefer to use [`sampler_log::error`](crate::error) over this function whenever possible. This
/// function is intended for fatal conditions, which may be detected before the logger has been
/// initialized.
///
/// # Example
///
/// ```
/// if let Err(error) = std::env::var("FOO") {
///     sampler_log::ensure_error(&error);
/// }
/// ```
pub fn ensure_error<E: Error + ?Sized>(error: &E) {
    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!("{}", LogError(error));
    } else {
        #[allow(clippy::print_stderr)]
        {
            eprintln!("KokkosP: FATAL: {}", LogError(error));
        }
    }
}

/// A wrapper around an error that prints its causes on the same line.
///
/// Fatal diagnostics of the tool are single lines, so causes are joined with `: `.
///
/// # Example
///
/// ```
/// use sampler_log::LogError;
///
/// if let Err(error) = std::env::var("FOO") {
///     sampler_log::error!("env failed: {}", LogError(&error));
/// }
/// ```
pub struct LogError<'a, E: Error + ?Sized>(pub &'a E);

impl<E: Error + ?Sized> fmt::Display for LogError<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;

        let mut source = self.0.source();
        while let Some(s) = source {
            write!(f, ": {s}")?;
            source = s.source();
        }

        Ok(())
    }
}
