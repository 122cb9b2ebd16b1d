use std::env;
use std::fmt::{self, Write as _};
use std::io;
use std::str::FromStr;

use tracing::level_filters::LevelFilter;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

include!(concat!(env!("OUT_DIR"), "/constants.gen.rs"));

/// Prefix of every line in the simplified format.
const LINE_PREFIX: &str = "KokkosP: ";

/// Controls the log format.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum LogFormat {
    /// Auto detect the best format.
    ///
    /// This chooses [`LogFormat::Pretty`] for TTY, otherwise [`LogFormat::Simplified`].
    #[default]
    Auto,

    /// Pretty printing with colors.
    ///
    /// ```text
    ///  INFO sampler_relay: sample 51 calling child-begin function...
    /// ```
    Pretty,

    /// Simplified plain text output in the style of Kokkos tools.
    ///
    /// ```text
    /// KokkosP: sample 51 calling child-begin function...
    /// ```
    Simplified,

    /// Dump out JSON lines.
    ///
    /// ```text
    /// {"timestamp":"2024-03-04T12:11:08.729716Z","level":"INFO","message":"sample 51 calling child-begin function...","target":"sampler_relay"}
    /// ```
    Json,
}

impl LogFormat {
    /// Returns the configuration name of this format.
    pub const fn name(self) -> &'static str {
        match self {
            LogFormat::Auto => "auto",
            LogFormat::Pretty => "pretty",
            LogFormat::Simplified => "simplified",
            LogFormat::Json => "json",
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An error used when parsing [`LogFormat`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseLogFormatError(String);

impl fmt::Display for ParseLogFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid log format '{}', expected auto, pretty, simplified or json",
            self.0
        )
    }
}

impl std::error::Error for ParseLogFormatError {}

impl FromStr for LogFormat {
    type Err = ParseLogFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "auto" => LogFormat::Auto,
            "pretty" => LogFormat::Pretty,
            "simplified" => LogFormat::Simplified,
            "json" => LogFormat::Json,
            _ => return Err(ParseLogFormatError(s.to_owned())),
        })
    }
}

/// Controls the logging system.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LogConfig {
    /// The log level for the sampler crates.
    pub level: LevelFilter,

    /// Controls the log output format.
    ///
    /// Defaults to [`LogFormat::Auto`], which detects the best format based on the TTY.
    pub format: LogFormat,
}

impl LogConfig {
    /// Maps the tool verbosity to a log level.
    ///
    /// Verbosity `0` only shows warnings, `1` adds lifecycle messages, and `2` or more adds fence
    /// diagnostics.
    pub fn from_verbosity(verbosity: u32) -> Self {
        let level = match verbosity {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            _ => LevelFilter::DEBUG,
        };

        Self {
            level,
            ..Self::default()
        }
    }

    /// Sets the output format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::WARN,
            format: LogFormat::Auto,
        }
    }
}

/// Builds the filter applied when `RUST_LOG` is not set.
fn default_filter(level: LevelFilter) -> EnvFilter {
    // Third-party crates only report warnings.
    let mut directives = String::from("warn");
    for name in CRATE_NAMES {
        directives.push_str(&format!(",{name}={level}"));
    }

    EnvFilter::new(directives)
}

/// Formats events as `KokkosP: <message>` lines.
struct SimplifiedFormat;

impl<S, N> FormatEvent<S, N> for SimplifiedFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        writer.write_str(LINE_PREFIX)?;

        match *event.metadata().level() {
            Level::ERROR => writer.write_str("FATAL: ")?,
            Level::WARN => writer.write_str("warning: ")?,
            _ => (),
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Initialize the logging system.
///
/// The filter is taken from `RUST_LOG` if set, otherwise it is derived from the configured level.
/// Calling this more than once, or in a process that already has a global subscriber, keeps the
/// existing subscriber.
///
/// # Example
///
/// ```
/// let config = sampler_log::LogConfig::from_verbosity(2);
/// sampler_log::init(&config);
/// ```
pub fn init(config: &LogConfig) {
    let filter = match env::var(EnvFilter::DEFAULT_ENV) {
        Ok(_) => EnvFilter::from_default_env(),
        Err(_) => default_filter(config.level),
    };

    let registry = tracing_subscriber::registry().with(filter);

    let result = match (config.format, console::user_attended()) {
        (LogFormat::Auto, true) | (LogFormat::Pretty, _) => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(io::stdout)
                    .without_time()
                    .with_target(true),
            )
            .try_init(),
        (LogFormat::Auto, false) | (LogFormat::Simplified, _) => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(io::stdout)
                    .with_ansi(false)
                    .event_format(SimplifiedFormat),
            )
            .try_init(),
        (LogFormat::Json, _) => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(io::stdout)
                    .json()
                    .flatten_event(true),
            )
            .try_init(),
    };

    if result.is_err() {
        tracing::debug!("global subscriber already installed, keeping it");
    }
}
