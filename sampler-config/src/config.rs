use std::str::FromStr;

use sampler_log::{LogConfig, LogFormat};
use thiserror::Error;

use crate::env::{self, Environment};

/// A problem with a configuration value.
///
/// None of these are fatal. The offending value is replaced as documented on each variant, and the
/// error is reported as a warning once logging is set up.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    /// The value could not be parsed and is treated as unset.
    #[error("ignoring invalid value '{value}' of {key}: {reason}")]
    InvalidValue {
        /// The environment variable.
        key: &'static str,
        /// The raw value.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A negative skip rate was configured and is treated as `0`.
    #[error("{key} is negative ({value}), sampling every invocation")]
    NegativeSkip {
        /// The environment variable.
        key: &'static str,
        /// The configured value.
        value: i64,
    },

    /// The chain list was taken from a deprecated variable.
    #[error("{deprecated} is a deprecated variable, please use {replacement}")]
    Deprecated {
        /// The variable that was read.
        deprecated: &'static str,
        /// The variable that should be used instead.
        replacement: &'static str,
    },
}

/// The list of tool libraries as read from the environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolsLibs {
    /// The variable that provided the list.
    pub key: &'static str,
    /// The raw, unsplit list.
    pub value: String,
}

/// Configuration of the sampler tool.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// The chain of tool libraries, if configured.
    pub tools_libs: Option<ToolsLibs>,
    /// Verbosity: `0` is silent, `1` logs the lifecycle, `2` also logs fences.
    pub verbosity: u32,
    /// Whether to fence before forwarding sampled begin and end events.
    pub global_fences: bool,
    /// Number of invocations to suppress between two sampled invocations.
    pub skip: Option<u64>,
    /// Sampling probability in percent, not yet clamped.
    pub probability: Option<f64>,
    /// Seed of the random number generator.
    pub seed: Option<u64>,
    /// Output format of the log.
    pub log_format: LogFormat,
    /// Problems found while reading the configuration.
    pub warnings: Vec<ConfigError>,
}

impl Config {
    /// Reads the configuration from the given environment.
    ///
    /// Invalid values are skipped and recorded in [`warnings`](Self::warnings).
    pub fn from_env<E: Environment>(environment: E) -> Self {
        let mut reader = Reader {
            environment,
            warnings: Vec::new(),
        };

        let tools_libs = reader.tools_libs();
        let verbosity = reader.parse::<u32>(env::SAMPLER_VERBOSE).unwrap_or(0);
        let global_fences = reader.flag(env::GLOBAL_FENCES);
        let skip = reader.skip(env::SAMPLER_SKIP);
        let probability = reader.probability(env::SAMPLER_PROB);
        let seed = reader.parse::<u64>(env::RANDOM_SEED);
        let log_format = reader
            .parse::<LogFormat>(env::SAMPLER_LOG_FORMAT)
            .unwrap_or_default();

        Self {
            tools_libs,
            verbosity,
            global_fences,
            skip,
            probability,
            seed,
            log_format,
            warnings: reader.warnings,
        }
    }

    /// Returns the logging configuration for the configured verbosity and format.
    pub fn log_config(&self) -> LogConfig {
        LogConfig::from_verbosity(self.verbosity).with_format(self.log_format)
    }

    /// Logs all [`warnings`](Self::warnings).
    pub fn log_warnings(&self) {
        for warning in &self.warnings {
            sampler_log::warn!("{warning}");
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tools_libs: None,
            verbosity: 0,
            global_fences: false,
            skip: None,
            probability: None,
            seed: None,
            log_format: LogFormat::default(),
            warnings: Vec::new(),
        }
    }
}

struct Reader<E> {
    environment: E,
    warnings: Vec<ConfigError>,
}

impl<E: Environment> Reader<E> {
    /// Returns the trimmed value, treating empty values as unset.
    fn raw(&self, key: &str) -> Option<String> {
        let value = self.environment.var(key)?;
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_owned())
    }

    fn parse<T>(&mut self, key: &'static str) -> Option<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let value = self.raw(key)?;
        match value.parse() {
            Ok(parsed) => Some(parsed),
            Err(error) => {
                self.warnings.push(ConfigError::InvalidValue {
                    key,
                    value,
                    reason: error.to_string(),
                });
                None
            }
        }
    }

    fn flag(&mut self, key: &'static str) -> bool {
        let Some(value) = self.raw(key) else {
            return false;
        };

        match value.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" => return true,
            "false" | "no" | "off" => return false,
            _ => (),
        }

        match value.parse::<i64>() {
            Ok(number) => number != 0,
            Err(error) => {
                self.warnings.push(ConfigError::InvalidValue {
                    key,
                    value,
                    reason: error.to_string(),
                });
                false
            }
        }
    }

    fn skip(&mut self, key: &'static str) -> Option<u64> {
        let value = self.parse::<i64>(key)?;
        match u64::try_from(value) {
            Ok(skip) => Some(skip),
            Err(_) => {
                self.warnings.push(ConfigError::NegativeSkip { key, value });
                Some(0)
            }
        }
    }

    fn probability(&mut self, key: &'static str) -> Option<f64> {
        let probability = self.parse::<f64>(key)?;
        if probability.is_nan() {
            self.warnings.push(ConfigError::InvalidValue {
                key,
                value: probability.to_string(),
                reason: "not a number".to_owned(),
            });
            return None;
        }

        Some(probability)
    }

    fn tools_libs(&mut self) -> Option<ToolsLibs> {
        if let Some(value) = self.raw(env::TOOLS_LIBS) {
            return Some(ToolsLibs {
                key: env::TOOLS_LIBS,
                value,
            });
        }

        let value = self.raw(env::PROFILE_LIBRARY)?;
        self.warnings.push(ConfigError::Deprecated {
            deprecated: env::PROFILE_LIBRARY,
            replacement: env::TOOLS_LIBS,
        });

        Some(ToolsLibs {
            key: env::PROFILE_LIBRARY,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use similar_asserts::assert_eq;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Config {
        let environment: BTreeMap<&str, &str> = vars.iter().copied().collect();
        Config::from_env(environment)
    }

    #[test]
    fn test_empty_environment() {
        assert_eq!(config(&[]), Config::default());
    }

    #[test]
    fn test_full_environment() {
        let config = config(&[
            ("KOKKOS_TOOLS_LIBS", "libsampler.so;libkernel-logger.so"),
            ("KOKKOS_TOOLS_SAMPLER_VERBOSE", "2"),
            ("KOKKOS_TOOLS_GLOBALFENCES", "1"),
            ("KOKKOS_TOOLS_SAMPLER_SKIP", "50"),
            ("KOKKOS_TOOLS_SAMPLER_PROB", "12.5"),
            ("KOKKOS_TOOLS_RANDOM_SEED", "1234"),
            ("KOKKOS_TOOLS_SAMPLER_LOG_FORMAT", "json"),
        ]);

        assert_eq!(
            config.tools_libs,
            Some(ToolsLibs {
                key: "KOKKOS_TOOLS_LIBS",
                value: "libsampler.so;libkernel-logger.so".to_owned(),
            })
        );
        assert_eq!(config.verbosity, 2);
        assert!(config.global_fences);
        assert_eq!(config.skip, Some(50));
        assert_eq!(config.probability, Some(12.5));
        assert_eq!(config.seed, Some(1234));
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.warnings.is_empty());
    }

    #[test]
    fn test_deprecated_profile_library() {
        let config = config(&[("KOKKOS_PROFILE_LIBRARY", "libsampler.so;liblogger.so")]);

        assert_eq!(
            config.tools_libs.map(|libs| libs.key),
            Some("KOKKOS_PROFILE_LIBRARY")
        );
        insta::assert_snapshot!(
            config.warnings[0].to_string(),
            @"KOKKOS_PROFILE_LIBRARY is a deprecated variable, please use KOKKOS_TOOLS_LIBS"
        );
    }

    #[test]
    fn test_tools_libs_preferred() {
        let config = config(&[
            ("KOKKOS_TOOLS_LIBS", "a.so;b.so"),
            ("KOKKOS_PROFILE_LIBRARY", "c.so;d.so"),
        ]);

        assert_eq!(config.tools_libs.unwrap().value, "a.so;b.so");
        assert!(config.warnings.is_empty());
    }

    #[test]
    fn test_invalid_values_are_unset() {
        let config = config(&[
            ("KOKKOS_TOOLS_SAMPLER_VERBOSE", "loud"),
            ("KOKKOS_TOOLS_SAMPLER_PROB", "ten"),
            ("KOKKOS_TOOLS_RANDOM_SEED", "-3"),
        ]);

        assert_eq!(config.verbosity, 0);
        assert_eq!(config.probability, None);
        assert_eq!(config.seed, None);
        assert_eq!(config.warnings.len(), 3);
        insta::assert_snapshot!(
            config.warnings[0].to_string(),
            @"ignoring invalid value 'loud' of KOKKOS_TOOLS_SAMPLER_VERBOSE: invalid digit found in string"
        );
    }

    #[test]
    fn test_negative_skip_is_clamped() {
        let config = config(&[("KOKKOS_TOOLS_SAMPLER_SKIP", "-4")]);

        assert_eq!(config.skip, Some(0));
        insta::assert_snapshot!(
            config.warnings[0].to_string(),
            @"KOKKOS_TOOLS_SAMPLER_SKIP is negative (-4), sampling every invocation"
        );
    }

    #[test]
    fn test_out_of_range_probability_is_kept() {
        // Clamping is left to the sampling policy, which warns about it.
        let config = config(&[("KOKKOS_TOOLS_SAMPLER_PROB", "250")]);
        assert_eq!(config.probability, Some(250.0));
        assert!(config.warnings.is_empty());
    }

    #[test]
    fn test_empty_values_are_unset() {
        let config = config(&[
            ("KOKKOS_TOOLS_LIBS", "  "),
            ("KOKKOS_TOOLS_SAMPLER_SKIP", ""),
        ]);

        assert_eq!(config.tools_libs, None);
        assert_eq!(config.skip, None);
        assert!(config.warnings.is_empty());
    }

    #[test]
    fn test_fence_flag_spellings() {
        assert!(config(&[("KOKKOS_TOOLS_GLOBALFENCES", "true")]).global_fences);
        assert!(config(&[("KOKKOS_TOOLS_GLOBALFENCES", "2")]).global_fences);
        assert!(!config(&[("KOKKOS_TOOLS_GLOBALFENCES", "0")]).global_fences);
        assert!(!config(&[("KOKKOS_TOOLS_GLOBALFENCES", "off")]).global_fences);

        let invalid = config(&[("KOKKOS_TOOLS_GLOBALFENCES", "sometimes")]);
        assert!(!invalid.global_fences);
        assert_eq!(invalid.warnings.len(), 1);
    }
}
