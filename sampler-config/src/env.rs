use std::collections::{BTreeMap, HashMap};

/// Chain list of tool libraries, separated by `;`.
pub const TOOLS_LIBS: &str = "KOKKOS_TOOLS_LIBS";
/// Deprecated name of [`TOOLS_LIBS`].
pub const PROFILE_LIBRARY: &str = "KOKKOS_PROFILE_LIBRARY";
/// Verbosity of the sampler.
pub const SAMPLER_VERBOSE: &str = "KOKKOS_TOOLS_SAMPLER_VERBOSE";
/// Enables tool-induced fences around sampled kernels.
pub const GLOBAL_FENCES: &str = "KOKKOS_TOOLS_GLOBALFENCES";
/// Number of suppressed invocations between two sampled invocations.
pub const SAMPLER_SKIP: &str = "KOKKOS_TOOLS_SAMPLER_SKIP";
/// Sampling probability in percent.
pub const SAMPLER_PROB: &str = "KOKKOS_TOOLS_SAMPLER_PROB";
/// Seed of the random number generator.
pub const RANDOM_SEED: &str = "KOKKOS_TOOLS_RANDOM_SEED";
/// Output format of the log.
pub const SAMPLER_LOG_FORMAT: &str = "KOKKOS_TOOLS_SAMPLER_LOG_FORMAT";

/// A source of configuration values keyed by variable name.
pub trait Environment {
    /// Returns the value of the variable, or `None` if it is not set.
    fn var(&self, key: &str) -> Option<String>;
}

/// The environment of the current process.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl<K, V> Environment for HashMap<K, V>
where
    K: std::borrow::Borrow<str> + std::hash::Hash + Eq,
    V: AsRef<str>,
{
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).map(|v| v.as_ref().to_owned())
    }
}

impl<K, V> Environment for BTreeMap<K, V>
where
    K: std::borrow::Borrow<str> + Ord,
    V: AsRef<str>,
{
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).map(|v| v.as_ref().to_owned())
    }
}

impl<E: Environment + ?Sized> Environment for &E {
    fn var(&self, key: &str) -> Option<String> {
        (**self).var(key)
    }
}
