use std::fmt;

use sampler_config::Config;
use thiserror::Error;

/// The probability used when neither a skip rate nor a probability is configured.
pub const DEFAULT_PROBABILITY: f64 = 10.0;

/// An adjustment made while resolving the [`SamplingPolicy`].
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PolicyWarning {
    /// Skip rate and probability were both set, so the skip rate is ignored.
    #[error(
        "both probability and skip rate are set, ignoring skip rate {skip} and testing every \
         invocation with probability {probability}%"
    )]
    SkipOverridden {
        /// The configured skip rate.
        skip: u64,
        /// The probability in effect.
        probability: f64,
    },

    /// The probability was outside of `[0, 100]`.
    #[error("sampling probability {requested}% is out of range, using {clamped}%")]
    ProbabilityClamped {
        /// The configured probability.
        requested: f64,
        /// The probability in effect.
        clamped: f64,
    },
}

/// The effective sampling parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SamplingPolicy {
    period: u64,
    probability: f64,
}

impl SamplingPolicy {
    /// Creates a policy from an effective period and a probability in percent.
    ///
    /// A period of `0` is treated as `1`. The probability is clamped to `[0, 100]` silently; use
    /// [`resolve`](Self::resolve) to apply the configuration rules.
    pub fn new(period: u64, probability: f64) -> Self {
        Self {
            period: period.max(1),
            probability: probability.clamp(0.0, 100.0),
        }
    }

    /// Resolves the policy from a configured skip rate and probability.
    ///
    /// The skip rate is the number of invocations suppressed between two tested invocations, so
    /// the period is `skip + 1`. The rules are:
    ///
    ///  - Both set: the period is `1` and every invocation is tested against the probability.
    ///  - Only the skip rate set: purely periodic sampling with a probability of `100`.
    ///  - Only the probability set: the period is `1`.
    ///  - Neither set: the period is `1` and the probability is [`DEFAULT_PROBABILITY`].
    ///
    /// A probability outside of `[0, 100]` is clamped.
    pub fn resolve(skip: Option<u64>, probability: Option<f64>) -> (Self, Vec<PolicyWarning>) {
        let mut warnings = Vec::new();

        let probability = probability.map(|requested| {
            let clamped = requested.clamp(0.0, 100.0);
            if clamped != requested {
                warnings.push(PolicyWarning::ProbabilityClamped { requested, clamped });
            }
            clamped
        });

        let policy = match (skip, probability) {
            (Some(skip), Some(probability)) => {
                warnings.push(PolicyWarning::SkipOverridden { skip, probability });
                Self::new(1, probability)
            }
            (Some(skip), None) => Self::new(skip.saturating_add(1), 100.0),
            (None, Some(probability)) => Self::new(1, probability),
            (None, None) => Self::new(1, DEFAULT_PROBABILITY),
        };

        (policy, warnings)
    }

    /// Resolves the policy from the tool configuration and logs all adjustments.
    pub fn from_config(config: &Config) -> Self {
        let (policy, warnings) = Self::resolve(config.skip, config.probability);
        for warning in warnings {
            sampler_log::warn!("{warning}");
        }

        if config.skip.is_none() && config.probability.is_none() {
            sampler_log::info!(
                "neither probability nor skip rate set, using probability {DEFAULT_PROBABILITY}%"
            );
        }

        sampler_log::info!("{policy}");
        policy
    }

    /// Returns the sampling period.
    ///
    /// Only invocations whose counter is a multiple of the period are tested.
    pub fn period(&self) -> u64 {
        self.period
    }

    /// Returns the sampling probability in percent.
    pub fn probability(&self) -> f64 {
        self.probability
    }
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        Self::new(1, DEFAULT_PROBABILITY)
    }
}

impl fmt::Display for SamplingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sampling period set to {}, sampling probability set to {}%",
            self.period, self.probability
        )
    }
}
