use std::time::{SystemTime, UNIX_EPOCH};

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use sampler_common::EventKind;

use crate::SamplingPolicy;

/// Decides per invocation whether a kernel event is forwarded.
///
/// The sampler is not synchronized. Callers that receive events from multiple threads hold it
/// behind a lock together with the [`CorrespondenceTable`](crate::CorrespondenceTable).
#[derive(Debug)]
pub struct Sampler {
    policy: SamplingPolicy,
    invocations: [u64; EventKind::ALL.len()],
    rng: Pcg32,
}

impl Sampler {
    /// Creates a sampler with a deterministic seed, or a time-based seed if none is given.
    pub fn new(policy: SamplingPolicy, seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(time_seed);
        sampler_log::debug!(seed, "seeding random number generator");

        Self {
            policy,
            invocations: [0; EventKind::ALL.len()],
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Returns the policy of this sampler.
    pub fn policy(&self) -> &SamplingPolicy {
        &self.policy
    }

    /// Returns the number of begin-events observed for the given kind.
    pub fn invocations(&self, kind: EventKind) -> u64 {
        self.invocations[kind.index()]
    }

    /// Counts an invocation of the given kind and returns `true` if it should be forwarded.
    ///
    /// A random number is only drawn for invocations that pass the periodic test.
    pub fn sample(&mut self, kind: EventKind) -> bool {
        let counter = &mut self.invocations[kind.index()];
        *counter += 1;
        let invocation = *counter;

        if invocation % self.policy.period() != 0 {
            sampler_log::trace!(%kind, invocation, "skipping invocation outside of period");
            return false;
        }

        let random_number: f64 = self.rng.random();
        let sample_rate = self.policy.probability() / 100.0;
        sampler_log::trace!(
            %kind,
            invocation,
            sample_rate,
            random_number,
            "applying probability to periodic invocation"
        );

        random_number < sample_rate
    }
}

/// Derives a seed from the current time.
fn time_seed() -> u64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_nanos() as u64,
        Err(_) => 0,
    }
}
