use sampler_common::DeviceId;
use thiserror::Error;

/// An error relaying an event.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum RelayError {
    /// Fencing is enabled, but the host did not provide a fence function.
    #[error("tool-induced fence on device {device} requested, but the host provided no fence")]
    FenceUnavailable {
        /// The device that should have been fenced.
        device: DeviceId,
    },
}
