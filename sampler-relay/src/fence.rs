use parking_lot::RwLock;
use sampler_common::DeviceId;
use sampler_common::abi::FenceFunction;

use crate::RelayError;

/// Holds the fence function of the host's tools programming interface.
///
/// The host may provide the interface before or after the tool is initialized, so the coordinator
/// exists independently of the relay.
#[derive(Debug, Default)]
pub struct FenceCoordinator {
    function: RwLock<Option<FenceFunction>>,
}

impl FenceCoordinator {
    /// Creates a coordinator without a fence function.
    pub const fn new() -> Self {
        Self {
            function: RwLock::new(None),
        }
    }

    /// Stores the fence function of the tools programming interface.
    ///
    /// `num_functions` is the number of functions the host declares in the interface. A missing
    /// fence function replaces a previously registered one.
    pub fn register(&self, num_functions: u32, function: Option<FenceFunction>) {
        if num_functions == 0 {
            sampler_log::info!("number of functions in tools programming interface is 0");
        }

        if function.is_none() {
            sampler_log::debug!("tools programming interface provides no fence");
        }

        *self.function.write() = function;
    }

    /// Returns `true` if a fence function is registered.
    pub fn is_registered(&self) -> bool {
        self.function.read().is_some()
    }

    /// Fences the given device and blocks until the fence completes.
    pub fn require_fence(&self, device: DeviceId) -> Result<(), RelayError> {
        let function = (*self.function.read()).ok_or(RelayError::FenceUnavailable { device })?;

        // SAFETY: The host provides a function that accepts its own device identifiers.
        unsafe { function(device.raw()) };
        sampler_log::debug!("invoked tool-induced fence on device {device}");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    #[test]
    fn test_unregistered() {
        let fence = FenceCoordinator::new();

        assert!(!fence.is_registered());
        let error = fence.require_fence(DeviceId::GLOBAL).unwrap_err();
        insta::assert_snapshot!(
            error.to_string(),
            @"tool-induced fence on device 0 requested, but the host provided no fence"
        );
    }

    #[test]
    fn test_registered() {
        sampler_test::setup();
        sampler_test::take_fences();

        let fence = FenceCoordinator::new();
        fence.register(1, Some(sampler_test::record_fence));
        assert!(fence.is_registered());

        fence.require_fence(DeviceId::GLOBAL).unwrap();
        fence.require_fence(DeviceId((1 << 17) | 3)).unwrap();
        assert_eq!(sampler_test::take_fences(), vec![0, (1 << 17) | 3]);
    }

    #[test]
    fn test_null_fence_unregisters() {
        let fence = FenceCoordinator::new();
        fence.register(1, Some(sampler_test::record_fence));
        fence.register(0, None);

        assert!(!fence.is_registered());
    }
}
