use std::fmt;

const NUM_DEVICE_BITS: u32 = 7;
const NUM_INSTANCE_BITS: u32 = 17;

/// A device identifier as encoded by the host runtime.
///
/// The raw value packs the device type into the bits above the lowest 17 bits, and the instance
/// of the execution space into the lowest 17 bits.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct DeviceId(pub u32);

impl DeviceId {
    /// The device handle used for global fences.
    pub const GLOBAL: DeviceId = DeviceId(0);

    /// Returns the raw encoded value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns the device type portion of the identifier.
    pub const fn device(self) -> u32 {
        !(u32::MAX << NUM_DEVICE_BITS) & (self.0 >> NUM_INSTANCE_BITS)
    }
}

impl From<u32> for DeviceId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.device())
    }
}
