use std::ffi::CStr;

use sampler_common::EventKind;

/// The next tool in the chain, as seen by the relay.
///
/// Every method corresponds to one optional callback of the next tool. Calls for callbacks the tool
/// does not provide do nothing and report so through their return value.
pub trait Downstream: Send + Sync {
    /// Returns `true` if the tool handles begin-events of this kind.
    fn has_begin(&self, kind: EventKind) -> bool;

    /// Returns `true` if the tool handles end-events of this kind.
    fn has_end(&self, kind: EventKind) -> bool;

    /// Forwards a begin-event and returns the identifier assigned by the tool.
    ///
    /// Returns `None` without calling the tool if it does not handle this kind.
    fn begin(&self, kind: EventKind, name: &CStr, device_id: u32) -> Option<u64>;

    /// Forwards an end-event with the identifier previously returned by [`begin`](Self::begin).
    ///
    /// Returns `false` without calling the tool if it does not handle this kind.
    fn end(&self, kind: EventKind, inner_id: u64) -> bool;

    /// Forwards the shutdown of the host runtime.
    ///
    /// Returns `false` without calling the tool if it has no finalize callback.
    fn finalize(&self) -> bool;
}

impl<D: Downstream + ?Sized> Downstream for Box<D> {
    fn has_begin(&self, kind: EventKind) -> bool {
        (**self).has_begin(kind)
    }

    fn has_end(&self, kind: EventKind) -> bool {
        (**self).has_end(kind)
    }

    fn begin(&self, kind: EventKind, name: &CStr, device_id: u32) -> Option<u64> {
        (**self).begin(kind, name, device_id)
    }

    fn end(&self, kind: EventKind, inner_id: u64) -> bool {
        (**self).end(kind, inner_id)
    }

    fn finalize(&self) -> bool {
        (**self).finalize()
    }
}
