use std::ffi::CStr;
use std::os::raw::c_char;

use sampler_common::EventKind;

use crate::core::RELAY;

unsafe fn begin(kind: EventKind, name: *const c_char, device_id: u32, kid: *mut u64) {
    sampler_ffi::run(|| {
        let Some(relay) = RELAY.get() else {
            sampler_log::trace!(%kind, "begin before init, not sampling");
            return Ok(());
        };

        let name = if name.is_null() {
            c""
        } else {
            unsafe { CStr::from_ptr(name) }
        };

        let outer_id = relay.begin(kind, name, device_id)?;
        if let Some(kid) = unsafe { kid.as_mut() } {
            *kid = outer_id;
        }

        Ok(())
    })
}

fn end(kind: EventKind, kid: u64) {
    sampler_ffi::run(|| {
        if let Some(relay) = RELAY.get() {
            relay.end(kind, kid)?;
        }

        Ok(())
    })
}

/// Counts a `parallel_for` and forwards it if sampled.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kokkosp_begin_parallel_for(
    name: *const c_char,
    dev_id: u32,
    kid: *mut u64,
) {
    unsafe { begin(EventKind::For, name, dev_id, kid) }
}

/// Counts a `parallel_scan` and forwards it if sampled.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kokkosp_begin_parallel_scan(
    name: *const c_char,
    dev_id: u32,
    kid: *mut u64,
) {
    unsafe { begin(EventKind::Scan, name, dev_id, kid) }
}

/// Counts a `parallel_reduce` and forwards it if sampled.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kokkosp_begin_parallel_reduce(
    name: *const c_char,
    dev_id: u32,
    kid: *mut u64,
) {
    unsafe { begin(EventKind::Reduce, name, dev_id, kid) }
}

/// Forwards the end of a sampled `parallel_for`.
#[unsafe(no_mangle)]
pub extern "C" fn kokkosp_end_parallel_for(kid: u64) {
    end(EventKind::For, kid)
}

/// Forwards the end of a sampled `parallel_scan`.
#[unsafe(no_mangle)]
pub extern "C" fn kokkosp_end_parallel_scan(kid: u64) {
    end(EventKind::Scan, kid)
}

/// Forwards the end of a sampled `parallel_reduce`.
#[unsafe(no_mangle)]
pub extern "C" fn kokkosp_end_parallel_reduce(kid: u64) {
    end(EventKind::Reduce, kid)
}
