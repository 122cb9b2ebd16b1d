//! Raw function pointer types of the Kokkos Tools callback interface.
//!
//! These are the shapes of the entry points a tool library exports and the host calls. The relay
//! implements them inbound and resolves them outbound on the next library in the chain.

use std::ffi::c_void;
use std::os::raw::c_char;

/// `kokkosp_init_library(load_seq, interface_version, dev_info_count, dev_info)`.
pub type InitFunction = unsafe extern "C" fn(i32, u64, u32, *mut c_void);

/// `kokkosp_finalize_library()`.
pub type FinalizeFunction = unsafe extern "C" fn();

/// `kokkosp_begin_parallel_*(name, dev_id, kid)`.
pub type BeginFunction = unsafe extern "C" fn(*const c_char, u32, *mut u64);

/// `kokkosp_end_parallel_*(kid)`.
pub type EndFunction = unsafe extern "C" fn(u64);

/// The fence entry of the tool programming interface, taking a device identifier.
pub type FenceFunction = unsafe extern "C" fn(u32);
