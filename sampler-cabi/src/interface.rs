use sampler_common::abi::FenceFunction;

use crate::core::FENCE;

/// Functions the host offers to tools, as passed to
/// [`kokkosp_provide_tool_programming_interface`].
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct ToolProgrammingInterface {
    /// Fences the given device.
    pub fence: Option<FenceFunction>,
    /// Reserved for future functions.
    pub padding: [Option<unsafe extern "C" fn()>; 31],
}

/// Requirements a tool reports to the host through [`kokkosp_request_tool_settings`].
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct ToolSettings {
    /// Whether the host should fence around every kernel.
    pub requires_global_fencing: bool,
    /// Reserved for future settings.
    pub padding: [bool; 255],
}

/// Receives the tools programming interface, which holds the fence function.
#[unsafe(no_mangle)]
pub extern "C" fn kokkosp_provide_tool_programming_interface(
    num_funcs: u32,
    funcs: ToolProgrammingInterface,
) {
    sampler_ffi::run(|| {
        FENCE.register(num_funcs, funcs.fence);
        Ok(())
    })
}

/// Reports that the host does not need to fence every kernel.
///
/// The sampler fences on its own around sampled kernels if `KOKKOS_TOOLS_GLOBALFENCES` is set.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kokkosp_request_tool_settings(
    num_settings: u32,
    settings: *mut ToolSettings,
) {
    sampler_ffi::run(|| {
        match unsafe { settings.as_mut() } {
            Some(settings) => settings.requires_global_fencing = false,
            None => sampler_log::debug!(num_settings, "host requested settings without a buffer"),
        }

        Ok(())
    })
}
