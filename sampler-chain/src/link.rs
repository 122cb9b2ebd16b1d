use std::ffi::{CStr, c_void};
use std::fmt;
use std::path::PathBuf;

use libloading::os::unix::{Library, RTLD_GLOBAL, RTLD_NOW, Symbol};
use sampler_common::EventKind;
use sampler_common::abi::{BeginFunction, EndFunction, FinalizeFunction, InitFunction};

use crate::{ChainConfig, ChainError, Downstream};

/// The arguments of the init handshake, as passed by the host.
#[derive(Clone, Copy, Debug)]
pub struct InitArgs {
    /// The position of the receiving tool in the chain.
    pub load_seq: i32,
    /// The version of the Kokkos tools interface.
    pub interface_version: u64,
    /// The number of entries behind `device_info`.
    pub device_info_count: u32,
    /// Opaque device information, passed on unchanged.
    pub device_info: *mut c_void,
}

/// The callbacks a tool library provides.
#[derive(Clone, Copy, Default)]
pub struct ToolCallbacks {
    /// `kokkosp_init_library`.
    pub init: Option<InitFunction>,
    /// `kokkosp_finalize_library`.
    pub finalize: Option<FinalizeFunction>,
    /// `kokkosp_begin_parallel_*`, indexed by [`EventKind::index`].
    pub begin: [Option<BeginFunction>; EventKind::ALL.len()],
    /// `kokkosp_end_parallel_*`, indexed by [`EventKind::index`].
    pub end: [Option<EndFunction>; EventKind::ALL.len()],
}

impl ToolCallbacks {
    /// Looks up all callbacks in a loaded library.
    ///
    /// # Safety
    ///
    /// Symbols with these names must have the signatures of the Kokkos tools interface.
    pub unsafe fn load(library: &Library) -> Self {
        unsafe {
            Self {
                init: load_symbol(library, b"kokkosp_init_library"),
                finalize: load_symbol(library, b"kokkosp_finalize_library"),
                begin: [
                    load_symbol(library, b"kokkosp_begin_parallel_for"),
                    load_symbol(library, b"kokkosp_begin_parallel_scan"),
                    load_symbol(library, b"kokkosp_begin_parallel_reduce"),
                ],
                end: [
                    load_symbol(library, b"kokkosp_end_parallel_for"),
                    load_symbol(library, b"kokkosp_end_parallel_scan"),
                    load_symbol(library, b"kokkosp_end_parallel_reduce"),
                ],
            }
        }
    }

    /// Returns the status of the begin and end callbacks, one line per callback.
    pub fn status(&self) -> FunctionStatus<'_> {
        FunctionStatus(self)
    }

    fn log_status(&self) {
        sampler_log::info!("function status:");
        for line in self.status().to_string().lines() {
            sampler_log::info!("{line}");
        }

        for kind in EventKind::ALL {
            if self.begin[kind.index()].is_none() {
                sampler_log::info!(
                    "next library has no begin-{kind} callback, not forwarding {kind}"
                );
            }
        }
    }
}

impl fmt::Debug for ToolCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolCallbacks")
            .field("init", &self.init.is_some())
            .field("finalize", &self.finalize.is_some())
            .field("begin", &self.begin.map(|callback| callback.is_some()))
            .field("end", &self.end.map(|callback| callback.is_some()))
            .finish()
    }
}

/// Displays which callbacks of a tool are available.
pub struct FunctionStatus<'a>(&'a ToolCallbacks);

impl fmt::Display for FunctionStatus<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let yes_no = |available: bool| if available { "yes" } else { "no" };

        for kind in EventKind::ALL {
            let label = format!("begin-{kind}:");
            let available = self.0.begin[kind.index()].is_some();
            writeln!(f, "{label:<24}{}", yes_no(available))?;
        }

        for kind in EventKind::ALL {
            let label = format!("end-{kind}:");
            let available = self.0.end[kind.index()].is_some();
            writeln!(f, "{label:<24}{}", yes_no(available))?;
        }

        Ok(())
    }
}

unsafe fn load_symbol<T: Copy>(library: &Library, symbol: &'static [u8]) -> Option<T> {
    let function: Symbol<T> = match unsafe { library.get(symbol) } {
        Ok(function) => function,
        Err(error) => {
            sampler_log::debug!(
                symbol = %String::from_utf8_lossy(symbol),
                error = &error as &dyn std::error::Error,
                "symbol not found in library"
            );
            return None;
        }
    };

    Some(*function)
}

/// The link to the next library in the chain.
///
/// Keeps the library loaded for as long as the link lives.
#[derive(Debug)]
pub struct ChainLink {
    path: String,
    callbacks: ToolCallbacks,
    _library: Option<Library>,
}

impl ChainLink {
    /// Loads the next library of the chain and forwards the init handshake to it.
    ///
    /// The handshake is forwarded with the load sequence advanced by one and all other arguments
    /// unchanged.
    pub fn resolve(chain: &ChainConfig, init: InitArgs) -> Result<Self, ChainError> {
        let path = chain.next_module()?;
        sampler_log::info!("next library to call: {path}");
        sampler_log::info!("loading child library");

        let link = Self::load(path)?;
        link.handshake(chain, init);

        Ok(link)
    }

    /// Forwards the init handshake received at the position of `chain` to this link.
    ///
    /// Returns `true` if the library has an init callback.
    pub fn handshake(&self, chain: &ChainConfig, init: InitArgs) -> bool {
        self.callbacks.log_status();
        self.initialize(InitArgs {
            load_seq: chain.next_position(),
            ..init
        })
    }

    /// Loads a tool library and looks up its callbacks.
    ///
    /// Symbols are bound immediately and made available to libraries loaded after this one.
    pub fn load(path: &str) -> Result<Self, ChainError> {
        let lib_path = PathBuf::from(path);
        sampler_log::debug!(path = %lib_path.display(), "loading shared library");

        let library = unsafe { Library::open(Some(&lib_path), RTLD_NOW | RTLD_GLOBAL) }.map_err(
            |source| ChainError::Load {
                path: path.to_owned(),
                source,
            },
        )?;

        // SAFETY: Tools loaded by Kokkos must export these symbols with the interface signatures.
        let callbacks = unsafe { ToolCallbacks::load(&library) };

        Ok(Self {
            path: path.to_owned(),
            callbacks,
            _library: Some(library),
        })
    }

    /// Creates a link from callbacks that are not backed by a loaded library.
    ///
    /// # Safety
    ///
    /// The callbacks must be safe to call with the arguments of the Kokkos tools interface for the
    /// lifetime of the link.
    pub unsafe fn from_callbacks(name: &str, callbacks: ToolCallbacks) -> Self {
        Self {
            path: name.to_owned(),
            callbacks,
            _library: None,
        }
    }

    /// Returns the path of the library.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the callbacks of the library.
    pub fn callbacks(&self) -> &ToolCallbacks {
        &self.callbacks
    }

    /// Forwards the init handshake, if the library has an init callback.
    pub fn initialize(&self, init: InitArgs) -> bool {
        let Some(function) = self.callbacks.init else {
            sampler_log::info!("{} has no init callback", self.path);
            return false;
        };

        unsafe {
            function(
                init.load_seq,
                init.interface_version,
                init.device_info_count,
                init.device_info,
            )
        };
        true
    }
}

impl Downstream for ChainLink {
    fn has_begin(&self, kind: EventKind) -> bool {
        self.callbacks.begin[kind.index()].is_some()
    }

    fn has_end(&self, kind: EventKind) -> bool {
        self.callbacks.end[kind.index()].is_some()
    }

    fn begin(&self, kind: EventKind, name: &CStr, device_id: u32) -> Option<u64> {
        let function = self.callbacks.begin[kind.index()]?;
        let mut inner_id = 0;
        unsafe { function(name.as_ptr(), device_id, &mut inner_id) };
        Some(inner_id)
    }

    fn end(&self, kind: EventKind, inner_id: u64) -> bool {
        let Some(function) = self.callbacks.end[kind.index()] else {
            return false;
        };

        unsafe { function(inner_id) };
        true
    }

    fn finalize(&self) -> bool {
        let Some(function) = self.callbacks.finalize else {
            return false;
        };

        unsafe { function() };
        true
    }
}
