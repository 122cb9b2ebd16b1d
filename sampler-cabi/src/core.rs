use std::ffi::c_void;
use std::sync::{Arc, LazyLock, OnceLock};

use sampler_chain::{ChainConfig, ChainLink, InitArgs};
use sampler_config::{Config, ProcessEnv};
use sampler_relay::{FenceCoordinator, Relay};

/// The fence function of the host, which may be provided before or after initialization.
pub(crate) static FENCE: LazyLock<Arc<FenceCoordinator>> = LazyLock::new(Default::default);

/// The relay, created by [`kokkosp_init_library`].
pub(crate) static RELAY: OnceLock<Relay<ChainLink>> = OnceLock::new();

/// Reads the configuration, sets up logging and resolves the rest of the chain.
fn init_relay(init: InitArgs) -> anyhow::Result<Relay<ChainLink>> {
    let config = Config::from_env(ProcessEnv);
    sampler_log::init(&config.log_config());
    config.log_warnings();

    sampler_log::debug!(
        verbosity = config.verbosity,
        global_fences = config.global_fences,
        skip = ?config.skip,
        probability = ?config.probability,
        seed = ?config.seed,
        "configuration provided as input"
    );

    sampler_log::info!(
        "initializing sampler at position {} of the chain",
        init.load_seq
    );
    let chain = ChainConfig::from_config(&config, init.load_seq)?;
    let link = ChainLink::resolve(&chain, init)?;

    Ok(Relay::from_config(link, &config, Arc::clone(&FENCE)))
}

/// Initializes the sampler and the rest of the chain.
///
/// Reads the configuration from the environment, sets up logging, loads the next library of the
/// chain and forwards this handshake to it with `load_seq + 1`. Only the first call initializes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kokkosp_init_library(
    load_seq: i32,
    interface_version: u64,
    device_info_count: u32,
    device_info: *mut c_void,
) {
    if RELAY.get().is_some() {
        sampler_log::warn!("sampler already initialized, ignoring init");
        return;
    }

    let init = InitArgs {
        load_seq,
        interface_version,
        device_info_count,
        device_info,
    };

    let mut initialized = false;
    RELAY.get_or_init(|| {
        initialized = true;
        sampler_ffi::set_panic_hook();
        sampler_ffi::run(|| init_relay(init))
    });

    if !initialized {
        sampler_log::warn!("sampler initialized concurrently, keeping the first instance");
    }
}

/// Finalizes the next library of the chain.
#[unsafe(no_mangle)]
pub extern "C" fn kokkosp_finalize_library() {
    sampler_ffi::run(|| {
        match RELAY.get() {
            Some(relay) => {
                relay.finalize();
            }
            None => sampler_log::debug!("finalize before init, nothing to forward"),
        }

        Ok(())
    })
}
