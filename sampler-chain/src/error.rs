use thiserror::Error;

/// An error resolving the next library of the chain.
///
/// All variants are fatal. The host cannot run the chain without the sampler forwarding to it.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Neither the chain variable nor its deprecated alias is set.
    #[error("no library to call, {key} is not set")]
    Unset {
        /// The variable that should list the chain.
        key: &'static str,
    },

    /// The chain list contains no library.
    #[error("no library to call in '{list}'")]
    EmptyChain {
        /// The raw chain list.
        list: String,
    },

    /// The load sequence passed by the host is negative.
    #[error("invalid load sequence {position}")]
    InvalidPosition {
        /// The load sequence.
        position: i32,
    },

    /// The sampler is the last library of the chain.
    #[error("no downstream module after position {position} in '{list}'")]
    NoDownstream {
        /// The position of the sampler in the chain.
        position: usize,
        /// The raw chain list.
        list: String,
    },

    /// The next library could not be loaded.
    #[error("unable to load {path}")]
    Load {
        /// The path of the library.
        path: String,
        /// The error reported by the dynamic loader.
        #[source]
        source: libloading::Error,
    },
}
