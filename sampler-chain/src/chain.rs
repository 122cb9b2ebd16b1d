use sampler_config::{Config, TOOLS_LIBS};

use crate::ChainError;

/// The libraries of a tool chain and the position of the sampler within it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChainConfig {
    list: String,
    modules: Vec<String>,
    position: usize,
}

impl ChainConfig {
    /// Parses a `;`-separated list of libraries.
    ///
    /// Surrounding whitespace is trimmed and empty entries are skipped. The position is the load
    /// sequence passed by the host, which is the zero-based index of the sampler in the list.
    pub fn parse(list: &str, position: i32) -> Result<Self, ChainError> {
        let modules: Vec<String> = list
            .split(';')
            .map(str::trim)
            .filter(|module| !module.is_empty())
            .map(str::to_owned)
            .collect();

        if modules.is_empty() {
            return Err(ChainError::EmptyChain {
                list: list.to_owned(),
            });
        }

        let position =
            usize::try_from(position).map_err(|_| ChainError::InvalidPosition { position })?;

        let config = Self {
            list: list.to_owned(),
            modules,
            position,
        };

        // Validate early, so a chain that cannot forward never gets to load anything.
        config.next_module()?;
        Ok(config)
    }

    /// Parses the chain list of the tool configuration.
    pub fn from_config(config: &Config, position: i32) -> Result<Self, ChainError> {
        match config.tools_libs {
            Some(ref libs) => Self::parse(&libs.value, position),
            None => Err(ChainError::Unset { key: TOOLS_LIBS }),
        }
    }

    /// Returns all libraries of the chain.
    pub fn modules(&self) -> &[String] {
        &self.modules
    }

    /// Returns the position of the sampler in the chain.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns the library following the sampler.
    pub fn next_module(&self) -> Result<&str, ChainError> {
        self.position
            .checked_add(1)
            .and_then(|next| self.modules.get(next))
            .map(String::as_str)
            .ok_or_else(|| ChainError::NoDownstream {
                position: self.position,
                list: self.list.clone(),
            })
    }

    /// Returns the load sequence to pass to the next library.
    pub fn next_position(&self) -> i32 {
        i32::try_from(self.position + 1).unwrap_or(i32::MAX)
    }
}
