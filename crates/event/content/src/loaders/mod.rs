//! Loaders for reading event configuration from files.

pub mod config;

pub use config::{ConfigLoader, EventConfig, ModeSection};

use std::path::{Path, PathBuf};

/// Errors raised while loading configuration files.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse event configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Common result type for loaders.
pub type LoadResult<T> = std::result::Result<T, ConfigError>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
