use std::num::ParseIntError;

use thiserror::Error;

use crate::cache::CacheError;

/// A parse failure in a cgroup or procfs stat file.
#[derive(Debug, Error)]
pub enum StatParseError {
    #[error("invalid value for '{key}' at line {line}: '{value}': {source}")]
    InvalidKeyValue {
        key: String,
        value: String,
        line: usize,
        #[source]
        source: ParseIntError,
    },

    #[error("invalid value at line {line}: '{value}': {source}")]
    InvalidValue {
        value: String,
        line: usize,
        #[source]
        source: ParseIntError,
    },

    #[error("error during I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure to sample a container into the cache.
///
/// I/O errors usually mean the container's cgroup directory vanished between
/// discovery and collection; the monitor drops the container in response.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("error during I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse stat file: {0}")]
    Parse(#[from] StatParseError),

    #[error("failed to update metric cache: {0}")]
    Cache(#[from] CacheError),
}
