use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// The maximum allowed length for a [`ContainerId`].
const CONTAINER_ID_MAX_LEN: usize = 255;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("invalid container id `{0}`")]
    InvalidContainerId(String),
}

/// A validated container identifier, cheap to clone and usable as a map key.
///
/// # Examples
///
/// ```
/// # use cgscrape::container::ContainerId;
/// let id = ContainerId::new("abc123abc123abc123abc123abc123abc123abc123abc123abc123abc123abcd").unwrap();
/// assert_eq!(id.as_ref().len(), 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerId(Arc<str>);

impl ContainerId {
    /// Creates a new `ContainerId` from the given raw id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidContainerId`] if the input is empty or longer
    /// than [`CONTAINER_ID_MAX_LEN`].
    pub fn new(src: impl AsRef<str>) -> Result<Self, Error> {
        let src = src.as_ref();
        if src.is_empty() || src.len() > CONTAINER_ID_MAX_LEN {
            return Err(Error::InvalidContainerId(src.to_owned()));
        }

        Ok(Self(src.into()))
    }
}

impl AsRef<str> for ContainerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ContainerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_container_id() {
        let id = ContainerId::new("abc123").unwrap();
        assert_eq!(id.as_ref(), "abc123");
        assert_eq!(id.to_string(), "abc123");
    }

    #[test]
    fn test_empty_container_id_rejected() {
        assert!(ContainerId::new("").is_err());
    }

    #[test]
    fn test_oversized_container_id_rejected() {
        let long = "a".repeat(CONTAINER_ID_MAX_LEN + 1);
        assert!(ContainerId::new(&long).is_err());

        let max = "a".repeat(CONTAINER_ID_MAX_LEN);
        assert!(ContainerId::new(&max).is_ok());
    }
}
