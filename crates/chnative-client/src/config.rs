//! Connection configuration.

use chnative_codec::reader::{DEFAULT_MAX_PAYLOAD_SIZE, DEFAULT_READ_BUFFER_SIZE};
use chnative_protocol::revision::DEFAULT_REVISION;

use crate::error::{Error, Result};

/// Settings for a [`Connection`](crate::Connection).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Protocol revision negotiated during the handshake (default:
    /// [`DEFAULT_REVISION`]).
    pub revision: u64,
    /// Initial capacity of the read buffer in bytes (default: 64 KiB).
    pub read_buffer_size: usize,
    /// Largest payload the read buffer may grow to (default: 256 MiB).
    pub max_payload_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            revision: DEFAULT_REVISION,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
        }
    }
}

impl Config {
    /// Create a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the negotiated protocol revision.
    #[must_use]
    pub fn revision(mut self, revision: u64) -> Self {
        self.revision = revision;
        self
    }

    /// Set the initial read buffer capacity.
    #[must_use]
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    /// Set the largest payload the read buffer may grow to.
    #[must_use]
    pub fn max_payload_size(mut self, size: usize) -> Self {
        self.max_payload_size = size;
        self
    }

    /// Check the configuration for values that cannot work.
    pub fn validate(&self) -> Result<()> {
        if self.max_payload_size == 0 {
            return Err(Error::Config("max_payload_size must be non-zero".into()));
        }
        if self.read_buffer_size > self.max_payload_size {
            return Err(Error::Config(format!(
                "read_buffer_size ({}) exceeds max_payload_size ({})",
                self.read_buffer_size, self.max_payload_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert_eq!(config.revision, DEFAULT_REVISION);
        config.validate().unwrap();
    }

    #[test]
    fn test_builder() {
        let config = Config::new()
            .revision(54469)
            .read_buffer_size(1024)
            .max_payload_size(4096);
        assert_eq!(config.revision, 54469);
        assert_eq!(config.read_buffer_size, 1024);
        assert_eq!(config.max_payload_size, 4096);
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_sizes() {
        assert!(matches!(
            Config::new().max_payload_size(0).validate(),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::new().read_buffer_size(10).max_payload_size(5).validate(),
            Err(Error::Config(_))
        ));
    }
}
