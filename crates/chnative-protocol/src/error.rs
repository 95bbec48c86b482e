//! Protocol-level error types.

use thiserror::Error;

/// Errors raised while decoding protocol payloads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// The source ended before the payload was complete.
    ///
    /// This is the only variant that means "more bytes may fix this"; a
    /// buffering reader retries on it and treats everything else as fatal.
    #[error("unexpected end of payload")]
    UnexpectedEof,

    /// A varint ran past ten bytes or overflowed 64 bits.
    #[error("varint overflow")]
    VarintOverflow,

    /// A length prefix exceeds what the platform can address.
    #[error("length {0} is out of range")]
    LengthOutOfRange(u64),

    /// A field carried a value the decoder cannot accept.
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// Field name.
        field: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// A block column uses a type this codec does not implement.
    #[error("unsupported column type {0:?}")]
    UnsupportedColumnType(String),

    /// A block is missing a column that a typed view requires.
    #[error("missing column {0:?}")]
    MissingColumn(&'static str),
}

impl ProtocolError {
    /// Returns `true` if the error only means the source was short.
    #[must_use]
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Self::UnexpectedEof)
    }

    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}
