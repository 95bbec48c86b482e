//! Codec error types.

use chnative_protocol::ProtocolError;
use thiserror::Error;

/// Errors raised by the buffered packet reader and writer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CodecError {
    /// The underlying transport failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A payload could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The peer closed the stream, or the local side was shut down.
    #[error("connection closed")]
    ConnectionClosed,

    /// A payload outgrew the read buffer limit before it could be decoded.
    #[error("payload exceeds {max} bytes")]
    PayloadTooLarge {
        /// Configured limit.
        max: usize,
    },
}
