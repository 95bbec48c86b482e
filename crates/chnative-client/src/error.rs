//! Client error types.

use chnative_codec::CodecError;
use chnative_protocol::{ProtocolError, ServerException};
use thiserror::Error;

use crate::cancel::CancelReason;

/// Errors that can end a response stream.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The server reported an exception and ended the query.
    #[error("server exception: {0}")]
    Server(#[from] ServerException),

    /// A tag outside the packet vocabulary arrived; the stream is out of sync.
    #[error("{op}: unexpected packet {packet}")]
    UnexpectedPacket {
        /// Operation that was reading the stream.
        op: &'static str,
        /// The offending tag byte.
        packet: u8,
    },

    /// The query context fired and the query was cancelled.
    ///
    /// If sending `Cancel` or closing the connection also failed, that
    /// failure is kept in `cancel_error` and reported as the source.
    #[error("{reason}")]
    Cancelled {
        /// Why the query was cancelled.
        reason: CancelReason,
        /// Failure while sending `Cancel` or closing the connection.
        #[source]
        cancel_error: Option<Box<Error>>,
    },

    /// The connection was closed, locally or by the server.
    #[error("connection closed")]
    ConnectionClosed,

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Protocol error.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Codec error.
    #[error("codec error: {0}")]
    Codec(CodecError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<CodecError> for Error {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Io(e) => Self::Io(e),
            CodecError::Protocol(e) => Self::Protocol(e),
            CodecError::ConnectionClosed => Self::ConnectionClosed,
            other => Self::Codec(other),
        }
    }
}

impl Error {
    /// Check if this error is the result of cancelling the query.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// The cancellation reason, if this error is a cancellation.
    #[must_use]
    pub fn cancel_reason(&self) -> Option<CancelReason> {
        match self {
            Self::Cancelled { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    /// Check if the stream lost sync with the server.
    #[must_use]
    pub fn is_desync(&self) -> bool {
        matches!(self, Self::UnexpectedPacket { .. })
    }

    /// The server error code, if this is a server exception.
    #[must_use]
    pub fn server_code(&self) -> Option<i32> {
        match self {
            Self::Server(e) => Some(e.code),
            _ => None,
        }
    }

    /// Check if the connection can still be used after this error.
    ///
    /// Only a server exception leaves the stream in a known state: the
    /// server ended the query itself. Every other error means the transport
    /// or the stream position can no longer be trusted.
    #[must_use]
    pub fn is_connection_reusable(&self) -> bool {
        matches!(self, Self::Server(_))
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;
