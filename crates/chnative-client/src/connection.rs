//! Connection state shared by the response processor and cancellation.

use std::sync::atomic::{AtomicU64, Ordering};

use chnative_codec::{PacketReader, PacketWriter};
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{Error, Result};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// An open native protocol connection.
///
/// The transport is split into a read half and a write half. The read half
/// sits behind the read lock: at most one packet is being read at any time,
/// and a packet's payload is always read to the end under the same lock
/// acquisition as its handling. The write half has its own lock so a
/// `Cancel` can be sent while another task is blocked reading.
///
/// Once closed, whether by [`close`](Self::close) or by cancellation, a
/// connection never reads again: every entry point fails with
/// [`Error::ConnectionClosed`].
pub struct Connection<T> {
    id: u64,
    revision: u64,
    pub(crate) reader: Mutex<PacketReader<ReadHalf<T>>>,
    pub(crate) writer: Mutex<PacketWriter<WriteHalf<T>>>,
    pub(crate) closed: CancellationToken,
}

impl<T> Connection<T>
where
    T: AsyncRead + AsyncWrite,
{
    /// Wrap an already established and handshaken transport.
    pub fn new(transport: T, config: Config) -> Result<Self> {
        config.validate()?;
        let (read_half, write_half) = tokio::io::split(transport);
        let id = NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(conn_id = id, revision = config.revision, "connection opened");

        Ok(Self {
            id,
            revision: config.revision,
            reader: Mutex::new(PacketReader::with_capacity(
                read_half,
                config.read_buffer_size,
                config.max_payload_size,
            )),
            writer: Mutex::new(PacketWriter::new(write_half)),
            closed: CancellationToken::new(),
        })
    }

    /// Process-unique identifier, attached to every log event as `conn_id`.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Negotiated protocol revision.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Check if the connection has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Close the connection.
    ///
    /// Marks the connection closed, wakes any reader blocked waiting for a
    /// packet tag, and shuts the write half down. Closing twice is a no-op.
    pub async fn close(&self) -> Result<()> {
        if !self.closed.is_cancelled() {
            tracing::debug!(conn_id = self.id, "[close]");
        }
        self.closed.cancel();
        self.writer.lock().await.shutdown().await?;
        Ok(())
    }

    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::ConnectionClosed);
        }
        Ok(())
    }
}

impl<T> std::fmt::Debug for Connection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("revision", &self.revision)
            .field("closed", &self.closed.is_cancelled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (client, _server) = tokio::io::duplex(64);
        let conn = Connection::new(client, Config::default()).unwrap();
        assert!(!conn.is_closed());
        conn.close().await.unwrap();
        conn.close().await.unwrap();
        assert!(conn.is_closed());
        assert!(matches!(conn.ensure_open(), Err(Error::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let (a, _a) = tokio::io::duplex(64);
        let (b, _b) = tokio::io::duplex(64);
        let a = Connection::new(a, Config::default()).unwrap();
        let b = Connection::new(b, Config::default()).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let (client, _server) = tokio::io::duplex(64);
        let err = Connection::new(client, Config::new().max_payload_size(0)).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_connection_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Connection<tokio::io::DuplexStream>>();
    }
}
