//! Buffered packet writer.

use bytes::BytesMut;
use chnative_protocol::codec::write_uvarint;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::CodecError;

/// Buffers outgoing packet bytes and writes them on [`flush`](Self::flush).
#[derive(Debug)]
pub struct PacketWriter<W> {
    inner: W,
    buffer: BytesMut,
    shut_down: bool,
}

impl<W> PacketWriter<W>
where
    W: AsyncWrite + Unpin,
{
    /// Create a new writer.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            buffer: BytesMut::new(),
            shut_down: false,
        }
    }

    /// Append a varint to the write buffer.
    pub fn put_uvarint(&mut self, value: u64) {
        write_uvarint(&mut self.buffer, value);
    }

    /// Number of bytes waiting to be flushed.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Check if [`shutdown`](Self::shutdown) has been called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Write the buffered bytes to the transport and flush it.
    ///
    /// The buffer is cleared whether or not the write succeeds.
    pub async fn flush(&mut self) -> Result<(), CodecError> {
        let pending = self.buffer.split();
        if self.shut_down {
            return Err(CodecError::ConnectionClosed);
        }
        tracing::trace!(bytes = pending.len(), "flushing write buffer");
        self.inner.write_all(&pending).await?;
        self.inner.flush().await?;
        Ok(())
    }

    /// Shut the write side of the transport down.
    ///
    /// Calling this more than once is a no-op.
    pub async fn shutdown(&mut self) -> Result<(), CodecError> {
        if self.shut_down {
            return Ok(());
        }
        self.shut_down = true;
        self.buffer.clear();
        self.inner.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_flush_writes_buffer() {
        let mock = tokio_test::io::Builder::new().write(&[3]).build();
        let mut writer = PacketWriter::new(mock);
        writer.put_uvarint(3);
        assert_eq!(writer.pending(), 1);
        writer.flush().await.unwrap();
        assert_eq!(writer.pending(), 0);
    }

    #[tokio::test]
    async fn test_flush_after_shutdown_fails() {
        let (client, _server) = tokio::io::duplex(64);
        let mut writer = PacketWriter::new(client);
        writer.shutdown().await.unwrap();
        writer.shutdown().await.unwrap();
        writer.put_uvarint(3);
        assert!(matches!(writer.flush().await, Err(CodecError::ConnectionClosed)));
        assert_eq!(writer.pending(), 0);
    }
}
