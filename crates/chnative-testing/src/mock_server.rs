//! In-memory server end of a client connection.

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

use crate::recording::{Recording, RecordingStream};

/// Default in-memory pipe capacity.
pub const DEFAULT_PIPE_CAPACITY: usize = 64 * 1024;

/// The server side of an in-memory connection.
///
/// Dropping it (or calling [`disconnect`](Self::disconnect)) makes client
/// reads hit end of stream once buffered data is consumed, and client writes
/// fail with a broken pipe.
#[derive(Debug)]
pub struct MockServer {
    stream: DuplexStream,
}

impl MockServer {
    /// Create a connected client transport and server.
    #[must_use]
    pub fn pair() -> (RecordingStream<DuplexStream>, Recording, Self) {
        Self::pair_with_capacity(DEFAULT_PIPE_CAPACITY)
    }

    /// Like [`pair`](Self::pair) with a custom pipe capacity.
    ///
    /// A small capacity forces the client to read payloads in several
    /// chunks.
    #[must_use]
    pub fn pair_with_capacity(capacity: usize) -> (RecordingStream<DuplexStream>, Recording, Self) {
        let (client, server) = tokio::io::duplex(capacity);
        let (stream, recording) = RecordingStream::new(client);
        (stream, recording, Self { stream: server })
    }

    /// Send bytes to the client.
    pub async fn send(&mut self, bytes: impl Into<Bytes>) -> std::io::Result<()> {
        let bytes = bytes.into();
        tracing::trace!(len = bytes.len(), "mock server send");
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await
    }

    /// Read everything the client writes until it shuts its write side down.
    pub async fn read_to_end(&mut self) -> std::io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.stream.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Drop the server end of the pipe.
    pub fn disconnect(self) {
        drop(self);
    }
}

/// Install a `tracing` subscriber that writes through the test harness.
///
/// Safe to call from every test; only the first call installs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
