//! Buffered packet reader.

use std::pin::Pin;
use std::task::Poll;

use bytes::{Buf, BytesMut};
use chnative_protocol::ProtocolError;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::io::poll_read_buf;

use crate::error::CodecError;

/// Default initial capacity of the read buffer.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 64 * 1024;

/// Default upper bound on a single buffered payload.
pub const DEFAULT_MAX_PAYLOAD_SIZE: usize = 256 * 1024 * 1024;

/// Smallest amount a retry waits to add to the buffer.
const MIN_RETRY_GROWTH: usize = 4096;

/// Reads packet tags and payloads from an async byte stream.
///
/// Payload decoders are retried against a growing buffer until they stop
/// reporting [`ProtocolError::UnexpectedEof`]. Bytes are only released from
/// the buffer once a decoder succeeds, so a failed or dropped decode never
/// leaves the stream half consumed from the decoder's point of view.
///
/// Between retries the buffer is grown geometrically: the reader keeps
/// taking whatever the transport has ready until the buffer has doubled, so
/// a payload of `n` bytes costs `O(log n)` decoder runs rather than one run
/// per transport read. It stops early when the transport has nothing more
/// ready, since the buffered bytes may already hold the whole payload.
#[derive(Debug)]
pub struct PacketReader<R> {
    inner: R,
    buffer: BytesMut,
    max_payload_size: usize,
    position: u64,
}

impl<R> PacketReader<R>
where
    R: AsyncRead + Unpin,
{
    /// Create a reader with default buffer settings.
    pub fn new(inner: R) -> Self {
        Self::with_capacity(inner, DEFAULT_READ_BUFFER_SIZE, DEFAULT_MAX_PAYLOAD_SIZE)
    }

    /// Create a reader with an initial buffer capacity and a payload limit.
    pub fn with_capacity(inner: R, capacity: usize, max_payload_size: usize) -> Self {
        Self {
            inner,
            buffer: BytesMut::with_capacity(capacity.min(max_payload_size)),
            max_payload_size,
            position: 0,
        }
    }

    /// Total number of bytes consumed by tags and decoded payloads.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Number of bytes read from the transport but not yet consumed.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Read one packet tag.
    ///
    /// A clean end of stream before the tag is reported as
    /// [`CodecError::ConnectionClosed`]. This method is cancel safe: if the
    /// future is dropped no byte has been consumed.
    pub async fn read_tag(&mut self) -> Result<u8, CodecError> {
        if self.buffer.is_empty() {
            self.fill().await?;
        }
        let tag = self.buffer.get_u8();
        self.position += 1;
        tracing::trace!(tag, position = self.position - 1, "read packet tag");
        Ok(tag)
    }

    /// Run a payload decoder against the stream.
    ///
    /// `decode` receives the buffered bytes and must advance the slice past
    /// whatever it consumed. It may be run several times against a growing
    /// prefix of the same payload.
    pub async fn decode<T, F>(&mut self, mut decode: F) -> Result<T, CodecError>
    where
        F: FnMut(&mut &[u8]) -> Result<T, ProtocolError>,
    {
        loop {
            let mut src = &self.buffer[..];
            let available = src.len();
            match decode(&mut src) {
                Ok(value) => {
                    let consumed = available - src.len();
                    if consumed > self.max_payload_size {
                        return Err(CodecError::PayloadTooLarge {
                            max: self.max_payload_size,
                        });
                    }
                    self.buffer.advance(consumed);
                    self.position += consumed as u64;
                    return Ok(value);
                }
                Err(e) if e.is_incomplete() => {
                    if self.buffer.len() >= self.max_payload_size {
                        return Err(CodecError::PayloadTooLarge {
                            max: self.max_payload_size,
                        });
                    }
                    let target = self
                        .buffer
                        .len()
                        .saturating_mul(2)
                        .max(self.buffer.len() + MIN_RETRY_GROWTH)
                        .min(self.max_payload_size);
                    self.fill().await?;
                    self.fill_ready(target).await?;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn fill(&mut self) -> Result<(), CodecError> {
        if self.buffer.capacity() == self.buffer.len() {
            self.buffer.reserve(self.buffer.len().max(4096));
        }
        let n = self.inner.read_buf(&mut self.buffer).await?;
        tracing::trace!(bytes = n, buffered = self.buffer.len(), "filled read buffer");
        if n == 0 {
            return Err(CodecError::ConnectionClosed);
        }
        Ok(())
    }

    /// Take bytes the transport has ready until the buffer reaches `target`.
    ///
    /// Never waits on the transport. When nothing is ready it yields once so
    /// a writer on the same runtime can catch up, then gives up.
    async fn fill_ready(&mut self, target: usize) -> Result<(), CodecError> {
        let mut yielded = false;
        while self.buffer.len() < target {
            match self.try_fill(target).await? {
                // End of stream: let the decoder look at what it has.
                Some(0) => break,
                Some(_) => yielded = false,
                None if yielded => break,
                None => {
                    tokio::task::yield_now().await;
                    yielded = true;
                }
            }
        }
        Ok(())
    }

    /// Poll the transport once. `None` means no bytes were ready.
    async fn try_fill(&mut self, target: usize) -> Result<Option<usize>, CodecError> {
        let want = target.saturating_sub(self.buffer.len());
        if self.buffer.capacity() - self.buffer.len() < want {
            self.buffer.reserve(want);
        }
        let Self { inner, buffer, .. } = &mut *self;
        let n = std::future::poll_fn(|cx| {
            match poll_read_buf(Pin::new(&mut *inner), cx, &mut *buffer) {
                Poll::Ready(result) => Poll::Ready(result.map(Some)),
                Poll::Pending => Poll::Ready(Ok(None)),
            }
        })
        .await?;
        if let Some(n) = n {
            tracing::trace!(bytes = n, buffered = self.buffer.len(), "took ready bytes");
        }
        Ok(n)
    }
}
