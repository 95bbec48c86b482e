//! Transport wrapper that records what the client reads and writes.

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// One successful read from the underlying transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRecord {
    /// Stream offset of the first byte read.
    pub offset: u64,
    /// Number of bytes read.
    pub len: usize,
}

#[derive(Debug, Default)]
struct State {
    reads: Vec<ReadRecord>,
    read: BytesMut,
    written: BytesMut,
    flushes: usize,
    shut_down: bool,
}

/// Shared view of everything a [`RecordingStream`] has seen.
///
/// Cloning is cheap; all clones observe the same stream.
#[derive(Debug, Clone, Default)]
pub struct Recording {
    state: Arc<Mutex<State>>,
}

impl Recording {
    /// Every read, in order.
    #[must_use]
    pub fn reads(&self) -> Vec<ReadRecord> {
        self.state.lock().reads.clone()
    }

    /// Total number of bytes read.
    #[must_use]
    pub fn bytes_read(&self) -> usize {
        self.state.lock().read.len()
    }

    /// All bytes read so far, concatenated.
    #[must_use]
    pub fn read_data(&self) -> Bytes {
        Bytes::copy_from_slice(&self.state.lock().read)
    }

    /// All bytes written so far, concatenated.
    #[must_use]
    pub fn written(&self) -> Bytes {
        Bytes::copy_from_slice(&self.state.lock().written)
    }

    /// Number of flushes issued.
    #[must_use]
    pub fn flushes(&self) -> usize {
        self.state.lock().flushes
    }

    /// Check if the write side was shut down.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.state.lock().shut_down
    }
}

/// An `AsyncRead + AsyncWrite` wrapper that records traffic.
#[derive(Debug)]
pub struct RecordingStream<S> {
    inner: S,
    recording: Recording,
}

impl<S> RecordingStream<S> {
    /// Wrap a transport.
    pub fn new(inner: S) -> (Self, Recording) {
        let recording = Recording::default();
        let stream = Self {
            inner,
            recording: recording.clone(),
        };
        (stream, recording)
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for RecordingStream<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();
        let poll = Pin::new(&mut this.inner).poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = &poll {
            let chunk = &buf.filled()[before..];
            if !chunk.is_empty() {
                let mut state = this.recording.state.lock();
                let offset = state.read.len() as u64;
                state.reads.push(ReadRecord {
                    offset,
                    len: chunk.len(),
                });
                state.read.extend_from_slice(chunk);
                tracing::trace!(offset, len = chunk.len(), "recorded read");
            }
        }
        poll
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for RecordingStream<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.inner).poll_write(cx, buf);
        if let Poll::Ready(Ok(n)) = &poll {
            this.recording
                .state
                .lock()
                .written
                .extend_from_slice(&buf[..*n]);
        }
        poll
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.inner).poll_flush(cx);
        if poll.is_ready() {
            this.recording.state.lock().flushes += 1;
        }
        poll
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.inner).poll_shutdown(cx);
        if poll.is_ready() {
            this.recording.state.lock().shut_down = true;
        }
        poll
    }
}
