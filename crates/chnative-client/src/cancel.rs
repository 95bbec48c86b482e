//! Query cancellation.
//!
//! A [`QueryContext`] carries the caller's cancellation signal: an explicit
//! [`CancellationToken`] and an optional deadline. The response processor
//! polls it between packets. When it fires, the connection sends `Cancel`,
//! is closed, and the call returns [`Error::Cancelled`] with the context's
//! reason.
//!
//! The connection is closed even when the server would have acknowledged
//! the cancel: the rest of the response is never drained, so the stream
//! position is unknown and the connection cannot be handed to another query.
//!
//! ```rust,ignore
//! let ctx = QueryContext::new().with_timeout(Duration::from_secs(5));
//! let token = ctx.token().clone();
//!
//! tokio::spawn(async move {
//!     shutdown_signal().await;
//!     token.cancel();
//! });
//!
//! match conn.drain(&ctx, &mut on).await {
//!     Err(e) if e.is_cancelled() => tracing::info!("query cancelled: {e}"),
//!     other => other?,
//! }
//! ```

use std::fmt;
use std::time::Duration;

use chnative_protocol::ClientPacket;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::connection::Connection;
use crate::error::{Error, Result};

/// Why a query was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CancelReason {
    /// The context's token was cancelled.
    Cancelled,
    /// The context's deadline passed.
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => f.write_str("query cancelled"),
            Self::DeadlineExceeded => f.write_str("deadline exceeded"),
        }
    }
}

/// Cancellation signal for one call into the response processor.
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl QueryContext {
    /// Create a context that never fires on its own.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an existing token, e.g. a child of a server-wide shutdown token.
    #[must_use]
    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Fire once `deadline` has passed.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Fire once `timeout` has elapsed from now.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// The context's token. Cancelling it cancels the query.
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// The context's deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancel the query.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Poll the context without blocking.
    ///
    /// An explicit cancellation wins over an expired deadline.
    #[must_use]
    pub fn check(&self) -> Option<CancelReason> {
        if self.token.is_cancelled() {
            return Some(CancelReason::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(CancelReason::DeadlineExceeded),
            _ => None,
        }
    }
}

impl<T> Connection<T>
where
    T: AsyncRead + AsyncWrite,
{
    /// Ask the server to stop the current query and close the connection.
    ///
    /// Does not take the read lock, so it may be called from another task
    /// while [`drain`](Self::drain) is waiting for a packet; that call then
    /// fails with [`Error::ConnectionClosed`]. The connection is closed
    /// whether or not `Cancel` could be sent. If closing fails, that error
    /// is returned; otherwise the error from sending `Cancel`, if any.
    pub async fn cancel(&self) -> Result<()> {
        tracing::debug!(conn_id = self.id(), "[cancel]");
        let sent = {
            let mut writer = self.writer.lock().await;
            writer.put_uvarint(ClientPacket::Cancel as u64);
            writer.flush().await
        };
        self.close().await?;
        sent.map_err(Error::from)
    }

    /// Run the cancel sequence and build the error the entry point returns.
    pub(crate) async fn cancel_with(&self, reason: CancelReason) -> Error {
        let cancel_error = match self.cancel().await {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(
                    conn_id = self.id(),
                    error = %e,
                    "cancel did not complete cleanly"
                );
                Some(Box::new(e))
            }
        };
        Error::Cancelled {
            reason,
            cancel_error,
        }
    }
}
