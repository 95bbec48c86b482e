//! # chnative-client
//!
//! Response stream processing for ClickHouse native protocol connections.
//!
//! After a query has been sent, the server answers with an interleaved
//! sequence of packets: data blocks, progress, profiling counters, log
//! records, exceptions and finally an end-of-stream marker. A [`Connection`]
//! pulls those packets off the wire one at a time and routes each of them to
//! the caller, either as a return value or through an [`OnProcess`]
//! callback table.
//!
//! ## Entry points
//!
//! - [`Connection::first_block`] reads until the first `Data` packet and
//!   returns its block, or `None` if the stream ended without one. It takes
//!   `&mut self`: nothing else can be reading yet, so no lock is needed for
//!   its tag reads.
//! - [`Connection::drain`] reads until end of stream, delivering every
//!   non-empty block through the `data` callback. It takes `&self` and locks
//!   the reader for every packet, so it can run while another task holds a
//!   reference to the connection (for example to cancel it).
//!
//! ## Cancellation
//!
//! Both entry points poll their [`QueryContext`] between packets, never in
//! the middle of one. When it fires they send `Cancel`, close the connection
//! and return [`Error::Cancelled`]. A closed connection refuses every further
//! read with [`Error::ConnectionClosed`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use chnative_client::{Config, Connection, OnProcess, QueryContext};
//!
//! let mut conn = Connection::new(stream, Config::default())?;
//! let ctx = QueryContext::new().with_timeout(Duration::from_secs(30));
//!
//! let mut rows = 0;
//! let mut on = OnProcess::new()
//!     .on_data(|block| rows += block.rows())
//!     .on_progress(|p| tracing::info!(rows = p.rows, "progress"));
//!
//! if let Some(header) = conn.first_block(&ctx, &mut on).await? {
//!     println!("{} columns", header.columns().len());
//!     conn.drain(&ctx, &mut on).await?;
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod callbacks;
pub mod cancel;
pub mod config;
pub mod connection;
pub mod error;
mod process;

pub use callbacks::OnProcess;
pub use cancel::{CancelReason, QueryContext};
pub use config::Config;
pub use connection::Connection;
pub use error::{Error, Result};

// Payload types handed to callbacks.
pub use chnative_protocol::{
    Block, Column, ColumnData, ProfileEvent, ProfileEventKind, ProfileInfo, Progress,
    ServerException, ServerLog,
};
