//! # chnative-protocol
//!
//! Packet vocabulary and payload codecs for the ClickHouse native TCP
//! protocol, as seen from the client side of a query response.
//!
//! This crate is intentionally IO-agnostic. Every decoder works on an
//! in-memory [`bytes::Buf`] and reports a short source as
//! [`ProtocolError::UnexpectedEof`], which lets a higher layer buffer more
//! bytes from the socket and retry. Decoders consume exactly the bytes of
//! their own payload, leaving the source positioned at the next packet tag.
//!
//! ## Example
//!
//! ```rust,ignore
//! use chnative_protocol::{Progress, ServerPacket, revision::DEFAULT_REVISION};
//!
//! let mut src: &[u8] = &wire_bytes;
//! match ServerPacket::from_u8(src[0]) {
//!     Some(ServerPacket::Progress) => {
//!         let progress = Progress::decode(&mut &src[1..], DEFAULT_REVISION)?;
//!         println!("{} rows read", progress.rows);
//!     }
//!     _ => {}
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod block;
pub mod codec;
pub mod error;
pub mod exception;
pub mod log;
pub mod packet;
pub mod profile;
pub mod progress;
pub mod revision;
pub mod table_columns;

pub use block::{Block, BlockInfo, Column, ColumnData};
pub use error::ProtocolError;
pub use exception::ServerException;
pub use log::ServerLog;
pub use packet::{ClientPacket, ServerPacket};
pub use profile::{ProfileEvent, ProfileEventKind, ProfileInfo};
pub use progress::Progress;
pub use table_columns::TableColumns;
