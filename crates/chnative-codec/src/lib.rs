//! # chnative-codec
//!
//! Async buffered packet I/O for the ClickHouse native protocol.
//!
//! Native protocol packets carry no length prefix: the only way to find the
//! end of a payload is to decode it. This crate bridges the IO-agnostic
//! decoders of `chnative-protocol` and an async byte stream:
//!
//! ```text
//! socket → PacketReader (buffer, retry on short input) → payload decoder
//! ```
//!
//! A decoder is run against the buffered bytes; if it reports the input as
//! incomplete, more bytes are read and the decoder runs again. On success the
//! buffer is advanced by exactly the bytes the decoder consumed, so the
//! stream stays positioned at the next packet tag.
//!
//! ```rust,ignore
//! use chnative_codec::PacketReader;
//! use chnative_protocol::Progress;
//!
//! let mut reader = PacketReader::new(read_half);
//! let tag = reader.read_tag().await?;
//! let progress = reader.decode(|src| Progress::decode(src, revision)).await?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod reader;
pub mod writer;

pub use error::CodecError;
pub use reader::PacketReader;
pub use writer::PacketWriter;
