//! Protocol revision thresholds.
//!
//! The revision is negotiated once per connection during the handshake.
//! Several payload layouts grow extra fields past a given revision; the
//! constants below name those thresholds.

/// Revision this crate speaks unless told otherwise.
pub const DEFAULT_REVISION: u64 = 54460;

/// Blocks are preceded by a temporary table name.
pub const WITH_TEMPORARY_TABLES: u64 = 50264;

/// Progress carries the total number of rows to read.
pub const WITH_TOTAL_ROWS_IN_PROGRESS: u64 = 51554;

/// Blocks carry a field-numbered block info header.
pub const WITH_BLOCK_INFO: u64 = 51903;

/// Progress carries written rows and bytes.
pub const WITH_CLIENT_WRITE_INFO: u64 = 54420;

/// Each block column carries a custom serialization flag.
pub const WITH_CUSTOM_SERIALIZATION: u64 = 54454;

/// Progress carries the elapsed server time.
pub const WITH_SERVER_QUERY_TIME_IN_PROGRESS: u64 = 54460;

/// Progress carries the total number of bytes to read.
pub const WITH_TOTAL_BYTES_IN_PROGRESS: u64 = 54463;

/// Profile info carries rows before aggregation.
pub const WITH_ROWS_BEFORE_AGGREGATION: u64 = 54469;
