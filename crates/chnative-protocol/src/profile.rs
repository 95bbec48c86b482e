//! Profiling payloads: the per-query summary and the profile event counters.

use std::fmt;

use bytes::{Buf, BufMut};

use crate::block::{Block, i64_at, str_at, u64_at};
use crate::codec::{read_bool, read_uvarint, write_bool, write_uvarint};
use crate::error::ProtocolError;
use crate::revision;

/// Summary of the work a query did, sent once near the end of the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProfileInfo {
    /// Rows produced.
    pub rows: u64,
    /// Blocks produced.
    pub blocks: u64,
    /// Bytes produced.
    pub bytes: u64,
    /// Whether a `LIMIT` was applied.
    pub applied_limit: bool,
    /// Rows that would have been produced without the `LIMIT`.
    pub rows_before_limit: u64,
    /// Whether `rows_before_limit` was actually computed.
    pub calculated_rows_before_limit: bool,
    /// Whether aggregation was applied.
    pub applied_aggregation: bool,
    /// Rows that entered aggregation.
    pub rows_before_aggregation: u64,
}

impl ProfileInfo {
    /// Decode a profile info payload at the given protocol revision.
    pub fn decode(src: &mut impl Buf, revision: u64) -> Result<Self, ProtocolError> {
        let mut info = Self {
            rows: read_uvarint(src)?,
            blocks: read_uvarint(src)?,
            bytes: read_uvarint(src)?,
            applied_limit: read_bool(src)?,
            rows_before_limit: read_uvarint(src)?,
            calculated_rows_before_limit: read_bool(src)?,
            ..Self::default()
        };
        if revision >= revision::WITH_ROWS_BEFORE_AGGREGATION {
            info.applied_aggregation = read_bool(src)?;
            info.rows_before_aggregation = read_uvarint(src)?;
        }
        Ok(info)
    }

    /// Encode the profile info payload at the given protocol revision.
    pub fn encode(&self, dst: &mut impl BufMut, revision: u64) {
        write_uvarint(dst, self.rows);
        write_uvarint(dst, self.blocks);
        write_uvarint(dst, self.bytes);
        write_bool(dst, self.applied_limit);
        write_uvarint(dst, self.rows_before_limit);
        write_bool(dst, self.calculated_rows_before_limit);
        if revision >= revision::WITH_ROWS_BEFORE_AGGREGATION {
            write_bool(dst, self.applied_aggregation);
            write_uvarint(dst, self.rows_before_aggregation);
        }
    }
}

impl fmt::Display for ProfileInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rows={}, blocks={}, bytes={}, rows before limit={}, applied limit={}, calculated rows before limit={}",
            self.rows,
            self.blocks,
            self.bytes,
            self.rows_before_limit,
            self.applied_limit,
            self.calculated_rows_before_limit
        )
    }
}

/// Kind of a profile event counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileEventKind {
    /// A monotonically increasing counter; the value is a delta.
    Increment,
    /// A point-in-time gauge.
    Gauge,
}

impl ProfileEventKind {
    fn from_i64(value: i64) -> Result<Self, ProtocolError> {
        match value {
            1 => Ok(Self::Increment),
            2 => Ok(Self::Gauge),
            other => Err(ProtocolError::invalid(
                "type",
                format!("unknown profile event type {other}"),
            )),
        }
    }

    /// Wire discriminant of the kind.
    #[must_use]
    pub fn as_i8(self) -> i8 {
        match self {
            Self::Increment => 1,
            Self::Gauge => 2,
        }
    }
}

/// One profile event counter reported by a server thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileEvent {
    /// Reporting host.
    pub host_name: String,
    /// Report time, seconds since the Unix epoch.
    pub current_time: u64,
    /// Reporting thread.
    pub thread_id: u64,
    /// Counter kind.
    pub kind: ProfileEventKind,
    /// Counter name, e.g. `SelectedRows`.
    pub name: String,
    /// Counter value.
    pub value: i64,
}

impl ProfileEvent {
    /// Column names and types of a profile events block.
    pub const COLUMNS: [(&'static str, &'static str); 6] = [
        ("host_name", "String"),
        ("current_time", "DateTime"),
        ("thread_id", "UInt64"),
        ("type", "Enum8('increment' = 1, 'gauge' = 2)"),
        ("name", "String"),
        ("value", "Int64"),
    ];

    /// Convert a profile events block into one record per row.
    pub fn from_block(block: &Block) -> Result<Vec<Self>, ProtocolError> {
        let host_name = block.require("host_name")?;
        let current_time = block.require("current_time")?;
        let thread_id = block.require("thread_id")?;
        let kind = block.require("type")?;
        let name = block.require("name")?;
        let value = block.require("value")?;

        (0..block.rows())
            .map(|row| {
                Ok(Self {
                    host_name: str_at(host_name, "host_name", row)?.to_string(),
                    current_time: u64_at(current_time, "current_time", row)?,
                    thread_id: u64_at(thread_id, "thread_id", row)?,
                    kind: ProfileEventKind::from_i64(i64_at(kind, "type", row)?)?,
                    name: str_at(name, "name", row)?.to_string(),
                    value: i64_at(value, "value", row)?,
                })
            })
            .collect()
    }
}
