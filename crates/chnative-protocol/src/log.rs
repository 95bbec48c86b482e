//! Server log records.

use crate::block::{Block, i64_at, str_at, u64_at};
use crate::error::ProtocolError;

/// One log line emitted by the server while executing the query.
///
/// Log records are shipped as a block; see [`ServerLog::from_block`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerLog {
    /// Event time, seconds since the Unix epoch.
    pub time: u64,
    /// Microsecond part of the event time.
    pub time_micros: u64,
    /// Reporting host.
    pub host: String,
    /// Query the record belongs to.
    pub query_id: String,
    /// Reporting thread.
    pub thread_id: u64,
    /// Log priority, 1 (fatal) through 8 (trace).
    pub priority: i64,
    /// Logger name.
    pub source: String,
    /// Message text.
    pub text: String,
}

impl ServerLog {
    /// Column names and types of a log block.
    pub const COLUMNS: [(&'static str, &'static str); 8] = [
        ("event_time", "DateTime"),
        ("event_time_microseconds", "UInt32"),
        ("host_name", "String"),
        ("query_id", "String"),
        ("thread_id", "UInt64"),
        ("priority", "Int8"),
        ("source", "String"),
        ("text", "String"),
    ];

    /// Convert a log block into one record per row.
    pub fn from_block(block: &Block) -> Result<Vec<Self>, ProtocolError> {
        let time = block.require("event_time")?;
        let micros = block.require("event_time_microseconds")?;
        let host = block.require("host_name")?;
        let query_id = block.require("query_id")?;
        let thread_id = block.require("thread_id")?;
        let priority = block.require("priority")?;
        let source = block.require("source")?;
        let text = block.require("text")?;

        (0..block.rows())
            .map(|row| {
                Ok(Self {
                    time: u64_at(time, "event_time", row)?,
                    time_micros: u64_at(micros, "event_time_microseconds", row)?,
                    host: str_at(host, "host_name", row)?.to_string(),
                    query_id: str_at(query_id, "query_id", row)?.to_string(),
                    thread_id: u64_at(thread_id, "thread_id", row)?,
                    priority: i64_at(priority, "priority", row)?,
                    source: str_at(source, "source", row)?.to_string(),
                    text: str_at(text, "text", row)?.to_string(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::block::{Column, ColumnData};

    fn log_block(priority: ColumnData) -> Block {
        Block::new(vec![
            Column::new("event_time", "DateTime", ColumnData::DateTime(vec![1_700_000_000])),
            Column::new("event_time_microseconds", "UInt32", ColumnData::UInt32(vec![42])),
            Column::new("host_name", "String", ColumnData::String(vec!["node-1".into()])),
            Column::new("query_id", "String", ColumnData::String(vec!["q1".into()])),
            Column::new("thread_id", "UInt64", ColumnData::UInt64(vec![77])),
            Column::new("priority", "Int8", priority),
            Column::new("source", "String", ColumnData::String(vec!["executeQuery".into()])),
            Column::new("text", "String", ColumnData::String(vec!["Read 3 rows".into()])),
        ])
        .unwrap()
    }

    #[test]
    fn test_from_block() {
        let logs = ServerLog::from_block(&log_block(ColumnData::Int8(vec![6]))).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].host, "node-1");
        assert_eq!(logs[0].priority, 6);
        assert_eq!(logs[0].time_micros, 42);
        assert_eq!(logs[0].text, "Read 3 rows");
    }

    #[test]
    fn test_mistyped_column() {
        let err = ServerLog::from_block(&log_block(ColumnData::String(vec!["x".into()]))).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidField { field: "priority", .. }));
    }
}
