//! Canned blocks and records.

use chnative_protocol::{Block, Column, ColumnData, ProfileEvent, ProfileEventKind, ServerLog};

/// A two-column block (`number UInt64`, `name String`) with `rows` rows.
#[must_use]
pub fn rows_block(rows: usize) -> Block {
    let numbers = (0..rows as u64).collect();
    let names = (0..rows).map(|i| format!("row-{i}")).collect();
    block(vec![
        Column::new("number", "UInt64", ColumnData::UInt64(numbers)),
        Column::new("name", "String", ColumnData::String(names)),
    ])
}

/// The zero-row block a server sends first to describe the result schema.
#[must_use]
pub fn header_block() -> Block {
    rows_block(0)
}

/// Encode log records the way the server ships them.
#[must_use]
pub fn log_block(records: &[ServerLog]) -> Block {
    let col = |name: &str, data: ColumnData| {
        let type_name = ServerLog::COLUMNS
            .iter()
            .find(|(n, _)| *n == name)
            .map_or("String", |(_, t)| *t);
        Column::new(name, type_name, data)
    };
    block(vec![
        col(
            "event_time",
            ColumnData::DateTime(records.iter().map(|r| r.time as u32).collect()),
        ),
        col(
            "event_time_microseconds",
            ColumnData::UInt32(records.iter().map(|r| r.time_micros as u32).collect()),
        ),
        col(
            "host_name",
            ColumnData::String(records.iter().map(|r| r.host.clone()).collect()),
        ),
        col(
            "query_id",
            ColumnData::String(records.iter().map(|r| r.query_id.clone()).collect()),
        ),
        col(
            "thread_id",
            ColumnData::UInt64(records.iter().map(|r| r.thread_id).collect()),
        ),
        col(
            "priority",
            ColumnData::Int8(records.iter().map(|r| r.priority as i8).collect()),
        ),
        col(
            "source",
            ColumnData::String(records.iter().map(|r| r.source.clone()).collect()),
        ),
        col(
            "text",
            ColumnData::String(records.iter().map(|r| r.text.clone()).collect()),
        ),
    ])
}

/// Encode profile events the way the server ships them.
#[must_use]
pub fn profile_events_block(events: &[ProfileEvent]) -> Block {
    let col = |name: &str, data: ColumnData| {
        let type_name = ProfileEvent::COLUMNS
            .iter()
            .find(|(n, _)| *n == name)
            .map_or("String", |(_, t)| *t);
        Column::new(name, type_name, data)
    };
    block(vec![
        col(
            "host_name",
            ColumnData::String(events.iter().map(|e| e.host_name.clone()).collect()),
        ),
        col(
            "current_time",
            ColumnData::DateTime(events.iter().map(|e| e.current_time as u32).collect()),
        ),
        col(
            "thread_id",
            ColumnData::UInt64(events.iter().map(|e| e.thread_id).collect()),
        ),
        col(
            "type",
            ColumnData::Enum8(events.iter().map(|e| e.kind.as_i8()).collect()),
        ),
        col(
            "name",
            ColumnData::String(events.iter().map(|e| e.name.clone()).collect()),
        ),
        col(
            "value",
            ColumnData::Int64(events.iter().map(|e| e.value).collect()),
        ),
    ])
}

/// A log record with the given text.
#[must_use]
pub fn log_record(text: &str) -> ServerLog {
    ServerLog {
        time: 1_700_000_000,
        time_micros: 250_000,
        host: "clickhouse-01".into(),
        query_id: "3b0f4c1e-test".into(),
        thread_id: 4242,
        priority: 6,
        source: "executeQuery".into(),
        text: text.into(),
    }
}

/// An increment counter with the given name and value.
#[must_use]
pub fn profile_event(name: &str, value: i64) -> ProfileEvent {
    ProfileEvent {
        host_name: "clickhouse-01".into(),
        current_time: 1_700_000_000,
        thread_id: 4242,
        kind: ProfileEventKind::Increment,
        name: name.into(),
        value,
    }
}

// Fixture columns always have matching lengths.
#[allow(clippy::expect_used)]
fn block(columns: Vec<Column>) -> Block {
    Block::new(columns).expect("fixture columns have equal lengths")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_log_block_converts_back() {
        let records = vec![log_record("Read 3 rows"), log_record("Peak memory usage")];
        let block = log_block(&records);
        assert_eq!(ServerLog::from_block(&block).unwrap(), records);
    }

    #[test]
    fn test_profile_events_block_converts_back() {
        let events = vec![profile_event("SelectedRows", 3)];
        let block = profile_events_block(&events);
        assert_eq!(ProfileEvent::from_block(&block).unwrap(), events);
    }

    #[test]
    fn test_header_block_is_empty() {
        let header = header_block();
        assert_eq!(header.rows(), 0);
        assert_eq!(header.columns().len(), 2);
    }
}
