//! Progress payloads.

use std::fmt;
use std::time::Duration;

use bytes::{Buf, BufMut};

use crate::codec::{read_uvarint, write_uvarint};
use crate::error::ProtocolError;
use crate::revision;

/// Incremental query progress.
///
/// Counters are deltas since the previous progress packet, not running
/// totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    /// Rows read.
    pub rows: u64,
    /// Bytes read.
    pub bytes: u64,
    /// Estimated total rows to read.
    pub total_rows: u64,
    /// Estimated total bytes to read.
    pub total_bytes: u64,
    /// Rows written.
    pub wrote_rows: u64,
    /// Bytes written.
    pub wrote_bytes: u64,
    /// Server-side elapsed time.
    pub elapsed: Duration,
}

impl Progress {
    /// Decode a progress payload at the given protocol revision.
    pub fn decode(src: &mut impl Buf, revision: u64) -> Result<Self, ProtocolError> {
        let mut progress = Self {
            rows: read_uvarint(src)?,
            bytes: read_uvarint(src)?,
            ..Self::default()
        };
        if revision >= revision::WITH_TOTAL_ROWS_IN_PROGRESS {
            progress.total_rows = read_uvarint(src)?;
        }
        if revision >= revision::WITH_TOTAL_BYTES_IN_PROGRESS {
            progress.total_bytes = read_uvarint(src)?;
        }
        if revision >= revision::WITH_CLIENT_WRITE_INFO {
            progress.wrote_rows = read_uvarint(src)?;
            progress.wrote_bytes = read_uvarint(src)?;
        }
        if revision >= revision::WITH_SERVER_QUERY_TIME_IN_PROGRESS {
            progress.elapsed = Duration::from_nanos(read_uvarint(src)?);
        }
        Ok(progress)
    }

    /// Encode the progress payload at the given protocol revision.
    pub fn encode(&self, dst: &mut impl BufMut, revision: u64) {
        write_uvarint(dst, self.rows);
        write_uvarint(dst, self.bytes);
        if revision >= revision::WITH_TOTAL_ROWS_IN_PROGRESS {
            write_uvarint(dst, self.total_rows);
        }
        if revision >= revision::WITH_TOTAL_BYTES_IN_PROGRESS {
            write_uvarint(dst, self.total_bytes);
        }
        if revision >= revision::WITH_CLIENT_WRITE_INFO {
            write_uvarint(dst, self.wrote_rows);
            write_uvarint(dst, self.wrote_bytes);
        }
        if revision >= revision::WITH_SERVER_QUERY_TIME_IN_PROGRESS {
            write_uvarint(dst, u64::try_from(self.elapsed.as_nanos()).unwrap_or(u64::MAX));
        }
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rows={}, bytes={}, total rows={}, wrote rows={}, wrote bytes={}, elapsed={:?}",
            self.rows, self.bytes, self.total_rows, self.wrote_rows, self.wrote_bytes, self.elapsed
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn test_fields_gated_by_revision() {
        let mut buf = BytesMut::new();
        write_uvarint(&mut buf, 10);
        write_uvarint(&mut buf, 800);
        write_uvarint(&mut buf, 100);
        write_uvarint(&mut buf, 0);
        write_uvarint(&mut buf, 0);
        write_uvarint(&mut buf, 1_500_000);

        let mut src = &buf[..];
        let progress = Progress::decode(&mut src, revision::WITH_SERVER_QUERY_TIME_IN_PROGRESS).unwrap();
        assert!(src.is_empty());
        assert_eq!(progress.rows, 10);
        assert_eq!(progress.total_rows, 100);
        assert_eq!(progress.total_bytes, 0);
        assert_eq!(progress.elapsed, Duration::from_micros(1500));
    }

    #[test]
    fn test_total_bytes_revision() {
        let progress = Progress {
            rows: 1,
            bytes: 2,
            total_rows: 3,
            total_bytes: 4,
            wrote_rows: 5,
            wrote_bytes: 6,
            elapsed: Duration::from_nanos(7),
        };
        let mut buf = BytesMut::new();
        progress.encode(&mut buf, revision::WITH_TOTAL_BYTES_IN_PROGRESS);
        assert_eq!(buf.len(), 7);
        let decoded =
            Progress::decode(&mut &buf[..], revision::WITH_TOTAL_BYTES_IN_PROGRESS).unwrap();
        assert_eq!(decoded, progress);
    }

    #[test]
    fn test_old_revision_reads_two_fields() {
        let src = [1u8, 2, 9];
        let mut cursor = &src[..];
        let progress = Progress::decode(&mut cursor, 50000).unwrap();
        assert_eq!((progress.rows, progress.bytes), (1, 2));
        assert_eq!(cursor, &[9]);
    }
}
