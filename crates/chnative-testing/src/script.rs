//! Scripted server responses.

use bytes::{BufMut, Bytes, BytesMut};
use chnative_protocol::codec::write_uvarint;
use chnative_protocol::revision::DEFAULT_REVISION;
use chnative_protocol::{
    Block, ProfileEvent, ProfileInfo, Progress, ServerException, ServerLog, ServerPacket,
    TableColumns,
};

use crate::fixtures;

/// Builder for the bytes a server sends in answer to a query.
///
/// Payloads are encoded with the protocol crate's encoders at the script's
/// revision, so a script is only meaningful to a client configured with the
/// same revision.
#[derive(Debug, Clone)]
pub struct ServerScript {
    revision: u64,
    buf: BytesMut,
}

impl Default for ServerScript {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerScript {
    /// Create an empty script at [`DEFAULT_REVISION`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_revision(DEFAULT_REVISION)
    }

    /// Create an empty script at the given revision.
    #[must_use]
    pub fn with_revision(revision: u64) -> Self {
        Self {
            revision,
            buf: BytesMut::new(),
        }
    }

    /// Revision payloads are encoded at.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Append a bare packet tag.
    #[must_use]
    pub fn tag(mut self, packet: ServerPacket) -> Self {
        write_uvarint(&mut self.buf, packet as u64);
        self
    }

    /// Append raw bytes, e.g. an unknown tag or a corrupt payload.
    #[must_use]
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.buf.put_slice(bytes);
        self
    }

    fn block(self, packet: ServerPacket, block: &Block) -> Self {
        let revision = self.revision;
        let mut script = self.tag(packet);
        block.encode(&mut script.buf, revision);
        script
    }

    /// Append a `Data` packet.
    #[must_use]
    pub fn data(self, block: &Block) -> Self {
        self.block(ServerPacket::Data, block)
    }

    /// Append a `Totals` packet.
    #[must_use]
    pub fn totals(self, block: &Block) -> Self {
        self.block(ServerPacket::Totals, block)
    }

    /// Append an `Extremes` packet.
    #[must_use]
    pub fn extremes(self, block: &Block) -> Self {
        self.block(ServerPacket::Extremes, block)
    }

    /// Append a `Log` packet carrying the given records.
    #[must_use]
    pub fn log(self, records: &[ServerLog]) -> Self {
        let block = fixtures::log_block(records);
        self.block(ServerPacket::Log, &block)
    }

    /// Append a `ProfileEvents` packet carrying the given counters.
    #[must_use]
    pub fn profile_events(self, events: &[ProfileEvent]) -> Self {
        let block = fixtures::profile_events_block(events);
        self.block(ServerPacket::ProfileEvents, &block)
    }

    /// Append a `Progress` packet.
    #[must_use]
    pub fn progress(mut self, progress: &Progress) -> Self {
        self = self.tag(ServerPacket::Progress);
        progress.encode(&mut self.buf, self.revision);
        self
    }

    /// Append a `ProfileInfo` packet.
    #[must_use]
    pub fn profile_info(mut self, info: &ProfileInfo) -> Self {
        self = self.tag(ServerPacket::ProfileInfo);
        info.encode(&mut self.buf, self.revision);
        self
    }

    /// Append a `TableColumns` packet.
    #[must_use]
    pub fn table_columns(mut self, columns: &TableColumns) -> Self {
        self = self.tag(ServerPacket::TableColumns);
        columns.encode(&mut self.buf);
        self
    }

    /// Append an `Exception` packet.
    #[must_use]
    pub fn exception(mut self, exception: &ServerException) -> Self {
        self = self.tag(ServerPacket::Exception);
        exception.encode(&mut self.buf);
        self
    }

    /// Append `EndOfStream`.
    #[must_use]
    pub fn end_of_stream(self) -> Self {
        self.tag(ServerPacket::EndOfStream)
    }

    /// Length of the script so far, in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if nothing has been appended yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Finish the script.
    #[must_use]
    pub fn build(self) -> Bytes {
        self.buf.freeze()
    }
}

impl From<ServerScript> for Bytes {
    fn from(script: ServerScript) -> Self {
        script.build()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_packets_decode_back_in_order() {
        let script = ServerScript::new()
            .progress(&Progress {
                rows: 5,
                ..Progress::default()
            })
            .data(&fixtures::rows_block(2))
            .end_of_stream();
        let revision = script.revision();
        let bytes = script.build();
        let mut src = &bytes[..];

        assert_eq!(src[0], ServerPacket::Progress as u8);
        src = &src[1..];
        assert_eq!(Progress::decode(&mut src, revision).unwrap().rows, 5);

        assert_eq!(src[0], ServerPacket::Data as u8);
        src = &src[1..];
        assert_eq!(Block::decode(&mut src, revision).unwrap().rows(), 2);

        assert_eq!(src, [ServerPacket::EndOfStream as u8]);
    }

    #[test]
    fn test_raw_is_verbatim() {
        let bytes = ServerScript::new().raw(&[0xEE, 0x01]).build();
        assert_eq!(&bytes[..], [0xEE, 0x01]);
    }
}
