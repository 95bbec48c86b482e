//! Packet tag definitions.
//!
//! Every packet on the wire starts with a one-byte tag. The values are fixed
//! by the server implementation and must match it exactly.

/// Packet tags a server may send while answering a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ServerPacket {
    /// A block of result rows (or a header block with zero rows).
    Data = 1,
    /// A server-side exception; ends the query.
    Exception = 2,
    /// Query progress counters.
    Progress = 3,
    /// No more packets will arrive for this query.
    EndOfStream = 5,
    /// Profiling summary for the query.
    ProfileInfo = 6,
    /// A block holding totals for `WITH TOTALS` queries.
    Totals = 7,
    /// A block holding extreme values.
    Extremes = 8,
    /// A block of server log records.
    Log = 10,
    /// Column descriptions of an external table.
    TableColumns = 11,
    /// A block of profile event counters.
    ProfileEvents = 14,
}

impl ServerPacket {
    /// Classify a raw tag byte. Unknown bytes yield `None`.
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Data),
            2 => Some(Self::Exception),
            3 => Some(Self::Progress),
            5 => Some(Self::EndOfStream),
            6 => Some(Self::ProfileInfo),
            7 => Some(Self::Totals),
            8 => Some(Self::Extremes),
            10 => Some(Self::Log),
            11 => Some(Self::TableColumns),
            14 => Some(Self::ProfileEvents),
            _ => None,
        }
    }

    /// Check if the payload of this packet is a data block.
    #[must_use]
    pub fn is_block(self) -> bool {
        matches!(self, Self::Data | Self::Totals | Self::Extremes)
    }

    /// Short name used in log output.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Data => "data",
            Self::Exception => "exception",
            Self::Progress => "progress",
            Self::EndOfStream => "end of stream",
            Self::ProfileInfo => "profile info",
            Self::Totals => "totals",
            Self::Extremes => "extremes",
            Self::Log => "log",
            Self::TableColumns => "table columns",
            Self::ProfileEvents => "profile events",
        }
    }
}

/// Packet tags the response processor sends to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ClientPacket {
    /// Ask the server to stop executing the current query.
    Cancel = 3,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_u8_matches_discriminants() {
        for tag in [
            ServerPacket::Data,
            ServerPacket::Exception,
            ServerPacket::Progress,
            ServerPacket::EndOfStream,
            ServerPacket::ProfileInfo,
            ServerPacket::Totals,
            ServerPacket::Extremes,
            ServerPacket::Log,
            ServerPacket::TableColumns,
            ServerPacket::ProfileEvents,
        ] {
            assert_eq!(ServerPacket::from_u8(tag as u8), Some(tag));
        }
    }

    #[test]
    fn test_unknown_tags() {
        // Hello, Pong and the tags past ProfileEvents are outside this vocabulary.
        for byte in [0u8, 4, 9, 12, 13, 15, 0x7F, 0xFF] {
            assert_eq!(ServerPacket::from_u8(byte), None, "byte {byte}");
        }
    }

    #[test]
    fn test_block_packets() {
        assert!(ServerPacket::Data.is_block());
        assert!(ServerPacket::Totals.is_block());
        assert!(ServerPacket::Extremes.is_block());
        assert!(!ServerPacket::Log.is_block());
        assert!(!ServerPacket::ProfileEvents.is_block());
    }
}
