//! Table column description payloads.

use bytes::{Buf, BufMut};

use crate::codec::{read_string, write_string};
use crate::error::ProtocolError;

/// Column description of an external table, sent ahead of `INSERT` data.
///
/// The response processor only decodes it to stay aligned with the stream.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableColumns {
    /// External table name.
    pub table: String,
    /// Serialized column list.
    pub description: String,
}

impl TableColumns {
    /// Decode a table columns payload.
    pub fn decode(src: &mut impl Buf) -> Result<Self, ProtocolError> {
        Ok(Self {
            table: read_string(src)?,
            description: read_string(src)?,
        })
    }

    /// Encode the table columns payload.
    pub fn encode(&self, dst: &mut impl BufMut) {
        write_string(dst, &self.table);
        write_string(dst, &self.description);
    }
}
