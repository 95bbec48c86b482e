//! Server exception payloads.

use std::fmt;

use bytes::{Buf, BufMut};

use crate::codec::{read_bool, read_i32, read_string, write_bool, write_string};
use crate::error::ProtocolError;

/// Nesting depth past which a chain is considered malformed.
const MAX_NESTING: usize = 128;

/// An exception reported by the server, possibly wrapping a nested cause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerException {
    /// Server error code.
    pub code: i32,
    /// Exception class name, e.g. `DB::Exception`.
    pub name: String,
    /// Human-readable message.
    pub message: String,
    /// Server-side stack trace.
    pub stack_trace: String,
    /// The exception that caused this one.
    pub nested: Option<Box<ServerException>>,
}

impl ServerException {
    /// Create an exception without a nested cause.
    pub fn new(code: i32, name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            name: name.into(),
            message: message.into(),
            stack_trace: String::new(),
            nested: None,
        }
    }

    /// Attach a nested cause.
    #[must_use]
    pub fn with_nested(mut self, nested: ServerException) -> Self {
        self.nested = Some(Box::new(nested));
        self
    }

    /// Iterate over this exception and its nested causes, outermost first.
    pub fn chain(&self) -> impl Iterator<Item = &ServerException> {
        std::iter::successors(Some(self), |e| e.nested.as_deref())
    }

    /// Decode an exception chain.
    ///
    /// The wire layout is a flat sequence of records, each ending with a
    /// flag that says whether another (nested) record follows.
    pub fn decode(src: &mut impl Buf) -> Result<Self, ProtocolError> {
        let mut records = Vec::new();
        loop {
            if records.len() == MAX_NESTING {
                return Err(ProtocolError::invalid(
                    "exception",
                    format!("nesting deeper than {MAX_NESTING}"),
                ));
            }
            let record = Self {
                code: read_i32(src)?,
                name: read_string(src)?,
                message: read_string(src)?,
                stack_trace: read_string(src)?,
                nested: None,
            };
            let has_nested = read_bool(src)?;
            records.push(record);
            if !has_nested {
                break;
            }
        }

        let mut nested = None;
        while let Some(mut record) = records.pop() {
            record.nested = nested.map(Box::new);
            nested = Some(record);
        }
        nested.ok_or(ProtocolError::UnexpectedEof)
    }

    /// Encode the exception chain.
    pub fn encode(&self, dst: &mut impl BufMut) {
        for record in self.chain() {
            dst.put_i32_le(record.code);
            write_string(dst, &record.name);
            write_string(dst, &record.message);
            write_string(dst, &record.stack_trace);
            write_bool(dst, record.nested.is_some());
        }
    }
}

impl fmt::Display for ServerException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "code {}: {}: {}", self.code, self.name, self.message)
    }
}

impl std::error::Error for ServerException {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.nested
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bytes::BytesMut;
    use std::error::Error as _;

    #[test]
    fn test_nested_chain() {
        let exception = ServerException::new(60, "DB::Exception", "Table default.x does not exist")
            .with_nested(ServerException::new(1000, "Poco::Exception", "inner"));

        let mut buf = BytesMut::new();
        exception.encode(&mut buf);

        let mut src = &buf[..];
        let decoded = ServerException::decode(&mut src).unwrap();
        assert!(src.is_empty());
        assert_eq!(decoded, exception);
        assert_eq!(decoded.chain().count(), 2);
        assert_eq!(decoded.source().unwrap().to_string(), "code 1000: Poco::Exception: inner");
    }

    #[test]
    fn test_display() {
        let exception = ServerException::new(159, "DB::Exception", "Timeout exceeded");
        assert_eq!(exception.to_string(), "code 159: DB::Exception: Timeout exceeded");
    }

    #[test]
    fn test_truncated_is_incomplete() {
        let mut buf = BytesMut::new();
        ServerException::new(1, "a", "b").encode(&mut buf);
        let err = ServerException::decode(&mut &buf[..buf.len() - 1]).unwrap_err();
        assert!(err.is_incomplete());
    }
}
