//! Codec utilities for native protocol encoding and decoding.
//!
//! Fixed-width integers are little-endian, unsigned varints are LEB128,
//! booleans are a single byte and strings are a varint byte length followed
//! by UTF-8 data. Every reader checks `remaining()` first so a short source
//! surfaces as [`ProtocolError::UnexpectedEof`] instead of a panic.

use bytes::{Buf, BufMut};

use crate::error::ProtocolError;

/// Longest legal encoding of a `u64` varint.
pub const MAX_VARINT_LEN: usize = 10;

#[inline]
fn ensure(src: &impl Buf, n: usize) -> Result<(), ProtocolError> {
    if src.remaining() < n {
        return Err(ProtocolError::UnexpectedEof);
    }
    Ok(())
}

/// Read an unsigned LEB128 varint.
pub fn read_uvarint(src: &mut impl Buf) -> Result<u64, ProtocolError> {
    let mut value = 0u64;
    for i in 0..MAX_VARINT_LEN {
        ensure(src, 1)?;
        let byte = src.get_u8();
        if i == MAX_VARINT_LEN - 1 && byte > 1 {
            return Err(ProtocolError::VarintOverflow);
        }
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(ProtocolError::VarintOverflow)
}

/// Read a varint and convert it to a `usize` length.
pub fn read_len(src: &mut impl Buf) -> Result<usize, ProtocolError> {
    let len = read_uvarint(src)?;
    usize::try_from(len).map_err(|_| ProtocolError::LengthOutOfRange(len))
}

/// Read a single-byte boolean.
pub fn read_bool(src: &mut impl Buf) -> Result<bool, ProtocolError> {
    ensure(src, 1)?;
    Ok(src.get_u8() != 0)
}

/// Read a single byte.
pub fn read_u8(src: &mut impl Buf) -> Result<u8, ProtocolError> {
    ensure(src, 1)?;
    Ok(src.get_u8())
}

/// Read a little-endian `i32`.
pub fn read_i32(src: &mut impl Buf) -> Result<i32, ProtocolError> {
    ensure(src, 4)?;
    Ok(src.get_i32_le())
}

/// Read a varint-length-prefixed UTF-8 string.
pub fn read_string(src: &mut impl Buf) -> Result<String, ProtocolError> {
    let bytes = read_bytes(src)?;
    String::from_utf8(bytes).map_err(|e| ProtocolError::invalid("string", e.to_string()))
}

/// Read a varint-length-prefixed byte string.
pub fn read_bytes(src: &mut impl Buf) -> Result<Vec<u8>, ProtocolError> {
    let len = read_len(src)?;
    ensure(src, len)?;
    let mut bytes = vec![0u8; len];
    src.copy_to_slice(&mut bytes);
    Ok(bytes)
}

/// Write an unsigned LEB128 varint.
pub fn write_uvarint(dst: &mut impl BufMut, mut value: u64) {
    while value >= 0x80 {
        dst.put_u8((value as u8) | 0x80);
        value >>= 7;
    }
    dst.put_u8(value as u8);
}

/// Write a single-byte boolean.
pub fn write_bool(dst: &mut impl BufMut, value: bool) {
    dst.put_u8(u8::from(value));
}

/// Write a varint-length-prefixed string.
pub fn write_string(dst: &mut impl BufMut, s: &str) {
    write_uvarint(dst, s.len() as u64);
    dst.put_slice(s.as_bytes());
}

/// Number of bytes `value` occupies as a varint.
#[must_use]
pub fn uvarint_len(mut value: u64) -> usize {
    let mut len = 1;
    while value >= 0x80 {
        value >>= 7;
        len += 1;
    }
    len
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bytes::BytesMut;
    use proptest::prelude::*;

    #[test]
    fn test_uvarint_known_encodings() {
        let mut buf = BytesMut::new();
        write_uvarint(&mut buf, 300);
        assert_eq!(&buf[..], &[0xAC, 0x02]);
        assert_eq!(uvarint_len(300), 2);

        let mut src = &buf[..];
        assert_eq!(read_uvarint(&mut src).unwrap(), 300);
        assert!(src.is_empty());
    }

    #[test]
    fn test_uvarint_max_value() {
        let mut buf = BytesMut::new();
        write_uvarint(&mut buf, u64::MAX);
        assert_eq!(buf.len(), MAX_VARINT_LEN);
        assert_eq!(read_uvarint(&mut &buf[..]).unwrap(), u64::MAX);
    }

    #[test]
    fn test_uvarint_overflow() {
        let src = [0xFFu8; 11];
        assert_eq!(read_uvarint(&mut &src[..]), Err(ProtocolError::VarintOverflow));
    }

    #[test]
    fn test_truncated_string_is_incomplete() {
        let mut buf = BytesMut::new();
        write_string(&mut buf, "hello");
        let err = read_string(&mut &buf[..4]).unwrap_err();
        assert!(err.is_incomplete());
    }

    #[test]
    fn test_invalid_utf8_is_not_incomplete() {
        let src = [2u8, 0xC3, 0x28];
        let err = read_string(&mut &src[..]).unwrap_err();
        assert!(!err.is_incomplete());
    }

    proptest! {
        #[test]
        fn uvarint_never_panics(data in proptest::collection::vec(any::<u8>(), 0..16)) {
            let _ = read_uvarint(&mut &data[..]);
        }

        #[test]
        fn uvarint_prefix_is_incomplete(value in any::<u64>()) {
            let mut buf = BytesMut::new();
            write_uvarint(&mut buf, value);
            for cut in 0..buf.len() {
                prop_assert_eq!(read_uvarint(&mut &buf[..cut]), Err(ProtocolError::UnexpectedEof));
            }
        }
    }
}
