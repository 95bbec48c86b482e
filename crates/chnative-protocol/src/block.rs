//! Data block payloads.
//!
//! `Data`, `Totals`, `Extremes`, `Log` and `ProfileEvents` packets all carry
//! a block: an optional temporary table name, a block info header, the
//! column and row counts, then every column in turn as name, type name and
//! column-major values.
//!
//! Only the plain fixed-width numeric types, `String`, `DateTime` and
//! `Enum8` are implemented here. Anything else is rejected with
//! [`ProtocolError::UnsupportedColumnType`] rather than guessed at, since a
//! wrong guess would desynchronize the stream.

use bytes::{Buf, BufMut};

use crate::codec::{
    read_bool, read_i32, read_len, read_string, read_u8, read_uvarint, write_bool, write_string,
    write_uvarint,
};
use crate::error::ProtocolError;
use crate::revision;

/// Upper bound on speculative allocations driven by wire-supplied counts.
const MAX_PREALLOC: usize = 4096;

/// Block info header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    /// Set on the block of rows that overflowed `max_rows_to_group_by`.
    pub is_overflows: bool,
    /// Bucket number for two-level aggregation, `-1` when unused.
    pub bucket_num: i32,
}

impl Default for BlockInfo {
    fn default() -> Self {
        Self {
            is_overflows: false,
            bucket_num: -1,
        }
    }
}

impl BlockInfo {
    /// Decode a field-numbered block info header.
    pub fn decode(src: &mut impl Buf) -> Result<Self, ProtocolError> {
        let mut info = Self::default();
        loop {
            match read_uvarint(src)? {
                0 => return Ok(info),
                1 => info.is_overflows = read_bool(src)?,
                2 => info.bucket_num = read_i32(src)?,
                other => {
                    return Err(ProtocolError::invalid(
                        "block info",
                        format!("unknown field number {other}"),
                    ));
                }
            }
        }
    }

    /// Encode the block info header.
    pub fn encode(&self, dst: &mut impl BufMut) {
        write_uvarint(dst, 1);
        write_bool(dst, self.is_overflows);
        write_uvarint(dst, 2);
        dst.put_i32_le(self.bucket_num);
        write_uvarint(dst, 0);
    }
}

/// Column values, stored column-major.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    /// `UInt8` values.
    UInt8(Vec<u8>),
    /// `UInt16` values.
    UInt16(Vec<u16>),
    /// `UInt32` values.
    UInt32(Vec<u32>),
    /// `UInt64` values.
    UInt64(Vec<u64>),
    /// `Int8` values.
    Int8(Vec<i8>),
    /// `Int16` values.
    Int16(Vec<i16>),
    /// `Int32` values.
    Int32(Vec<i32>),
    /// `Int64` values.
    Int64(Vec<i64>),
    /// `Float32` values.
    Float32(Vec<f32>),
    /// `Float64` values.
    Float64(Vec<f64>),
    /// `String` values.
    String(Vec<String>),
    /// `DateTime` values as seconds since the Unix epoch.
    DateTime(Vec<u32>),
    /// `Enum8(...)` values as their underlying discriminants.
    Enum8(Vec<i8>),
}

fn read_fixed<B, T>(
    src: &mut B,
    rows: usize,
    width: usize,
    get: impl Fn(&mut B) -> T,
) -> Result<Vec<T>, ProtocolError>
where
    B: Buf,
{
    let len = rows
        .checked_mul(width)
        .ok_or(ProtocolError::LengthOutOfRange(rows as u64))?;
    if src.remaining() < len {
        return Err(ProtocolError::UnexpectedEof);
    }
    Ok((0..rows).map(|_| get(src)).collect())
}

impl ColumnData {
    /// Decode `rows` values of the named column type.
    pub fn decode<B: Buf>(src: &mut B, type_name: &str, rows: usize) -> Result<Self, ProtocolError> {
        let data = match type_name {
            "UInt8" => Self::UInt8(read_fixed(src, rows, 1, |b| b.get_u8())?),
            "UInt16" => Self::UInt16(read_fixed(src, rows, 2, |b| b.get_u16_le())?),
            "UInt32" => Self::UInt32(read_fixed(src, rows, 4, |b| b.get_u32_le())?),
            "UInt64" => Self::UInt64(read_fixed(src, rows, 8, |b| b.get_u64_le())?),
            "Int8" => Self::Int8(read_fixed(src, rows, 1, |b| b.get_i8())?),
            "Int16" => Self::Int16(read_fixed(src, rows, 2, |b| b.get_i16_le())?),
            "Int32" => Self::Int32(read_fixed(src, rows, 4, |b| b.get_i32_le())?),
            "Int64" => Self::Int64(read_fixed(src, rows, 8, |b| b.get_i64_le())?),
            "Float32" => Self::Float32(read_fixed(src, rows, 4, |b| b.get_f32_le())?),
            "Float64" => Self::Float64(read_fixed(src, rows, 8, |b| b.get_f64_le())?),
            "String" => {
                let mut values = Vec::with_capacity(rows.min(MAX_PREALLOC));
                for _ in 0..rows {
                    values.push(read_string(src)?);
                }
                Self::String(values)
            }
            t if t == "DateTime" || t.starts_with("DateTime(") => {
                Self::DateTime(read_fixed(src, rows, 4, |b| b.get_u32_le())?)
            }
            t if t.starts_with("Enum8(") => Self::Enum8(read_fixed(src, rows, 1, |b| b.get_i8())?),
            other => return Err(ProtocolError::UnsupportedColumnType(other.to_string())),
        };
        Ok(data)
    }

    /// Encode the column values.
    pub fn encode(&self, dst: &mut impl BufMut) {
        match self {
            Self::UInt8(v) => dst.put_slice(v),
            Self::UInt16(v) => v.iter().for_each(|x| dst.put_u16_le(*x)),
            Self::UInt32(v) | Self::DateTime(v) => v.iter().for_each(|x| dst.put_u32_le(*x)),
            Self::UInt64(v) => v.iter().for_each(|x| dst.put_u64_le(*x)),
            Self::Int8(v) | Self::Enum8(v) => v.iter().for_each(|x| dst.put_i8(*x)),
            Self::Int16(v) => v.iter().for_each(|x| dst.put_i16_le(*x)),
            Self::Int32(v) => v.iter().for_each(|x| dst.put_i32_le(*x)),
            Self::Int64(v) => v.iter().for_each(|x| dst.put_i64_le(*x)),
            Self::Float32(v) => v.iter().for_each(|x| dst.put_f32_le(*x)),
            Self::Float64(v) => v.iter().for_each(|x| dst.put_f64_le(*x)),
            Self::String(v) => v.iter().for_each(|s| write_string(dst, s)),
        }
    }

    /// Number of values in the column.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::UInt8(v) => v.len(),
            Self::UInt16(v) => v.len(),
            Self::UInt32(v) | Self::DateTime(v) => v.len(),
            Self::UInt64(v) => v.len(),
            Self::Int8(v) | Self::Enum8(v) => v.len(),
            Self::Int16(v) => v.len(),
            Self::Int32(v) => v.len(),
            Self::Int64(v) => v.len(),
            Self::Float32(v) => v.len(),
            Self::Float64(v) => v.len(),
            Self::String(v) => v.len(),
        }
    }

    /// Check if the column holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read an unsigned integer or `DateTime` value, widened to `u64`.
    #[must_use]
    pub fn get_u64(&self, row: usize) -> Option<u64> {
        match self {
            Self::UInt8(v) => v.get(row).map(|x| u64::from(*x)),
            Self::UInt16(v) => v.get(row).map(|x| u64::from(*x)),
            Self::UInt32(v) | Self::DateTime(v) => v.get(row).map(|x| u64::from(*x)),
            Self::UInt64(v) => v.get(row).copied(),
            _ => None,
        }
    }

    /// Read a signed integer or `Enum8` value, widened to `i64`.
    #[must_use]
    pub fn get_i64(&self, row: usize) -> Option<i64> {
        match self {
            Self::Int8(v) | Self::Enum8(v) => v.get(row).map(|x| i64::from(*x)),
            Self::Int16(v) => v.get(row).map(|x| i64::from(*x)),
            Self::Int32(v) => v.get(row).map(|x| i64::from(*x)),
            Self::Int64(v) => v.get(row).copied(),
            _ => None,
        }
    }

    /// Read a `String` value.
    #[must_use]
    pub fn get_str(&self, row: usize) -> Option<&str> {
        match self {
            Self::String(v) => v.get(row).map(String::as_str),
            _ => None,
        }
    }
}

pub(crate) fn u64_at(data: &ColumnData, field: &'static str, row: usize) -> Result<u64, ProtocolError> {
    data.get_u64(row)
        .ok_or_else(|| ProtocolError::invalid(field, "expected an unsigned integer column"))
}

pub(crate) fn i64_at(data: &ColumnData, field: &'static str, row: usize) -> Result<i64, ProtocolError> {
    data.get_i64(row)
        .ok_or_else(|| ProtocolError::invalid(field, "expected a signed integer column"))
}

pub(crate) fn str_at<'a>(
    data: &'a ColumnData,
    field: &'static str,
    row: usize,
) -> Result<&'a str, ProtocolError> {
    data.get_str(row)
        .ok_or_else(|| ProtocolError::invalid(field, "expected a String column"))
}

/// A named, typed block column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Server type name, e.g. `UInt64` or `DateTime('UTC')`.
    pub type_name: String,
    /// Column values.
    pub data: ColumnData,
}

impl Column {
    /// Create a new column.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            data,
        }
    }
}

/// A columnar chunk of query results.
///
/// A block with zero rows is legal and common: the first block of every
/// `SELECT` is a header that only carries the result schema.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    /// Temporary table name, empty for ordinary results.
    pub table_name: String,
    /// Block info header.
    pub info: BlockInfo,
    columns: Vec<Column>,
    rows: usize,
}

impl Block {
    /// Build a block from columns, checking they all have the same length.
    pub fn new(columns: Vec<Column>) -> Result<Self, ProtocolError> {
        let rows = columns.first().map_or(0, |c| c.data.len());
        if let Some(bad) = columns.iter().find(|c| c.data.len() != rows) {
            return Err(ProtocolError::invalid(
                "block",
                format!(
                    "column {:?} has {} rows, expected {rows}",
                    bad.name,
                    bad.data.len()
                ),
            ));
        }
        Ok(Self {
            table_name: String::new(),
            info: BlockInfo::default(),
            columns,
            rows,
        })
    }

    /// Number of rows in the block.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// The block's columns.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Look a column up by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Look up a column that a typed view of this block cannot do without.
    pub(crate) fn require(&self, name: &'static str) -> Result<&ColumnData, ProtocolError> {
        self.column(name)
            .map(|c| &c.data)
            .ok_or(ProtocolError::MissingColumn(name))
    }

    /// Decode a block payload at the given protocol revision.
    pub fn decode(src: &mut impl Buf, revision: u64) -> Result<Self, ProtocolError> {
        let table_name = if revision >= revision::WITH_TEMPORARY_TABLES {
            read_string(src)?
        } else {
            String::new()
        };
        let info = if revision >= revision::WITH_BLOCK_INFO {
            BlockInfo::decode(src)?
        } else {
            BlockInfo::default()
        };

        let num_columns = read_len(src)?;
        let rows = read_len(src)?;

        let mut columns = Vec::with_capacity(num_columns.min(MAX_PREALLOC));
        for _ in 0..num_columns {
            let name = read_string(src)?;
            let type_name = read_string(src)?;
            if revision >= revision::WITH_CUSTOM_SERIALIZATION && read_u8(src)? != 0 {
                return Err(ProtocolError::UnsupportedColumnType(format!(
                    "{type_name} (custom serialization)"
                )));
            }
            let data = ColumnData::decode(src, &type_name, rows)?;
            columns.push(Column {
                name,
                type_name,
                data,
            });
        }

        Ok(Self {
            table_name,
            info,
            columns,
            rows,
        })
    }

    /// Encode the block payload at the given protocol revision.
    pub fn encode(&self, dst: &mut impl BufMut, revision: u64) {
        if revision >= revision::WITH_TEMPORARY_TABLES {
            write_string(dst, &self.table_name);
        }
        if revision >= revision::WITH_BLOCK_INFO {
            self.info.encode(dst);
        }
        write_uvarint(dst, self.columns.len() as u64);
        write_uvarint(dst, self.rows as u64);
        for column in &self.columns {
            write_string(dst, &column.name);
            write_string(dst, &column.type_name);
            if revision >= revision::WITH_CUSTOM_SERIALIZATION {
                dst.put_u8(0);
            }
            column.data.encode(dst);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::revision::DEFAULT_REVISION;
    use bytes::BytesMut;

    fn sample_block() -> Block {
        Block::new(vec![
            Column::new("id", "UInt64", ColumnData::UInt64(vec![1, 2, 3])),
            Column::new(
                "name",
                "String",
                ColumnData::String(vec!["a".into(), "bb".into(), "".into()]),
            ),
            Column::new("ts", "DateTime('UTC')", ColumnData::DateTime(vec![0, 1, 2])),
        ])
        .unwrap()
    }

    #[test]
    fn test_decode_consumes_exactly_the_payload() {
        let block = sample_block();
        let mut buf = BytesMut::new();
        block.encode(&mut buf, DEFAULT_REVISION);
        buf.extend_from_slice(&[5]); // next packet tag

        let mut src = &buf[..];
        let decoded = Block::decode(&mut src, DEFAULT_REVISION).unwrap();
        assert_eq!(decoded.rows(), 3);
        assert_eq!(decoded.column("name").unwrap().data.get_str(1), Some("bb"));
        assert_eq!(decoded.column("id").unwrap().data.get_u64(2), Some(3));
        assert_eq!(src, &[5]);
    }

    #[test]
    fn test_header_block_has_zero_rows() {
        let block = Block::new(vec![Column::new("x", "Int32", ColumnData::Int32(vec![]))]).unwrap();
        let mut buf = BytesMut::new();
        block.encode(&mut buf, DEFAULT_REVISION);

        let decoded = Block::decode(&mut &buf[..], DEFAULT_REVISION).unwrap();
        assert_eq!(decoded.rows(), 0);
        assert_eq!(decoded.columns().len(), 1);
        assert_eq!(decoded.columns()[0].type_name, "Int32");
    }

    #[test]
    fn test_every_truncation_is_incomplete() {
        let mut buf = BytesMut::new();
        sample_block().encode(&mut buf, DEFAULT_REVISION);
        for cut in 0..buf.len() {
            let err = Block::decode(&mut &buf[..cut], DEFAULT_REVISION).unwrap_err();
            assert!(err.is_incomplete(), "cut at {cut}: {err}");
        }
    }

    #[test]
    fn test_old_revision_omits_table_name_and_info() {
        let mut buf = BytesMut::new();
        sample_block().encode(&mut buf, 50000);
        let decoded = Block::decode(&mut &buf[..], 50000).unwrap();
        assert_eq!(decoded.rows(), 3);
        assert_eq!(decoded.info, BlockInfo::default());
    }

    #[test]
    fn test_unsupported_column_type() {
        let mut buf = BytesMut::new();
        write_string(&mut buf, "");
        BlockInfo::default().encode(&mut buf);
        write_uvarint(&mut buf, 1);
        write_uvarint(&mut buf, 1);
        write_string(&mut buf, "x");
        write_string(&mut buf, "Array(UInt8)");
        buf.put_u8(0);

        let err = Block::decode(&mut &buf[..], DEFAULT_REVISION).unwrap_err();
        assert_eq!(err, ProtocolError::UnsupportedColumnType("Array(UInt8)".into()));
    }

    #[test]
    fn test_custom_serialization_rejected() {
        let mut buf = BytesMut::new();
        write_string(&mut buf, "");
        BlockInfo::default().encode(&mut buf);
        write_uvarint(&mut buf, 1);
        write_uvarint(&mut buf, 0);
        write_string(&mut buf, "x");
        write_string(&mut buf, "UInt8");
        buf.put_u8(1);

        let err = Block::decode(&mut &buf[..], DEFAULT_REVISION).unwrap_err();
        assert!(matches!(err, ProtocolError::UnsupportedColumnType(_)));
    }

    #[test]
    fn test_block_info_unknown_field() {
        let src = [3u8];
        let err = BlockInfo::decode(&mut &src[..]).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidField { field: "block info", .. }));
    }

    #[test]
    fn test_new_rejects_ragged_columns() {
        let err = Block::new(vec![
            Column::new("a", "UInt8", ColumnData::UInt8(vec![1, 2])),
            Column::new("b", "UInt8", ColumnData::UInt8(vec![1])),
        ])
        .unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidField { field: "block", .. }));
    }

    #[test]
    fn test_enum8_reads_as_i64() {
        let data = ColumnData::decode(&mut &[2u8][..], "Enum8('increment' = 1, 'gauge' = 2)", 1)
            .unwrap();
        assert_eq!(data.get_i64(0), Some(2));
        assert_eq!(data.get_u64(0), None);
    }
}
