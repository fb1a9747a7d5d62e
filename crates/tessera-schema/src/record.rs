//! The persisted per-table schema record.
//!
//! Layout (little-endian): signature (8), checksum (8), csn (8), table
//! shove (8), column count (4), reserved (4), then the column shoves. The
//! checksum covers everything after its own field, so a record is
//! tamper-evident from the csn through the last column.

use bytes::{Buf, BufMut, BytesMut};
use xxhash_rust::xxh3::xxh3_64_with_seed;

use tessera_common::constants::{
    MAX_COLS, SCHEMA_CHECKSEED, SCHEMA_HEADER_SIZE, SCHEMA_SIGNATURE,
};
use tessera_common::types::Csn;

use crate::column_set::validate_columns;
use crate::error::{SchemaError, SchemaResult};
use crate::shove::Shove;

/// Offset of the checksum-covered region within a serialized record.
const CHECKSUM_COVER_START: usize = 16;

/// The in-memory form of one table's persisted schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    csn: Csn,
    shove: Shove,
    columns: Vec<Shove>,
}

impl TableSchema {
    /// Assembles a record for serialization. The column array must
    /// already be canonical (validated).
    pub(crate) fn new(csn: Csn, shove: Shove, columns: Vec<Shove>) -> Self {
        debug_assert!(shove.is_table());
        debug_assert!(csn.is_valid());
        debug_assert!(!columns.is_empty());
        Self { csn, shove, columns }
    }

    /// The database version at which this schema was written.
    #[inline]
    #[must_use]
    pub fn csn(&self) -> Csn {
        self.csn
    }

    /// The owning table's shove.
    #[inline]
    #[must_use]
    pub fn shove(&self) -> Shove {
        self.shove
    }

    /// Number of columns.
    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.columns.len()
    }

    /// The ordered column shoves.
    #[inline]
    #[must_use]
    pub fn columns(&self) -> &[Shove] {
        &self.columns
    }

    /// Serialized size of a record with `count` columns.
    #[inline]
    #[must_use]
    pub const fn serialized_size(count: usize) -> usize {
        SCHEMA_HEADER_SIZE + count * 8
    }

    /// Serializes the record, computing the checksum last.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let size = Self::serialized_size(self.columns.len());
        let mut buf = BytesMut::with_capacity(size);
        buf.put_u64_le(SCHEMA_SIGNATURE);
        buf.put_u64_le(0); // checksum placeholder
        buf.put_u64_le(self.csn.as_u64());
        buf.put_u64_le(self.shove.as_raw());
        buf.put_u32_le(self.columns.len() as u32);
        buf.put_u32_le(0); // reserved
        for column in &self.columns {
            buf.put_u64_le(column.as_raw());
        }
        debug_assert_eq!(buf.len(), size);

        let checksum = xxh3_64_with_seed(&buf[CHECKSUM_COVER_START..], SCHEMA_CHECKSEED);
        buf[8..16].copy_from_slice(&checksum.to_le_bytes());
        buf.to_vec()
    }

    /// Parses and fully validates a serialized record.
    ///
    /// Every failure maps to [`SchemaError::SchemaCorrupted`] with the
    /// first check that did not hold.
    pub fn parse(data: &[u8]) -> SchemaResult<Self> {
        if data.len() < Self::serialized_size(1) {
            return Err(corrupted("truncated record"));
        }
        if (data.len() - SCHEMA_HEADER_SIZE) % 8 != 0 {
            return Err(corrupted("misaligned column array"));
        }

        let mut cursor = data;
        let signature = cursor.get_u64_le();
        let checksum = cursor.get_u64_le();
        let csn = Csn::new(cursor.get_u64_le());
        let shove = Shove::from_raw(cursor.get_u64_le());
        let count = cursor.get_u32_le() as usize;
        let _reserved = cursor.get_u32_le();

        if signature != SCHEMA_SIGNATURE {
            return Err(corrupted("bad signature"));
        }
        if count < 1 || count > MAX_COLS {
            return Err(corrupted("column count out of range"));
        }
        if data.len() != Self::serialized_size(count) {
            return Err(corrupted("size does not match column count"));
        }
        if !csn.is_valid() {
            return Err(corrupted("zero csn"));
        }
        if !shove.is_table() {
            return Err(corrupted("record shove is not a table shove"));
        }
        let expected = xxh3_64_with_seed(&data[CHECKSUM_COVER_START..], SCHEMA_CHECKSEED);
        if checksum != expected {
            return Err(corrupted("checksum mismatch"));
        }

        let columns: Vec<Shove> = (0..count)
            .map(|_| Shove::from_raw(cursor.get_u64_le()))
            .collect();
        if validate_columns(&columns).is_err() {
            return Err(corrupted("invalid column layout"));
        }

        Ok(Self { csn, shove, columns })
    }
}

const fn corrupted(reason: &'static str) -> SchemaError {
    SchemaError::SchemaCorrupted { reason }
}
