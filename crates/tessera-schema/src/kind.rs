//! Column types and index kinds.
//!
//! Both are packed into the low 16 bits of a shove: the column type in the
//! 6-bit type field, the index kind in the flag field above it. The table
//! sentinel occupies its own bit in the flag field, exclusive of all
//! others.

use serde::{Deserialize, Serialize};

/// Bit layout of the kind field (low 16 bits of a shove).
pub(crate) mod bits {
    /// Column type, values 0..=63.
    pub const TYPE_MASK: u16 = 0x003F;
    /// Column admits nulls.
    pub const NULLABLE: u16 = 1 << 6;
    /// Column participates in an index.
    pub const INDEXED: u16 = 1 << 7;
    /// Indexed column is the primary key (absent: secondary).
    pub const PRIMARY: u16 = 1 << 8;
    /// Index rejects duplicate values.
    pub const UNIQUE: u16 = 1 << 9;
    /// Index keeps keys in value order.
    pub const ORDERED: u16 = 1 << 10;
    /// Reversed byte order (ordered indexes) or reversed null-sentinel
    /// placement (nullable unordered indexes).
    pub const REVERSE: u16 = 1 << 11;
    /// The shove names a table, not a column.
    pub const TABLE: u16 = 1 << 12;

    /// Every index-kind bit including the table sentinel.
    pub const INDEX_MASK: u16 =
        NULLABLE | INDEXED | PRIMARY | UNIQUE | ORDERED | REVERSE | TABLE;
    /// The whole kind field.
    pub const KIND_MASK: u16 = INDEX_MASK | TYPE_MASK;
}

/// Data type of one column.
///
/// The discriminant order is significant: types from [`Bin96`](Self::Bin96)
/// upward are wide enough for reverse ordered indexes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum ColType {
    /// Reserved; never a valid column type.
    Null = 0,
    /// Unsigned 16-bit integer.
    Uint16 = 1,
    /// Signed 32-bit integer.
    Int32 = 2,
    /// Unsigned 32-bit integer.
    Uint32 = 3,
    /// Signed 64-bit integer.
    Int64 = 4,
    /// Unsigned 64-bit integer.
    Uint64 = 5,
    /// 32-bit float.
    Fp32 = 6,
    /// 64-bit float.
    Fp64 = 7,
    /// Timestamp.
    Datetime = 8,
    /// 96-bit binary.
    Bin96 = 9,
    /// 128-bit binary.
    Bin128 = 10,
    /// 160-bit binary.
    Bin160 = 11,
    /// 256-bit binary.
    Bin256 = 12,
    /// Zero-terminated string.
    Str = 13,
    /// Variable-length binary.
    Opaque = 14,
    /// Nested row blob.
    Nested = 15,
}

impl ColType {
    /// Converts the type to its field value.
    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Reconstructs a type from a field value.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0 => Self::Null,
            1 => Self::Uint16,
            2 => Self::Int32,
            3 => Self::Uint32,
            4 => Self::Int64,
            5 => Self::Uint64,
            6 => Self::Fp32,
            7 => Self::Fp64,
            8 => Self::Datetime,
            9 => Self::Bin96,
            10 => Self::Bin128,
            11 => Self::Bin160,
            12 => Self::Bin256,
            13 => Self::Str,
            14 => Self::Opaque,
            15 => Self::Nested,
            _ => return None,
        })
    }

    /// True for types at least 96 bits wide, the minimum for a reverse
    /// ordered index.
    #[inline]
    #[must_use]
    pub const fn is_wide(self) -> bool {
        self as u8 >= Self::Bin96 as u8
    }

    /// True for types whose keys sort as little-endian unsigned integers.
    #[inline]
    #[must_use]
    pub const fn is_unsigned(self) -> bool {
        matches!(self, Self::Uint16 | Self::Uint32 | Self::Uint64 | Self::Datetime)
    }

    /// True when an engine tree keyed by this type can use the native
    /// integer-key layout (4- or 8-byte fixed keys).
    #[inline]
    #[must_use]
    pub const fn is_integer_keyed(self) -> bool {
        matches!(self, Self::Uint32 | Self::Uint64 | Self::Datetime)
    }

    /// True for types whose null-sentinel encoding occupies an extremal
    /// value and therefore distinguishes obverse from reverse placement.
    #[inline]
    #[must_use]
    pub const fn nullable_reverse_sensitive(self) -> bool {
        matches!(
            self,
            Self::Uint16
                | Self::Uint32
                | Self::Uint64
                | Self::Bin96
                | Self::Bin128
                | Self::Bin160
                | Self::Bin256
        )
    }
}

/// Index kind of one column: the closed set of valid flag combinations.
///
/// The grid is `primary`/`secondary` × `unique`/`withdups` ×
/// `ordered obverse`/`ordered reverse`/`unordered` × optional `nullable`,
/// with the primary `withdups unordered nullable reverse` form not
/// provided. `None` and `NoindexNullable` describe non-indexed columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
#[allow(missing_docs)]
pub enum IndexKind {
    None = 0,
    NoindexNullable = bits::NULLABLE,

    PrimaryWithdupsOrderedObverse = bits::INDEXED | bits::PRIMARY | bits::ORDERED,
    PrimaryWithdupsOrderedObverseNullable =
        bits::INDEXED | bits::PRIMARY | bits::ORDERED | bits::NULLABLE,
    PrimaryWithdupsOrderedReverse =
        bits::INDEXED | bits::PRIMARY | bits::ORDERED | bits::REVERSE,
    PrimaryWithdupsOrderedReverseNullable =
        bits::INDEXED | bits::PRIMARY | bits::ORDERED | bits::REVERSE | bits::NULLABLE,

    PrimaryUniqueOrderedObverse =
        bits::INDEXED | bits::PRIMARY | bits::UNIQUE | bits::ORDERED,
    PrimaryUniqueOrderedObverseNullable =
        bits::INDEXED | bits::PRIMARY | bits::UNIQUE | bits::ORDERED | bits::NULLABLE,
    PrimaryUniqueOrderedReverse =
        bits::INDEXED | bits::PRIMARY | bits::UNIQUE | bits::ORDERED | bits::REVERSE,
    PrimaryUniqueOrderedReverseNullable = bits::INDEXED
        | bits::PRIMARY
        | bits::UNIQUE
        | bits::ORDERED
        | bits::REVERSE
        | bits::NULLABLE,

    PrimaryUniqueUnordered = bits::INDEXED | bits::PRIMARY | bits::UNIQUE,
    PrimaryUniqueUnorderedNullableObverse =
        bits::INDEXED | bits::PRIMARY | bits::UNIQUE | bits::NULLABLE,
    PrimaryUniqueUnorderedNullableReverse =
        bits::INDEXED | bits::PRIMARY | bits::UNIQUE | bits::NULLABLE | bits::REVERSE,

    PrimaryWithdupsUnordered = bits::INDEXED | bits::PRIMARY,
    PrimaryWithdupsUnorderedNullableObverse =
        bits::INDEXED | bits::PRIMARY | bits::NULLABLE,

    SecondaryWithdupsOrderedObverse = bits::INDEXED | bits::ORDERED,
    SecondaryWithdupsOrderedObverseNullable =
        bits::INDEXED | bits::ORDERED | bits::NULLABLE,
    SecondaryWithdupsOrderedReverse = bits::INDEXED | bits::ORDERED | bits::REVERSE,
    SecondaryWithdupsOrderedReverseNullable =
        bits::INDEXED | bits::ORDERED | bits::REVERSE | bits::NULLABLE,

    SecondaryUniqueOrderedObverse = bits::INDEXED | bits::UNIQUE | bits::ORDERED,
    SecondaryUniqueOrderedObverseNullable =
        bits::INDEXED | bits::UNIQUE | bits::ORDERED | bits::NULLABLE,
    SecondaryUniqueOrderedReverse =
        bits::INDEXED | bits::UNIQUE | bits::ORDERED | bits::REVERSE,
    SecondaryUniqueOrderedReverseNullable =
        bits::INDEXED | bits::UNIQUE | bits::ORDERED | bits::REVERSE | bits::NULLABLE,

    SecondaryUniqueUnordered = bits::INDEXED | bits::UNIQUE,
    SecondaryUniqueUnorderedNullableObverse =
        bits::INDEXED | bits::UNIQUE | bits::NULLABLE,
    SecondaryUniqueUnorderedNullableReverse =
        bits::INDEXED | bits::UNIQUE | bits::NULLABLE | bits::REVERSE,

    SecondaryWithdupsUnordered = bits::INDEXED,
    SecondaryWithdupsUnorderedNullableObverse = bits::INDEXED | bits::NULLABLE,
    SecondaryWithdupsUnorderedNullableReverse =
        bits::INDEXED | bits::NULLABLE | bits::REVERSE,
}

impl IndexKind {
    const ALL: [Self; 29] = [
        Self::None,
        Self::NoindexNullable,
        Self::PrimaryWithdupsOrderedObverse,
        Self::PrimaryWithdupsOrderedObverseNullable,
        Self::PrimaryWithdupsOrderedReverse,
        Self::PrimaryWithdupsOrderedReverseNullable,
        Self::PrimaryUniqueOrderedObverse,
        Self::PrimaryUniqueOrderedObverseNullable,
        Self::PrimaryUniqueOrderedReverse,
        Self::PrimaryUniqueOrderedReverseNullable,
        Self::PrimaryUniqueUnordered,
        Self::PrimaryUniqueUnorderedNullableObverse,
        Self::PrimaryUniqueUnorderedNullableReverse,
        Self::PrimaryWithdupsUnordered,
        Self::PrimaryWithdupsUnorderedNullableObverse,
        Self::SecondaryWithdupsOrderedObverse,
        Self::SecondaryWithdupsOrderedObverseNullable,
        Self::SecondaryWithdupsOrderedReverse,
        Self::SecondaryWithdupsOrderedReverseNullable,
        Self::SecondaryUniqueOrderedObverse,
        Self::SecondaryUniqueOrderedObverseNullable,
        Self::SecondaryUniqueOrderedReverse,
        Self::SecondaryUniqueOrderedReverseNullable,
        Self::SecondaryUniqueUnordered,
        Self::SecondaryUniqueUnorderedNullableObverse,
        Self::SecondaryUniqueUnorderedNullableReverse,
        Self::SecondaryWithdupsUnordered,
        Self::SecondaryWithdupsUnorderedNullableObverse,
        Self::SecondaryWithdupsUnorderedNullableReverse,
    ];

    /// Converts the kind to its flag bits.
    #[inline]
    #[must_use]
    pub const fn as_bits(self) -> u16 {
        self as u16
    }

    /// Reconstructs a kind from raw flag bits, rejecting combinations
    /// outside the closed set (including anything with the table bit).
    #[must_use]
    pub fn from_bits(value: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_bits() == value)
    }

    /// True when the column participates in an index.
    #[inline]
    #[must_use]
    pub const fn is_indexed(self) -> bool {
        self.as_bits() & bits::INDEXED != 0
    }

    /// True for a primary index kind.
    #[inline]
    #[must_use]
    pub const fn is_primary(self) -> bool {
        self.is_indexed() && self.as_bits() & bits::PRIMARY != 0
    }

    /// True for a secondary index kind.
    #[inline]
    #[must_use]
    pub const fn is_secondary(self) -> bool {
        self.is_indexed() && self.as_bits() & bits::PRIMARY == 0
    }

    /// True when the index rejects duplicates.
    #[inline]
    #[must_use]
    pub const fn is_unique(self) -> bool {
        self.as_bits() & bits::UNIQUE != 0
    }

    /// True when the index keeps keys in value order.
    #[inline]
    #[must_use]
    pub const fn is_ordered(self) -> bool {
        self.as_bits() & bits::ORDERED != 0
    }

    /// True for reverse byte order or reverse null-sentinel placement.
    #[inline]
    #[must_use]
    pub const fn is_reverse(self) -> bool {
        self.as_bits() & bits::REVERSE != 0
    }

    /// True when the column admits nulls.
    #[inline]
    #[must_use]
    pub const fn is_nullable(self) -> bool {
        self.as_bits() & bits::NULLABLE != 0
    }
}
