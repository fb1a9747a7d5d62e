//! The shove: a 64-bit token naming a table, a column, or a tree.
//!
//! Low 16 bits are the kind field (column type + index flags, or the table
//! sentinel), upper 48 bits hold a seeded hash of the uppercased name.
//! Name equality compares the hash payload only, so the same identifier
//! keeps its shove across type and index changes, and across letter case.

use serde::{Deserialize, Serialize};
use std::fmt;
use xxhash_rust::xxh3::xxh3_64_with_seed;

use tessera_common::constants::{MAX_INDEXES, NAME_LEN_MAX, NAME_LEN_MIN, TREE_NAME_MAX};

use crate::kind::{bits, ColType, IndexKind};

/// Number of low bits reserved for the kind field.
pub const HASH_SHIFT: u32 = 16;

/// What a name identifies; doubles as the hash seed so table and column
/// hashes never collide by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u64)]
pub enum NameKind {
    /// A table name.
    Table = 1,
    /// A column name.
    Column = 2,
}

/// A 64-bit identifier token.
///
/// # Example
///
/// ```rust
/// use tessera_schema::{ColType, IndexKind, NameKind, Shove};
///
/// let table = Shove::of_name("Users", NameKind::Table);
/// assert!(table.is_table());
/// assert!(!table.is_indexed());
///
/// let col = Shove::column(
///     Shove::of_name("id", NameKind::Column),
///     ColType::Uint64,
///     IndexKind::PrimaryUniqueOrderedObverse,
/// );
/// assert!(col.is_primary());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Shove(u64);

impl Shove {
    /// The table sentinel within the kind field.
    pub const TABLE_FLAG: u64 = bits::TABLE as u64;

    /// The empty shove: names the catalog tree, and marks "no shove".
    pub const NONE: Self = Self(0);

    /// Hashes a name into its shove.
    ///
    /// The name is uppercased byte-wise and truncated to
    /// [`NAME_LEN_MAX`] before hashing; tables get the table sentinel in
    /// the kind field, columns get an empty kind field to be filled by
    /// [`column`](Self::column).
    #[must_use]
    pub fn of_name(name: &str, kind: NameKind) -> Self {
        let mut upper = [0u8; NAME_LEN_MAX];
        let len = name.len().min(NAME_LEN_MAX);
        for (dst, src) in upper[..len].iter_mut().zip(name.bytes()) {
            *dst = src.to_ascii_uppercase();
        }
        let hash = xxh3_64_with_seed(&upper[..len], kind as u64);
        let mut shove = hash << HASH_SHIFT;
        if kind == NameKind::Table {
            shove |= Self::TABLE_FLAG;
        }
        Self(shove)
    }

    /// Combines a column name shove with its type and index kind.
    #[inline]
    #[must_use]
    pub const fn column(name: Self, ty: ColType, kind: IndexKind) -> Self {
        Self(name.0 | ty.as_u8() as u64 | kind.as_bits() as u64)
    }

    /// Derives the shove of the tree backing index slot `slot` of a table.
    ///
    /// Clearing the table sentinel and adding the slot number places the
    /// slot in the type field, preserving name equality with the table.
    #[must_use]
    pub fn dbi(table: Self, slot: usize) -> Self {
        debug_assert!(table.is_table());
        debug_assert!(slot < MAX_INDEXES);
        Self(table.0 - Self::TABLE_FLAG + slot as u64)
    }

    /// Reconstructs a shove from its raw representation.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw representation.
    #[inline]
    #[must_use]
    pub const fn as_raw(self) -> u64 {
        self.0
    }

    /// The hash payload (upper 48 bits).
    #[inline]
    #[must_use]
    pub const fn hash_payload(self) -> u64 {
        self.0 >> HASH_SHIFT
    }

    /// The whole kind field.
    #[inline]
    #[must_use]
    pub const fn kind_bits(self) -> u16 {
        (self.0 as u16) & bits::KIND_MASK
    }

    /// A shove carrying only this shove's kind field.
    #[inline]
    #[must_use]
    pub const fn kind_only(self) -> Self {
        Self(self.0 & bits::KIND_MASK as u64)
    }

    /// The index-flag portion of the kind field.
    #[inline]
    #[must_use]
    pub const fn index_bits(self) -> u16 {
        (self.0 as u16) & bits::INDEX_MASK
    }

    /// The column type, if the type field holds a known value.
    #[inline]
    #[must_use]
    pub const fn col_type(self) -> Option<ColType> {
        ColType::from_u8((self.0 & bits::TYPE_MASK as u64) as u8)
    }

    /// The index kind, if the flag field holds a valid combination.
    #[inline]
    #[must_use]
    pub fn index_kind(self) -> Option<IndexKind> {
        IndexKind::from_bits(self.index_bits())
    }

    /// True when two shoves name the same identifier, ignoring case,
    /// type, and index differences.
    #[inline]
    #[must_use]
    pub const fn name_eq(self, other: Self) -> bool {
        self.hash_payload() == other.hash_payload()
    }

    /// True when the kind field is exactly the table sentinel.
    #[inline]
    #[must_use]
    pub const fn is_table(self) -> bool {
        self.index_bits() == bits::TABLE
    }

    /// True when the column participates in an index.
    #[inline]
    #[must_use]
    pub const fn is_indexed(self) -> bool {
        self.index_bits() & bits::INDEXED != 0
    }

    /// True for a primary index column.
    #[inline]
    #[must_use]
    pub const fn is_primary(self) -> bool {
        self.is_indexed() && self.index_bits() & bits::PRIMARY != 0
    }

    /// True for a secondary index column.
    #[inline]
    #[must_use]
    pub const fn is_secondary(self) -> bool {
        self.is_indexed() && self.index_bits() & bits::PRIMARY == 0
    }

    /// True when the index rejects duplicates.
    #[inline]
    #[must_use]
    pub const fn is_unique(self) -> bool {
        self.index_bits() & bits::UNIQUE != 0
    }

    /// True when the index keeps keys in value order.
    #[inline]
    #[must_use]
    pub const fn is_ordered(self) -> bool {
        self.index_bits() & bits::ORDERED != 0
    }

    /// True for reverse byte order or reverse null-sentinel placement.
    #[inline]
    #[must_use]
    pub const fn is_reverse(self) -> bool {
        self.index_bits() & bits::REVERSE != 0
    }

    /// True when the column admits nulls.
    #[inline]
    #[must_use]
    pub const fn is_nullable(self) -> bool {
        self.index_bits() & bits::NULLABLE != 0
    }

    /// Renders the shove as the engine-visible tree name.
    ///
    /// Six-bit groups from the least significant end index a fixed
    /// 64-character alphabet; the empty shove renders as `"@"`.
    #[must_use]
    pub fn tree_name(self) -> String {
        const ALPHABET: &[u8; 64] =
            b"@0123456789qwertyuiopasdfghjklzxcvbnmQWERTYUIOPASDFGHJKLZXCVBNM_";
        let mut out = String::with_capacity(TREE_NAME_MAX);
        let mut rest = self.0;
        loop {
            out.push(ALPHABET[(rest & 63) as usize] as char);
            rest >>= 6;
            if rest == 0 {
                break;
            }
        }
        out
    }
}

impl fmt::Debug for Shove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shove({:#018x})", self.0)
    }
}

/// Checks a name against the identifier grammar.
///
/// Valid names start with an ASCII letter or `_`, continue with ASCII
/// alphanumerics or `_` (and `.` under the `dot-names` feature), have a
/// length in `[NAME_LEN_MIN, NAME_LEN_MAX]`, and hash to a nonzero
/// payload.
#[must_use]
pub fn validate_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    if bytes.len() < NAME_LEN_MIN || bytes.len() > NAME_LEN_MAX {
        return false;
    }
    if !is_name_char(bytes[0], true) {
        return false;
    }
    if !bytes[1..].iter().all(|&b| is_name_char(b, false)) {
        return false;
    }
    Shove::of_name(name, NameKind::Column).hash_payload() != 0
}

fn is_name_char(byte: u8, first: bool) -> bool {
    if first && byte.is_ascii_alphabetic() {
        return true;
    }
    if !first && byte.is_ascii_alphanumeric() {
        return true;
    }
    if byte == b'_' {
        return true;
    }
    #[cfg(feature = "dot-names")]
    if !first && byte == b'.' {
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_shove() {
        let shove = Shove::of_name("users", NameKind::Table);
        assert!(shove.is_table());
        assert!(!shove.is_indexed());
        assert_ne!(shove.hash_payload(), 0);
        assert_eq!(shove.kind_bits(), bits::TABLE);
    }

    #[test]
    fn test_name_eq_case_insensitive() {
        let a = Shove::of_name("Users", NameKind::Table);
        let b = Shove::of_name("USERS", NameKind::Table);
        let c = Shove::of_name("orders", NameKind::Table);
        assert!(a.name_eq(b));
        assert!(!a.name_eq(c));
    }

    #[test]
    fn test_name_eq_ignores_kind_field() {
        let name = Shove::of_name("age", NameKind::Column);
        let a = Shove::column(name, ColType::Uint32, IndexKind::None);
        let b = Shove::column(
            name,
            ColType::Str,
            IndexKind::SecondaryWithdupsOrderedObverse,
        );
        assert!(a.name_eq(b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_table_and_column_hashes_differ() {
        let t = Shove::of_name("thing", NameKind::Table);
        let c = Shove::of_name("thing", NameKind::Column);
        assert!(!t.name_eq(c));
    }

    #[test]
    fn test_dbi_shove() {
        let table = Shove::of_name("users", NameKind::Table);
        let d0 = Shove::dbi(table, 0);
        let d3 = Shove::dbi(table, 3);
        assert!(d0.name_eq(table));
        assert!(d3.name_eq(table));
        assert_ne!(d0, d3);
        assert_eq!(d3.as_raw() - d0.as_raw(), 3);
        assert!(!d0.is_table());
    }

    #[test]
    fn test_column_accessors() {
        let shove = Shove::column(
            Shove::of_name("tag", NameKind::Column),
            ColType::Bin128,
            IndexKind::SecondaryUniqueOrderedReverse,
        );
        assert_eq!(shove.col_type(), Some(ColType::Bin128));
        assert_eq!(
            shove.index_kind(),
            Some(IndexKind::SecondaryUniqueOrderedReverse)
        );
        assert!(shove.is_secondary());
        assert!(shove.is_unique());
        assert!(shove.is_ordered());
        assert!(shove.is_reverse());
        assert!(!shove.is_nullable());
    }

    #[test]
    fn test_kind_only() {
        let shove = Shove::column(
            Shove::of_name("pk", NameKind::Column),
            ColType::Uint64,
            IndexKind::PrimaryUniqueOrderedObverse,
        );
        let kind = shove.kind_only();
        assert_eq!(kind.hash_payload(), 0);
        assert_eq!(kind.col_type(), Some(ColType::Uint64));
        assert!(kind.is_primary());
    }

    #[test]
    fn test_tree_name() {
        assert_eq!(Shove::NONE.tree_name(), "@");
        assert_eq!(Shove::from_raw(1).tree_name(), "0");
        assert_eq!(Shove::from_raw(64).tree_name(), "@0");

        let name = Shove::of_name("users", NameKind::Table).tree_name();
        assert!(name.len() <= TREE_NAME_MAX);
        assert!(!name.is_empty());
    }

    #[test]
    fn test_tree_names_distinct_per_slot() {
        let table = Shove::of_name("users", NameKind::Table);
        let names: Vec<String> = (0..4).map(|i| Shove::dbi(table, i).tree_name()).collect();
        for (i, a) in names.iter().enumerate() {
            for b in &names[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("users"));
        assert!(validate_name("_tmp"));
        assert!(validate_name("a1_b2"));
        assert!(validate_name(&"x".repeat(NAME_LEN_MAX)));

        assert!(!validate_name(""));
        assert!(!validate_name("1users"));
        assert!(!validate_name("has space"));
        assert!(!validate_name("uni\u{0441}ode"));
        assert!(!validate_name(&"x".repeat(NAME_LEN_MAX + 1)));
    }

    #[cfg(feature = "dot-names")]
    #[test]
    fn test_dot_names() {
        assert!(validate_name("ns.table"));
        assert!(!validate_name(".table"));
    }

    #[cfg(not(feature = "dot-names"))]
    #[test]
    fn test_no_dot_names() {
        assert!(!validate_name("ns.table"));
    }
}
