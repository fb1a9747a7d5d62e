//! Derivation of engine tree shapes from column shoves.
//!
//! Every index tree's flags and comparators are a pure function of the
//! column shoves involved, so a tree opened during CREATE TABLE and the
//! same tree opened later by a reader always agree on shape.

use tessera_engine::{Comparator, TreeFlags};

use crate::kind::{ColType, IndexKind};
use crate::shove::Shove;

/// Flags for the tree backing index slot `slot` of a column array.
///
/// Slot 0 is the table's primary tree; other slots are secondary-index
/// trees whose data items are primary key values.
pub(crate) fn dbi_flags(columns: &[Shove], slot: usize) -> TreeFlags {
    let col = columns[slot];
    let mut flags = TreeFlags::empty();
    if !col.is_unique() {
        flags |= TreeFlags::DUP_SORT;
    }
    let reverse_ordered = col.is_ordered() && col.is_reverse();
    if reverse_ordered {
        flags |= TreeFlags::REVERSE_KEY;
    } else if col.col_type().is_some_and(ColType::is_integer_keyed) {
        flags |= TreeFlags::INTEGER_KEY;
    }
    flags
}

/// The shove selecting the data comparator for index slot `slot`.
///
/// Secondary trees store primary key values, so the primary column's
/// shove applies; the primary tree stores whole rows, selected by a
/// synthetic nested marker.
pub(crate) fn data_shove(columns: &[Shove], slot: usize) -> Shove {
    if slot > 0 {
        columns[0]
    } else {
        Shove::column(
            Shove::NONE,
            ColType::Nested,
            IndexKind::PrimaryUniqueOrderedObverse,
        )
    }
}

/// Maps a shove's type and index bits onto an engine comparator.
pub(crate) fn comparator_for(shove: Shove) -> Comparator {
    match shove.col_type() {
        Some(ColType::Nested) => Comparator::RowBlob,
        Some(ty) if ty.is_unsigned() => Comparator::Unsigned,
        _ if shove.is_ordered() && shove.is_reverse() => Comparator::Reverse,
        _ => Comparator::Lexical,
    }
}
