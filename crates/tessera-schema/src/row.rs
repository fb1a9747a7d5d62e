//! The row-codec seam.
//!
//! Row encoding is outside this crate; the only contact point is typed
//! field lookup on an opaque row, used to check that a row carries every
//! column the schema requires.

use crate::error::{SchemaError, SchemaResult};
use crate::handle::TableId;
use crate::kind::ColType;

/// Typed field lookup on an opaque row blob.
pub trait FieldLookup {
    /// Returns true if the row has a field at column position `column`
    /// with the given type.
    fn has_field(&self, column: usize, ty: ColType) -> bool;
}

/// Checks that every plain column of a refreshed table is present in a
/// row.
///
/// Indexed columns are verified by index maintenance and nullable
/// columns may legitimately be absent; the trailing plain columns are
/// the only ones nothing else checks. Returns
/// [`SchemaError::ColumnMissing`] with the first absent position.
pub fn check_unindexed_columns<R>(table: &TableId, row: &R) -> SchemaResult<()>
where
    R: FieldLookup + ?Sized,
{
    let def = table.schema().ok_or(SchemaError::InvalidArgument {
        message: "table handle not refreshed",
    })?;
    for at in (1..def.count()).rev() {
        let shove = def.columns()[at];
        if shove.index_bits() != 0 {
            // Canonical order puts indexed then nullable columns first;
            // the plain region is the tail.
            break;
        }
        let ty = shove.col_type().ok_or(SchemaError::SchemaCorrupted {
            reason: "unknown column type",
        })?;
        if !row.has_field(at, ty) {
            return Err(SchemaError::ColumnMissing { column: at });
        }
    }
    Ok(())
}
