//! Name handles: lazily bound client-side cursors into the schema.
//!
//! A handle carries a shove and the schema version it was last refreshed
//! at. Refreshing against a transaction binds the handle to the schema
//! that transaction can see: table handles take ownership of a copy of
//! the persisted record, column handles resolve to a position inside
//! their table's record.

use tessera_common::types::Csn;

use crate::catalog::schema_read;
use crate::error::{SchemaError, SchemaResult};
use crate::record::TableSchema;
use crate::shove::{validate_name, NameKind, Shove};
use crate::store::SchemaTxn;

/// A table name handle.
///
/// Owns a heap copy of the table's schema record once refreshed; the copy
/// is released when the handle is dropped, reused on refresh, and freed
/// when a refresh finds the table gone.
#[derive(Debug)]
pub struct TableId {
    shove: Shove,
    version: Csn,
    hint: Option<usize>,
    pk: Shove,
    def: Option<Box<TableSchema>>,
}

impl TableId {
    /// Creates an unbound handle for a table name.
    pub fn new(name: &str) -> SchemaResult<Self> {
        if !validate_name(name) {
            return Err(SchemaError::InvalidName { name: name.into() });
        }
        Ok(Self::from_shove(Shove::of_name(name, NameKind::Table)))
    }

    pub(crate) fn from_shove(shove: Shove) -> Self {
        debug_assert!(shove.is_table());
        Self {
            shove,
            version: Csn::INVALID,
            hint: None,
            pk: Shove::NONE,
            def: None,
        }
    }

    /// The table's shove.
    #[inline]
    #[must_use]
    pub fn shove(&self) -> Shove {
        self.shove
    }

    /// The schema version this handle was last refreshed at.
    #[inline]
    #[must_use]
    pub fn version(&self) -> Csn {
        self.version
    }

    /// The primary key's type and index bits, once refreshed.
    #[inline]
    #[must_use]
    pub fn pk(&self) -> Shove {
        self.pk
    }

    /// The owned schema copy, if the handle is bound and the table
    /// existed at the refresh version.
    #[must_use]
    pub fn schema(&self) -> Option<&TableSchema> {
        self.def.as_deref()
    }

    /// Forgets the refresh version and cache hint, forcing the next
    /// refresh to reload.
    pub fn reset(&mut self) {
        self.version = Csn::INVALID;
        self.hint = None;
    }

    /// Number of columns in the bound schema, or `None` for an unbound
    /// handle (or one whose owned copy does not match this table).
    #[must_use]
    pub fn column_count(&self) -> Option<usize> {
        let def = self.def.as_deref()?;
        if def.shove() != self.shove {
            return None;
        }
        Some(def.count())
    }

    /// Builds a bound column handle for the column at `index`.
    pub fn column_get(&self, index: usize) -> SchemaResult<ColumnId> {
        let def = self.def.as_deref().ok_or(SchemaError::InvalidArgument {
            message: "table handle not refreshed",
        })?;
        if def.shove() != self.shove {
            return Err(SchemaError::SchemaCorrupted {
                reason: "schema copy does not match handle",
            });
        }
        if index >= def.count() {
            return Err(SchemaError::InvalidArgument {
                message: "column index out of range",
            });
        }
        Ok(ColumnId {
            shove: def.columns()[index],
            table_shove: self.shove,
            version: self.version,
            hint: None,
            num: Some(index),
        })
    }

    pub(crate) fn hint(&self) -> Option<usize> {
        self.hint
    }

    pub(crate) fn hint_mut(&mut self) -> &mut Option<usize> {
        &mut self.hint
    }
}

/// A column name handle, bound to its table at construction.
#[derive(Debug)]
pub struct ColumnId {
    shove: Shove,
    table_shove: Shove,
    version: Csn,
    hint: Option<usize>,
    num: Option<usize>,
}

impl ColumnId {
    /// Creates an unresolved handle for a column of `table`.
    pub fn new(table: &TableId, name: &str) -> SchemaResult<Self> {
        if !validate_name(name) {
            return Err(SchemaError::InvalidName { name: name.into() });
        }
        Ok(Self {
            shove: Shove::of_name(name, NameKind::Column),
            table_shove: table.shove,
            version: Csn::INVALID,
            hint: None,
            num: None,
        })
    }

    /// The column's shove: name-only until resolved, then the full shove
    /// copied from the schema record.
    #[inline]
    #[must_use]
    pub fn shove(&self) -> Shove {
        self.shove
    }

    /// The owning table's shove.
    #[inline]
    #[must_use]
    pub fn table_shove(&self) -> Shove {
        self.table_shove
    }

    /// The schema version this handle was last refreshed at.
    #[inline]
    #[must_use]
    pub fn version(&self) -> Csn {
        self.version
    }

    /// The column's position in the schema, or `None` while unresolved.
    #[inline]
    #[must_use]
    pub fn num(&self) -> Option<usize> {
        self.num
    }

    /// Forgets the refresh version and cache hint.
    pub fn reset(&mut self) {
        self.version = Csn::INVALID;
        self.hint = None;
    }

    pub(crate) fn hint(&self) -> Option<usize> {
        self.hint
    }

    pub(crate) fn hint_mut(&mut self) -> &mut Option<usize> {
        &mut self.hint
    }
}

/// Refreshes a table handle against a transaction's schema snapshot.
pub fn refresh_table(txn: &mut SchemaTxn<'_>, table: &mut TableId) -> SchemaResult<()> {
    refresh_couple(txn, table, None)
}

/// Refreshes a table handle and optionally one of its column handles.
///
/// The central coherence operation: a handle refreshed at a newer schema
/// version than the transaction can see fails with
/// [`SchemaError::SchemaChanged`]; an out-of-date handle is rebound by
/// re-reading the catalog. A refresh that finds the table gone releases
/// the owned schema copy and reports [`SchemaError::NotFound`]; a column
/// that no longer exists reports [`SchemaError::NoSuchColumn`].
pub fn refresh_couple(
    txn: &mut SchemaTxn<'_>,
    table: &mut TableId,
    column: Option<&mut ColumnId>,
) -> SchemaResult<()> {
    let snapshot = txn.schema_version();
    if table.version > snapshot {
        return Err(SchemaError::SchemaChanged);
    }

    if table.version != snapshot {
        table.hint = None;
        match schema_read(txn, table.shove) {
            Ok(def) => table.def = Some(def),
            Err(SchemaError::NotFound) => table.def = None,
            Err(err) => return Err(err),
        }
        table.version = snapshot;
        table.pk = table
            .def
            .as_deref()
            .map_or(Shove::NONE, |def| def.columns()[0].kind_only());
    }

    let Some(def) = table.def.as_deref() else {
        return Err(SchemaError::NotFound);
    };
    if def.shove() != table.shove {
        return Err(SchemaError::SchemaCorrupted {
            reason: "schema copy does not match handle",
        });
    }

    let Some(column) = column else {
        return Ok(());
    };
    if column.table_shove != table.shove {
        return Err(SchemaError::InvalidArgument {
            message: "column is bound to a different table",
        });
    }
    if column.version > table.version {
        return Err(SchemaError::SchemaChanged);
    }

    if column.version != table.version {
        column.num = None;
        column.hint = None;
        for (at, &shove) in def.columns().iter().enumerate() {
            if column.shove.name_eq(shove) {
                column.shove = shove;
                column.num = Some(at);
                break;
            }
        }
        column.version = table.version;
    }

    if column.num.is_none() {
        return Err(SchemaError::NoSuchColumn);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_id_new() {
        let table = TableId::new("users").unwrap();
        assert!(table.shove().is_table());
        assert_eq!(table.version(), Csn::INVALID);
        assert!(table.schema().is_none());
        assert_eq!(table.column_count(), None);

        assert!(TableId::new("1bad").is_err());
    }

    #[test]
    fn test_column_id_new() {
        let table = TableId::new("users").unwrap();
        let column = ColumnId::new(&table, "age").unwrap();
        assert_eq!(column.table_shove(), table.shove());
        assert_eq!(column.num(), None);
        assert!(!column.shove().is_table());

        assert!(ColumnId::new(&table, "").is_err());
    }

    #[test]
    fn test_reset() {
        let mut table = TableId::new("users").unwrap();
        table.version = Csn::new(5);
        table.hint = Some(3);
        table.reset();
        assert_eq!(table.version(), Csn::INVALID);
        assert_eq!(table.hint(), None);
    }
}
