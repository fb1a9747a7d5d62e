//! The schema catalog: one reserved tree, keyed by table shove.
//!
//! The catalog tree is named by the base-64 rendering of shove zero
//! (`"@"`) and uses native integer key order. Values are serialized
//! schema records.

use tessera_common::constants::TABLES_MAX;
use tessera_engine::{Dbi, EngineError, TreeFlags};

use crate::error::{SchemaError, SchemaResult};
use crate::handle::TableId;
use crate::kind::{ColType, IndexKind};
use crate::open::dbi_open;
use crate::record::TableSchema;
use crate::shove::Shove;
use crate::store::SchemaTxn;

/// Opens the catalog tree, creating it when asked, and caches its handle
/// in the store.
pub(crate) fn schema_open(txn: &mut SchemaTxn<'_>, create: bool) -> SchemaResult<Dbi> {
    let cached = txn.store().schema_dbi();
    if cached.is_valid() {
        return Ok(cached);
    }

    let key_shove = Shove::column(
        Shove::NONE,
        ColType::Uint64,
        IndexKind::PrimaryUniqueOrderedObverse,
    );
    let data_shove = Shove::column(
        Shove::NONE,
        ColType::Opaque,
        IndexKind::PrimaryUniqueOrderedObverse,
    );
    let mut flags = TreeFlags::INTEGER_KEY;
    if create {
        flags |= TreeFlags::CREATE;
    }
    let dbi = dbi_open(txn, Shove::NONE, flags, key_shove, data_shove, None)?;
    txn.store().set_schema_dbi(dbi);
    Ok(dbi)
}

/// Reads and validates the catalog row of one table, returning a freshly
/// owned copy of its schema.
pub(crate) fn schema_read(txn: &mut SchemaTxn<'_>, shove: Shove) -> SchemaResult<Box<TableSchema>> {
    let catalog = schema_open(txn, false)?;
    let key = shove.as_raw().to_le_bytes();
    let data = match txn.engine().get(catalog, &key) {
        Ok(data) => data,
        Err(EngineError::KeyNotFound) => return Err(SchemaError::NotFound),
        Err(err) => return Err(err.into()),
    };
    Ok(Box::new(TableSchema::parse(&data)?))
}

/// A snapshot of the catalog: one unbound table handle per row.
#[derive(Debug, Default)]
pub struct SchemaInfo {
    tables: Vec<TableId>,
}

impl SchemaInfo {
    /// The table handles, in catalog key order.
    #[must_use]
    pub fn tables(&self) -> &[TableId] {
        &self.tables
    }

    /// Number of tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// True when the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Consumes the snapshot, yielding the handles.
    #[must_use]
    pub fn into_tables(self) -> Vec<TableId> {
        self.tables
    }
}

/// Walks the whole catalog, validating every row and emitting one
/// unbound table name handle per table.
pub fn schema_fetch(txn: &mut SchemaTxn<'_>) -> SchemaResult<SchemaInfo> {
    let catalog = schema_open(txn, false)?;
    let mut cursor = txn.engine().cursor(catalog)?;

    let mut info = SchemaInfo::default();
    let mut row = cursor.first().map(|(k, v)| (k.to_vec(), v.to_vec()));
    while let Some((key, value)) = row {
        if info.tables.len() >= TABLES_MAX {
            return Err(SchemaError::SchemaCorrupted {
                reason: "too many tables",
            });
        }
        let key: [u8; 8] = key.as_slice().try_into().map_err(|_| {
            SchemaError::SchemaCorrupted {
                reason: "bad catalog key",
            }
        })?;
        let shove = Shove::from_raw(u64::from_le_bytes(key));
        if !shove.is_table() || shove.hash_payload() == 0 {
            return Err(SchemaError::SchemaCorrupted {
                reason: "bad catalog key",
            });
        }
        TableSchema::parse(&value)?;
        info.tables.push(TableId::from_shove(shove));
        row = cursor.next_entry().map(|(k, v)| (k.to_vec(), v.to_vec()));
    }
    Ok(info)
}
