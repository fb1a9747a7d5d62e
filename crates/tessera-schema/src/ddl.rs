//! CREATE TABLE and DROP TABLE.
//!
//! Both run inside a schema-level transaction. Atomicity with respect to
//! the underlying trees is provided here, not by the engine: a failing
//! CREATE drops every tree it created, and a failure during that cleanup
//! escalates to poisoning the transaction so nothing of the half-built
//! table can commit.

use tracing::{debug, warn};

use tessera_engine::{Dbi, EngineError, TreeFlags, TxnLevel};

use crate::catalog::schema_open;
use crate::column_set::ColumnSet;
use crate::error::{SchemaError, SchemaResult};
use crate::index::{data_shove, dbi_flags};
use crate::open::dbi_open;
use crate::record::TableSchema;
use crate::shove::{validate_name, NameKind, Shove};
use crate::store::SchemaTxn;

fn ensure_schema_level(txn: &SchemaTxn<'_>) -> SchemaResult<()> {
    if txn.level() != TxnLevel::Schema {
        return Err(SchemaError::WrongTxnLevel {
            need: TxnLevel::Schema,
        });
    }
    Ok(())
}

/// Drops the listed index trees and purges them from the handle cache.
///
/// A failure here escalates: the transaction is poisoned and the drop
/// error is returned, so the caller's transaction cannot commit with
/// trees dangling outside any catalog row.
fn drop_index_trees(
    txn: &mut SchemaTxn<'_>,
    table_shove: Shove,
    trees: &[(usize, Dbi)],
) -> SchemaResult<()> {
    for &(slot, dbi) in trees {
        txn.store().cache().remove(Shove::dbi(table_shove, slot));
        if let Err(err) = txn.engine_mut().drop_tree(dbi, true) {
            warn!(%dbi, slot, %err, "index tree drop failed, aborting transaction");
            txn.poison();
            return Err(err.into());
        }
    }
    Ok(())
}

/// Creates a table from a column set.
///
/// The column set is canonicalized and validated, every index tree is
/// pre-flighted to not exist, then created, and finally the schema record
/// is inserted into the catalog with no-overwrite. Any failure unwinds
/// the trees created so far.
pub fn create_table(
    txn: &mut SchemaTxn<'_>,
    name: &str,
    columns: &mut ColumnSet,
) -> SchemaResult<()> {
    ensure_schema_level(txn)?;
    if !validate_name(name) {
        return Err(SchemaError::InvalidName { name: name.into() });
    }
    columns.validate()?;

    schema_open(txn, true)?;
    let table_shove = Shove::of_name(name, NameKind::Table);
    let cols = columns.columns().to_vec();

    // Pre-flight: every index tree must be absent.
    for (at, col) in cols.iter().enumerate() {
        if !col.is_indexed() {
            break;
        }
        match dbi_open(
            txn,
            Shove::dbi(table_shove, at),
            dbi_flags(&cols, at),
            *col,
            data_shove(&cols, at),
            None,
        ) {
            Err(SchemaError::NotFound) => {}
            _ => return Err(SchemaError::TableExists),
        }
    }

    // Create phase.
    let mut created: Vec<(usize, Dbi)> = Vec::new();
    for (at, col) in cols.iter().enumerate() {
        if !col.is_indexed() {
            break;
        }
        match dbi_open(
            txn,
            Shove::dbi(table_shove, at),
            dbi_flags(&cols, at) | TreeFlags::CREATE,
            *col,
            data_shove(&cols, at),
            None,
        ) {
            Ok(dbi) => created.push((at, dbi)),
            Err(err) => {
                drop_index_trees(txn, table_shove, &created)?;
                return Err(err);
            }
        }
    }

    let record = TableSchema::new(txn.db_version(), table_shove, cols);
    let key = table_shove.as_raw().to_le_bytes();
    let catalog = txn.store().schema_dbi();
    match txn.engine_mut().put(catalog, &key, &record.serialize(), true) {
        Ok(()) => {}
        Err(EngineError::KeyExists) => {
            drop_index_trees(txn, table_shove, &created)?;
            return Err(SchemaError::TableExists);
        }
        Err(err) => {
            drop_index_trees(txn, table_shove, &created)?;
            return Err(err.into());
        }
    }

    let version = txn.db_version();
    txn.set_schema_version(version);
    debug!(table = name, %version, indexes = created.len(), "created table");
    Ok(())
}

/// Drops a table: its catalog row and every index tree the record names.
///
/// Index trees that are already gone are tolerated, so a partially
/// created table can still be cleaned up. A failing tree drop after the
/// catalog row is deleted escalates to transaction abort.
pub fn drop_table(txn: &mut SchemaTxn<'_>, name: &str) -> SchemaResult<()> {
    ensure_schema_level(txn)?;
    if !validate_name(name) {
        return Err(SchemaError::InvalidName { name: name.into() });
    }

    let catalog = schema_open(txn, true)?;
    let table_shove = Shove::of_name(name, NameKind::Table);
    let key = table_shove.as_raw().to_le_bytes();
    let data = match txn.engine().get(catalog, &key) {
        Ok(data) => data,
        Err(EngineError::KeyNotFound) => return Err(SchemaError::NotFound),
        Err(err) => return Err(err.into()),
    };
    let record = TableSchema::parse(&data)?;
    let cols = record.columns().to_vec();

    let mut opened: Vec<(usize, Dbi)> = Vec::new();
    for (at, col) in cols.iter().enumerate() {
        if !col.is_indexed() {
            break;
        }
        match dbi_open(
            txn,
            Shove::dbi(table_shove, at),
            dbi_flags(&cols, at),
            *col,
            data_shove(&cols, at),
            None,
        ) {
            Ok(dbi) => opened.push((at, dbi)),
            // A partially created table may be mid-cleanup.
            Err(SchemaError::NotFound) => {}
            Err(err) => return Err(err),
        }
    }

    txn.engine_mut().del(catalog, &key, None)?;
    let version = txn.db_version();
    txn.set_schema_version(version);

    drop_index_trees(txn, table_shove, &opened)?;
    debug!(table = name, %version, "dropped table");
    Ok(())
}
