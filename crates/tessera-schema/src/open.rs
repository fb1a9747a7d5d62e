//! Opening the engine trees behind tables and column indexes.

use tracing::debug;

use tessera_engine::{Dbi, EngineError, TreeFlags, TxnLevel};

use crate::error::{SchemaError, SchemaResult};
use crate::handle::{ColumnId, TableId};
use crate::index::{comparator_for, data_shove, dbi_flags};
use crate::shove::Shove;
use crate::store::SchemaTxn;

/// Opens the tree named by `shove`, consulting and maintaining the handle
/// cache through `hint`.
///
/// Below schema level the session's DBI mutex is taken around the engine
/// open, with a second cache lookup after locking so two racing readers
/// do not both open the tree. Schema-level transactions are globally
/// exclusive and skip the mutex.
///
/// The cache is only ever populated by read-level transactions: a handle
/// opened under a write or schema transaction may be rolled back with it,
/// and publishing it would leave the cache pointing at a tree the engine
/// later discards.
pub(crate) fn dbi_open(
    txn: &mut SchemaTxn<'_>,
    shove: Shove,
    flags: TreeFlags,
    key_shove: Shove,
    data_shove: Shove,
    mut hint: Option<&mut Option<usize>>,
) -> SchemaResult<Dbi> {
    let store = txn.store();
    if let Some(hint) = hint.as_mut() {
        let handle = store.cache().lookup(shove, hint);
        if handle.is_valid() {
            return Ok(handle);
        }
    }

    let guard = (txn.level() < TxnLevel::Schema).then(|| store.dbi_mutex().lock());
    if guard.is_some() {
        if let Some(hint) = hint.as_mut() {
            let handle = store.cache().lookup(shove, hint);
            if handle.is_valid() {
                return Ok(handle);
            }
        }
    }

    let name = shove.tree_name();
    let result = txn.engine_mut().open_tree(
        &name,
        flags,
        comparator_for(key_shove),
        comparator_for(data_shove),
    );
    match result {
        Ok(dbi) => {
            if txn.level() == TxnLevel::Read {
                if let Some(hint) = hint.as_mut() {
                    **hint = store.cache().insert(shove, dbi);
                    debug!(name, %dbi, "cached tree handle");
                }
            }
            Ok(dbi)
        }
        Err(EngineError::TreeNotFound { .. }) => Err(SchemaError::NotFound),
        Err(err) => Err(err.into()),
    }
}

/// Opens the primary tree of a refreshed table.
pub fn open_table(txn: &mut SchemaTxn<'_>, table: &mut TableId) -> SchemaResult<Dbi> {
    let tree_shove = Shove::dbi(table.shove(), 0);
    let peeked = txn.store().cache().peek(tree_shove, table.hint());
    if peeked.is_valid() {
        return Ok(peeked);
    }

    let (flags, data) = {
        let def = table.schema().ok_or(SchemaError::InvalidArgument {
            message: "table handle not refreshed",
        })?;
        (dbi_flags(def.columns(), 0), data_shove(def.columns(), 0))
    };
    let pk = table.pk();
    dbi_open(txn, tree_shove, flags, pk, data, Some(table.hint_mut()))
}

/// Opens the table tree and the index tree of one refreshed column.
///
/// Column 0 is the primary key, whose index is the table tree itself;
/// non-indexed columns live inside the rows, so they also resolve to the
/// table tree. Only secondary index columns have a tree of their own.
pub fn open_column(
    txn: &mut SchemaTxn<'_>,
    table: &mut TableId,
    column: &mut ColumnId,
) -> SchemaResult<(Dbi, Dbi)> {
    if column.table_shove() != table.shove() {
        return Err(SchemaError::InvalidArgument {
            message: "column is bound to a different table",
        });
    }
    let num = column.num().ok_or(SchemaError::NoSuchColumn)?;

    let tbl = open_table(txn, table)?;
    if num == 0 || !column.shove().is_indexed() {
        return Ok((tbl, tbl));
    }

    let tree_shove = Shove::dbi(table.shove(), num);
    let peeked = txn.store().cache().peek(tree_shove, column.hint());
    if peeked.is_valid() {
        return Ok((tbl, peeked));
    }

    let flags = {
        let def = table.schema().ok_or(SchemaError::InvalidArgument {
            message: "table handle not refreshed",
        })?;
        dbi_flags(def.columns(), num)
    };
    let key = column.shove();
    let pk = table.pk();
    let idx = dbi_open(txn, tree_shove, flags, key, pk, Some(column.hint_mut()))?;
    Ok((tbl, idx))
}

/// Opens the table tree and every secondary index tree, in position
/// order, stopping at the first non-indexed column.
pub fn open_secondaries(txn: &mut SchemaTxn<'_>, table: &mut TableId) -> SchemaResult<Vec<Dbi>> {
    let mut handles = vec![open_table(txn, table)?];

    let columns = {
        let def = table.schema().ok_or(SchemaError::InvalidArgument {
            message: "table handle not refreshed",
        })?;
        def.columns().to_vec()
    };
    let pk = table.pk();
    for (at, col) in columns.iter().enumerate().skip(1) {
        if !col.is_indexed() {
            break;
        }
        let mut scratch = None;
        let dbi = dbi_open(
            txn,
            Shove::dbi(table.shove(), at),
            dbi_flags(&columns, at),
            *col,
            pk,
            Some(&mut scratch),
        )?;
        handles.push(dbi);
    }
    Ok(handles)
}
