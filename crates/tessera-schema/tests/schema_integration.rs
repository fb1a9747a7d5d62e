//! End-to-end schema subsystem tests against a live store.

use std::collections::HashSet;

use tessera_engine::{Comparator, TreeFlags};
use tessera_schema::{
    check_unindexed_columns, create_table, drop_table, open_column, open_secondaries,
    open_table, refresh_couple, refresh_table, schema_fetch, ColType, ColumnId, ColumnSet,
    EngineConfig, ErrorCode, FieldLookup, IndexKind, NameKind, SchemaError, Shove, TableId,
    TableStore, TxnLevel,
};

/// Columns of the canonical test table: a unique ordered u64 primary, a
/// with-dups ordered string secondary, and a plain u32.
fn users_columns() -> ColumnSet {
    let mut set = ColumnSet::new();
    set.describe("pk", ColType::Uint64, IndexKind::PrimaryUniqueOrderedObverse)
        .unwrap();
    set.describe("name", ColType::Str, IndexKind::SecondaryWithdupsOrderedObverse)
        .unwrap();
    set.describe("age", ColType::Uint32, IndexKind::None).unwrap();
    set
}

fn create(store: &TableStore, name: &str, set: &mut ColumnSet) {
    let mut txn = store.begin(TxnLevel::Schema);
    create_table(&mut txn, name, set).unwrap();
    txn.commit().unwrap();
}

/// Reads a raw catalog row through the engine, bypassing the schema layer.
fn catalog_row(store: &TableStore, table: &str) -> Vec<u8> {
    let shove = Shove::of_name(table, NameKind::Table);
    let mut txn = store.engine().begin(TxnLevel::Write);
    let dbi = txn
        .open_tree(
            "@",
            TreeFlags::INTEGER_KEY,
            Comparator::Unsigned,
            Comparator::Lexical,
        )
        .unwrap();
    let row = txn.get(dbi, &shove.as_raw().to_le_bytes()).unwrap();
    txn.abort();
    row
}

/// Overwrites a raw catalog row through the engine.
fn put_catalog_row(store: &TableStore, table: &str, row: &[u8]) {
    let shove = Shove::of_name(table, NameKind::Table);
    let mut txn = store.engine().begin(TxnLevel::Write);
    let dbi = txn
        .open_tree(
            "@",
            TreeFlags::INTEGER_KEY,
            Comparator::Unsigned,
            Comparator::Lexical,
        )
        .unwrap();
    txn.put(dbi, &shove.as_raw().to_le_bytes(), row, false).unwrap();
    txn.commit().unwrap();
}

#[test]
fn create_fetch_open() {
    let store = TableStore::default();
    create(&store, "users", &mut users_columns());

    let mut txn = store.begin(TxnLevel::Read);
    let info = schema_fetch(&mut txn).unwrap();
    assert_eq!(info.len(), 1);
    assert!(info.tables()[0]
        .shove()
        .name_eq(Shove::of_name("users", NameKind::Table)));

    let mut table = TableId::new("users").unwrap();
    let mut pk = ColumnId::new(&table, "pk").unwrap();
    let mut name = ColumnId::new(&table, "name").unwrap();
    let mut age = ColumnId::new(&table, "age").unwrap();
    refresh_couple(&mut txn, &mut table, Some(&mut pk)).unwrap();
    refresh_couple(&mut txn, &mut table, Some(&mut name)).unwrap();
    refresh_couple(&mut txn, &mut table, Some(&mut age)).unwrap();
    assert_eq!(pk.num(), Some(0));
    assert_eq!(name.num(), Some(1));
    assert_eq!(age.num(), Some(2));

    let (tbl, pk_idx) = open_column(&mut txn, &mut table, &mut pk).unwrap();
    assert_eq!(tbl, pk_idx);

    let (_, name_idx) = open_column(&mut txn, &mut table, &mut name).unwrap();
    assert_ne!(name_idx, pk_idx);

    // A non-indexed column lives inside the rows of the table tree.
    let (_, age_idx) = open_column(&mut txn, &mut table, &mut age).unwrap();
    assert_eq!(age_idx, pk_idx);

    let handles = open_secondaries(&mut txn, &mut table).unwrap();
    assert_eq!(handles, vec![tbl, name_idx]);
}

#[test]
fn open_visible_within_creating_txn() {
    let store = TableStore::default();
    let mut txn = store.begin(TxnLevel::Schema);
    create_table(&mut txn, "users", &mut users_columns()).unwrap();

    // DDL effects are visible to the same transaction immediately.
    let mut table = TableId::new("users").unwrap();
    refresh_table(&mut txn, &mut table).unwrap();
    assert_eq!(table.column_count(), Some(3));
    open_table(&mut txn, &mut table).unwrap();
    txn.commit().unwrap();
}

#[test]
fn duplicate_create_keeps_row() {
    let store = TableStore::default();
    create(&store, "users", &mut users_columns());
    let before = catalog_row(&store, "users");

    let mut txn = store.begin(TxnLevel::Schema);
    let err = create_table(&mut txn, "users", &mut users_columns()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::Eexist);
    txn.abort();

    assert_eq!(catalog_row(&store, "users"), before);

    let mut txn = store.begin(TxnLevel::Read);
    assert_eq!(schema_fetch(&mut txn).unwrap().len(), 1);
}

#[test]
fn drop_then_refresh_stale_handle() {
    let store = TableStore::default();
    create(&store, "users", &mut users_columns());

    let mut table = TableId::new("users").unwrap();
    {
        let mut txn = store.begin(TxnLevel::Read);
        refresh_table(&mut txn, &mut table).unwrap();
        assert!(table.schema().is_some());
    }

    let mut txn = store.begin(TxnLevel::Schema);
    drop_table(&mut txn, "users").unwrap();
    txn.commit().unwrap();

    let mut txn = store.begin(TxnLevel::Read);
    let err = refresh_table(&mut txn, &mut table).unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
    // The owned schema copy was released.
    assert!(table.schema().is_none());
    assert_eq!(schema_fetch(&mut txn).unwrap().len(), 0);
}

#[test]
fn drop_missing_table() {
    let store = TableStore::default();
    create(&store, "other", &mut users_columns());

    let mut txn = store.begin(TxnLevel::Schema);
    let err = drop_table(&mut txn, "users").unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[test]
fn corruption_detected_on_read() {
    let store = TableStore::default();
    create(&store, "users", &mut users_columns());

    // Flip one byte inside columns[0] of the persisted record.
    let mut row = catalog_row(&store, "users");
    row[40] ^= 0x01;
    put_catalog_row(&store, "users", &row);

    let mut table = TableId::new("users").unwrap();
    let mut txn = store.begin(TxnLevel::Read);
    let err = refresh_table(&mut txn, &mut table).unwrap_err();
    assert_eq!(err.code(), ErrorCode::SchemaCorrupted);

    let err = schema_fetch(&mut txn).unwrap_err();
    assert_eq!(err.code(), ErrorCode::SchemaCorrupted);
}

#[test]
fn stale_newer_handle_is_schema_changed() {
    let store = TableStore::default();
    create(&store, "t1", &mut users_columns());

    let mut old_txn = store.begin(TxnLevel::Read);

    create(&store, "t2", &mut users_columns());

    let mut table = TableId::new("t1").unwrap();
    let mut new_txn = store.begin(TxnLevel::Read);
    refresh_table(&mut new_txn, &mut table).unwrap();

    // The handle now carries a schema version the older snapshot cannot
    // see.
    let err = refresh_table(&mut old_txn, &mut table).unwrap_err();
    assert_eq!(err.code(), ErrorCode::SchemaChanged);

    // Re-initializing the handle recovers.
    table.reset();
    refresh_table(&mut old_txn, &mut table).unwrap();
}

#[test]
fn column_refresh_tracks_schema() {
    let store = TableStore::default();
    create(&store, "users", &mut users_columns());

    let mut table = TableId::new("users").unwrap();
    let mut ghost = ColumnId::new(&table, "salary").unwrap();
    let mut txn = store.begin(TxnLevel::Read);
    let err = refresh_couple(&mut txn, &mut table, Some(&mut ghost)).unwrap_err();
    assert_eq!(err.code(), ErrorCode::Enoent);
    assert_eq!(ghost.num(), None);
    // The table itself still bound.
    assert_eq!(table.column_count(), Some(3));
}

#[test]
fn column_get_observes_canonical_order() {
    let store = TableStore::default();
    // Described out of order: secondary, primary, secondary, plain.
    let mut set = ColumnSet::new();
    set.describe("sec1", ColType::Str, IndexKind::SecondaryWithdupsOrderedObverse)
        .unwrap();
    set.describe("pk", ColType::Uint64, IndexKind::PrimaryUniqueOrderedObverse)
        .unwrap();
    set.describe("sec2", ColType::Str, IndexKind::SecondaryWithdupsOrderedObverse)
        .unwrap();
    set.describe("c", ColType::Uint32, IndexKind::None).unwrap();
    create(&store, "t", &mut set);

    let mut table = TableId::new("t").unwrap();
    let mut txn = store.begin(TxnLevel::Read);
    refresh_table(&mut txn, &mut table).unwrap();
    assert_eq!(table.column_count(), Some(4));

    let expect = ["pk", "sec1", "sec2", "c"];
    for (at, name) in expect.iter().enumerate() {
        let column = table.column_get(at).unwrap();
        assert!(column
            .shove()
            .name_eq(Shove::of_name(name, NameKind::Column)));
        assert_eq!(column.num(), Some(at));
    }
}

#[test]
fn removing_primary_invalidates_set() {
    let mut set = users_columns();
    set.validate().unwrap();
    set.remove("pk").unwrap();
    let err = set.validate().unwrap_err();
    assert_eq!(err.code(), ErrorCode::Einval);
}

#[test]
fn reverse_index_type_rules() {
    let mut set = ColumnSet::new();
    let err = set
        .describe("n", ColType::Uint32, IndexKind::SecondaryWithdupsOrderedReverse)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::Einval);

    set.describe("w", ColType::Bin128, IndexKind::SecondaryWithdupsOrderedReverse)
        .unwrap();
}

#[test]
fn failed_index_creation_unwinds() {
    // Capacity for the catalog and the primary tree only; creating the
    // secondary index tree must fail and unwind the primary.
    let store = TableStore::new(EngineConfig::default().with_max_trees(2));

    let mut txn = store.begin(TxnLevel::Schema);
    let err = create_table(&mut txn, "users", &mut users_columns()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::Engine);
    assert!(!txn.is_aborted());
    txn.commit().unwrap();

    // No catalog row and no leftover trees.
    let mut txn = store.begin(TxnLevel::Read);
    assert!(schema_fetch(&mut txn).unwrap().is_empty());
    drop(txn);

    let table_shove = Shove::of_name("users", NameKind::Table);
    let mut engine_txn = store.engine().begin(TxnLevel::Write);
    for slot in 0..2 {
        let name = Shove::dbi(table_shove, slot).tree_name();
        let result = engine_txn.open_tree(
            &name,
            TreeFlags::empty(),
            Comparator::Lexical,
            Comparator::Lexical,
        );
        assert!(result.is_err(), "index tree {slot} survived the rollback");
    }
}

#[test]
fn failed_catalog_insert_unwinds() {
    let store = TableStore::default();
    create(&store, "users", &mut users_columns());

    let table_shove = Shove::of_name("users", NameKind::Table);
    let before = catalog_row(&store, "users");

    // Simulate a half-dropped table: the catalog row survives but the
    // index trees are gone, so a re-create passes pre-flight and fails
    // only at the no-overwrite catalog insert.
    {
        let mut txn = store.engine().begin(TxnLevel::Write);
        let pk_tree = txn
            .open_tree(
                &Shove::dbi(table_shove, 0).tree_name(),
                TreeFlags::INTEGER_KEY,
                Comparator::Unsigned,
                Comparator::RowBlob,
            )
            .unwrap();
        txn.drop_tree(pk_tree, true).unwrap();
        let name_tree = txn
            .open_tree(
                &Shove::dbi(table_shove, 1).tree_name(),
                TreeFlags::DUP_SORT,
                Comparator::Lexical,
                Comparator::Unsigned,
            )
            .unwrap();
        txn.drop_tree(name_tree, true).unwrap();
        txn.commit().unwrap();
    }

    let mut txn = store.begin(TxnLevel::Schema);
    let err = create_table(&mut txn, "users", &mut users_columns()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::Eexist);
    txn.abort();

    // The freshly created trees were dropped again and the old catalog
    // row is untouched.
    assert_eq!(catalog_row(&store, "users"), before);
    let mut engine_txn = store.engine().begin(TxnLevel::Write);
    for slot in 0..2 {
        let name = Shove::dbi(table_shove, slot).tree_name();
        let result = engine_txn.open_tree(
            &name,
            TreeFlags::empty(),
            Comparator::Lexical,
            Comparator::Lexical,
        );
        assert!(result.is_err(), "index tree {slot} survived the rollback");
    }
}

#[test]
fn ddl_requires_schema_level() {
    let store = TableStore::default();
    let mut txn = store.begin(TxnLevel::Write);
    let err = create_table(&mut txn, "users", &mut users_columns()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::Einval);
    let err = drop_table(&mut txn, "users").unwrap_err();
    assert_eq!(err.code(), ErrorCode::Einval);
}

struct FieldSet(HashSet<(usize, ColType)>);

impl FieldLookup for FieldSet {
    fn has_field(&self, column: usize, ty: ColType) -> bool {
        self.0.contains(&(column, ty))
    }
}

#[test]
fn unindexed_columns_checked_against_rows() {
    let store = TableStore::default();
    create(&store, "users", &mut users_columns());

    let mut table = TableId::new("users").unwrap();
    let mut txn = store.begin(TxnLevel::Read);
    refresh_table(&mut txn, &mut table).unwrap();

    // "age" sits at position 2 after canonicalization.
    let full = FieldSet([(2, ColType::Uint32)].into_iter().collect());
    check_unindexed_columns(&table, &full).unwrap();

    let empty = FieldSet(HashSet::new());
    let err = check_unindexed_columns(&table, &empty).unwrap_err();
    assert!(matches!(err, SchemaError::ColumnMissing { column: 2 }));
}

#[test]
fn cached_handles_survive_transactions() {
    let store = TableStore::default();
    create(&store, "users", &mut users_columns());

    let mut table = TableId::new("users").unwrap();
    let first = {
        let mut txn = store.begin(TxnLevel::Read);
        refresh_table(&mut txn, &mut table).unwrap();
        open_table(&mut txn, &mut table).unwrap()
    };

    // A later transaction at the same schema version resolves through
    // the cache hint to the same engine handle.
    let second = {
        let mut txn = store.begin(TxnLevel::Read);
        refresh_table(&mut txn, &mut table).unwrap();
        open_table(&mut txn, &mut table).unwrap()
    };
    assert_eq!(first, second);
}
