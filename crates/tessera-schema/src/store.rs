//! The table store: the engine session plus the schema subsystem's
//! per-session state.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};

use parking_lot::Mutex;
use tessera_common::types::Csn;
use tessera_engine::{Database, Dbi, EngineConfig, Transaction, TxnLevel};

use crate::cache::DbiCache;
use crate::error::SchemaResult;

/// A typed-table store over one engine database.
///
/// Owns the session-wide state the schema subsystem needs beyond the
/// engine itself: the shove-to-handle cache, the cached catalog tree
/// handle, and the DBI mutex that serializes tree opens from non-schema
/// transactions.
///
/// # Example
///
/// ```rust
/// use tessera_schema::{ColType, ColumnSet, IndexKind, TableStore, TxnLevel};
///
/// # fn main() -> tessera_schema::SchemaResult<()> {
/// let store = TableStore::default();
/// let mut set = ColumnSet::new();
/// set.describe("id", ColType::Uint64, IndexKind::PrimaryUniqueOrderedObverse)?;
///
/// let mut txn = store.begin(TxnLevel::Schema);
/// tessera_schema::create_table(&mut txn, "users", &mut set)?;
/// txn.commit()?;
/// # Ok(())
/// # }
/// ```
pub struct TableStore {
    engine: Database,
    cache: DbiCache,
    dbi_mutex: Mutex<()>,
    schema_dbi: AtomicU32,
}

impl fmt::Debug for TableStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableStore")
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl Default for TableStore {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl TableStore {
    /// Creates a store over a fresh engine database.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            engine: Database::new(config),
            cache: DbiCache::new(),
            dbi_mutex: Mutex::new(()),
            schema_dbi: AtomicU32::new(Dbi::INVALID.as_raw()),
        }
    }

    /// Begins a schema-layer transaction at the given level.
    #[must_use]
    pub fn begin(&self, level: TxnLevel) -> SchemaTxn<'_> {
        SchemaTxn {
            store: self,
            inner: self.engine.begin(level),
        }
    }

    /// The underlying engine database.
    ///
    /// The schema layer is a thin abstraction; row storage drives the
    /// engine directly through the handles this crate resolves.
    #[must_use]
    pub fn engine(&self) -> &Database {
        &self.engine
    }

    pub(crate) fn cache(&self) -> &DbiCache {
        &self.cache
    }

    pub(crate) fn dbi_mutex(&self) -> &Mutex<()> {
        &self.dbi_mutex
    }

    /// The cached catalog tree handle, invalid until first opened.
    pub(crate) fn schema_dbi(&self) -> Dbi {
        Dbi::from_raw(self.schema_dbi.load(AtomicOrdering::Acquire))
    }

    pub(crate) fn set_schema_dbi(&self, dbi: Dbi) {
        self.schema_dbi.store(dbi.as_raw(), AtomicOrdering::Release);
    }
}

/// A transaction over a [`TableStore`].
///
/// All schema operations (`refresh_*`, `open_*`, `create_table`,
/// `drop_table`, `schema_fetch`) take one of these.
#[derive(Debug)]
pub struct SchemaTxn<'db> {
    store: &'db TableStore,
    inner: Transaction<'db>,
}

impl<'db> SchemaTxn<'db> {
    /// The transaction's level.
    #[inline]
    #[must_use]
    pub fn level(&self) -> TxnLevel {
        self.inner.level()
    }

    /// The database version this transaction runs at.
    #[inline]
    #[must_use]
    pub fn db_version(&self) -> Csn {
        self.inner.db_version()
    }

    /// The schema version visible to this transaction.
    #[inline]
    #[must_use]
    pub fn schema_version(&self) -> Csn {
        self.inner.schema_version()
    }

    /// True if the transaction was aborted by an escalated DDL failure.
    #[inline]
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.inner.is_aborted()
    }

    /// Commits the transaction.
    pub fn commit(self) -> SchemaResult<()> {
        self.inner.commit().map_err(Into::into)
    }

    /// Abandons the transaction.
    pub fn abort(self) {
        self.inner.abort();
    }

    pub(crate) fn store(&self) -> &'db TableStore {
        self.store
    }

    pub(crate) fn engine(&self) -> &Transaction<'db> {
        &self.inner
    }

    pub(crate) fn engine_mut(&mut self) -> &mut Transaction<'db> {
        &mut self.inner
    }

    pub(crate) fn set_schema_version(&mut self, version: Csn) {
        self.inner.set_schema_version(version);
    }

    pub(crate) fn poison(&mut self) {
        self.inner.poison();
    }
}
