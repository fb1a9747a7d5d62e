//! Leveled transactions.

use std::fmt;

use parking_lot::MutexGuard;
use tessera_common::types::Csn;

use crate::cmp::Comparator;
use crate::cursor::Cursor;
use crate::db::{Database, Dbi};
use crate::error::{EngineError, EngineResult};
use crate::flags::TreeFlags;

/// The privilege level of a transaction.
///
/// Levels are ordered: every schema transaction is also a write
/// transaction, and every write transaction can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TxnLevel {
    /// Read-only snapshot of the last committed state.
    Read,
    /// Exclusive writer; may modify tree contents.
    Write,
    /// Exclusive writer that may also create and drop trees and advance
    /// the schema version.
    Schema,
}

impl fmt::Display for TxnLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxnLevel::Read => write!(f, "read"),
            TxnLevel::Write => write!(f, "write"),
            TxnLevel::Schema => write!(f, "schema"),
        }
    }
}

/// An engine transaction.
///
/// Write and schema transactions hold the database's single writer slot
/// for their whole lifetime; schema transactions are therefore globally
/// exclusive with respect to every other writer.
pub struct Transaction<'db> {
    db: &'db Database,
    level: TxnLevel,
    db_version: Csn,
    schema_version: Csn,
    aborted: bool,
    _writer: Option<MutexGuard<'db, ()>>,
}

impl fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("level", &self.level)
            .field("db_version", &self.db_version)
            .field("schema_version", &self.schema_version)
            .field("aborted", &self.aborted)
            .finish()
    }
}

impl<'db> Transaction<'db> {
    pub(crate) fn new(
        db: &'db Database,
        level: TxnLevel,
        db_version: Csn,
        schema_version: Csn,
        writer: Option<MutexGuard<'db, ()>>,
    ) -> Self {
        Self {
            db,
            level,
            db_version,
            schema_version,
            aborted: false,
            _writer: writer,
        }
    }

    /// The transaction's level.
    #[inline]
    #[must_use]
    pub fn level(&self) -> TxnLevel {
        self.level
    }

    /// The database version this transaction runs at.
    ///
    /// For writers this is the version the commit will publish.
    #[inline]
    #[must_use]
    pub fn db_version(&self) -> Csn {
        self.db_version
    }

    /// The schema version visible to this transaction.
    #[inline]
    #[must_use]
    pub fn schema_version(&self) -> Csn {
        self.schema_version
    }

    /// Advances the schema version visible to this transaction.
    ///
    /// Only schema-level transactions change the schema version; the new
    /// value becomes globally visible at commit.
    pub fn set_schema_version(&mut self, version: Csn) {
        debug_assert_eq!(self.level, TxnLevel::Schema);
        self.schema_version = version;
    }

    /// Returns true if this transaction has been aborted.
    #[inline]
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Marks the transaction as aborted without consuming it.
    ///
    /// Every subsequent operation, including commit, fails with
    /// [`EngineError::TxnAborted`].
    pub fn poison(&mut self) {
        self.aborted = true;
    }

    fn ensure_active(&self) -> EngineResult<()> {
        if self.aborted {
            return Err(EngineError::TxnAborted);
        }
        Ok(())
    }

    fn ensure_writable(&self) -> EngineResult<()> {
        self.ensure_active()?;
        if self.level < TxnLevel::Write {
            return Err(EngineError::ReadOnly { level: self.level });
        }
        Ok(())
    }

    /// Opens a named tree, creating it when [`TreeFlags::CREATE`] is set.
    ///
    /// Reopening an existing tree returns its handle after checking that
    /// the requested shape matches the stored one. Creation requires at
    /// least write level.
    pub fn open_tree(
        &mut self,
        name: &str,
        flags: TreeFlags,
        key_cmp: Comparator,
        data_cmp: Comparator,
    ) -> EngineResult<Dbi> {
        self.ensure_active()?;
        if flags.contains(TreeFlags::CREATE) && self.level < TxnLevel::Write {
            return Err(EngineError::ReadOnly { level: self.level });
        }
        self.db.open_tree(name, flags, key_cmp, data_cmp)
    }

    /// Looks up the value stored under `key`.
    pub fn get(&self, dbi: Dbi, key: &[u8]) -> EngineResult<Vec<u8>> {
        self.ensure_active()?;
        self.db.get(dbi, key)
    }

    /// Stores `value` under `key`.
    ///
    /// With `no_overwrite`, fails with [`EngineError::KeyExists`] if the
    /// key is already present.
    pub fn put(&mut self, dbi: Dbi, key: &[u8], value: &[u8], no_overwrite: bool) -> EngineResult<()> {
        self.ensure_writable()?;
        self.db.put(dbi, key, value, no_overwrite)
    }

    /// Deletes the entry under `key`.
    ///
    /// For dup-sort trees a `value` selects which duplicate to delete.
    pub fn del(&mut self, dbi: Dbi, key: &[u8], value: Option<&[u8]>) -> EngineResult<()> {
        self.ensure_writable()?;
        self.db.del(dbi, key, value)
    }

    /// Opens a read cursor over the tree.
    pub fn cursor(&self, dbi: Dbi) -> EngineResult<Cursor> {
        self.ensure_active()?;
        self.db.cursor(dbi)
    }

    /// Drops a tree.
    ///
    /// With `delete_contents` the tree itself is removed and its handle
    /// becomes invalid; otherwise the tree is merely emptied.
    pub fn drop_tree(&mut self, dbi: Dbi, delete_contents: bool) -> EngineResult<()> {
        self.ensure_writable()?;
        self.db.drop_tree(dbi, delete_contents)
    }

    /// Commits the transaction, publishing its version counters.
    pub fn commit(self) -> EngineResult<()> {
        self.ensure_active()?;
        if self.level >= TxnLevel::Write {
            self.db.publish(self.db_version, self.schema_version);
        }
        Ok(())
    }

    /// Abandons the transaction.
    ///
    /// The writer slot is released; version counters stay unpublished.
    pub fn abort(self) {
        drop(self);
    }
}
