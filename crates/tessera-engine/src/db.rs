//! The engine database: a registry of named trees plus version counters.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use parking_lot::{Mutex, RwLock};
use tessera_common::types::Csn;
use tracing::debug;

use crate::cmp::Comparator;
use crate::config::EngineConfig;
use crate::cursor::Cursor;
use crate::error::{EngineError, EngineResult};
use crate::flags::TreeFlags;
use crate::tree::Tree;
use crate::txn::{Transaction, TxnLevel};

/// Handle to one open tree within a database.
///
/// Zero is never a valid handle; it doubles as the empty marker in the
/// schema layer's handle cache.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Dbi(u32);

impl Dbi {
    /// Invalid handle, used as a sentinel value.
    pub const INVALID: Self = Self(0);

    /// Reconstructs a handle from its raw representation.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw representation.
    #[inline]
    #[must_use]
    pub const fn as_raw(self) -> u32 {
        self.0
    }

    /// Checks if this is a valid handle.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != Self::INVALID.0
    }

    fn index(self) -> usize {
        self.0 as usize - 1
    }
}

impl fmt::Debug for Dbi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "Dbi(INVALID)")
        } else {
            write!(f, "Dbi({})", self.0)
        }
    }
}

impl fmt::Display for Dbi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Default)]
struct Registry {
    slots: Vec<Option<Tree>>,
    by_name: HashMap<String, Dbi>,
}

impl Registry {
    fn tree(&self, dbi: Dbi) -> EngineResult<&Tree> {
        if !dbi.is_valid() {
            return Err(EngineError::InvalidDbi);
        }
        self.slots
            .get(dbi.index())
            .and_then(Option::as_ref)
            .ok_or(EngineError::InvalidDbi)
    }

    fn tree_mut(&mut self, dbi: Dbi) -> EngineResult<&mut Tree> {
        if !dbi.is_valid() {
            return Err(EngineError::InvalidDbi);
        }
        self.slots
            .get_mut(dbi.index())
            .and_then(Option::as_mut)
            .ok_or(EngineError::InvalidDbi)
    }

    fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

/// An engine database session.
///
/// The database owns every named tree and the two global counters the
/// schema layer depends on: the monotonic database version and the CSN of
/// the last committed schema change.
pub struct Database {
    config: EngineConfig,
    registry: RwLock<Registry>,
    writer: Mutex<()>,
    committed_version: AtomicU64,
    committed_schema: AtomicU64,
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("version", &self.committed_version.load(AtomicOrdering::Relaxed))
            .field(
                "schema_version",
                &self.committed_schema.load(AtomicOrdering::Relaxed),
            )
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Creates an empty database session.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            registry: RwLock::new(Registry::default()),
            writer: Mutex::new(()),
            committed_version: AtomicU64::new(Csn::FIRST.as_u64()),
            committed_schema: AtomicU64::new(Csn::INVALID.as_u64()),
        }
    }

    /// Begins a transaction at the given level.
    ///
    /// Write and schema transactions block until the writer slot is free
    /// and hold it until they end; read transactions never block.
    pub fn begin(&self, level: TxnLevel) -> Transaction<'_> {
        let writer = (level >= TxnLevel::Write).then(|| self.writer.lock());
        let committed = Csn::new(self.committed_version.load(AtomicOrdering::Acquire));
        let db_version = if level >= TxnLevel::Write {
            committed.next()
        } else {
            committed
        };
        let schema_version = Csn::new(self.committed_schema.load(AtomicOrdering::Acquire));
        Transaction::new(self, level, db_version, schema_version, writer)
    }

    pub(crate) fn publish(&self, db_version: Csn, schema_version: Csn) {
        self.committed_version
            .store(db_version.as_u64(), AtomicOrdering::Release);
        self.committed_schema
            .store(schema_version.as_u64(), AtomicOrdering::Release);
    }

    pub(crate) fn open_tree(
        &self,
        name: &str,
        flags: TreeFlags,
        key_cmp: Comparator,
        data_cmp: Comparator,
    ) -> EngineResult<Dbi> {
        let mut registry = self.registry.write();
        if let Some(&dbi) = registry.by_name.get(name) {
            let tree = registry.tree(dbi)?;
            if tree.flags.shape() != flags.shape() {
                return Err(EngineError::IncompatibleFlags { name: name.into() });
            }
            return Ok(dbi);
        }
        if !flags.contains(TreeFlags::CREATE) {
            return Err(EngineError::TreeNotFound { name: name.into() });
        }
        if registry.live_count() >= self.config.max_trees {
            return Err(EngineError::TooManyTrees {
                max: self.config.max_trees,
            });
        }
        registry
            .slots
            .push(Some(Tree::new(name.into(), flags.shape(), key_cmp, data_cmp)));
        let dbi = Dbi(registry.slots.len() as u32);
        registry.by_name.insert(name.into(), dbi);
        debug!(name, %dbi, "created tree");
        Ok(dbi)
    }

    pub(crate) fn get(&self, dbi: Dbi, key: &[u8]) -> EngineResult<Vec<u8>> {
        self.registry.read().tree(dbi)?.get(key)
    }

    pub(crate) fn put(
        &self,
        dbi: Dbi,
        key: &[u8],
        value: &[u8],
        no_overwrite: bool,
    ) -> EngineResult<()> {
        self.registry.write().tree_mut(dbi)?.put(key, value, no_overwrite)
    }

    pub(crate) fn del(&self, dbi: Dbi, key: &[u8], value: Option<&[u8]>) -> EngineResult<()> {
        self.registry.write().tree_mut(dbi)?.del(key, value)
    }

    pub(crate) fn cursor(&self, dbi: Dbi) -> EngineResult<Cursor> {
        Ok(Cursor::new(self.registry.read().tree(dbi)?.snapshot()))
    }

    pub(crate) fn drop_tree(&self, dbi: Dbi, delete_contents: bool) -> EngineResult<()> {
        let mut registry = self.registry.write();
        if delete_contents {
            let name = registry.tree(dbi)?.name.clone();
            registry.by_name.remove(&name);
            registry.slots[dbi.index()] = None;
            debug!(name, %dbi, "dropped tree");
        } else {
            registry.tree_mut(dbi)?.clear();
        }
        Ok(())
    }
}
