//! A single named ordered tree.

use std::cmp::Ordering;

use crate::cmp::Comparator;
use crate::error::{EngineError, EngineResult};
use crate::flags::TreeFlags;

/// One named tree: a vector of entries kept sorted by the key comparator,
/// with data-comparator tiebreaking when duplicates are allowed.
#[derive(Debug)]
pub(crate) struct Tree {
    pub(crate) name: String,
    pub(crate) flags: TreeFlags,
    pub(crate) key_cmp: Comparator,
    pub(crate) data_cmp: Comparator,
    entries: Vec<(Vec<u8>, Vec<u8>)>,
}

impl Tree {
    pub(crate) fn new(
        name: String,
        flags: TreeFlags,
        key_cmp: Comparator,
        data_cmp: Comparator,
    ) -> Self {
        Self {
            name,
            flags,
            key_cmp,
            data_cmp,
            entries: Vec::new(),
        }
    }

    fn order(&self, entry: &(Vec<u8>, Vec<u8>), key: &[u8], value: Option<&[u8]>) -> Ordering {
        let by_key = self.key_cmp.cmp(&entry.0, key);
        match (by_key, value) {
            (Ordering::Equal, Some(value)) if self.flags.contains(TreeFlags::DUP_SORT) => {
                self.data_cmp.cmp(&entry.1, value)
            }
            _ => by_key,
        }
    }

    /// Index of the first entry with the given key, if any.
    fn find(&self, key: &[u8]) -> Option<usize> {
        let at = self
            .entries
            .partition_point(|e| self.key_cmp.cmp(&e.0, key) == Ordering::Less);
        (at < self.entries.len() && self.key_cmp.cmp(&self.entries[at].0, key) == Ordering::Equal)
            .then_some(at)
    }

    pub(crate) fn get(&self, key: &[u8]) -> EngineResult<Vec<u8>> {
        self.find(key)
            .map(|at| self.entries[at].1.clone())
            .ok_or(EngineError::KeyNotFound)
    }

    pub(crate) fn put(&mut self, key: &[u8], value: &[u8], no_overwrite: bool) -> EngineResult<()> {
        if let Some(at) = self.find(key) {
            if no_overwrite {
                return Err(EngineError::KeyExists);
            }
            if self.flags.contains(TreeFlags::DUP_SORT) {
                let ins = self.entries.partition_point(|e| {
                    self.order(e, key, Some(value)) == Ordering::Less
                });
                self.entries.insert(ins, (key.to_vec(), value.to_vec()));
            } else {
                self.entries[at].1 = value.to_vec();
            }
            return Ok(());
        }
        let ins = self
            .entries
            .partition_point(|e| self.key_cmp.cmp(&e.0, key) == Ordering::Less);
        self.entries.insert(ins, (key.to_vec(), value.to_vec()));
        Ok(())
    }

    pub(crate) fn del(&mut self, key: &[u8], value: Option<&[u8]>) -> EngineResult<()> {
        let mut at = self.find(key).ok_or(EngineError::KeyNotFound)?;
        if let Some(value) = value {
            while at < self.entries.len()
                && self.key_cmp.cmp(&self.entries[at].0, key) == Ordering::Equal
            {
                if self.data_cmp.cmp(&self.entries[at].1, value) == Ordering::Equal {
                    self.entries.remove(at);
                    return Ok(());
                }
                at += 1;
            }
            return Err(EngineError::KeyNotFound);
        }
        self.entries.remove(at);
        Ok(())
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn snapshot(&self) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.entries.clone()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
