//! Sparse set: O(1) insert, remove and membership with a packed dense array
//!
//! The dense array is what iteration walks. Removal swaps the last element
//! into the vacated slot, so callers that keep parallel dense arrays can
//! mirror it with `Vec::swap_remove` on the returned index.

use super::{EcsError, Entity, Result};

const NONE: usize = usize::MAX;

/// Keys that map onto a slot of the sparse array.
pub trait SparseKey: Copy + Eq {
    fn sparse_index(self) -> usize;
}

impl SparseKey for u32 {
    #[inline]
    fn sparse_index(self) -> usize {
        self as usize
    }
}

/// Entities share a slot per id; only one version can occupy it at a time.
impl SparseKey for Entity {
    #[inline]
    fn sparse_index(self) -> usize {
        self.id() as usize
    }
}

#[derive(Debug, Clone)]
pub struct SparseSet<K: SparseKey> {
    dense: Vec<K>,
    sparse: Vec<usize>,
}

impl<K: SparseKey> SparseSet<K> {
    pub fn new() -> Self {
        Self {
            dense: Vec::new(),
            sparse: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            dense: Vec::with_capacity(capacity),
            sparse: vec![NONE; capacity],
        }
    }

    /// Dense index of whatever key currently occupies `key`'s slot.
    #[inline]
    pub fn slot(&self, key: K) -> Option<usize> {
        match self.sparse.get(key.sparse_index()) {
            Some(&index) if index != NONE => Some(index),
            _ => None,
        }
    }

    /// Dense index of `key` itself.
    #[inline]
    pub fn position(&self, key: K) -> Option<usize> {
        self.slot(key).filter(|&index| self.dense[index] == key)
    }

    #[inline]
    pub fn contains(&self, key: K) -> bool {
        self.position(key).is_some()
    }

    /// Inserts `key` and returns its dense index. A different key sharing the
    /// slot is overwritten in place.
    pub fn insert(&mut self, key: K) -> usize {
        if let Some(index) = self.slot(key) {
            self.dense[index] = key;
            return index;
        }

        let slot = key.sparse_index();
        if slot >= self.sparse.len() {
            self.sparse.resize(slot + 1, NONE);
        }
        let index = self.dense.len();
        self.sparse[slot] = index;
        self.dense.push(key);
        index
    }

    /// Removes `key` and returns the dense index it vacated.
    pub fn remove(&mut self, key: K) -> Option<usize> {
        let index = self.position(key)?;
        let last = self.dense.len() - 1;
        if index != last {
            let moved = self.dense[last];
            self.sparse[moved.sparse_index()] = index;
        }
        self.dense.swap_remove(index);
        self.sparse[key.sparse_index()] = NONE;
        Some(index)
    }

    pub fn get(&self, index: usize) -> Result<K> {
        self.dense.get(index).copied().ok_or(EcsError::IndexOutOfRange {
            index,
            len: self.dense.len(),
        })
    }

    #[inline]
    pub fn as_slice(&self) -> &[K] {
        &self.dense
    }

    pub fn iter(&self) -> impl Iterator<Item = K> + '_ {
        self.dense.iter().copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    pub fn clear(&mut self) {
        for key in &self.dense {
            self.sparse[key.sparse_index()] = NONE;
        }
        self.dense.clear();
    }
}

impl<K: SparseKey> Default for SparseSet<K> {
    fn default() -> Self {
        Self::new()
    }
}
