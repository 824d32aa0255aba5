/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Caller-owned memoization for contribution callbacks.
//!
//! A contribution callback often recomputes the same sub-results for many
//! clusters of one expansion (per-member operators, per-order bases). The caller
//! owns a [`Memo`], hands it to the power expansion, and the callback receives it
//! on every invocation. The expansion wraps it in a [`MemoScope`] that clears it
//! exactly once on every exit path, so no state leaks from one call into the next.

use alloc::vec::Vec;
use core::ops::{Deref, DerefMut};

use hashbrown::HashMap;

use crate::error::Result;

/// Anything the power expansion should reset when it returns.
pub trait Memo {
    /// Drop all memoized state.
    fn clear(&mut self);
}

impl Memo for () {
    fn clear(&mut self) {}
}

/// Memo keyed by cluster members.
#[derive(Clone, Debug)]
pub struct ScopedCache<V> {
    entries: HashMap<Vec<usize>, V>,
}

impl<V> ScopedCache<V> {
    /// Empty cache.
    pub fn new() -> Self {
        Self { entries: HashMap::new() }
    }

    /// Cached value for `key`, if any.
    pub fn get(&self, key: &[usize]) -> Option<&V> {
        self.entries.get(key)
    }

    /// Store a value, returning the previous one.
    pub fn insert(&mut self, key: &[usize], value: V) -> Option<V> {
        self.entries.insert(key.to_vec(), value)
    }

    /// Return the cached value for `key`, computing and storing it on a miss.
    ///
    /// A failing `compute` leaves the cache unchanged.
    pub fn get_or_try_insert_with<F>(&mut self, key: &[usize], compute: F) -> Result<&V>
    where
        F: FnOnce() -> Result<V>,
    {
        if !self.entries.contains_key(key) {
            let value = compute()?;
            self.entries.insert(key.to_vec(), value);
        }
        // Present: either found above or just inserted.
        Ok(&self.entries[key])
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Default for ScopedCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Memo for ScopedCache<V> {
    fn clear(&mut self) {
        self.entries.clear();
    }
}

// ─── MemoScope ───────────────────────────────────────────────────────────────

/// Exclusive borrow of a [`Memo`] that clears it when dropped.
///
/// Held by the power expansion for the whole call, including the single-cluster
/// fast path and early returns on error.
pub struct MemoScope<'m, M: Memo + ?Sized> {
    memo: &'m mut M,
}

impl<'m, M: Memo + ?Sized> MemoScope<'m, M> {
    /// Acquire `memo` for the duration of one expansion.
    pub fn acquire(memo: &'m mut M) -> Self {
        Self { memo }
    }
}

impl<M: Memo + ?Sized> Deref for MemoScope<'_, M> {
    type Target = M;

    fn deref(&self) -> &M {
        self.memo
    }
}

impl<M: Memo + ?Sized> DerefMut for MemoScope<'_, M> {
    fn deref_mut(&mut self) -> &mut M {
        self.memo
    }
}

impl<M: Memo + ?Sized> Drop for MemoScope<'_, M> {
    fn drop(&mut self) {
        self.memo.clear();
        tracing::debug!("memo released");
    }
}
