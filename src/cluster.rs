/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Cluster tables and cluster sets.
//!
//! A cluster is a sorted list of distinct member indices; its length is the
//! cluster's *order*. All clusters of one order live in a [`ClusterTable`], a
//! rectangular row-major index table. A [`ClusterSet`] maps each order present to
//! its table. Orders need not be contiguous.
//!
//! Tables sort every row on insertion, so containment checks can walk two rows in
//! lockstep. Deserialized tables are rebuilt row by row through the same path.
//! Nothing else is checked on the hot path; call [`ClusterSet::validate`] when
//! the producer of the set is not trusted.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use hashbrown::HashSet;

use crate::error::{ExpansionError, Result};

// ─── ClusterTable ────────────────────────────────────────────────────────────

/// All clusters of a single order, stored as a flat row-major index table.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawClusterTable"))]
pub struct ClusterTable {
    order: usize,
    indices: Vec<usize>,
}

impl ClusterTable {
    /// Create an empty table for clusters of `order` members.
    pub fn new(order: usize) -> Self {
        Self { order, indices: Vec::new() }
    }

    /// Build a table from rows, all of which must have `order` members.
    pub fn from_rows<I, R>(order: usize, rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[usize]>,
    {
        let mut table = Self::new(order);
        for row in rows {
            table.push(row.as_ref())?;
        }
        Ok(table)
    }

    /// Append a cluster. The row is stored sorted ascending.
    pub fn push(&mut self, cluster: &[usize]) -> Result<()> {
        if cluster.is_empty() {
            return Err(ExpansionError::EmptyCluster);
        }
        if cluster.len() != self.order {
            return Err(ExpansionError::OrderMismatch {
                expected: self.order,
                found: cluster.len(),
            });
        }
        self.push_sorted(cluster);
        Ok(())
    }

    fn push_sorted(&mut self, cluster: &[usize]) {
        let start = self.indices.len();
        self.indices.extend_from_slice(cluster);
        self.indices[start..].sort_unstable();
    }

    /// Number of members per cluster.
    #[inline]
    pub fn order(&self) -> usize {
        self.order
    }

    /// Number of clusters (rows).
    #[inline]
    pub fn len(&self) -> usize {
        if self.order == 0 {
            0
        } else {
            self.indices.len() / self.order
        }
    }

    /// True when the table holds no clusters.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row `i`, sorted ascending. Panics if `i >= len()`.
    #[inline]
    pub fn row(&self, i: usize) -> &[usize] {
        &self.indices[i * self.order..(i + 1) * self.order]
    }

    /// Iterate over all rows in insertion order.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[usize]> + '_ {
        // chunks_exact panics on a zero chunk size; an order-0 table is always empty.
        self.indices.chunks_exact(self.order.max(1))
    }
}

/// Serialized shape of a [`ClusterTable`]; rows are re-checked and re-sorted.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawClusterTable {
    order: usize,
    indices: Vec<usize>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawClusterTable> for ClusterTable {
    type Error = ExpansionError;

    fn try_from(raw: RawClusterTable) -> Result<Self> {
        if raw.order == 0 {
            if raw.indices.is_empty() {
                return Ok(Self::new(0));
            }
            return Err(ExpansionError::EmptyCluster);
        }
        let trailing = raw.indices.len() % raw.order;
        if trailing != 0 {
            return Err(ExpansionError::OrderMismatch { expected: raw.order, found: trailing });
        }
        Self::from_rows(raw.order, raw.indices.chunks_exact(raw.order))
    }
}

// ─── ClusterSet ──────────────────────────────────────────────────────────────

/// Mapping from order to the table of clusters of that order.
///
/// Iteration over [`Self::tables`] is in ascending order, [`Self::tables_rev`]
/// in descending order; the two expansion variants walk the hierarchy in
/// opposite directions.
///
/// Collecting clusters with [`FromIterator`] silently skips empty clusters. Use
/// [`Self::try_from_clusters`] (or `TryFrom<Vec<Vec<usize>>>`) to reject them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawClusterSet"))]
pub struct ClusterSet {
    tables: BTreeMap<usize, ClusterTable>,
}

impl ClusterSet {
    /// Create an empty cluster set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect clusters into a set, failing on the first empty cluster.
    pub fn try_from_clusters<I, R>(clusters: I) -> Result<Self>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[usize]>,
    {
        let mut set = Self::new();
        for cluster in clusters {
            set.insert(cluster.as_ref())?;
        }
        Ok(set)
    }

    /// Insert one cluster into the table of its order, creating the table if needed.
    pub fn insert(&mut self, cluster: &[usize]) -> Result<()> {
        if cluster.is_empty() {
            return Err(ExpansionError::EmptyCluster);
        }
        self.tables
            .entry(cluster.len())
            .or_insert_with(|| ClusterTable::new(cluster.len()))
            .push(cluster)
    }

    /// Insert a whole table, replacing any existing table of the same order.
    ///
    /// Empty tables are dropped so that they never count as an order.
    pub fn insert_table(&mut self, table: ClusterTable) {
        if table.is_empty() {
            self.tables.remove(&table.order());
        } else {
            self.tables.insert(table.order(), table);
        }
    }

    /// Table of the given order, if present.
    pub fn table(&self, order: usize) -> Option<&ClusterTable> {
        self.tables.get(&order)
    }

    /// Orders present, ascending.
    pub fn orders(&self) -> impl Iterator<Item = usize> + '_ {
        self.tables.keys().copied()
    }

    /// Tables in ascending order.
    pub fn tables(&self) -> impl DoubleEndedIterator<Item = &ClusterTable> + '_ {
        self.tables.values()
    }

    /// Tables in descending order.
    pub fn tables_rev(&self) -> impl Iterator<Item = &ClusterTable> + '_ {
        self.tables.values().rev()
    }

    /// Number of distinct orders.
    pub fn order_count(&self) -> usize {
        self.tables.len()
    }

    /// Total number of clusters across all orders.
    pub fn len(&self) -> usize {
        self.tables.values().map(ClusterTable::len).sum()
    }

    /// True when the set contains no clusters.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The lone cluster, when the set has exactly one order holding exactly one row.
    ///
    /// This is the degenerate case in which both expansion variants return the
    /// contribution of that cluster unchanged.
    pub fn single_cluster(&self) -> Option<&[usize]> {
        if self.tables.len() != 1 {
            return None;
        }
        let table = self.tables.values().next()?;
        (table.len() == 1).then(|| table.row(0))
    }

    /// Check the structural assumptions the expansion relies on.
    ///
    /// Rejects tables filed under the wrong order or with a ragged index buffer,
    /// unsorted rows, repeated members within a cluster, repeated clusters within
    /// an order, and (when `member_count` is given) indices outside
    /// `0..member_count`. A set that passes produces the same result with or
    /// without this call.
    pub fn validate(&self, member_count: Option<usize>) -> Result<()> {
        for (&order, table) in &self.tables {
            if order != table.order || order == 0 {
                return Err(ExpansionError::OrderMismatch { expected: order, found: table.order });
            }
            if table.indices.len() % order != 0 {
                return Err(ExpansionError::OrderMismatch {
                    expected: order,
                    found: table.indices.len() % order,
                });
            }
            let mut seen: HashSet<&[usize]> = HashSet::with_capacity(table.len());
            for row in table.rows() {
                if let Some(w) = row.windows(2).find(|w| w[0] >= w[1]) {
                    if w[0] > w[1] {
                        return Err(ExpansionError::UnsortedCluster { cluster: row.to_vec() });
                    }
                    return Err(ExpansionError::DuplicateMember {
                        cluster: row.to_vec(),
                        member: w[0],
                    });
                }
                if let Some(n) = member_count {
                    // Rows are sorted, so the last entry is the largest.
                    if let Some(&max) = row.last() {
                        if max >= n {
                            return Err(ExpansionError::IndexOutOfRange {
                                index: max,
                                member_count: n,
                            });
                        }
                    }
                }
                if !seen.insert(row) {
                    return Err(ExpansionError::DuplicateCluster { cluster: row.to_vec() });
                }
            }
        }
        Ok(())
    }
}

impl<R: AsRef<[usize]>> FromIterator<R> for ClusterSet {
    /// Collect clusters into a set. Empty clusters are skipped.
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        let mut set = Self::new();
        for cluster in iter {
            let cluster = cluster.as_ref();
            if cluster.is_empty() {
                continue;
            }
            set.tables
                .entry(cluster.len())
                .or_insert_with(|| ClusterTable::new(cluster.len()))
                .push_sorted(cluster);
        }
        set
    }
}

impl TryFrom<Vec<Vec<usize>>> for ClusterSet {
    type Error = ExpansionError;

    fn try_from(clusters: Vec<Vec<usize>>) -> Result<Self> {
        Self::try_from_clusters(clusters)
    }
}

/// Serialized shape of a [`ClusterSet`]; each table must sit under its own order.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawClusterSet {
    tables: BTreeMap<usize, ClusterTable>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawClusterSet> for ClusterSet {
    type Error = ExpansionError;

    fn try_from(raw: RawClusterSet) -> Result<Self> {
        let mut set = Self::new();
        for (order, table) in raw.tables {
            if order != table.order() {
                return Err(ExpansionError::OrderMismatch { expected: order, found: table.order() });
            }
            set.insert_table(table);
        }
        Ok(set)
    }
}
