/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Subset tests between clusters.
//!
//! [`contains`] and [`contains_batch`] are the direct forms. [`MemberIndex`] is what
//! the expansion uses: an inverted index over one [`ClusterTable`] so that finding
//! every row related to a cluster costs time proportional to the rows that share
//! members with it, not to the size of the table.

use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::cluster::ClusterTable;

/// True iff every member of `candidate` also appears in `container`.
///
/// Both slices must be sorted ascending, as rows of a [`ClusterTable`] are.
pub fn contains(candidate: &[usize], container: &[usize]) -> bool {
    if candidate.len() > container.len() {
        return false;
    }
    let mut rest = container.iter();
    'outer: for &member in candidate {
        for &other in rest.by_ref() {
            if other == member {
                continue 'outer;
            }
            if other > member {
                return false;
            }
        }
        return false;
    }
    true
}

/// For every row of `candidates`, whether that row is contained in `container`.
pub fn contains_batch(candidates: &ClusterTable, container: &[usize]) -> Vec<bool> {
    candidates.rows().map(|row| contains(row, container)).collect()
}

// ─── MemberIndex ─────────────────────────────────────────────────────────────

/// Inverted index from member to the rows of one table that hold it.
///
/// Built once per table per expansion call and dropped with it.
#[derive(Debug)]
pub struct MemberIndex<'t> {
    table: &'t ClusterTable,
    postings: HashMap<usize, Vec<usize>>,
}

impl<'t> MemberIndex<'t> {
    /// Index every row of `table`.
    pub fn build(table: &'t ClusterTable) -> Self {
        let mut postings: HashMap<usize, Vec<usize>> = HashMap::new();
        for (row, members) in table.rows().enumerate() {
            for &member in members {
                postings.entry(member).or_default().push(row);
            }
        }
        Self { table, postings }
    }

    /// The indexed table.
    pub fn table(&self) -> &'t ClusterTable {
        self.table
    }

    fn posting(&self, member: usize) -> &[usize] {
        self.postings.get(&member).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Rows that contain every member of `cluster`, ascending.
    pub fn supersets_of<'a>(&'a self, cluster: &'a [usize]) -> impl Iterator<Item = usize> + 'a {
        // Any superset must hold the rarest member, so its posting list bounds the scan.
        let rarest = cluster
            .iter()
            .map(|&m| self.posting(m))
            .min_by_key(|p| p.len())
            .unwrap_or(&[]);
        rarest
            .iter()
            .copied()
            .filter(move |&row| contains(cluster, self.table.row(row)))
    }

    /// Rows all of whose members lie in `cluster`, ascending.
    ///
    /// A row qualifies when the number of `cluster` members it holds equals the
    /// table order. Rows are assumed to have distinct members.
    pub fn subsets_of(&self, cluster: &[usize]) -> Vec<usize> {
        let order = self.table.order();
        if order > cluster.len() {
            return Vec::new();
        }
        let mut hits: HashMap<usize, usize> = HashMap::new();
        for &member in cluster {
            for &row in self.posting(member) {
                *hits.entry(row).or_insert(0) += 1;
            }
        }
        let mut rows: Vec<usize> = hits
            .into_iter()
            .filter_map(|(row, count)| (count == order).then_some(row))
            .collect();
        rows.sort_unstable();
        rows
    }
}
