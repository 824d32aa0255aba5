/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Power-correction expansion.
//!
//! Orders are processed from highest to lowest. Every cluster starts with
//! exponent 1 and loses the exponent of every already-finalized cluster that
//! contains it, so each maximal cluster counts once and each subcluster is raised
//! to whatever power cancels its over-representation. An order must be complete
//! before the next lower order reads its exponents.

use alloc::vec;
use alloc::vec::Vec;

use tracing::{debug, trace};

use crate::algebra::Algebra;
use crate::cluster::ClusterSet;
use crate::containment::MemberIndex;
use crate::error::{ExpansionError, Result};
use crate::memo::{Memo, MemoScope};

pub(crate) fn expand_power<A, C, M, F>(
    algebra: &A,
    clusters: &ClusterSet,
    context: &C,
    memo: &mut M,
    mut contribution: F,
    skip_null_exponents: bool,
) -> Result<A::Value>
where
    A: Algebra + ?Sized,
    C: ?Sized,
    M: Memo + ?Sized,
    F: FnMut(&[usize], &C, &mut M) -> Result<A::Value>,
{
    let mut memo = MemoScope::acquire(memo);

    if let Some(cluster) = clusters.single_cluster() {
        debug!(order = cluster.len(), "single cluster, power expansion bypassed");
        let value = contribution(cluster, context, &mut *memo)?;
        algebra.admit(&value)?;
        return Ok(value);
    }

    let mut result = algebra.identity();
    let mut finalized: Vec<(MemberIndex<'_>, Vec<i32>)> = Vec::with_capacity(clusters.order_count());

    for table in clusters.tables_rev() {
        let mut exponents = vec![1i32; table.len()];
        let mut evaluated = 0usize;

        for (row, cluster) in table.rows().enumerate() {
            let mut exponent = 1i32;
            for (higher, higher_exponents) in &finalized {
                let covered: i64 = higher
                    .supersets_of(cluster)
                    .map(|u| i64::from(higher_exponents[u]))
                    .sum();
                exponent = corrected_exponent(exponent, covered)
                    .ok_or_else(|| ExpansionError::ExponentOverflow { cluster: cluster.to_vec() })?;
            }
            exponents[row] = exponent;
            trace!(order = table.order(), row, exponent, "cluster exponent");
            if exponent == 0 && skip_null_exponents {
                continue;
            }

            let value = contribution(cluster, context, &mut *memo)?;
            algebra.admit(&value)?;
            result = algebra.combine(result, algebra.raise(value, exponent)?);
            evaluated += 1;
        }

        debug!(
            order = table.order(),
            clusters = table.len(),
            evaluated,
            "power expansion: order finalized"
        );
        finalized.push((MemberIndex::build(table), exponents));
    }

    Ok(result)
}

/// `exponent − covered`, or `None` once it leaves the `i32` range.
fn corrected_exponent(exponent: i32, covered: i64) -> Option<i32> {
    i64::from(exponent)
        .checked_sub(covered)
        .and_then(|e| i32::try_from(e).ok())
}
