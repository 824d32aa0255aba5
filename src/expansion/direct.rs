/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Direct-subtraction expansion.
//!
//! Orders are processed from lowest to highest. Each cluster's raw contribution
//! is corrected by removing, order by order, the aggregate of the tilde values of
//! every strictly contained cluster already processed. The corrected value is kept
//! for higher orders and folded into the result.

use alloc::vec::Vec;

use tracing::debug;

use crate::algebra::Algebra;
use crate::cluster::ClusterSet;
use crate::containment::MemberIndex;
use crate::error::Result;
use crate::memo::Memo;

pub(crate) fn expand_direct<A, C, M, F>(
    algebra: &A,
    clusters: &ClusterSet,
    context: &C,
    memo: &mut M,
    mut contribution: F,
) -> Result<A::Value>
where
    A: Algebra + ?Sized,
    C: ?Sized,
    M: Memo + ?Sized,
    F: FnMut(&[usize], &C, &mut M) -> Result<A::Value>,
{
    if let Some(cluster) = clusters.single_cluster() {
        debug!(order = cluster.len(), "single cluster, direct expansion bypassed");
        let value = contribution(cluster, context, &mut *memo)?;
        algebra.admit(&value)?;
        return Ok(value);
    }

    let mut result = algebra.identity();
    let mut tilde: Vec<(MemberIndex<'_>, Vec<A::Value>)> = Vec::with_capacity(clusters.order_count());

    for table in clusters.tables() {
        let mut corrected = Vec::with_capacity(table.len());

        for cluster in table.rows() {
            let mut value = contribution(cluster, context, &mut *memo)?;
            algebra.admit(&value)?;
            for (lower, lower_tilde) in &tilde {
                let contained = lower.subsets_of(cluster);
                if let Some(correction) = algebra.aggregate(contained.iter().map(|&u| &lower_tilde[u])) {
                    value = algebra.remove(value, correction)?;
                }
            }
            result = algebra.combine(result, value.clone());
            corrected.push(value);
        }

        debug!(
            order = table.order(),
            clusters = table.len(),
            "direct expansion: order finalized"
        );
        tilde.push((MemberIndex::build(table), corrected));
    }

    Ok(result)
}
