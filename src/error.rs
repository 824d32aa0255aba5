/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Errors raised while building cluster sets or running an expansion.
//!
//! Three families, matching how callers are expected to react:
//!
//! - **Configuration**: the engine was bound to an algebra that lacks an operator
//!   the selected method needs, or an unknown method name was supplied. Reported
//!   before any contribution is evaluated.
//! - **Arithmetic**: an operator is undefined for its operands (zero raised to a
//!   negative power, division by a zero aggregate). Propagated unchanged; the
//!   partial aggregate is discarded.
//! - **Malformed input**: only produced by table construction and the optional
//!   [`crate::cluster::ClusterSet::validate`] pass.

use alloc::string::String;
use alloc::vec::Vec;

/// Result alias for `cce-core`.
pub type Result<T> = core::result::Result<T, ExpansionError>;

/// Errors returned by cluster-set construction and the expansion engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExpansionError {
    /// The algebra does not provide an operator required by the selected method.
    #[error("algebra does not define the `{operator}` operator")]
    MissingOperator {
        /// Operator name (`"raise"` or `"remove"`).
        operator: &'static str,
    },

    /// An expansion method name could not be parsed.
    #[error("unknown expansion method `{0}` (expected `power` or `direct`)")]
    UnknownMethod(String),

    /// `raise` is undefined for this value/exponent pair.
    #[error("power undefined for exponent {exponent}")]
    UndefinedPower {
        /// Combinatorial exponent that could not be applied.
        exponent: i32,
    },

    /// A combinatorial exponent left the `i32` range.
    #[error("combinatorial exponent of cluster {cluster:?} overflows")]
    ExponentOverflow {
        /// Cluster whose exponent could not be represented.
        cluster: Vec<usize>,
    },

    /// A vector contribution does not match the algebra's length.
    #[error("value of length {found} does not match algebra length {expected}")]
    LengthMismatch {
        /// Length fixed by the algebra.
        expected: usize,
        /// Length of the offending value.
        found: usize,
    },

    /// `remove` is undefined for this pair (e.g. division by zero).
    #[error("singular removal: aggregated subcluster value is not invertible")]
    SingularRemoval,

    /// A cluster with no members.
    #[error("cluster must contain at least one member")]
    EmptyCluster,

    /// A row of the wrong width was pushed into a table.
    #[error("cluster of order {found} does not fit a table of order {expected}")]
    OrderMismatch {
        /// Order of the table.
        expected: usize,
        /// Length of the offending cluster.
        found: usize,
    },

    /// A cluster lists the same member more than once.
    #[error("cluster {cluster:?} repeats member {member}")]
    DuplicateMember {
        /// Offending cluster.
        cluster: Vec<usize>,
        /// Repeated member index.
        member: usize,
    },

    /// A stored cluster is not in ascending member order.
    #[error("cluster {cluster:?} is not sorted")]
    UnsortedCluster {
        /// Offending cluster as stored.
        cluster: Vec<usize>,
    },

    /// The same index set appears twice within one order.
    #[error("cluster {cluster:?} appears more than once")]
    DuplicateCluster {
        /// Offending cluster.
        cluster: Vec<usize>,
    },

    /// A member index lies outside the member collection.
    #[error("member index {index} out of range for {member_count} members")]
    IndexOutOfRange {
        /// Offending index.
        index: usize,
        /// Size of the member collection.
        member_count: usize,
    },

    /// The caller's contribution callback failed.
    #[error("contribution for cluster {cluster:?} failed: {message}")]
    Contribution {
        /// Cluster being evaluated.
        cluster: Vec<usize>,
        /// Callback-supplied description.
        message: String,
    },
}

impl ExpansionError {
    /// True for operator failures on concrete operands.
    #[inline]
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            Self::UndefinedPower { .. } | Self::ExponentOverflow { .. } | Self::SingularRemoval
        )
    }

    /// True for errors caused by how the engine was set up rather than by its input.
    #[inline]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingOperator { .. } | Self::UnknownMethod(_))
    }
}
