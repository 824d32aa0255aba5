/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Cluster-correlation expansion: combine per-cluster contributions without
//! counting any subcluster twice.
//!
//! Two interchangeable methods are provided:
//!
//! - [`ExpansionMethod::Power`] walks orders from highest to lowest and gives every
//!   cluster an integer exponent `e(v) = 1 − Σ e(u)` over the already-visited
//!   clusters `u ⊋ v`. The result is `Π raise(f(v), e(v))`.
//! - [`ExpansionMethod::Direct`] walks orders from lowest to highest and corrects
//!   every contribution by removing the aggregated corrected ("tilde") values of all
//!   strictly contained clusters: `f̃(v) = remove(f(v), Π f̃(u))` over `u ⊊ v`. The
//!   result is `Π f̃(v)`.
//!
//! By Möbius inversion over the containment lattice both give the same value
//! whenever `raise(a, n)` is `n`-fold `combine`. The direct method needs no power
//! operator, so it also serves algebras where negative or fractional powers are
//! meaningless.
//!
//! A set holding exactly one cluster bypasses all bookkeeping: the contribution of
//! that cluster is returned as is.
//!
//! ```
//! use cce_core::{ClusterExpansion, ClusterSet, Product};
//!
//! // {0,1} contains both singletons, so their exponents drop to zero.
//! let clusters: ClusterSet = [vec![0, 1], vec![0], vec![1]].into_iter().collect();
//! let engine = ClusterExpansion::new(Product::<f64>::new());
//! let total = engine
//!     .expand(&clusters, &(), |cluster, _| {
//!         Ok(match cluster {
//!             [0, 1] => 4.0,
//!             [0] => 2.0,
//!             _ => 3.0,
//!         })
//!     })
//!     .unwrap();
//! assert_eq!(total, 4.0);
//! ```

mod direct;
mod power;

use core::fmt;
use core::str::FromStr;

use crate::algebra::Algebra;
use crate::cluster::ClusterSet;
use crate::error::{ExpansionError, Result};
use crate::memo::Memo;

// ─── ExpansionMethod ─────────────────────────────────────────────────────────

/// Which correction algorithm to run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ExpansionMethod {
    /// Inclusion–exclusion exponents, highest order first. Needs `raise`.
    #[default]
    Power,
    /// Tilde-value subtraction, lowest order first. Needs `remove` and `aggregate`.
    Direct,
}

impl ExpansionMethod {
    /// Lowercase name, as accepted by [`FromStr`].
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Power => "power",
            Self::Direct => "direct",
        }
    }

    /// The operator this method cannot run without.
    pub const fn required_operator(self) -> &'static str {
        match self {
            Self::Power => "raise",
            Self::Direct => "remove",
        }
    }
}

impl fmt::Display for ExpansionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpansionMethod {
    type Err = ExpansionError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "power" => Ok(Self::Power),
            "direct" => Ok(Self::Direct),
            other => Err(ExpansionError::UnknownMethod(other.into())),
        }
    }
}

// ─── ExpansionConfig ─────────────────────────────────────────────────────────

/// Configuration for [`ClusterExpansion`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ExpansionConfig {
    /// Method used by [`ClusterExpansion::expand`]. Default: `Power`.
    pub method: ExpansionMethod,

    /// Run [`ClusterSet::validate`] before every expansion. Default: `false`.
    pub validate: bool,

    /// Size of the member collection, checked when `validate` is set. Default: `None`.
    pub member_count: Option<usize>,

    /// Power method only: do not evaluate clusters whose exponent is exactly zero.
    ///
    /// Their factor is `raise(f, 0) = identity` for every lawful algebra, so the
    /// result is unchanged while fully covered subclusters are never computed.
    /// Default: `false`.
    pub skip_null_exponents: bool,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            method: ExpansionMethod::Power,
            validate: false,
            member_count: None,
            skip_null_exponents: false,
        }
    }
}

// ─── ClusterExpansion ────────────────────────────────────────────────────────

/// Expansion engine bound to one algebra and one configuration.
///
/// Contributions are supplied per call as a callback `(cluster, context) -> value`.
/// The callback sees each cluster as its sorted member indices.
#[derive(Clone, Debug, Default)]
pub struct ClusterExpansion<A> {
    algebra: A,
    config: ExpansionConfig,
}

impl<A: Algebra> ClusterExpansion<A> {
    /// Engine with the default configuration (power method, no validation).
    pub fn new(algebra: A) -> Self {
        Self::with_config(algebra, ExpansionConfig::default())
    }

    /// Engine with an explicit configuration.
    pub fn with_config(algebra: A, config: ExpansionConfig) -> Self {
        Self { algebra, config }
    }

    /// The bound algebra.
    pub fn algebra(&self) -> &A {
        &self.algebra
    }

    /// The bound configuration.
    pub fn config(&self) -> &ExpansionConfig {
        &self.config
    }

    /// Expand with the configured method.
    pub fn expand<C, F>(&self, clusters: &ClusterSet, context: &C, mut contribution: F) -> Result<A::Value>
    where
        C: ?Sized,
        F: FnMut(&[usize], &C) -> Result<A::Value>,
    {
        self.run(self.config.method, clusters, context, &mut (), |cluster, ctx, _| {
            contribution(cluster, ctx)
        })
    }

    /// Expand with the configured method, handing `memo` to every callback.
    ///
    /// The power method clears `memo` before returning, on success and on error.
    /// The direct method leaves it as the callback left it.
    pub fn expand_with_memo<C, M, F>(
        &self,
        clusters: &ClusterSet,
        context: &C,
        memo: &mut M,
        contribution: F,
    ) -> Result<A::Value>
    where
        C: ?Sized,
        M: Memo + ?Sized,
        F: FnMut(&[usize], &C, &mut M) -> Result<A::Value>,
    {
        self.run(self.config.method, clusters, context, memo, contribution)
    }

    /// Expand with the power method regardless of configuration.
    pub fn expand_power<C, F>(&self, clusters: &ClusterSet, context: &C, mut contribution: F) -> Result<A::Value>
    where
        C: ?Sized,
        F: FnMut(&[usize], &C) -> Result<A::Value>,
    {
        self.run(ExpansionMethod::Power, clusters, context, &mut (), |cluster, ctx, _| {
            contribution(cluster, ctx)
        })
    }

    /// Power method with a memo that is cleared when the call returns.
    pub fn expand_power_with_memo<C, M, F>(
        &self,
        clusters: &ClusterSet,
        context: &C,
        memo: &mut M,
        contribution: F,
    ) -> Result<A::Value>
    where
        C: ?Sized,
        M: Memo + ?Sized,
        F: FnMut(&[usize], &C, &mut M) -> Result<A::Value>,
    {
        self.run(ExpansionMethod::Power, clusters, context, memo, contribution)
    }

    /// Expand with the direct method regardless of configuration.
    pub fn expand_direct<C, F>(&self, clusters: &ClusterSet, context: &C, mut contribution: F) -> Result<A::Value>
    where
        C: ?Sized,
        F: FnMut(&[usize], &C) -> Result<A::Value>,
    {
        self.run(ExpansionMethod::Direct, clusters, context, &mut (), |cluster, ctx, _| {
            contribution(cluster, ctx)
        })
    }

    fn run<C, M, F>(
        &self,
        method: ExpansionMethod,
        clusters: &ClusterSet,
        context: &C,
        memo: &mut M,
        contribution: F,
    ) -> Result<A::Value>
    where
        C: ?Sized,
        M: Memo + ?Sized,
        F: FnMut(&[usize], &C, &mut M) -> Result<A::Value>,
    {
        if self.config.validate {
            clusters.validate(self.config.member_count)?;
        }
        if !self.algebra.supports(method) {
            return Err(ExpansionError::MissingOperator {
                operator: method.required_operator(),
            });
        }
        match method {
            ExpansionMethod::Power => power::expand_power(
                &self.algebra,
                clusters,
                context,
                memo,
                contribution,
                self.config.skip_null_exponents,
            ),
            ExpansionMethod::Direct => {
                direct::expand_direct(&self.algebra, clusters, context, memo, contribution)
            }
        }
    }
}
