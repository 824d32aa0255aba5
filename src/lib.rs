//! # cce-core
//!
//! Cluster-correlation expansion: aggregate per-cluster contributions over a
//! hierarchy of nested member subsets without double counting.
//!
//! ---
//!
//! ## What it computes
//!
//! A system of many interacting members is approximated from contributions
//! computed on small subsets ("clusters") of members. A pair `{0,1}` already
//! accounts for everything the singletons `{0}` and `{1}` contribute, so simply
//! multiplying every contribution together would count those singletons twice.
//! The engine removes exactly that over-counting, across any number of orders and
//! any irregular pattern of containment.
//!
//! The per-cluster contribution is the caller's: a callback receives a cluster's
//! sorted member indices plus an opaque context and returns a value. How values
//! combine is the caller's too: an [`Algebra`] fixes `combine`, `raise`, `remove`
//! and `aggregate` once per engine.
//!
//! ## The pipeline
//!
//! ```text
//! ClusterSet ──► MemberIndex ──► contribution(cluster, ctx) ──► exponent / tilde ──► aggregate
//!                 (containment)        (caller)                  (power / direct)     (Algebra)
//! ```
//!
//! ## Module overview
//!
//! | Module | Key types | What it does |
//! |--------|-----------|--------------|
//! | [`cluster`] | [`ClusterTable`], [`ClusterSet`] | Clusters grouped by order; optional validation |
//! | [`containment`] | [`contains`], [`MemberIndex`] | Subset tests, single and batched |
//! | [`algebra`] | [`Algebra`], [`Product`], [`Sum`], [`FnAlgebra`] | Operator sets for combining contributions |
//! | [`memo`] | [`Memo`], [`ScopedCache`] | Caller-owned memo cleared after each power expansion |
//! | [`expansion`] | [`ClusterExpansion`], [`ExpansionConfig`] | The power and direct expansions |
//! | [`error`] | [`ExpansionError`] | Configuration, arithmetic and input errors |
//!
//! ## `no_std`
//!
//! This crate is `#![no_std]` by default and needs only `alloc`. Enable `std` to
//! forward to the standard library, `serde` to (de)serialize cluster sets and
//! configuration, and `python-ffi` for the Python extension module.
//!
//! ## License
//!
//! Business Source License 1.1.

#![cfg_attr(not(any(feature = "std", feature = "python-ffi")), no_std)]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

#[cfg(any(feature = "std", feature = "python-ffi"))]
extern crate std;

pub mod algebra;
pub mod cluster;
pub mod containment;
pub mod error;
pub mod expansion;
pub mod memo;

#[cfg(feature = "python-ffi")]
pub mod ffi;

pub use algebra::{Algebra, ElementwiseProduct, FnAlgebra, Product, Sum};
pub use cluster::{ClusterSet, ClusterTable};
pub use containment::{contains, contains_batch, MemberIndex};
pub use error::{ExpansionError, Result};
pub use expansion::{ClusterExpansion, ExpansionConfig, ExpansionMethod};
pub use memo::{Memo, MemoScope, ScopedCache};
