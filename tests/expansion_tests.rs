//! Integration tests for the power and direct cluster expansions.
//!
//! Covers the behavioural guarantees of the engine: single-cluster identity,
//! agreement between the two methods on irregular cluster sets, the absence of
//! double counting on nested hierarchies, and memo hygiene.

use std::collections::BTreeMap;

use cce_core::{
    Algebra, ClusterExpansion, ClusterSet, ElementwiseProduct, ExpansionConfig, ExpansionError,
    ExpansionMethod, Product, ScopedCache, Sum,
};
use proptest::collection;
use proptest::prelude::*;

// ─── helpers ─────────────────────────────────────────────────────────────────

fn set(rows: &[&[usize]]) -> ClusterSet {
    rows.iter().copied().collect()
}

/// Every cluster of up to `max_order` members drawn from `0..n`.
fn lattice(n: usize, max_order: u32) -> ClusterSet {
    (1u32..(1 << n))
        .filter(|mask| mask.count_ones() <= max_order)
        .map(|mask| (0..n).filter(|&i| mask & (1 << i) != 0).collect::<Vec<usize>>())
        .collect()
}

/// Distinct clusters over `0..members` of at most `max_order` members, each
/// paired with a contribution from `value`. Orders come out ragged and a
/// subcluster's supersets are only partially present.
fn weighted_clusters<V: std::fmt::Debug>(
    members: usize,
    max_order: usize,
    value: impl Strategy<Value = V>,
) -> impl Strategy<Value = BTreeMap<Vec<usize>, V>> {
    collection::btree_map(
        collection::btree_set(0..members, 1..=max_order)
            .prop_map(|cluster| cluster.into_iter().collect::<Vec<usize>>()),
        value,
        1..24,
    )
}

fn cluster_set<V>(values: &BTreeMap<Vec<usize>, V>) -> ClusterSet {
    values.keys().collect()
}

/// Positive contribution that depends only on the cluster's members.
fn weight(cluster: &[usize]) -> f64 {
    let h = cluster
        .iter()
        .fold(7u64, |h, &m| h.wrapping_mul(31).wrapping_add(m as u64 + 1));
    1.0 + (h % 13) as f64 / 10.0
}

fn close(a: f64, b: f64, rel: f64) -> bool {
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= rel * scale
}

fn assert_close(a: f64, b: f64, rel: f64) {
    assert!(close(a, b, rel), "values differ: {a} vs {b} (rel tol {rel:e})");
}

fn both<A: Algebra<Value = f64>>(
    engine: &ClusterExpansion<A>,
    clusters: &ClusterSet,
    f: impl Fn(&[usize]) -> f64,
) -> (f64, f64) {
    let power = engine.expand_power(clusters, &(), |c, _| Ok(f(c))).unwrap();
    let direct = engine.expand_direct(clusters, &(), |c, _| Ok(f(c))).unwrap();
    (power, direct)
}

// ─── single-cluster identity ─────────────────────────────────────────────────

#[test]
fn single_cluster_returns_contribution_exactly() {
    let engine = ClusterExpansion::new(Product::<f64>::new());
    let clusters = set(&[&[3, 8, 1]]);
    let (power, direct) = both(&engine, &clusters, |_| 0.123_456_789);
    assert_eq!(power, 0.123_456_789);
    assert_eq!(direct, 0.123_456_789);
}

#[test]
fn single_cluster_sees_sorted_members() {
    let engine = ClusterExpansion::new(Product::<f64>::new());
    let clusters = set(&[&[3, 8, 1]]);
    let mut seen = Vec::new();
    engine
        .expand(&clusters, &(), |c, _| {
            seen.push(c.to_vec());
            Ok(1.0)
        })
        .unwrap();
    assert_eq!(seen, vec![vec![1, 3, 8]]);
}

// ─── no double counting ──────────────────────────────────────────────────────

#[test]
fn pair_absorbs_its_singletons() {
    let engine = ClusterExpansion::new(Product::<f64>::new());
    let clusters = set(&[&[0, 1], &[0], &[1]]);
    let f = |c: &[usize]| match c {
        [0, 1] => 4.0,
        [0] => 2.0,
        _ => 3.0,
    };
    let (power, direct) = both(&engine, &clusters, f);
    assert_eq!(power, 4.0);
    assert_close(direct, 4.0, 1e-12);
}

#[test]
fn three_level_nesting_reduces_to_top_cluster() {
    let engine = ClusterExpansion::new(Product::<f64>::new());
    let clusters = set(&[&[0, 1, 2], &[0, 1], &[1, 2], &[0], &[1], &[2]]);
    let f = |c: &[usize]| match c {
        [0, 1, 2] => 10.0,
        [0, 1] => 2.0,
        [1, 2] => 3.0,
        _ => 1.0,
    };
    let (power, direct) = both(&engine, &clusters, f);
    assert_eq!(power, 10.0);
    assert_close(direct, 10.0, 1e-12);
}

#[test]
fn three_level_nesting_exponents() {
    // With the additive algebra and an indicator contribution, the expansion
    // returns the exponent assigned to the indicated cluster.
    let engine = ClusterExpansion::new(Sum::<f64>::new());
    let clusters = set(&[&[0, 1, 2], &[0, 1], &[1, 2], &[0], &[1], &[2]]);
    let exponent = |target: &[usize]| {
        engine
            .expand_power(&clusters, &(), |c, _| Ok(if c == target { 1.0 } else { 0.0 }))
            .unwrap()
    };
    assert_eq!(exponent(&[0, 1, 2]), 1.0);
    assert_eq!(exponent(&[0, 1]), 0.0);
    assert_eq!(exponent(&[1, 2]), 0.0);
    assert_eq!(exponent(&[0]), 0.0);
    assert_eq!(exponent(&[1]), 0.0);
    assert_eq!(exponent(&[2]), 0.0);
}

#[test]
fn disjoint_singletons_multiply() {
    let engine = ClusterExpansion::new(Product::<f64>::new());
    let clusters = set(&[&[0], &[1]]);
    let (power, direct) = both(&engine, &clusters, |c| if c == [0] { 1.5 } else { 4.0 });
    assert_eq!(power, 6.0);
    assert_eq!(direct, 6.0);
}

// ─── method equivalence ──────────────────────────────────────────────────────

proptest! {
    #[test]
    fn methods_agree_on_irregular_sets_multiplicative(
        values in weighted_clusters(6, 4, 0.5f64..2.0),
    ) {
        let engine = ClusterExpansion::new(Product::<f64>::new());
        let (power, direct) = both(&engine, &cluster_set(&values), |c| values[c]);
        prop_assert!(close(power, direct, 1e-9), "power {} vs direct {}", power, direct);
    }

    #[test]
    fn methods_agree_on_irregular_sets_additive(
        values in weighted_clusters(7, 3, -5.0f64..5.0),
    ) {
        let engine = ClusterExpansion::new(Sum::<f64>::new());
        let (power, direct) = both(&engine, &cluster_set(&values), |c| values[c]);
        prop_assert!(close(power, direct, 1e-9), "power {} vs direct {}", power, direct);
    }

    #[test]
    fn methods_agree_for_vector_contributions(
        values in weighted_clusters(5, 3, collection::vec(0.5f64..2.0, 4)),
    ) {
        let engine = ClusterExpansion::new(ElementwiseProduct::new(4));
        let clusters = cluster_set(&values);
        let power = engine.expand_power(&clusters, &(), |c, _| Ok(values[c].clone())).unwrap();
        let direct = engine.expand_direct(&clusters, &(), |c, _| Ok(values[c].clone())).unwrap();
        prop_assert_eq!(power.len(), 4);
        for (p, d) in power.iter().zip(&direct) {
            prop_assert!(close(*p, *d, 1e-9), "power {} vs direct {}", p, d);
        }
    }

    #[test]
    fn skipping_null_exponents_does_not_change_result(
        values in weighted_clusters(6, 3, 0.5f64..2.0),
    ) {
        let plain = ClusterExpansion::new(Product::<f64>::new());
        let skipping = ClusterExpansion::with_config(
            Product::<f64>::new(),
            ExpansionConfig { skip_null_exponents: true, ..Default::default() },
        );
        let clusters = cluster_set(&values);
        let a = plain.expand(&clusters, &(), |c, _| Ok(values[c])).unwrap();
        let b = skipping.expand(&clusters, &(), |c, _| Ok(values[c])).unwrap();
        prop_assert!(close(a, b, 1e-12), "plain {} vs skipping {}", a, b);
    }
}

#[test]
fn short_vector_contribution_fails_instead_of_truncating() {
    let clusters = set(&[&[0], &[1]]);
    for method in [ExpansionMethod::Power, ExpansionMethod::Direct] {
        let err = ClusterExpansion::with_config(
            ElementwiseProduct::new(4),
            ExpansionConfig { method, ..Default::default() },
        )
        .expand(&clusters, &(), |c, _| Ok(if c == [0] { vec![2.0; 3] } else { vec![3.0; 4] }))
        .unwrap_err();
        assert_eq!(err, ExpansionError::LengthMismatch { expected: 4, found: 3 });
    }
}

// ─── callback and context ────────────────────────────────────────────────────

#[test]
fn power_evaluates_every_cluster_once_highest_order_first() {
    let engine = ClusterExpansion::new(Product::<f64>::new());
    let clusters = set(&[&[0], &[0, 1], &[1], &[0, 1, 2]]);
    let mut orders = Vec::new();
    engine
        .expand_power(&clusters, &(), |c, _| {
            orders.push(c.len());
            Ok(2.0)
        })
        .unwrap();
    assert_eq!(orders, vec![3, 2, 1, 1]);
}

#[test]
fn context_reaches_the_callback() {
    let engine = ClusterExpansion::with_config(
        Sum::<f64>::new(),
        ExpansionConfig { method: ExpansionMethod::Direct, ..Default::default() },
    );
    let clusters = set(&[&[0, 1], &[0], &[1]]);
    let energies: &[f64] = &[0.5, 1.25];
    let total = engine
        .expand(&clusters, energies, |c, e| Ok(c.iter().map(|&i| e[i]).sum::<f64>()))
        .unwrap();
    // Additive contributions of independent members: the pair adds nothing new.
    assert_close(total, 1.75, 1e-12);
}

#[test]
fn callback_errors_propagate_unchanged() {
    let engine = ClusterExpansion::new(Product::<f64>::new());
    let clusters = set(&[&[0, 1], &[0], &[1]]);
    let err = engine
        .expand(&clusters, &(), |c, _| {
            if c == [1] {
                Err(ExpansionError::Contribution { cluster: c.to_vec(), message: "diverged".into() })
            } else {
                Ok(1.0)
            }
        })
        .unwrap_err();
    assert_eq!(
        err,
        ExpansionError::Contribution { cluster: vec![1], message: "diverged".into() }
    );
}

// ─── memo hygiene ────────────────────────────────────────────────────────────

#[test]
fn sequential_power_calls_are_independent() {
    let engine = ClusterExpansion::new(Product::<f64>::new());
    let clusters = lattice(5, 3);
    let mut cache: ScopedCache<f64> = ScopedCache::new();
    let mut misses = 0usize;

    let run = |cache: &mut ScopedCache<f64>, misses: &mut usize| {
        engine
            .expand_power_with_memo(&clusters, &(), cache, |c, _, memo: &mut ScopedCache<f64>| {
                // Per-member factors are shared between clusters of one call.
                let mut value = 1.0;
                for &m in c {
                    value *= *memo.get_or_try_insert_with(&[m], || {
                        *misses += 1;
                        Ok(1.0 + m as f64 / 8.0)
                    })?;
                }
                Ok(value * weight(c))
            })
            .unwrap()
    };

    let first = run(&mut cache, &mut misses);
    assert!(cache.is_empty());
    let misses_first = misses;

    let second = run(&mut cache, &mut misses);
    assert!(cache.is_empty());

    assert_eq!(first, second);
    // The second call recomputed everything: nothing survived the first.
    assert_eq!(misses, 2 * misses_first);
}

#[test]
fn direct_leaves_memo_to_the_caller() {
    let engine = ClusterExpansion::with_config(
        Product::<f64>::new(),
        ExpansionConfig { method: ExpansionMethod::Direct, ..Default::default() },
    );
    let clusters = set(&[&[0, 1], &[0], &[1]]);
    let mut cache: ScopedCache<f64> = ScopedCache::new();
    engine
        .expand_with_memo(&clusters, &(), &mut cache, |c, _, memo: &mut ScopedCache<f64>| {
            memo.insert(c, 1.0);
            Ok(2.0)
        })
        .unwrap();
    assert_eq!(cache.len(), 3);
}
