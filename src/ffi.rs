//! Python FFI bindings via PyO3.
//!
//! Exposes scalar cluster expansions to Python. The contribution is any Python
//! callable taking the sorted member list of a cluster and returning a float.
//!
//! # Building the Python extension
//!
//! ```bash
//! pip install maturin
//! maturin develop --features python-ffi
//! ```
//!
//! # Usage
//!
//! ```python
//! import cce_core
//!
//! values = {(0, 1): 4.0, (0,): 2.0, (1,): 3.0}
//! subclusters = {2: [[0, 1]], 1: [[0], [1]]}
//!
//! cce_core.expand(subclusters, lambda c: values[tuple(c)])                   # 4.0
//! cce_core.expand(subclusters, lambda c: values[tuple(c)], method="direct")  # 4.0
//! cce_core.contains([0], [0, 1])                                             # True
//! ```
//!
//! Exceptions raised inside the callable propagate unchanged. Arithmetic failures
//! (zero to a negative power, division by zero) raise `ArithmeticError`; bad
//! arguments raise `ValueError`.

use std::collections::HashMap;

use pyo3::exceptions::{PyArithmeticError, PyValueError};
use pyo3::prelude::*;

use crate::algebra::{Algebra, Product, Sum};
use crate::cluster::{ClusterSet, ClusterTable};
use crate::error::ExpansionError;
use crate::expansion::{ClusterExpansion, ExpansionConfig, ExpansionMethod};

fn to_py_err(err: ExpansionError) -> PyErr {
    if err.is_arithmetic() {
        PyArithmeticError::new_err(err.to_string())
    } else {
        PyValueError::new_err(err.to_string())
    }
}

fn cluster_set(subclusters: HashMap<usize, Vec<Vec<usize>>>) -> PyResult<ClusterSet> {
    let mut set = ClusterSet::new();
    for (order, rows) in subclusters {
        set.insert_table(ClusterTable::from_rows(order, rows).map_err(to_py_err)?);
    }
    Ok(set)
}

fn run<A: Algebra<Value = f64>>(
    algebra: A,
    method: ExpansionMethod,
    clusters: &ClusterSet,
    contribution: &Bound<'_, PyAny>,
) -> PyResult<f64> {
    let engine = ClusterExpansion::with_config(algebra, ExpansionConfig { method, ..Default::default() });

    // The first Python exception is kept so it can be re-raised as is.
    let mut raised: Option<PyErr> = None;
    let result = engine.expand(clusters, &(), |cluster, _| {
        match contribution
            .call1((cluster.to_vec(),))
            .and_then(|value| value.extract::<f64>())
        {
            Ok(value) => Ok(value),
            Err(err) => {
                let message = err.to_string();
                raised = Some(err);
                Err(ExpansionError::Contribution { cluster: cluster.to_vec(), message })
            }
        }
    });

    result.map_err(|err| raised.take().unwrap_or_else(|| to_py_err(err)))
}

/// Run a cluster expansion over scalar contributions.
///
/// Args:
///     subclusters:  dict mapping order to a list of clusters (lists of member indices)
///     contribution: callable(cluster: list[int]) -> float
///     method:       "power" (default) or "direct"
///     algebra:      "product" (default) or "sum"
///
/// Returns:
///     The corrected aggregate of all contributions.
#[pyfunction]
#[pyo3(signature = (subclusters, contribution, method="power", algebra="product"))]
pub fn expand(
    subclusters: HashMap<usize, Vec<Vec<usize>>>,
    contribution: &Bound<'_, PyAny>,
    method: &str,
    algebra: &str,
) -> PyResult<f64> {
    let method: ExpansionMethod = method.parse().map_err(to_py_err)?;
    let clusters = cluster_set(subclusters)?;
    match algebra {
        "product" => run(Product::<f64>::new(), method, &clusters, contribution),
        "sum" => run(Sum::<f64>::new(), method, &clusters, contribution),
        other => Err(PyValueError::new_err(format!(
            "unknown algebra `{other}` (expected `product` or `sum`)"
        ))),
    }
}

/// True if every member of `candidate` appears in `container`.
#[pyfunction]
#[pyo3(name = "contains")]
pub fn py_contains(mut candidate: Vec<usize>, mut container: Vec<usize>) -> bool {
    candidate.sort_unstable();
    container.sort_unstable();
    crate::containment::contains(&candidate, &container)
}

// ── Module entry point ────────────────────────────────────────────────────────

/// Cluster-correlation expansion engine.
#[pymodule]
pub fn cce_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(expand, m)?)?;
    m.add_function(wrap_pyfunction!(py_contains, m)?)?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}
