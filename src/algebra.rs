/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Operator sets that define how contributions compose.
//!
//! The expansion never looks inside a contribution value. Everything it does goes
//! through an [`Algebra`]:
//!
//! | Operator | Used by | Multiplicative | Additive |
//! |----------|---------|----------------|----------|
//! | `identity` | both | `1` | `0` |
//! | `combine(a, b)` | both | `a · b` | `a + b` |
//! | `raise(a, n)` | power | `aⁿ` | `n · a` |
//! | `remove(a, b)` | direct | `a / b` | `a − b` |
//! | `aggregate(xs)` | direct | `Π xs` | `Σ xs` |
//!
//! The two expansion methods agree whenever `raise(a, n)` equals `n`-fold
//! `combine`, which holds for every algebra in this module.

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;
use core::marker::PhantomData;

use crate::error::{ExpansionError, Result};
use crate::expansion::ExpansionMethod;

// ─── Algebra ─────────────────────────────────────────────────────────────────

/// The operators an expansion combines contributions with.
pub trait Algebra {
    /// Contribution type.
    type Value: Clone;

    /// Neutral element of [`Self::combine`]; seeds the running aggregate.
    fn identity(&self) -> Self::Value;

    /// Fold `value` into the running aggregate `acc`.
    fn combine(&self, acc: Self::Value, value: Self::Value) -> Self::Value;

    /// Apply a combinatorial exponent.
    ///
    /// The default is `|exponent|`-fold [`Self::combine`] by repeated squaring,
    /// inverted through [`Self::remove`] when the exponent is negative.
    fn raise(&self, value: Self::Value, exponent: i32) -> Result<Self::Value> {
        let magnitude = power_by_squaring(self, value, exponent.unsigned_abs());
        if exponent >= 0 {
            return Ok(magnitude);
        }
        self.remove(self.identity(), magnitude).map_err(|err| match err {
            ExpansionError::SingularRemoval => ExpansionError::UndefinedPower { exponent },
            other => other,
        })
    }

    /// Remove an aggregated correction from `value`.
    fn remove(&self, value: Self::Value, removed: Self::Value) -> Result<Self::Value>;

    /// Combine a sequence of corrected values. `None` for an empty sequence, which
    /// the direct expansion treats as "nothing to remove".
    fn aggregate<'v, I>(&self, values: I) -> Option<Self::Value>
    where
        I: IntoIterator<Item = &'v Self::Value>,
        Self::Value: 'v,
    {
        let mut values = values.into_iter();
        let first = values.next()?.clone();
        Some(values.fold(first, |acc, v| self.combine(acc, v.clone())))
    }

    /// Check a freshly computed contribution before it enters the expansion.
    ///
    /// The default accepts every value. Algebras whose operators are only defined
    /// on part of `Value` (fixed-length vectors, say) reject the rest here.
    fn admit(&self, value: &Self::Value) -> Result<()> {
        let _ = value;
        Ok(())
    }

    /// Whether this algebra supplies every operator `method` needs.
    fn supports(&self, method: ExpansionMethod) -> bool {
        let _ = method;
        true
    }
}

/// `exponent`-fold [`Algebra::combine`] of `value` with itself; `identity` for 0.
pub fn power_by_squaring<A>(algebra: &A, value: A::Value, exponent: u32) -> A::Value
where
    A: Algebra + ?Sized,
{
    let mut result = algebra.identity();
    let mut base = value;
    let mut n = exponent;
    while n > 0 {
        if n & 1 == 1 {
            result = algebra.combine(result, base.clone());
        }
        n >>= 1;
        if n > 0 {
            base = algebra.combine(base.clone(), base);
        }
    }
    result
}

// ─── Scalar algebras ─────────────────────────────────────────────────────────

/// Multiplicative algebra over real scalars: combine by product, remove by division.
#[derive(Clone, Copy, Debug, Default)]
pub struct Product<T = f64>(PhantomData<T>);

impl<T> Product<T> {
    /// Create the algebra.
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

/// Additive algebra over real scalars: combine by sum, remove by subtraction.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sum<T = f64>(PhantomData<T>);

impl<T> Sum<T> {
    /// Create the algebra.
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

macro_rules! scalar_algebras {
    ($($t:ty),*) => {$(
        impl Algebra for Product<$t> {
            type Value = $t;

            fn identity(&self) -> $t {
                1.0
            }

            fn combine(&self, acc: $t, value: $t) -> $t {
                acc * value
            }

            fn raise(&self, value: $t, exponent: i32) -> Result<$t> {
                if exponent >= 0 {
                    return Ok(power_by_squaring(self, value, exponent as u32));
                }
                let magnitude = power_by_squaring(self, value, exponent.unsigned_abs());
                if magnitude == 0.0 {
                    return Err(ExpansionError::UndefinedPower { exponent });
                }
                Ok(1.0 / magnitude)
            }

            fn remove(&self, value: $t, removed: $t) -> Result<$t> {
                if removed == 0.0 {
                    return Err(ExpansionError::SingularRemoval);
                }
                Ok(value / removed)
            }
        }

        impl Algebra for Sum<$t> {
            type Value = $t;

            fn identity(&self) -> $t {
                0.0
            }

            fn combine(&self, acc: $t, value: $t) -> $t {
                acc + value
            }

            fn raise(&self, value: $t, exponent: i32) -> Result<$t> {
                Ok(value * exponent as $t)
            }

            fn remove(&self, value: $t, removed: $t) -> Result<$t> {
                Ok(value - removed)
            }
        }
    )*};
}

scalar_algebras!(f32, f64);

// ─── ElementwiseProduct ──────────────────────────────────────────────────────

/// Multiplicative algebra over fixed-length `f64` vectors, applied per element.
///
/// Typical for contributions sampled on a shared time grid. All values passed to
/// the algebra must have length [`Self::len`]; [`Algebra::admit`], `raise` and
/// `remove` report any other length as [`ExpansionError::LengthMismatch`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ElementwiseProduct {
    len: usize,
}

impl ElementwiseProduct {
    /// Algebra over vectors of `len` elements.
    pub const fn new(len: usize) -> Self {
        Self { len }
    }

    fn check_len(&self, value: &[f64]) -> Result<()> {
        if value.len() != self.len {
            return Err(ExpansionError::LengthMismatch { expected: self.len, found: value.len() });
        }
        Ok(())
    }

    /// Vector length.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// True for the zero-length algebra.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Algebra for ElementwiseProduct {
    type Value = Vec<f64>;

    fn identity(&self) -> Vec<f64> {
        vec![1.0; self.len]
    }

    fn combine(&self, mut acc: Vec<f64>, value: Vec<f64>) -> Vec<f64> {
        debug_assert_eq!(acc.len(), self.len);
        debug_assert_eq!(value.len(), self.len);
        for (a, v) in acc.iter_mut().zip(value) {
            *a *= v;
        }
        acc
    }

    fn raise(&self, value: Vec<f64>, exponent: i32) -> Result<Vec<f64>> {
        self.check_len(&value)?;
        let scalar = Product::<f64>::new();
        value.into_iter().map(|v| scalar.raise(v, exponent)).collect()
    }

    fn remove(&self, mut value: Vec<f64>, removed: Vec<f64>) -> Result<Vec<f64>> {
        self.check_len(&value)?;
        self.check_len(&removed)?;
        if removed.iter().any(|&r| r == 0.0) {
            return Err(ExpansionError::SingularRemoval);
        }
        for (v, r) in value.iter_mut().zip(removed) {
            *v /= r;
        }
        Ok(value)
    }

    fn admit(&self, value: &Vec<f64>) -> Result<()> {
        self.check_len(value)
    }
}

// ─── FnAlgebra ───────────────────────────────────────────────────────────────

type CombineFn<V> = Box<dyn Fn(V, V) -> V>;
type RaiseFn<V> = Box<dyn Fn(V, i32) -> Result<V>>;
type RemoveFn<V> = Box<dyn Fn(V, V) -> Result<V>>;
type AggregateFn<V> = Box<dyn Fn(&[&V]) -> V>;

/// Algebra assembled from closures.
///
/// Only `identity` and `combine` are mandatory. Without `raise`, exponents are
/// applied by repeated `combine` (and `remove` for negative exponents). Without
/// `remove`, only the power expansion with non-negative exponents can run, and
/// [`Algebra::supports`] reports the direct method as unavailable.
///
/// ```
/// use cce_core::algebra::{Algebra, FnAlgebra};
///
/// let max_plus = FnAlgebra::new(f64::NEG_INFINITY, f64::max);
/// assert_eq!(max_plus.combine(1.0, 3.0), 3.0);
/// assert!(max_plus.remove(3.0, 1.0).is_err());
/// ```
pub struct FnAlgebra<V> {
    identity: V,
    combine: CombineFn<V>,
    raise: Option<RaiseFn<V>>,
    remove: Option<RemoveFn<V>>,
    aggregate: Option<AggregateFn<V>>,
}

impl<V: Clone> FnAlgebra<V> {
    /// Algebra with the given identity and combine operator.
    pub fn new(identity: V, combine: impl Fn(V, V) -> V + 'static) -> Self {
        Self {
            identity,
            combine: Box::new(combine),
            raise: None,
            remove: None,
            aggregate: None,
        }
    }

    /// Supply an explicit power operator.
    pub fn with_raise(mut self, raise: impl Fn(V, i32) -> Result<V> + 'static) -> Self {
        self.raise = Some(Box::new(raise));
        self
    }

    /// Supply the removal operator.
    pub fn with_remove(mut self, remove: impl Fn(V, V) -> Result<V> + 'static) -> Self {
        self.remove = Some(Box::new(remove));
        self
    }

    /// Supply an aggregate operator used instead of folding `combine`.
    pub fn with_aggregate(mut self, aggregate: impl Fn(&[&V]) -> V + 'static) -> Self {
        self.aggregate = Some(Box::new(aggregate));
        self
    }
}

impl<V: Clone> Algebra for FnAlgebra<V> {
    type Value = V;

    fn identity(&self) -> V {
        self.identity.clone()
    }

    fn combine(&self, acc: V, value: V) -> V {
        (self.combine)(acc, value)
    }

    fn raise(&self, value: V, exponent: i32) -> Result<V> {
        if let Some(raise) = &self.raise {
            return raise(value, exponent);
        }
        let magnitude = power_by_squaring(self, value, exponent.unsigned_abs());
        if exponent >= 0 {
            return Ok(magnitude);
        }
        match &self.remove {
            Some(remove) => remove(self.identity(), magnitude).map_err(|err| match err {
                ExpansionError::SingularRemoval => ExpansionError::UndefinedPower { exponent },
                other => other,
            }),
            None => Err(ExpansionError::MissingOperator { operator: "raise" }),
        }
    }

    fn remove(&self, value: V, removed: V) -> Result<V> {
        match &self.remove {
            Some(remove) => remove(value, removed),
            None => Err(ExpansionError::MissingOperator { operator: "remove" }),
        }
    }

    fn aggregate<'v, I>(&self, values: I) -> Option<V>
    where
        I: IntoIterator<Item = &'v V>,
        V: 'v,
    {
        let values: Vec<&V> = values.into_iter().collect();
        let (first, rest) = values.split_first()?;
        match &self.aggregate {
            Some(aggregate) => Some(aggregate(values.as_slice())),
            None => Some(
                rest.iter()
                    .fold((*first).clone(), |acc, v| self.combine(acc, (*v).clone())),
            ),
        }
    }

    fn supports(&self, method: ExpansionMethod) -> bool {
        match method {
            ExpansionMethod::Power => self.raise.is_some() || self.remove.is_some(),
            ExpansionMethod::Direct => self.remove.is_some(),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for FnAlgebra<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnAlgebra")
            .field("identity", &self.identity)
            .field("raise", &self.raise.is_some())
            .field("remove", &self.remove.is_some())
            .field("aggregate", &self.aggregate.is_some())
            .finish()
    }
}
