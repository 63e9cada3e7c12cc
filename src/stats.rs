//! Scalar statistics built on the reduction kernel.
//!
//! All functions take any [`Sequence`], so they work unchanged on slices,
//! strided views and matrix columns. Undefined results are `None`.
//!
//! # Algorithms
//!
//! - **sum / mean / sumsq / variance / stdev**: thin wrappers over
//!   [`reduce`](crate::reduce::reduce), pairwise with an extended-precision
//!   accumulator.
//! - **norm / inner / column_sum**: pairwise sums of transformed elements,
//!   each term formed in extended precision.
//! - **center_of_gravity**: plain sequential sums in `f64`; it feeds
//!   low-precision centroid estimates.

use crate::extended::Extended;
use crate::reduce::{reduce, sum_mean, Request};
use crate::sequence::{MatrixView, Sequence};
use crate::summation::{pairwise_sum, Pairwise, Sequential, Summation};

/// Pairwise sum. Empty input sums to `0.0`.
///
/// # Examples
/// ```
/// use u_reduce::stats::sum;
/// assert_eq!(sum(&[0.1; 10]), 1.0);
/// ```
pub fn sum<S: Sequence + ?Sized>(x: &S) -> f64 {
    sum_mean(x).0
}

/// Arithmetic mean, or `None` for empty input.
///
/// # Examples
/// ```
/// use u_reduce::stats::mean;
/// assert_eq!(mean(&[1.0, 2.0, 3.0, 4.0, 5.0]), Some(3.0));
/// ```
pub fn mean<S: Sequence + ?Sized>(x: &S) -> Option<f64> {
    sum_mean(x).1
}

/// Sum of squared residuals from the mean.
///
/// # Returns
/// - `None` for empty input; `Some(0.0)` for one element.
pub fn sumsq<S: Sequence + ?Sized>(x: &S) -> Option<f64> {
    reduce(x, Request::none().with_sumsq()).sumsq
}

/// Sample variance with Bessel's correction (denominator `n − 1`).
///
/// # Returns
/// - `None` if `x.len() < 2`.
///
/// # Examples
/// ```
/// use u_reduce::stats::variance;
/// let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
/// assert!((variance(&v).unwrap() - 4.571428571428571).abs() < 1e-15);
/// ```
pub fn variance<S: Sequence + ?Sized>(x: &S) -> Option<f64> {
    reduce(x, Request::none().with_variance()).variance
}

/// Sample standard deviation, `√variance`.
///
/// # Returns
/// - `None` if `x.len() < 2`.
pub fn stdev<S: Sequence + ?Sized>(x: &S) -> Option<f64> {
    reduce(x, Request::none().with_stdev()).stdev
}

/// Vector `p`-norm, `(Σ |xᵢ|^p)^(1/p)`.
///
/// `p = 1` and `p = 2` take dedicated paths (sum of absolute values, root
/// of the sum of exact squares). Other powers raise each `|xᵢ|` with
/// [`Extended::powf`] and take the final root with [`Extended::root`], so
/// neither the terms nor `1/p` are rounded to `f64`.
///
/// `p = 0` follows `powf`: every term is 1 and the root is `n^(1/0)`,
/// which is `+∞` for two or more elements, 1 for one and 0 for none.
///
/// # Returns
/// - `None` if `power` is negative or NaN.
///
/// # Examples
/// ```
/// use u_reduce::stats::norm;
/// assert_eq!(norm(&[3.0, 4.0], 2.0), Some(5.0));
/// assert_eq!(norm(&[3.0, -4.0], 1.0), Some(7.0));
/// assert_eq!(norm(&[3.0, 4.0], -1.0), None);
/// ```
pub fn norm<S: Sequence + ?Sized>(x: &S, power: f64) -> Option<f64> {
    if power.is_nan() || power < 0.0 {
        return None;
    }
    let n = x.len();
    if power == 2.0 {
        let sum = Pairwise.accumulate(n, |i| Extended::square(x.get(i)));
        Some(sum.sqrt().to_f64())
    } else if power == 1.0 {
        let sum = Pairwise.accumulate(n, |i| Extended::from(x.get(i).abs()));
        Some(sum.to_f64())
    } else {
        let sum = Pairwise.accumulate(n, |i| Extended::from(x.get(i).abs()).powf(power));
        Some(sum.root(power).to_f64())
    }
}

/// Inner product `Σ xᵢ·yᵢ`, each product exact before summation.
///
/// # Panics
/// Panics if `x` and `y` differ in length.
///
/// # Examples
/// ```
/// use u_reduce::stats::inner;
/// assert_eq!(inner(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]), 32.0);
/// ```
pub fn inner<X, Y>(x: &X, y: &Y) -> f64
where
    X: Sequence + ?Sized,
    Y: Sequence + ?Sized,
{
    assert_eq!(
        x.len(),
        y.len(),
        "inner: operands differ in length ({} vs {})",
        x.len(),
        y.len()
    );
    Pairwise
        .accumulate(x.len(), |i| Extended::product(x.get(i), y.get(i)))
        .to_f64()
}

/// Pairwise sum of column `column_number` (counted from 1).
///
/// # Panics
/// Panics unless `1 <= column_number <= matrix.ncol()`.
///
/// # Examples
/// ```
/// use u_reduce::sequence::MatrixView;
/// use u_reduce::stats::column_sum;
/// let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
/// let m = MatrixView::new(&data, 2, 3).unwrap();
/// assert_eq!(column_sum(&m, 2), 7.0);
/// ```
pub fn column_sum(matrix: &MatrixView<'_>, column_number: usize) -> f64 {
    pairwise_sum(&matrix.column(column_number))
}

/// Index-weighted mean position, `Σ i·xᵢ / Σ xᵢ` with `i` counted from 1.
///
/// # Returns
/// - `None` if the weights sum to exactly zero (including empty input).
///
/// # Examples
/// ```
/// use u_reduce::stats::center_of_gravity;
/// assert_eq!(center_of_gravity(&[1.0, 1.0, 1.0]), Some(2.0));
/// assert_eq!(center_of_gravity(&[0.0, 0.0, 3.0]), Some(3.0));
/// ```
pub fn center_of_gravity<S: Sequence + ?Sized>(x: &S) -> Option<f64> {
    let n = x.len();
    let weighted = Sequential::STANDARD
        .accumulate(n, |i| Extended::from((i + 1) as f64 * x.get(i)))
        .to_f64();
    let total = Sequential::STANDARD
        .accumulate(n, |i| Extended::from(x.get(i)))
        .to_f64();
    if total == 0.0 {
        return None;
    }
    Some(weighted / total)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
