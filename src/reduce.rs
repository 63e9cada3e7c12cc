//! Sum, mean, sum of squared residuals, variance and standard deviation
//! in one two-pass reduction.
//!
//! # Algorithm
//! 1. Sequences of up to four elements use fixed, balanced groupings
//!    (`(a + b) + (c + d)` for four); longer ones go through the selected
//!    [`Algorithm`], pairwise by default.
//! 2. The mean is the extended-precision sum divided by `n`, **rounded to
//!    `f64`**. Rounding first makes `xᵢ − mean` exactly zero when every
//!    `xᵢ` equals the mean, so constant input has variance exactly 0.
//! 3. Only if the sum of squares, variance or standard deviation was
//!    requested does a second pass accumulate `(xᵢ − mean)²`.
//! 4. `variance = sumsq / (n − 1)`, `stdev = √variance`.
//!
//! The accumulator has the exponent range of `f64`, so finite data can
//! still overflow the sum. In that case the sum is redone on terms scaled
//! by 2⁻⁶⁴, which is exact, and the rounded mean is scaled back. The
//! reported `sum` stays infinite but the mean and the residuals are those
//! of the data; a constant sequence of huge values still has variance 0.
//!
//! Reference: Chan, Golub & LeVeque (1983), "Algorithms for Computing the
//! Sample Variance: Analysis and Recommendations", *The American
//! Statistician* 37(3), pp. 242–247.
//!
//! # Undefined results
//!
//! | n   | sum  | mean | sumsq | variance | stdev |
//! |-----|------|------|-------|----------|-------|
//! | 0   | 0    | None | None  | None     | None  |
//! | 1   | x₀   | x₀   | 0     | None     | None  |
//! | ≥ 2 | Σ    | Σ/n  | ≥ 0   | ≥ 0      | ≥ 0   |

use crate::extended::Extended;
use crate::sequence::{MatrixView, Sequence};
use crate::summation::{Algorithm, Summation};

/// 2⁻⁶⁴. Scaling a normal `f64` by it, or back by [`UPSCALE`], is exact.
const DOWNSCALE: f64 = 5.421_010_862_427_522e-20;

/// 2⁶⁴.
const UPSCALE: f64 = 18_446_744_073_709_551_616.0;

/// Which statistics a [`reduce`] call should produce.
///
/// # Examples
/// ```
/// use u_reduce::reduce::Request;
/// let r = Request::none().with_mean().with_stdev();
/// assert!(r.mean && r.stdev && !r.sum);
/// assert!(r.needs_second_pass());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Request {
    pub sum: bool,
    pub mean: bool,
    pub sumsq: bool,
    pub variance: bool,
    pub stdev: bool,
}

impl Request {
    /// Requests nothing.
    pub const fn none() -> Self {
        Self {
            sum: false,
            mean: false,
            sumsq: false,
            variance: false,
            stdev: false,
        }
    }

    /// Requests all five statistics.
    pub const fn all() -> Self {
        Self {
            sum: true,
            mean: true,
            sumsq: true,
            variance: true,
            stdev: true,
        }
    }

    /// Adds the sum.
    pub const fn with_sum(mut self) -> Self {
        self.sum = true;
        self
    }

    /// Adds the mean.
    pub const fn with_mean(mut self) -> Self {
        self.mean = true;
        self
    }

    /// Adds the sum of squared residuals.
    pub const fn with_sumsq(mut self) -> Self {
        self.sumsq = true;
        self
    }

    /// Adds the sample variance.
    pub const fn with_variance(mut self) -> Self {
        self.variance = true;
        self
    }

    /// Adds the sample standard deviation.
    pub const fn with_stdev(mut self) -> Self {
        self.stdev = true;
        self
    }

    /// Whether any requested statistic depends on the residual pass.
    pub const fn needs_second_pass(&self) -> bool {
        self.sumsq || self.variance || self.stdev
    }
}

/// Output of [`reduce`].
///
/// A field is `None` when it was not requested or when it is undefined
/// for the input length (see the module table). `sum` is always defined.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Reduction {
    pub sum: Option<f64>,
    pub mean: Option<f64>,
    pub sumsq: Option<f64>,
    pub variance: Option<f64>,
    pub stdev: Option<f64>,
}

/// Reduces `x` with pairwise summation.
///
/// # Complexity
/// Time: O(n) per pass (one pass, or two if a residual statistic is
/// requested), Stack: O(log n)
///
/// # Examples
/// ```
/// use u_reduce::reduce::{reduce, Request};
/// let r = reduce(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0], Request::all());
/// assert_eq!(r.sum, Some(40.0));
/// assert_eq!(r.mean, Some(5.0));
/// assert_eq!(r.sumsq, Some(32.0));
/// assert!((r.variance.unwrap() - 32.0 / 7.0).abs() < 1e-15);
/// ```
pub fn reduce<S: Sequence + ?Sized>(x: &S, request: Request) -> Reduction {
    reduce_with(x, request, Algorithm::Pairwise)
}

/// Reduces one column of a row-major matrix, counted from 1.
///
/// Degenerate-length rules apply to the row count.
///
/// # Panics
/// Panics unless `1 <= column_number <= matrix.ncol()`.
pub fn reduce_column(matrix: &MatrixView<'_>, column_number: usize, request: Request) -> Reduction {
    reduce(&matrix.column(column_number), request)
}

/// Reduces `x` with an explicitly chosen accumulation strategy.
///
/// Intended for validation and benchmarking; use [`reduce`] elsewhere.
pub fn reduce_with<S: Sequence + ?Sized>(x: &S, request: Request, algorithm: Algorithm) -> Reduction {
    let n = x.len();
    let mut out = Reduction::default();

    if n == 0 {
        out.sum = request.sum.then_some(0.0);
        return out;
    }
    if n == 1 {
        let value = x.get(0);
        out.sum = request.sum.then_some(value);
        out.mean = request.mean.then_some(value);
        out.sumsq = request.sumsq.then_some(0.0);
        return out;
    }

    let (sum, mean) = sum_and_rounded_mean(x, algorithm);
    out.sum = request.sum.then(|| sum.to_f64());
    out.mean = request.mean.then_some(mean);
    if !request.needs_second_pass() {
        return out;
    }

    let mut sumsq = algorithm.accumulate(n, |i| Extended::square(x.get(i) - mean));
    // Squares are non-negative; only a correcting strategy can undershoot.
    if sumsq.to_f64() < 0.0 {
        sumsq = Extended::ZERO;
    }
    let variance = sumsq.div_f64((n - 1) as f64).to_f64();
    out.sumsq = request.sumsq.then(|| sumsq.to_f64());
    out.variance = request.variance.then_some(variance);
    out.stdev = request.stdev.then(|| variance.sqrt());
    out
}

/// Sum and mean only; never runs a residual pass.
///
/// # Returns
/// `(sum, mean)`, where `mean` is `None` for empty input.
///
/// # Examples
/// ```
/// use u_reduce::reduce::sum_mean;
/// assert_eq!(sum_mean(&[1.0, 2.0, 3.0]), (6.0, Some(2.0)));
/// let empty: [f64; 0] = [];
/// assert_eq!(sum_mean(&empty), (0.0, None));
/// ```
pub fn sum_mean<S: Sequence + ?Sized>(x: &S) -> (f64, Option<f64>) {
    sum_mean_with(x, Algorithm::Pairwise)
}

/// [`sum_mean`] with an explicitly chosen accumulation strategy.
pub fn sum_mean_with<S: Sequence + ?Sized>(x: &S, algorithm: Algorithm) -> (f64, Option<f64>) {
    if x.is_empty() {
        return (0.0, None);
    }
    let (sum, mean) = sum_and_rounded_mean(x, algorithm);
    (sum.to_f64(), Some(mean))
}

/// Extended sum and the `f64`-rounded mean of a non-empty sequence.
fn sum_and_rounded_mean<S: Sequence + ?Sized>(x: &S, algorithm: Algorithm) -> (Extended, f64) {
    let n = x.len();
    debug_assert!(n > 0);
    let sum = scaled_sum(x, algorithm, 1.0);
    let mut mean = sum.div_f64(n as f64).to_f64();
    if !sum.is_finite() {
        // Finite data has a finite mean even when its sum overflows.
        let scaled = scaled_sum(x, algorithm, DOWNSCALE);
        if scaled.is_finite() {
            mean = scaled.div_f64(n as f64).to_f64() * UPSCALE;
        }
    }
    (sum, mean)
}

/// `Σ xᵢ·scale`, with fixed groupings for up to four elements.
fn scaled_sum<S: Sequence + ?Sized>(x: &S, algorithm: Algorithm, scale: f64) -> Extended {
    let term = |i: usize| x.get(i) * scale;
    match x.len() {
        1 => Extended::from(term(0)),
        2 => Extended::from(term(0)) + term(1),
        3 => (Extended::from(term(0)) + term(1)) + term(2),
        4 => (Extended::from(term(0)) + term(1)) + (Extended::from(term(2)) + term(3)),
        n => algorithm.accumulate(n, |i| Extended::from(term(i))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Wide, unit-scale and large-offset values mixed in one vector.
    fn finite_vec(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
        let value = prop_oneof![-1e12_f64..1e12, -1.0_f64..1.0, 1e6_f64..1e6 + 1.0];
        proptest::collection::vec(value, min_len..=max_len)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn variance_non_negative(data in finite_vec(2, 300)) {
            for algorithm in Algorithm::ALL {
                let r = reduce_with(&data, Request::all(), algorithm);
                prop_assert!(r.variance.unwrap() >= 0.0, "{}: {:?}", algorithm, r);
                prop_assert!(r.stdev.unwrap() >= 0.0, "{}: {:?}", algorithm, r);
            }
        }

        #[test]
        fn variance_of_constant_is_exactly_zero(
            value in prop::num::f64::NORMAL,
            n in 2_usize..300,
        ) {
            let data = vec![value; n];
            let r = reduce(&data, Request::all());
            prop_assert_eq!(r.mean, Some(value));
            prop_assert_eq!(r.variance, Some(0.0));
            prop_assert_eq!(r.stdev, Some(0.0));
        }

        #[test]
        fn stdev_is_sqrt_of_variance(data in finite_vec(2, 300)) {
            let r = reduce(&data, Request::all());
            let var = r.variance.unwrap();
            prop_assert_eq!(r.stdev.unwrap(), var.sqrt());
        }

        #[test]
        fn sum_mean_agrees_with_reduce(data in finite_vec(0, 300)) {
            let r = reduce(&data, Request::all());
            let (sum, mean) = sum_mean(&data);
            prop_assert_eq!(r.sum, Some(sum));
            prop_assert_eq!(r.mean, mean);
        }

        #[test]
        fn single_element_rules(value in prop::num::f64::ANY) {
            let r = reduce(&[value], Request::all());
            prop_assert_eq!(r.sum.map(f64::to_bits), Some(value.to_bits()));
            prop_assert_eq!(r.mean.map(f64::to_bits), Some(value.to_bits()));
            prop_assert_eq!(r.sumsq, Some(0.0));
            prop_assert_eq!(r.variance, None);
            prop_assert_eq!(r.stdev, None);
        }
    }
}
