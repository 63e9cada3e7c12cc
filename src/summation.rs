//! Interchangeable accumulation strategies.
//!
//! Each strategy reduces "term `i` for `i` in `0..len`" to one
//! [`Extended`] total. Terms are supplied by a closure so the same code
//! sums plain elements, squared residuals, absolute values or products,
//! over contiguous or strided storage.
//!
//! | Strategy                         | Error bound       | Use        |
//! |----------------------------------|-------------------|------------|
//! | [`Sequential`] (standard)        | O(n·ε)            | diagnostic |
//! | [`Sequential`] (extended)        | O(n·ε²)           | diagnostic |
//! | [`Kahan`]                        | O(ε) + O(n·ε²)    | diagnostic |
//! | [`TwoLoop`]                      | O(ε) + O(n²·ε²)   | diagnostic |
//! | [`Pairwise`]                     | O(ε²·log n)       | production |
//!
//! Production code always goes through [`Pairwise`]; the others are
//! reachable only by naming an [`Algorithm`] explicitly.

use std::fmt;
use std::str::FromStr;

use crate::extended::Extended;
use crate::sequence::Sequence;

/// Block size at or below which [`Pairwise`] sums sequentially.
pub const PAIRWISE_BLOCK: usize = 64;

/// A strategy for summing `len` indexed terms.
pub trait Summation {
    /// Returns the sum of `term(0) + term(1) + ... + term(len - 1)`.
    ///
    /// `term` may be called more than once per index.
    fn accumulate<F>(&self, len: usize, term: F) -> Extended
    where
        F: Fn(usize) -> Extended;
}

/// Accumulator width for [`Sequential`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Precision {
    /// Round every partial sum to `f64`.
    Standard,
    /// Keep partial sums in double-double.
    Extended,
}

// ---------------------------------------------------------------------------
// Sequential
// ---------------------------------------------------------------------------

/// Left-to-right summation in a single accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sequential {
    pub precision: Precision,
}

impl Sequential {
    /// Naive summation in `f64`.
    pub const STANDARD: Sequential = Sequential {
        precision: Precision::Standard,
    };
    /// Naive summation in double-double.
    pub const EXTENDED: Sequential = Sequential {
        precision: Precision::Extended,
    };
}

impl Summation for Sequential {
    fn accumulate<F>(&self, len: usize, term: F) -> Extended
    where
        F: Fn(usize) -> Extended,
    {
        match self.precision {
            Precision::Standard => {
                let mut sum = 0.0_f64;
                for i in 0..len {
                    sum += term(i).to_f64();
                }
                Extended::from(sum)
            }
            Precision::Extended => {
                let mut sum = Extended::ZERO;
                for i in 0..len {
                    sum += term(i);
                }
                sum
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Kahan
// ---------------------------------------------------------------------------

/// Compensated sequential summation (Neumaier's variant of Kahan).
///
/// # Algorithm
/// A running compensation `c` collects the low-order bits each addition
/// drops; the branch picks the smaller operand so that addends larger
/// than the running sum are handled too. The low word of each term is
/// folded into `c` as well.
///
/// Reference: Neumaier (1974), "Rundungsfehleranalyse einiger Verfahren
/// zur Summation endlicher Summen", *ZAMM* 54(1), pp. 39–51.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Kahan;

impl Summation for Kahan {
    fn accumulate<F>(&self, len: usize, term: F) -> Extended
    where
        F: Fn(usize) -> Extended,
    {
        let mut sum = 0.0_f64;
        let mut c = 0.0_f64;
        for i in 0..len {
            let t = term(i);
            let x = t.hi();
            let s = sum + x;
            if sum.abs() >= x.abs() {
                c += (sum - s) + x;
            } else {
                c += (x - s) + sum;
            }
            c += t.lo();
            sum = s;
        }
        if !sum.is_finite() {
            return Extended::from(sum);
        }
        Extended::from(sum) + c
    }
}

// ---------------------------------------------------------------------------
// Two-loop
// ---------------------------------------------------------------------------

/// Sum, then correct by the sum of residuals from the first-pass mean.
///
/// # Algorithm
/// 1. `s = Σ xᵢ` and `m = s / n` in standard precision.
/// 2. `r = Σ (xᵢ − m)`, again in standard precision. The residuals are
///    small, so `r` carries the error of step 1 with little error of its
///    own.
/// 3. Return `s + r` as an unevaluated pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TwoLoop;

impl Summation for TwoLoop {
    fn accumulate<F>(&self, len: usize, term: F) -> Extended
    where
        F: Fn(usize) -> Extended,
    {
        if len == 0 {
            return Extended::ZERO;
        }
        let sum = Sequential::STANDARD.accumulate(len, &term).to_f64();
        if !sum.is_finite() {
            return Extended::from(sum);
        }
        let mean = sum / len as f64;
        let mut correction = 0.0_f64;
        for i in 0..len {
            correction += term(i).to_f64() - mean;
        }
        Extended::from(sum) + correction
    }
}

// ---------------------------------------------------------------------------
// Pairwise
// ---------------------------------------------------------------------------

/// Recursive halving down to blocks of [`PAIRWISE_BLOCK`] terms.
///
/// # Algorithm
/// A block of `n > 64` terms is split into a first half of `⌈n/2⌉` and a
/// second half of `⌊n/2⌋` terms, each summed recursively; blocks of at
/// most 64 terms are summed sequentially in extended precision. Rounding
/// error grows with the recursion depth `⌈log₂(n/64)⌉`, not with `n`.
///
/// Reference: Higham (1993), "The Accuracy of Floating Point Summation",
/// *SIAM J. Sci. Comput.* 14(4), pp. 783–799.
///
/// # Complexity
/// Time: O(n), Stack: O(log n)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Pairwise;

impl Pairwise {
    fn block<F>(start: usize, count: usize, term: &F) -> Extended
    where
        F: Fn(usize) -> Extended,
    {
        if count <= PAIRWISE_BLOCK {
            let mut sum = Extended::ZERO;
            for i in start..start + count {
                sum += term(i);
            }
            return sum;
        }
        let first = count - count / 2;
        Self::block(start, first, term) + Self::block(start + first, count - first, term)
    }
}

impl Summation for Pairwise {
    fn accumulate<F>(&self, len: usize, term: F) -> Extended
    where
        F: Fn(usize) -> Extended,
    {
        Self::block(0, len, &term)
    }
}

// ---------------------------------------------------------------------------
// Selector
// ---------------------------------------------------------------------------

/// Named choice of accumulation strategy.
///
/// [`Algorithm::Pairwise`] is the default and the only strategy used by
/// production entry points; the others exist for validation and
/// benchmarking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Algorithm {
    #[default]
    Pairwise,
    /// [`Sequential`] in standard precision.
    NaiveStandard,
    /// [`Sequential`] in extended precision.
    NaiveExtended,
    Kahan,
    TwoLoop,
}

impl Algorithm {
    /// Every variant, default first.
    pub const ALL: [Algorithm; 5] = [
        Algorithm::Pairwise,
        Algorithm::NaiveStandard,
        Algorithm::NaiveExtended,
        Algorithm::Kahan,
        Algorithm::TwoLoop,
    ];

    /// Kebab-case name, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Pairwise => "pairwise",
            Algorithm::NaiveStandard => "naive-standard",
            Algorithm::NaiveExtended => "naive-extended",
            Algorithm::Kahan => "kahan",
            Algorithm::TwoLoop => "two-loop",
        }
    }
}

impl Summation for Algorithm {
    fn accumulate<F>(&self, len: usize, term: F) -> Extended
    where
        F: Fn(usize) -> Extended,
    {
        match self {
            Algorithm::Pairwise => Pairwise.accumulate(len, term),
            Algorithm::NaiveStandard => Sequential::STANDARD.accumulate(len, term),
            Algorithm::NaiveExtended => Sequential::EXTENDED.accumulate(len, term),
            Algorithm::Kahan => Kahan.accumulate(len, term),
            Algorithm::TwoLoop => TwoLoop.accumulate(len, term),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An algorithm name that matches no [`Algorithm`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown summation algorithm `{0}` (expected one of: pairwise, naive-standard, naive-extended, kahan, two-loop)")]
pub struct ParseAlgorithmError(pub String);

impl FromStr for Algorithm {
    type Err = ParseAlgorithmError;

    /// Case-insensitive; `_` and `-` are interchangeable.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Algorithm::ALL
            .into_iter()
            .find(|a| a.name() == normalized)
            .ok_or_else(|| ParseAlgorithmError(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Sequence helpers
// ---------------------------------------------------------------------------

/// Pairwise sum of a sequence, rounded to `f64`.
///
/// # Examples
/// ```
/// use u_reduce::summation::pairwise_sum;
/// let v = vec![0.1; 10];
/// assert_eq!(pairwise_sum(&v), 1.0);
/// ```
pub fn pairwise_sum<S: Sequence + ?Sized>(x: &S) -> f64 {
    Pairwise
        .accumulate(x.len(), |i| Extended::from(x.get(i)))
        .to_f64()
}

/// Compensated sum of a sequence, rounded to `f64`.
///
/// # Examples
/// ```
/// use u_reduce::summation::kahan_sum;
/// assert_eq!(kahan_sum(&[1e16, 1.0, -1e16]), 1.0);
/// ```
pub fn kahan_sum<S: Sequence + ?Sized>(x: &S) -> f64 {
    Kahan.accumulate(x.len(), |i| Extended::from(x.get(i))).to_f64()
}

/// Sum of a sequence with an explicitly chosen strategy.
pub fn sum_with<S: Sequence + ?Sized>(x: &S, algorithm: Algorithm) -> f64 {
    algorithm
        .accumulate(x.len(), |i| Extended::from(x.get(i)))
        .to_f64()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
