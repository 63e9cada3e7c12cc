//! Extended-precision accumulator.
//!
//! Rust has no floating-point type wider than `f64`, so intermediate sums
//! are carried as an unevaluated pair `hi + lo` of two `f64`s
//! ("double-double"), giving roughly 106 significand bits. Every value
//! returned to a caller is rounded back to `f64` with [`Extended::to_f64`].
//!
//! # Algorithm
//! Additions are built from Knuth's error-free `TwoSum`, products from
//! the fused-multiply-add form of Dekker's `TwoProduct`. `exp` reduces by
//! `ln 2`, sums a short Taylor series for `expm1` and squares back up;
//! `ln` is one Newton step on `exp`; powers and roots go through both.
//!
//! References:
//! - Dekker (1971), "A Floating-Point Technique for Extending the
//!   Available Precision", *Numerische Mathematik* 18(3), pp. 224–242.
//! - Hida, Li & Bailey (2001), "Algorithms for Quad-Double Precision
//!   Floating Point Arithmetic", *ARITH-15*.
//!
//! Non-finite values propagate the IEEE way: once `hi` is infinite or NaN
//! the low word is dropped and the value stays non-finite.
//!
//! The exponent range is that of `f64`. Sums whose magnitude exceeds
//! `f64::MAX` overflow to infinity; callers that need a finite mean of
//! finite data rescale (see [`crate::reduce`]).

use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// A double-double value `hi + lo` with `|lo| <= ulp(hi) / 2`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Extended {
    hi: f64,
    lo: f64,
}

// ---------------------------------------------------------------------------
// Error-free transformations
// ---------------------------------------------------------------------------

/// `a + b = s + e` exactly, for any finite `a`, `b`.
#[inline]
fn two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    let bb = s - a;
    let e = (a - (s - bb)) + (b - bb);
    (s, e)
}

/// As [`two_sum`], but requires `|a| >= |b|`.
#[inline]
fn quick_two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    let e = b - (s - a);
    (s, e)
}

/// `a * b = p + e` exactly, barring underflow.
#[inline]
fn two_prod(a: f64, b: f64) -> (f64, f64) {
    let p = a * b;
    let e = a.mul_add(b, -p);
    (p, e)
}

/// `2^k` for `k` in the normal exponent range.
#[inline]
fn pow2(k: i32) -> f64 {
    debug_assert!((-1022..=1023).contains(&k));
    f64::from_bits(((k + 1023) as u64) << 52)
}

/// `ln 2` to double-double precision.
const LN_2: Extended = Extended {
    hi: std::f64::consts::LN_2,
    lo: 2.319_046_813_846_299_6e-17,
};

/// `exp` halves its reduced argument this many times before the series.
const EXP_SQUARINGS: i32 = 10;

/// Taylor terms of `expm1` on `|r| <= ln(2) / 2^11`.
const EXP_TERMS: u32 = 10;

impl Extended {
    /// Exact zero.
    pub const ZERO: Extended = Extended { hi: 0.0, lo: 0.0 };

    /// Builds a normalized value from a non-overlapping pair.
    #[inline]
    fn renormalize(hi: f64, lo: f64) -> Self {
        if !hi.is_finite() {
            return Self { hi, lo: 0.0 };
        }
        let (hi, lo) = quick_two_sum(hi, lo);
        Self { hi, lo }
    }

    /// High-order word; the nearest `f64` to the value.
    #[inline]
    pub fn hi(self) -> f64 {
        self.hi
    }

    /// Low-order word.
    #[inline]
    pub fn lo(self) -> f64 {
        self.lo
    }

    /// Rounds to standard precision.
    #[inline]
    pub fn to_f64(self) -> f64 {
        self.hi + self.lo
    }

    /// Returns `true` if the value is neither infinite nor NaN.
    #[inline]
    pub fn is_finite(self) -> bool {
        self.hi.is_finite()
    }

    /// Exact product of two standard-precision values.
    ///
    /// # Examples
    /// ```
    /// use u_reduce::extended::Extended;
    /// let x = 1.0 + f64::EPSILON;
    /// let p = Extended::product(x, x);
    /// // (1 + ε)² = 1 + 2ε + ε², and the ε² term survives in the low word.
    /// assert_eq!(p.lo(), f64::EPSILON * f64::EPSILON);
    /// ```
    #[inline]
    pub fn product(a: f64, b: f64) -> Self {
        let (p, e) = two_prod(a, b);
        Self::renormalize(p, e)
    }

    /// Exact square of a standard-precision value.
    #[inline]
    pub fn square(a: f64) -> Self {
        Self::product(a, a)
    }

    /// Adds a standard-precision value.
    #[inline]
    pub fn add_f64(self, b: f64) -> Self {
        let (s, e) = two_sum(self.hi, b);
        if !s.is_finite() {
            return Self { hi: s, lo: 0.0 };
        }
        Self::renormalize(s, e + self.lo)
    }

    /// Divides by a standard-precision value.
    ///
    /// One long-division correction step on top of `hi / d`, accurate to
    /// about 2⁻¹⁰⁴ relative.
    pub fn div_f64(self, d: f64) -> Self {
        let q1 = self.hi / d;
        if !q1.is_finite() || d == 0.0 {
            return Self { hi: q1, lo: 0.0 };
        }
        let (p1, p2) = two_prod(q1, d);
        let (s, e) = two_sum(self.hi, -p1);
        let e = e - p2 + self.lo;
        let q2 = (s + e) / d;
        Self::renormalize(q1, q2)
    }

    /// Non-negative square root; NaN for negative values.
    pub fn sqrt(self) -> Self {
        if self.hi == 0.0 {
            return Self::ZERO;
        }
        if self.hi < 0.0 || !self.hi.is_finite() {
            return Self { hi: self.hi.sqrt(), lo: 0.0 };
        }
        let q = self.hi.sqrt();
        let (p1, p2) = two_prod(q, q);
        let r = ((self.hi - p1) - p2 + self.lo) / (2.0 * q);
        Self::renormalize(q, r)
    }

    /// Absolute value.
    #[inline]
    pub fn abs(self) -> Self {
        if self.hi < 0.0 || (self.hi == 0.0 && self.lo < 0.0) {
            -self
        } else {
            self
        }
    }

    /// Multiplies by `2^k` exactly, unless the result leaves the normal
    /// range.
    fn scale_pow2(self, k: i32) -> Self {
        let half = k / 2;
        let (s1, s2) = (pow2(half), pow2(k - half));
        Self {
            hi: self.hi * s1 * s2,
            lo: self.lo * s1 * s2,
        }
    }

    /// Splits a positive finite value into `m · 2^e` with `m` near `[1, 2)`.
    fn split_exponent(self) -> (Self, i32) {
        let (x, bias) = if self.hi < f64::MIN_POSITIVE {
            (self.scale_pow2(64), 64)
        } else {
            (self, 0)
        };
        let e = ((x.hi.to_bits() >> 52) & 0x7ff) as i32 - 1023;
        (x.scale_pow2(-e), e - bias)
    }

    /// Natural exponential.
    ///
    /// # Examples
    /// ```
    /// use u_reduce::extended::Extended;
    /// let e = Extended::from(1.0).exp();
    /// assert_eq!(e.hi(), std::f64::consts::E);
    /// assert!((e.lo() - 1.445646891729250158e-16).abs() < 1e-29);
    /// ```
    pub fn exp(self) -> Self {
        if self.hi.is_nan() {
            return self;
        }
        if self.hi > 709.79 {
            return Self::from(f64::INFINITY);
        }
        if self.hi < -745.2 {
            return Self::ZERO;
        }
        if self.hi == 0.0 {
            return Self::from(1.0);
        }

        let m = (self.hi / LN_2.hi).round();
        let r = (self - LN_2 * m).scale_pow2(-EXP_SQUARINGS);

        let mut term = r;
        let mut expm1 = r;
        for k in 2..=EXP_TERMS {
            term = (term * r).div_f64(f64::from(k));
            expm1 += term;
        }
        // e^(2r) - 1 = (e^r - 1)(e^r + 1)
        for _ in 0..EXP_SQUARINGS {
            expm1 = expm1 * (expm1 + 2.0);
        }
        (expm1 + 1.0).scale_pow2(m as i32)
    }

    /// Natural logarithm; `-∞` at zero, NaN for negative values.
    pub fn ln(self) -> Self {
        if self.hi.is_nan() || self.hi < 0.0 {
            return Self::from(f64::NAN);
        }
        if self.hi == 0.0 {
            return Self::from(f64::NEG_INFINITY);
        }
        if self.hi == f64::INFINITY {
            return self;
        }

        let (m, e) = self.split_exponent();
        let y = Self::from(m.hi.ln());
        // One Newton step on exp(y) = m doubles the correct bits.
        let y = y + (m * (-y).exp()).add_f64(-1.0);
        y + LN_2 * f64::from(e)
    }

    /// Raises the value to the power `p`, as `exp(p · ln x)`.
    ///
    /// Follows `f64::powf` for zero, negative or non-finite operands and
    /// for non-finite `p`; `x^0` is 1 for every `x`.
    ///
    /// # Examples
    /// ```
    /// use u_reduce::extended::Extended;
    /// let root2 = Extended::from(2.0).powf(0.5);
    /// assert!((root2 - Extended::from(2.0).sqrt()).abs().to_f64() < 1e-28);
    /// ```
    pub fn powf(self, p: f64) -> Self {
        if p == 0.0 {
            return Self::from(1.0);
        }
        if self.hi <= 0.0 || !self.is_finite() || !p.is_finite() {
            return Self::from(self.hi.powf(p));
        }
        (self.ln() * p).exp()
    }

    /// The `p`-th root, `x^(1/p)`, with `1/p` never rounded to `f64`.
    ///
    /// A zero or non-finite `p`, and a zero or non-finite value, follow
    /// `f64::powf(1.0 / p)`.
    pub fn root(self, p: f64) -> Self {
        if p == 0.0 || !p.is_finite() || self.hi <= 0.0 || !self.is_finite() {
            return Self::from(self.hi.powf(1.0 / p));
        }
        self.ln().div_f64(p).exp()
    }
}

impl From<f64> for Extended {
    #[inline]
    fn from(value: f64) -> Self {
        Self { hi: value, lo: 0.0 }
    }
}

impl From<Extended> for f64 {
    #[inline]
    fn from(value: Extended) -> Self {
        value.to_f64()
    }
}

impl Add for Extended {
    type Output = Extended;

    #[inline]
    fn add(self, rhs: Extended) -> Extended {
        let (s1, s2) = two_sum(self.hi, rhs.hi);
        if !s1.is_finite() {
            return Extended { hi: s1, lo: 0.0 };
        }
        let (t1, t2) = two_sum(self.lo, rhs.lo);
        let (s1, s2) = quick_two_sum(s1, s2 + t1);
        Extended::renormalize(s1, s2 + t2)
    }
}

impl Add<f64> for Extended {
    type Output = Extended;

    #[inline]
    fn add(self, rhs: f64) -> Extended {
        self.add_f64(rhs)
    }
}

impl AddAssign for Extended {
    #[inline]
    fn add_assign(&mut self, rhs: Extended) {
        *self = *self + rhs;
    }
}

impl AddAssign<f64> for Extended {
    #[inline]
    fn add_assign(&mut self, rhs: f64) {
        *self = self.add_f64(rhs);
    }
}

impl Mul for Extended {
    type Output = Extended;

    #[inline]
    fn mul(self, rhs: Extended) -> Extended {
        let (p, e) = two_prod(self.hi, rhs.hi);
        if !p.is_finite() {
            return Extended { hi: p, lo: 0.0 };
        }
        Extended::renormalize(p, e + (self.hi * rhs.lo + self.lo * rhs.hi))
    }
}

impl Mul<f64> for Extended {
    type Output = Extended;

    #[inline]
    fn mul(self, rhs: f64) -> Extended {
        let (p, e) = two_prod(self.hi, rhs);
        if !p.is_finite() {
            return Extended { hi: p, lo: 0.0 };
        }
        Extended::renormalize(p, e + self.lo * rhs)
    }
}

impl Neg for Extended {
    type Output = Extended;

    #[inline]
    fn neg(self) -> Extended {
        Extended { hi: -self.hi, lo: -self.lo }
    }
}

impl Sub for Extended {
    type Output = Extended;

    #[inline]
    fn sub(self, rhs: Extended) -> Extended {
        self + (-rhs)
    }
}

impl fmt::Display for Extended {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_f64(), f)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_sum_recovers_lost_bits() {
        let (s, e) = two_sum(1.0, 1e-20);
        assert_eq!(s, 1.0);
        assert_eq!(e, 1e-20);
    }

    #[test]
    fn test_add_keeps_small_addend() {
        let x = Extended::from(1e17) + 1.0;
        assert_eq!(x.hi(), 1e17);
        assert_eq!(x.lo(), 1.0);
        let y = x + Extended::from(-1e17);
        assert_eq!(y.to_f64(), 1.0);
    }

    #[test]
    fn test_cancellation_is_exact() {
        let mut acc = Extended::ZERO;
        for v in [1.0, 1e100, 1.0, -1e100] {
            acc += v;
        }
        assert_eq!(acc.to_f64(), 2.0);
    }

    #[test]
    fn test_product_exact() {
        let a = 134_217_729.0; // 2^27 + 1
        let p = Extended::product(a, a);
        // (2^27 + 1)^2 = 2^54 + 2^28 + 1 needs 55 bits
        assert_eq!(p.hi(), 18_014_398_777_917_440.0);
        assert_eq!(p.lo(), 1.0);
    }

    #[test]
    fn test_div_exact_quotient() {
        let sum = Extended::from(0.1) + Extended::from(0.1) + Extended::from(0.1);
        assert_eq!(sum.div_f64(3.0).to_f64(), 0.1);
    }

    #[test]
    fn test_div_correctly_rounded() {
        let q = Extended::from(32.0).div_f64(7.0);
        assert_eq!(q.to_f64(), 32.0 / 7.0);
        assert!(q.lo() != 0.0);
    }

    #[test]
    fn test_div_by_zero() {
        assert_eq!(Extended::from(1.0).div_f64(0.0).to_f64(), f64::INFINITY);
        assert!(Extended::ZERO.div_f64(0.0).to_f64().is_nan());
    }

    #[test]
    fn test_sqrt() {
        assert_eq!(Extended::from(4.0).sqrt().to_f64(), 2.0);
        assert_eq!(Extended::ZERO.sqrt().to_f64(), 0.0);
        assert!(Extended::from(-1.0).sqrt().to_f64().is_nan());
        let two = Extended::from(2.0).sqrt();
        let back = Extended::product(two.hi(), two.hi()) + Extended::from(2.0 * two.hi() * two.lo());
        assert!((back.to_f64() - 2.0).abs() < 1e-30);
    }

    #[test]
    fn test_abs() {
        let x = Extended::from(-3.0) + 1e-20;
        let a = x.abs();
        assert_eq!(a.hi(), 3.0);
        assert_eq!(a.lo(), -1e-20);
    }

    #[test]
    fn test_mul() {
        let x = Extended::from(1.0) + 1e-20;
        let y = x * x;
        assert_eq!(y.hi(), 1.0);
        assert_eq!(y.lo(), 2e-20);
        assert_eq!((LN_2 * 2.0).hi(), 2.0 * std::f64::consts::LN_2);
    }

    #[test]
    fn test_exp_carries_low_word() {
        let e = Extended::from(1.0).exp();
        assert_eq!(e.hi(), std::f64::consts::E);
        let known = Extended {
            hi: std::f64::consts::E,
            lo: 1.445_646_891_729_250_2e-16,
        };
        assert!((e - known).abs().to_f64() < 1e-29);
    }

    #[test]
    fn test_exp_limits() {
        assert_eq!(Extended::ZERO.exp().to_f64(), 1.0);
        assert_eq!(Extended::from(710.0).exp().to_f64(), f64::INFINITY);
        assert_eq!(Extended::from(-750.0).exp().to_f64(), 0.0);
        assert!(Extended::from(f64::NAN).exp().to_f64().is_nan());
        let big = Extended::from(700.0).exp().to_f64();
        assert!((big / 700.0_f64.exp() - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_ln() {
        let ln8 = Extended::from(8.0).ln();
        assert!((ln8 - LN_2 * 3.0).abs().to_f64() < 1e-30);
        assert_eq!(Extended::from(1.0).ln().to_f64(), 0.0);
        assert_eq!(Extended::ZERO.ln().to_f64(), f64::NEG_INFINITY);
        assert!(Extended::from(-1.0).ln().to_f64().is_nan());
        let huge = Extended::from(f64::MAX).ln().to_f64();
        assert!((huge - f64::MAX.ln()).abs() < 1e-12);
        let tiny = Extended::from(5e-324).ln().to_f64();
        assert!((tiny - 5e-324_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_ln_exp_round_trip() {
        for v in [0.001, 0.5, 3.0, 10.0, 1e10, 1e-200] {
            let back = Extended::from(v).ln().exp();
            let rel = ((back - Extended::from(v)).abs().to_f64()) / v;
            assert!(rel < 1e-28, "{v}: relative error {rel}");
        }
    }

    #[test]
    fn test_powf() {
        assert_eq!(Extended::from(9.0).powf(0.5).to_f64(), 3.0);
        assert_eq!(Extended::from(2.0).powf(10.0).to_f64(), 1024.0);
        assert_eq!(Extended::ZERO.powf(3.0).to_f64(), 0.0);
        assert_eq!(Extended::ZERO.powf(0.0).to_f64(), 1.0);
        assert_eq!(Extended::from(f64::NAN).powf(0.0).to_f64(), 1.0);
        assert_eq!(Extended::ZERO.powf(-1.0).to_f64(), f64::INFINITY);
    }

    #[test]
    fn test_powf_has_extended_precision() {
        let root2 = Extended::from(2.0).powf(0.5);
        assert!((root2 - Extended::from(2.0).sqrt()).abs().to_f64() < 1e-28);

        // 3^2.5 = 9·√3; the low word is not the zero an f64 pow would give.
        let p = Extended::from(3.0).powf(2.5);
        let expected = Extended::from(3.0).sqrt() * 9.0;
        assert!(p.lo() != 0.0);
        assert!((p - expected).abs().to_f64() < 1e-27);
    }

    #[test]
    fn test_root() {
        let r = Extended::from(27.0).root(3.0);
        assert!((r - Extended::from(3.0)).abs().to_f64() < 1e-28);
        // 1/3 is not an f64; the root still comes out exact to double-double.
        let cube = r * r * r;
        assert!((cube - Extended::from(27.0)).abs().to_f64() < 1e-26);
        assert_eq!(Extended::from(2.0).root(0.0).to_f64(), f64::INFINITY);
        assert_eq!(Extended::from(1.0).root(0.0).to_f64(), 1.0);
        assert_eq!(Extended::ZERO.root(0.0).to_f64(), 0.0);
        assert_eq!(Extended::ZERO.root(2.0).to_f64(), 0.0);
    }

    #[test]
    fn test_infinity_propagates() {
        let x = Extended::from(f64::MAX) + f64::MAX;
        assert_eq!(x.to_f64(), f64::INFINITY);
        let y = x + 1.0;
        assert_eq!(y.to_f64(), f64::INFINITY);
        assert!(!y.is_finite());
    }

    #[test]
    fn test_nan_propagates() {
        let x = Extended::from(1.0) + f64::NAN;
        assert!(x.to_f64().is_nan());
    }
}
