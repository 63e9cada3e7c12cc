//! # u-reduce
//!
//! Numerically robust summary statistics over numeric sequences.
//!
//! This crate computes sums, means, sums of squared residuals, variances,
//! standard deviations, vector norms, inner products and centers of
//! gravity, over contiguous slices or single columns of row-major
//! matrices. It borrows caller buffers read-only and allocates nothing.
//!
//! ## Modules
//!
//! - [`extended`] — Double-double accumulator wider than `f64`
//! - [`sequence`] — Indexed views: slices, strided views, matrix columns
//! - [`summation`] — Pairwise, Kahan, two-loop and naive strategies
//! - [`reduce`] — Sum / mean / sumsq / variance / stdev kernel
//! - [`stats`] — Norms, inner products, column sums, center of gravity
//! - [`config`] — Diagnostic strategy selection from the environment
//!
//! ## Design Philosophy
//!
//! - **Numerical stability first**: pairwise summation into an
//!   extended-precision accumulator, O(ε·log n) error growth
//! - **Exact degenerate cases**: empty input sums to 0, a constant
//!   sequence has variance exactly 0
//! - **Undefined is not an error**: statistics that do not exist for the
//!   input are `None`; only broken preconditions panic
//! - **Property-based testing**: invariants verified via proptest
//!
//! # Examples
//! ```
//! use u_reduce::reduce::{reduce, Request};
//! use u_reduce::sequence::MatrixView;
//! use u_reduce::stats::{center_of_gravity, inner};
//!
//! let r = reduce(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0], Request::all());
//! assert_eq!(r.sumsq, Some(32.0));
//!
//! let data = [1.0, 10.0, 2.0, 20.0, 3.0, 30.0];
//! let m = MatrixView::new(&data, 3, 2).unwrap();
//! assert_eq!(reduce(&m.column(2), Request::all()).mean, Some(20.0));
//!
//! assert_eq!(inner(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]), 32.0);
//! assert_eq!(center_of_gravity(&[1.0, 1.0, 1.0]), Some(2.0));
//! ```

pub mod config;
pub mod extended;
pub mod reduce;
pub mod sequence;
pub mod stats;
pub mod summation;

pub use reduce::{reduce, reduce_column, reduce_with, sum_mean, Reduction, Request};
pub use sequence::{Column, MatrixView, Sequence, Strided};
pub use summation::Algorithm;
