//! Read-only indexed views over numeric buffers.
//!
//! Every reduction in this crate is written once against [`Sequence`]
//! ("element `i` of `len`") and is reused unchanged for contiguous slices
//! and for single columns of row-major matrices. A column is nothing more
//! than a [`Strided`] view whose stride is the row length.
//!
//! Views borrow the caller's buffer for the duration of one call; they
//! never copy or mutate it.

/// A finite, ordered, read-only view over `f64` values.
///
/// Positions are 0-based: `get(0)` through `get(len() - 1)`.
pub trait Sequence {
    /// Number of elements in the view.
    fn len(&self) -> usize;

    /// Element at position `i`.
    ///
    /// # Panics
    /// May panic if `i >= len()`.
    fn get(&self, i: usize) -> f64;

    /// Returns `true` if the view has no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Sequence for [f64] {
    #[inline]
    fn len(&self) -> usize {
        <[f64]>::len(self)
    }

    #[inline]
    fn get(&self, i: usize) -> f64 {
        self[i]
    }
}

impl Sequence for Vec<f64> {
    #[inline]
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    #[inline]
    fn get(&self, i: usize) -> f64 {
        self[i]
    }
}

impl<const N: usize> Sequence for [f64; N] {
    #[inline]
    fn len(&self) -> usize {
        N
    }

    #[inline]
    fn get(&self, i: usize) -> f64 {
        self[i]
    }
}

impl<S: Sequence + ?Sized> Sequence for &S {
    #[inline]
    fn len(&self) -> usize {
        (**self).len()
    }

    #[inline]
    fn get(&self, i: usize) -> f64 {
        (**self).get(i)
    }
}

// ---------------------------------------------------------------------------
// Strided views
// ---------------------------------------------------------------------------

/// Every `stride`-th element of a slice, starting at `offset`.
///
/// # Examples
/// ```
/// use u_reduce::sequence::{Sequence, Strided};
/// let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
/// let odd = Strided::new(&data, 1, 2, 3);
/// assert_eq!(odd.get(2), 6.0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Strided<'a> {
    data: &'a [f64],
    offset: usize,
    stride: usize,
    len: usize,
}

impl<'a> Strided<'a> {
    /// Creates a view of `len` elements at `offset`, `offset + stride`, ...
    ///
    /// # Panics
    /// Panics if `stride` is zero while `len > 1`, or if the last addressed
    /// element lies outside `data`.
    pub fn new(data: &'a [f64], offset: usize, stride: usize, len: usize) -> Self {
        if len > 0 {
            assert!(
                stride > 0 || len == 1,
                "Strided::new: zero stride over {len} elements"
            );
            let last = (len - 1)
                .checked_mul(stride)
                .and_then(|span| span.checked_add(offset));
            assert!(
                matches!(last, Some(last) if last < data.len()),
                "Strided::new: {len} elements at offset {offset} with stride {stride} \
                 exceed a buffer of {}",
                data.len()
            );
        }
        Self {
            data,
            offset,
            stride,
            len,
        }
    }

    /// Distance between consecutive elements in the underlying buffer.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Position of the first element in the underlying buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl Sequence for Strided<'_> {
    #[inline]
    fn len(&self) -> usize {
        self.len
    }

    #[inline]
    fn get(&self, i: usize) -> f64 {
        debug_assert!(i < self.len);
        self.data[self.offset + i * self.stride]
    }
}

// ---------------------------------------------------------------------------
// Matrices
// ---------------------------------------------------------------------------

/// A borrowed row-major matrix of `nrow × ncol` values.
///
/// # Examples
/// ```
/// use u_reduce::sequence::{MatrixView, Sequence};
/// let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
/// let m = MatrixView::new(&data, 3, 2).unwrap();
/// let second = m.column(2);
/// assert_eq!(second.len(), 3);
/// assert_eq!(second.get(1), 4.0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct MatrixView<'a> {
    data: &'a [f64],
    nrow: usize,
    ncol: usize,
}

impl<'a> MatrixView<'a> {
    /// Wraps `data` as an `nrow × ncol` row-major matrix.
    ///
    /// # Returns
    /// - `None` if `data.len() != nrow * ncol`.
    pub fn new(data: &'a [f64], nrow: usize, ncol: usize) -> Option<Self> {
        if nrow.checked_mul(ncol)? != data.len() {
            return None;
        }
        Some(Self { data, nrow, ncol })
    }

    /// Number of rows.
    pub fn nrow(&self) -> usize {
        self.nrow
    }

    /// Number of columns (the row length).
    pub fn ncol(&self) -> usize {
        self.ncol
    }

    /// The row-major backing buffer.
    pub fn as_slice(&self) -> &'a [f64] {
        self.data
    }

    /// Element at 1-based `(row, column)`.
    ///
    /// # Panics
    /// Panics if either number is out of range.
    pub fn at(&self, row: usize, column: usize) -> f64 {
        assert!(
            (1..=self.nrow).contains(&row) && (1..=self.ncol).contains(&column),
            "MatrixView::at: ({row}, {column}) outside {}×{}",
            self.nrow,
            self.ncol
        );
        self.data[(row - 1) * self.ncol + (column - 1)]
    }

    /// A strided view of column `column_number`, counted from 1.
    ///
    /// # Panics
    /// Panics unless `1 <= column_number <= ncol`.
    pub fn column(&self, column_number: usize) -> Column<'a> {
        assert!(
            (1..=self.ncol).contains(&column_number),
            "MatrixView::column: column {column_number} outside 1..={}",
            self.ncol
        );
        Column {
            inner: Strided::new(self.data, column_number - 1, self.ncol, self.nrow),
        }
    }
}

/// One column of a [`MatrixView`]; element `i` is row `i + 1`.
#[derive(Debug, Clone, Copy)]
pub struct Column<'a> {
    inner: Strided<'a>,
}

impl<'a> Column<'a> {
    /// The strided view this column reads through.
    pub fn as_strided(&self) -> Strided<'a> {
        self.inner
    }
}

impl Sequence for Column<'_> {
    #[inline]
    fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    fn get(&self, i: usize) -> f64 {
        self.inner.get(i)
    }
}
