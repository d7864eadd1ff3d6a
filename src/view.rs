//! Zero-copy strided views over flat `f64` buffers
//!
//! A view describes a linear or rectangular region of a caller-owned slice
//! through a start offset and one or two signed increments. Sub-vectors,
//! sub-matrices, transposes, rows, columns and diagonals are all O(1)
//! re-descriptions of the same storage; no element is ever copied.
//!
//! Views never own their buffer. Mutable views take an exclusive borrow, so
//! the kernel's exclusive-access requirement is enforced by the borrow
//! checker rather than by locking.

use crate::{Matrix, Vector};
use mdarray::DTensor;

/// Check that every addressed offset of a strided run lies inside `len`.
fn check_envelope(len: usize, start: usize, count: usize, inc: isize) {
    debug_assert!(inc != 0, "increment must be non-zero");
    if count == 0 {
        return;
    }
    let first = start as isize;
    let last = first + (count as isize - 1) * inc;
    let lo = first.min(last);
    let hi = first.max(last);
    debug_assert!(
        lo >= 0 && (hi as usize) < len,
        "view addresses [{lo}, {hi}] outside buffer of length {len}"
    );
}

#[inline]
fn offset(start: usize, i: usize, inc: isize) -> usize {
    (start as isize + i as isize * inc) as usize
}

/// Immutable strided vector view: element `i` lives at `start + i*inc`.
#[derive(Debug, Clone, Copy)]
pub struct VecView<'a> {
    data: &'a [f64],
    start: usize,
    len: usize,
    inc: isize,
}

impl<'a> VecView<'a> {
    /// Create a view with explicit addressing parameters.
    pub fn new(data: &'a [f64], start: usize, len: usize, inc: isize) -> Self {
        check_envelope(data.len(), start, len, inc);
        Self { data, start, len, inc }
    }

    /// Dense view over a whole slice (start 0, unit increment).
    pub fn from_slice(data: &'a [f64]) -> Self {
        Self { data, start: 0, len: data.len(), inc: 1 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn inc(&self) -> isize {
        self.inc
    }

    pub fn is_unit_stride(&self) -> bool {
        self.inc == 1
    }

    #[inline]
    pub fn get(&self, i: usize) -> f64 {
        debug_assert!(i < self.len, "index {i} out of bounds for view of length {}", self.len);
        self.data[offset(self.start, i, self.inc)]
    }

    /// Sub-vector of `len` elements starting at logical index `first`.
    pub fn range(&self, first: usize, len: usize) -> VecView<'a> {
        debug_assert!(first + len <= self.len);
        VecView {
            data: self.data,
            start: offset(self.start, first, self.inc),
            len,
            inc: self.inc,
        }
    }

    /// Same elements traversed back to front.
    pub fn reversed(&self) -> VecView<'a> {
        if self.len == 0 {
            return *self;
        }
        VecView {
            data: self.data,
            start: offset(self.start, self.len - 1, self.inc),
            len: self.len,
            inc: -self.inc,
        }
    }

    /// Contiguous slice of the viewed elements, if the increment is 1.
    pub fn as_slice(&self) -> Option<&'a [f64]> {
        if self.inc == 1 {
            Some(&self.data[self.start..self.start + self.len])
        } else {
            None
        }
    }

    pub fn to_vec(&self) -> Vec<f64> {
        (0..self.len).map(|i| self.get(i)).collect()
    }

    pub fn to_tensor(&self) -> Vector {
        DTensor::<f64, 1>::from_fn((self.len,), |idx| self.get(idx[0]))
    }
}

/// Mutable strided vector view.
#[derive(Debug)]
pub struct VecViewMut<'a> {
    data: &'a mut [f64],
    start: usize,
    len: usize,
    inc: isize,
}

impl<'a> VecViewMut<'a> {
    pub fn new(data: &'a mut [f64], start: usize, len: usize, inc: isize) -> Self {
        check_envelope(data.len(), start, len, inc);
        Self { data, start, len, inc }
    }

    pub fn from_slice(data: &'a mut [f64]) -> Self {
        let len = data.len();
        Self { data, start: 0, len, inc: 1 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn inc(&self) -> isize {
        self.inc
    }

    pub fn is_unit_stride(&self) -> bool {
        self.inc == 1
    }

    #[inline]
    pub fn get(&self, i: usize) -> f64 {
        debug_assert!(i < self.len, "index {i} out of bounds for view of length {}", self.len);
        self.data[offset(self.start, i, self.inc)]
    }

    #[inline]
    pub fn set(&mut self, i: usize, value: f64) {
        debug_assert!(i < self.len, "index {i} out of bounds for view of length {}", self.len);
        self.data[offset(self.start, i, self.inc)] = value;
    }

    /// Immutable re-description of the same region.
    pub fn as_view(&self) -> VecView<'_> {
        VecView {
            data: &*self.data,
            start: self.start,
            len: self.len,
            inc: self.inc,
        }
    }

    /// Mutable sub-vector of `len` elements starting at logical index `first`.
    pub fn range_mut(&mut self, first: usize, len: usize) -> VecViewMut<'_> {
        debug_assert!(first + len <= self.len);
        VecViewMut {
            start: offset(self.start, first, self.inc),
            len,
            inc: self.inc,
            data: &mut *self.data,
        }
    }

    /// Contiguous mutable slice of the viewed elements, if the increment is 1.
    pub fn as_slice_mut(&mut self) -> Option<&mut [f64]> {
        if self.inc == 1 {
            Some(&mut self.data[self.start..self.start + self.len])
        } else {
            None
        }
    }

    /// Copy every element of `src` into this view. Lengths must match.
    pub fn copy_from(&mut self, src: &VecView) {
        assert_eq!(
            self.len,
            src.len(),
            "copy_from length mismatch: {} vs {}",
            self.len,
            src.len()
        );
        for i in 0..self.len {
            self.set(i, src.get(i));
        }
    }

    pub fn fill(&mut self, value: f64) {
        for i in 0..self.len {
            self.set(i, value);
        }
    }

    pub fn to_vec(&self) -> Vec<f64> {
        (0..self.len).map(|i| self.get(i)).collect()
    }
}

/// Immutable strided matrix view: element `(r, c)` lives at
/// `start + r*row_inc + c*col_inc`.
#[derive(Debug, Clone, Copy)]
pub struct MatView<'a> {
    data: &'a [f64],
    start: usize,
    nrows: usize,
    ncols: usize,
    row_inc: isize,
    col_inc: isize,
}

impl<'a> MatView<'a> {
    pub fn new(
        data: &'a [f64],
        start: usize,
        nrows: usize,
        ncols: usize,
        row_inc: isize,
        col_inc: isize,
    ) -> Self {
        if nrows > 0 && ncols > 0 {
            // Corners bound the addressed envelope for any stride signs.
            check_envelope(data.len(), start, nrows, row_inc);
            let far = offset(start, nrows - 1, row_inc);
            check_envelope(data.len(), start, ncols, col_inc);
            check_envelope(data.len(), far, ncols, col_inc);
        }
        Self { data, start, nrows, ncols, row_inc, col_inc }
    }

    /// Dense row-major view over a whole slice.
    pub fn from_slice(data: &'a [f64], nrows: usize, ncols: usize) -> Self {
        assert_eq!(
            data.len(),
            nrows * ncols,
            "buffer of length {} cannot hold a {nrows}x{ncols} matrix",
            data.len()
        );
        Self {
            data,
            start: 0,
            nrows,
            ncols,
            row_inc: ncols as isize,
            col_inc: 1,
        }
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn row_inc(&self) -> isize {
        self.row_inc
    }

    pub fn col_inc(&self) -> isize {
        self.col_inc
    }

    #[inline]
    pub fn get(&self, r: usize, c: usize) -> f64 {
        debug_assert!(r < self.nrows && c < self.ncols, "({r}, {c}) out of bounds");
        self.data[(self.start as isize + r as isize * self.row_inc + c as isize * self.col_inc)
            as usize]
    }

    /// Row `r` as a vector view (increment = column increment).
    pub fn row(&self, r: usize) -> VecView<'a> {
        debug_assert!(r < self.nrows);
        VecView {
            data: self.data,
            start: offset(self.start, r, self.row_inc),
            len: self.ncols,
            inc: self.col_inc,
        }
    }

    /// Column `c` as a vector view (increment = row increment).
    pub fn column(&self, c: usize) -> VecView<'a> {
        debug_assert!(c < self.ncols);
        VecView {
            data: self.data,
            start: offset(self.start, c, self.col_inc),
            len: self.nrows,
            inc: self.row_inc,
        }
    }

    /// Main diagonal as a vector view.
    pub fn diagonal(&self) -> VecView<'a> {
        VecView {
            data: self.data,
            start: self.start,
            len: self.nrows.min(self.ncols),
            inc: self.row_inc + self.col_inc,
        }
    }

    /// Rectangular sub-matrix anchored at `(r0, c0)`.
    pub fn submatrix(&self, r0: usize, c0: usize, nrows: usize, ncols: usize) -> MatView<'a> {
        debug_assert!(r0 + nrows <= self.nrows && c0 + ncols <= self.ncols);
        MatView {
            data: self.data,
            start: (self.start as isize
                + r0 as isize * self.row_inc
                + c0 as isize * self.col_inc) as usize,
            nrows,
            ncols,
            row_inc: self.row_inc,
            col_inc: self.col_inc,
        }
    }

    /// Transpose by swapping extents and increments; no copy.
    pub fn transposed(&self) -> MatView<'a> {
        MatView {
            data: self.data,
            start: self.start,
            nrows: self.ncols,
            ncols: self.nrows,
            row_inc: self.col_inc,
            col_inc: self.row_inc,
        }
    }

    /// Contiguous slice of `len` elements of row `r` starting at column `c0`,
    /// if rows are unit-stride.
    pub fn row_slice(&self, r: usize, c0: usize, len: usize) -> Option<&'a [f64]> {
        if self.col_inc != 1 {
            return None;
        }
        debug_assert!(r < self.nrows && c0 + len <= self.ncols);
        let first = (self.start as isize + r as isize * self.row_inc) as usize + c0;
        Some(&self.data[first..first + len])
    }

    /// Contiguous slice of `len` elements of column `c` starting at row `r0`,
    /// if columns are unit-stride.
    pub fn col_slice(&self, c: usize, r0: usize, len: usize) -> Option<&'a [f64]> {
        if self.row_inc != 1 {
            return None;
        }
        debug_assert!(c < self.ncols && r0 + len <= self.nrows);
        let first = (self.start as isize + c as isize * self.col_inc) as usize + r0;
        Some(&self.data[first..first + len])
    }

    pub fn to_tensor(&self) -> Matrix {
        DTensor::<f64, 2>::from_fn((self.nrows, self.ncols), |idx| self.get(idx[0], idx[1]))
    }
}

/// Mutable strided matrix view.
#[derive(Debug)]
pub struct MatViewMut<'a> {
    data: &'a mut [f64],
    start: usize,
    nrows: usize,
    ncols: usize,
    row_inc: isize,
    col_inc: isize,
}

impl<'a> MatViewMut<'a> {
    pub fn new(
        data: &'a mut [f64],
        start: usize,
        nrows: usize,
        ncols: usize,
        row_inc: isize,
        col_inc: isize,
    ) -> Self {
        if nrows > 0 && ncols > 0 {
            check_envelope(data.len(), start, nrows, row_inc);
            let far = offset(start, nrows - 1, row_inc);
            check_envelope(data.len(), start, ncols, col_inc);
            check_envelope(data.len(), far, ncols, col_inc);
        }
        Self { data, start, nrows, ncols, row_inc, col_inc }
    }

    pub fn from_slice(data: &'a mut [f64], nrows: usize, ncols: usize) -> Self {
        assert_eq!(
            data.len(),
            nrows * ncols,
            "buffer of length {} cannot hold a {nrows}x{ncols} matrix",
            data.len()
        );
        Self {
            data,
            start: 0,
            nrows,
            ncols,
            row_inc: ncols as isize,
            col_inc: 1,
        }
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    pub fn get(&self, r: usize, c: usize) -> f64 {
        debug_assert!(r < self.nrows && c < self.ncols, "({r}, {c}) out of bounds");
        self.data[(self.start as isize + r as isize * self.row_inc + c as isize * self.col_inc)
            as usize]
    }

    #[inline]
    pub fn set(&mut self, r: usize, c: usize, value: f64) {
        debug_assert!(r < self.nrows && c < self.ncols, "({r}, {c}) out of bounds");
        self.data[(self.start as isize + r as isize * self.row_inc + c as isize * self.col_inc)
            as usize] = value;
    }

    pub fn as_view(&self) -> MatView<'_> {
        MatView {
            data: &*self.data,
            start: self.start,
            nrows: self.nrows,
            ncols: self.ncols,
            row_inc: self.row_inc,
            col_inc: self.col_inc,
        }
    }

    /// Row `r` as a mutable vector view.
    pub fn row_mut(&mut self, r: usize) -> VecViewMut<'_> {
        debug_assert!(r < self.nrows);
        VecViewMut {
            start: offset(self.start, r, self.row_inc),
            len: self.ncols,
            inc: self.col_inc,
            data: &mut *self.data,
        }
    }

    /// Column `c` as a mutable vector view.
    pub fn column_mut(&mut self, c: usize) -> VecViewMut<'_> {
        debug_assert!(c < self.ncols);
        VecViewMut {
            start: offset(self.start, c, self.col_inc),
            len: self.nrows,
            inc: self.row_inc,
            data: &mut *self.data,
        }
    }
}
