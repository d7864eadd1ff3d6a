//! Rank-revealing Householder QR decomposition
//!
//! Columns are processed left to right. A column whose remaining sub-column
//! norm falls at or below the working threshold is numerically dependent on
//! the columns before it: it is recorded in `unused` and physically
//! compacted out of the working region, so the factorization that remains
//! is always full-rank. There is no failure mode for rank deficiency; it is
//! reported as data.
//!
//! All numerically sensitive inner products run through the compensated
//! accumulator, bounding error growth across many columns. A faster,
//! uncompensated mode can be selected per decomposition.

pub mod householder;
pub mod hyperbolic;

pub use householder::Householder;
pub use hyperbolic::HyperbolicHouseholder;

use crate::error::KernelError;
use crate::utils::NeumaierSum;
use crate::view::{MatView, VecView, VecViewMut};
use crate::Matrix;
use mdarray::DTensor;

/// Options for [`RobustQr::decompose_with_options`].
#[derive(Debug, Clone, Copy)]
pub struct QrOptions {
    /// Threshold below which a column norm (or a back-substitution residual)
    /// is treated as zero.
    pub eps: f64,
    /// Skip compensated accumulation in norms and reflection inner products.
    pub fast_norms: bool,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self { eps: 0.0, fast_norms: false }
    }
}

/// State of a Householder QR factorization with rank detection.
///
/// Owns a column-major working buffer holding, after decomposition, the
/// Householder vectors below the diagonal and the off-diagonal rows of `R`
/// above it; the signed `R` diagonal lives in `rdiag`. Immutable once
/// `decompose` returns.
#[derive(Debug, Clone)]
pub struct RobustQr {
    /// Column-major working storage, `m * ncols` after compaction.
    qr: Vec<f64>,
    /// Row count of the input.
    m: usize,
    /// Column count of the input, before any column was rejected.
    n: usize,
    /// Columns kept in the working storage; equals the numeric rank.
    ncols: usize,
    /// Signed diagonal of `R`, one entry per kept column.
    rdiag: Vec<f64>,
    /// Reflection coefficients, one per kept column.
    beta: Vec<f64>,
    /// Original indices of rejected (linearly dependent) columns.
    unused: Vec<usize>,
    eps: f64,
    fast_norms: bool,
}

impl RobustQr {
    /// Decompose `a` with compensated accumulation (the robust default).
    ///
    /// `eps` is the rank-detection threshold: a column whose remaining
    /// sub-column norm is at most `eps` is rejected as linearly dependent.
    /// Panics on malformed dimensions (`a` must have at least as many rows
    /// as columns); rank deficiency is never an error.
    pub fn decompose(a: &MatView, eps: f64) -> Self {
        Self::decompose_with_options(a, QrOptions { eps, fast_norms: false })
    }

    /// Decompose with explicit options.
    pub fn decompose_with_options(a: &MatView, options: QrOptions) -> Self {
        let m = a.nrows();
        let n = a.ncols();
        assert!(
            m >= n,
            "matrix must have at least as many rows as columns, got {m}x{n}"
        );
        assert!(
            options.eps >= 0.0,
            "eps must be nonnegative, got {}",
            options.eps
        );

        let mut qr = Vec::with_capacity(m * n);
        for c in 0..n {
            for r in 0..m {
                qr.push(a.get(r, c));
            }
        }
        let mut state = Self {
            qr,
            m,
            n,
            ncols: n,
            rdiag: Vec::with_capacity(n),
            beta: Vec::with_capacity(n),
            unused: Vec::new(),
            eps: options.eps,
            fast_norms: options.fast_norms,
        };
        state.factorize();
        state
    }

    /// Decompose an owned matrix; convenience for callers holding tensors.
    pub fn decompose_tensor(a: &Matrix, eps: f64) -> Self {
        let (m, n) = *a.shape();
        let mut data = Vec::with_capacity(m * n);
        for r in 0..m {
            for c in 0..n {
                data.push(a[[r, c]]);
            }
        }
        Self::decompose(&MatView::from_slice(&data, m, n), eps)
    }

    fn factorize(&mut self) {
        let m = self.m;
        let mut k = 0;
        while k < self.ncols {
            let nrm = self.column_norm(k);
            if nrm <= self.eps {
                // Numerically dependent on the previous columns: remember
                // its original index and compact the remaining columns
                // leftward. The same working position is inspected again.
                self.unused.push(k + self.unused.len());
                self.qr.copy_within((k + 1) * m.., k * m);
                self.ncols -= 1;
                self.qr.truncate(self.ncols * m);
                continue;
            }

            let x0 = self.qr[k * m + k];
            let mu = if x0 >= 0.0 { -nrm } else { nrm };
            self.qr[k * m + k] = x0 - mu;

            // beta = 2 / (v'v); v'v = -2 * mu * v0 by construction.
            let beta = self.vtv_beta(k);
            self.rdiag.push(mu);
            self.beta.push(beta);

            for j in k + 1..self.ncols {
                let s = beta * self.column_dot(k, j);
                for i in k..m {
                    let t = s * self.qr[k * m + i];
                    self.qr[j * m + i] -= t;
                }
            }
            k += 1;
        }
    }

    /// Norm of the sub-column `rows k..m` of working column `k`.
    fn column_norm(&self, k: usize) -> f64 {
        let m = self.m;
        let col = &self.qr[k * m + k..(k + 1) * m];
        if self.fast_norms {
            let mut sum = 0.0;
            for val in col {
                sum += val * val;
            }
            sum.sqrt()
        } else {
            let mut acc = NeumaierSum::new();
            for val in col {
                acc.add_prod(*val, *val);
            }
            acc.value().sqrt()
        }
    }

    fn vtv_beta(&self, k: usize) -> f64 {
        let m = self.m;
        let v = &self.qr[k * m + k..(k + 1) * m];
        if self.fast_norms {
            let mut sum = 0.0;
            for vi in v {
                sum += vi * vi;
            }
            2.0 / sum
        } else {
            let mut acc = NeumaierSum::new();
            for vi in v {
                acc.add_prod(*vi, *vi);
            }
            2.0 / acc.value()
        }
    }

    /// Dot product of the stored reflection vector `k` with working column
    /// `j`, over rows `k..m`.
    fn column_dot(&self, k: usize, j: usize) -> f64 {
        let m = self.m;
        let v = &self.qr[k * m + k..(k + 1) * m];
        let col = &self.qr[j * m + k..(j + 1) * m];
        if self.fast_norms {
            let mut sum = 0.0;
            for (vi, ci) in v.iter().zip(col.iter()) {
                sum += vi * ci;
            }
            sum
        } else {
            let mut acc = NeumaierSum::new();
            for (vi, ci) in v.iter().zip(col.iter()) {
                acc.add_prod(*vi, *ci);
            }
            acc.value()
        }
    }

    /// Numeric rank detected during decomposition.
    pub fn rank(&self) -> usize {
        self.rdiag.len()
    }

    /// Original zero-based indices of columns rejected as dependent.
    pub fn unused(&self) -> &[usize] {
        &self.unused
    }

    pub fn row_count(&self) -> usize {
        self.m
    }

    /// Column count of the input matrix, before rank reduction.
    pub fn column_count(&self) -> usize {
        self.n
    }

    /// Signed diagonal of `R`.
    pub fn rdiag(&self) -> &[f64] {
        &self.rdiag
    }

    /// Materialize the upper-triangular `R` factor.
    ///
    /// With `compact`, the result is `rank x rank` over the kept columns.
    /// Otherwise it is `n x n` in the original column numbering, with zero
    /// rows and columns at the rejected indices, so regression callers can
    /// align entries with their design matrix.
    pub fn r(&self, compact: bool) -> Matrix {
        let m = self.m;
        let rk = self.rank();
        let r_entry = |i: usize, j: usize| -> f64 {
            if i > j {
                0.0
            } else if i == j {
                self.rdiag[i]
            } else {
                self.qr[j * m + i]
            }
        };
        if compact {
            return DTensor::<f64, 2>::from_fn((rk, rk), |idx| r_entry(idx[0], idx[1]));
        }

        // Map kept working columns back to their original positions.
        let mut used = Vec::with_capacity(rk);
        let mut next_unused = 0;
        for orig in 0..self.n {
            if next_unused < self.unused.len() && self.unused[next_unused] == orig {
                next_unused += 1;
            } else {
                used.push(orig);
            }
        }
        let mut full = DTensor::<f64, 2>::from_elem((self.n, self.n), 0.0);
        for i in 0..rk {
            for j in i..rk {
                full[[used[i], used[j]]] = r_entry(i, j);
            }
        }
        full
    }

    /// Apply `Q` to `x` in place by replaying the reflections backward.
    pub fn apply_q(&self, x: &mut VecViewMut) {
        self.check_vector(x.len());
        for k in (0..self.rank()).rev() {
            self.reflect(k, x);
        }
    }

    /// Apply `Q'` to `x` in place by replaying the reflections forward.
    pub fn apply_qt(&self, x: &mut VecViewMut) {
        self.check_vector(x.len());
        for k in 0..self.rank() {
            self.reflect(k, x);
        }
    }

    fn check_vector(&self, len: usize) {
        assert_eq!(
            len, self.m,
            "vector length {len} does not match row count {}",
            self.m
        );
    }

    /// Apply the stored reflection `k` to rows `k..m` of `x`.
    fn reflect(&self, k: usize, x: &mut VecViewMut) {
        let m = self.m;
        let v = &self.qr[k * m + k..(k + 1) * m];
        let mut acc = NeumaierSum::new();
        for (i, vi) in v.iter().enumerate() {
            acc.add_prod(*vi, x.get(k + i));
        }
        let s = self.beta[k] * acc.value();
        for (i, vi) in v.iter().enumerate() {
            let xi = x.get(k + i);
            x.set(k + i, xi - s * vi);
        }
    }

    /// Least-squares solve: `b = R^-1 * (Q'x)`, residual in `res`.
    ///
    /// `x` has length `m`; `b` receives the `rank` coefficients of the kept
    /// columns; `res`, when supplied, receives the trailing `m - rank`
    /// components of `Q'x`, the part of `x` outside the column space.
    ///
    /// Back-substitution follows the same soft-zero policy as the
    /// triangular engine, with `eps` as the threshold; an exactly-zero
    /// `R` diagonal under a residual above `eps` is a `Singular` failure
    /// and leaves `b` in an unspecified state.
    pub fn least_squares(
        &self,
        x: &VecView,
        b: &mut VecViewMut,
        res: Option<&mut VecViewMut>,
    ) -> Result<(), KernelError> {
        let m = self.m;
        let rk = self.rank();
        self.check_vector(x.len());
        assert_eq!(
            b.len(),
            rk,
            "solution length {} does not match rank {rk}",
            b.len()
        );

        let mut y = x.to_vec();
        self.apply_qt(&mut VecViewMut::from_slice(&mut y));

        for i in (0..rk).rev() {
            let mut acc = NeumaierSum::seeded(y[i]);
            for j in i + 1..rk {
                acc.sub_prod(self.qr[j * m + i], b.get(j));
            }
            let s = acc.value();
            if s.abs() <= self.eps {
                b.set(i, 0.0);
            } else if self.rdiag[i] == 0.0 {
                return Err(KernelError::Singular);
            } else {
                b.set(i, s / self.rdiag[i]);
            }
        }

        if let Some(res) = res {
            assert_eq!(
                res.len(),
                m - rk,
                "residual length {} does not match m - rank = {}",
                res.len(),
                m - rk
            );
            for (i, yi) in y[rk..].iter().enumerate() {
                res.set(i, *yi);
            }
        }
        Ok(())
    }
}
