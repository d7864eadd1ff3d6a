//! In-place triangular solve and multiply engine
//!
//! All operations here take a lower-triangular matrix view and a vector
//! view, and overwrite the vector in place; only the lower half of the
//! matrix is ever read, entries above the diagonal are treated as zero
//! without being inspected. Upper-triangular counterparts live in the
//! [`upper`] sub-module and delegate through transposed views.
//!
//! Every operation exists in two observably equivalent forms: a unit-stride
//! specialization with tight slice-based inner loops, and a generic strided
//! fallback. The form is chosen per call by inspecting the increments of
//! the views.
//!
//! Solves follow a soft-zero policy controlled by the caller's `zero`
//! threshold: a solved entry whose accumulated residual is at most `zero`
//! in magnitude is forced to exactly `0.0` without touching the diagonal,
//! so numerical noise never propagates into a logically-zero part of an
//! under-determined system. A residual above the threshold over an
//! exactly-zero diagonal is reported as [`KernelError::Singular`].

use crate::error::KernelError;
use crate::utils::NeumaierSum;
use crate::view::{MatView, VecViewMut};

fn check_solve_dims(l: &MatView, n: usize, zero: f64) {
    assert!(
        l.nrows() >= n && l.ncols() >= n,
        "triangular matrix is {}x{}, need at least {n}x{n}",
        l.nrows(),
        l.ncols()
    );
    assert!(zero >= 0.0, "zero threshold must be nonnegative, got {zero}");
}

/// Resolve the accumulated residual `s` against the diagonal entry `d`.
#[inline]
fn resolve(s: f64, d: f64, zero: f64) -> Result<f64, KernelError> {
    if s.abs() <= zero {
        Ok(0.0)
    } else if d == 0.0 {
        Err(KernelError::Singular)
    } else {
        Ok(s / d)
    }
}

/// Solve `L * x = b` in place by forward substitution.
///
/// `b` is overwritten with the solution; its length may be smaller than the
/// dimension of `L` (the leading sub-system is solved). `zero` is the
/// soft-zero threshold described in the module docs; pass `0.0` for exact
/// singularity detection only.
pub fn rsolve(l: &MatView, b: &mut VecViewMut, zero: f64) -> Result<(), KernelError> {
    let n = b.len();
    check_solve_dims(l, n, zero);
    if l.col_inc() == 1 && b.is_unit_stride() {
        rsolve_unit(l, b, zero)
    } else {
        rsolve_strided(l, b, zero)
    }
}

fn rsolve_unit(l: &MatView, b: &mut VecViewMut, zero: f64) -> Result<(), KernelError> {
    let n = b.len();
    let x = b.as_slice_mut().expect("unit-stride path requires inc == 1");
    for i in 0..n {
        let row = l.row_slice(i, 0, i).expect("unit-stride path requires col_inc == 1");
        let (solved, rest) = x.split_at_mut(i);
        let mut acc = NeumaierSum::seeded(rest[0]);
        for (lij, xj) in row.iter().zip(solved.iter()) {
            acc.sub_prod(*lij, *xj);
        }
        rest[0] = resolve(acc.value(), l.get(i, i), zero)?;
    }
    Ok(())
}

fn rsolve_strided(l: &MatView, b: &mut VecViewMut, zero: f64) -> Result<(), KernelError> {
    let n = b.len();
    for i in 0..n {
        let mut acc = NeumaierSum::seeded(b.get(i));
        for j in 0..i {
            acc.sub_prod(l.get(i, j), b.get(j));
        }
        b.set(i, resolve(acc.value(), l.get(i, i), zero)?);
    }
    Ok(())
}

/// Solve `x * L = b` in place by backward substitution.
///
/// Operates from the opposite side of [`rsolve`]: the recurrence runs over
/// the columns of `L` from the last solved entry downwards.
pub fn lsolve(l: &MatView, b: &mut VecViewMut, zero: f64) -> Result<(), KernelError> {
    let n = b.len();
    check_solve_dims(l, n, zero);
    if l.row_inc() == 1 && b.is_unit_stride() {
        lsolve_unit(l, b, zero)
    } else {
        lsolve_strided(l, b, zero)
    }
}

fn lsolve_unit(l: &MatView, b: &mut VecViewMut, zero: f64) -> Result<(), KernelError> {
    let n = b.len();
    let x = b.as_slice_mut().expect("unit-stride path requires inc == 1");
    for j in (0..n).rev() {
        let col = l.col_slice(j, j + 1, n - j - 1).expect("unit-stride path requires row_inc == 1");
        let (head, solved) = x.split_at_mut(j + 1);
        let mut acc = NeumaierSum::seeded(head[j]);
        for (lkj, xk) in col.iter().zip(solved.iter()) {
            acc.sub_prod(*lkj, *xk);
        }
        head[j] = resolve(acc.value(), l.get(j, j), zero)?;
    }
    Ok(())
}

fn lsolve_strided(l: &MatView, b: &mut VecViewMut, zero: f64) -> Result<(), KernelError> {
    let n = b.len();
    for j in (0..n).rev() {
        let mut acc = NeumaierSum::seeded(b.get(j));
        for k in j + 1..n {
            acc.sub_prod(l.get(k, j), b.get(k));
        }
        b.set(j, resolve(acc.value(), l.get(j, j), zero)?);
    }
    Ok(())
}

/// Compute `x <- L * x` in place.
///
/// No failure mode; entries of `x` that are exactly zero contribute nothing
/// and are skipped.
pub fn rmul(l: &MatView, x: &mut VecViewMut) {
    let n = x.len();
    assert!(
        l.nrows() >= n && l.ncols() >= n,
        "triangular matrix is {}x{}, need at least {n}x{n}",
        l.nrows(),
        l.ncols()
    );
    if l.col_inc() == 1 && x.is_unit_stride() {
        rmul_unit(l, x);
    } else {
        rmul_strided(l, x);
    }
}

fn rmul_unit(l: &MatView, x: &mut VecViewMut) {
    let n = x.len();
    let xs = x.as_slice_mut().expect("unit-stride path requires inc == 1");
    for i in (0..n).rev() {
        let row = l.row_slice(i, 0, i + 1).expect("unit-stride path requires col_inc == 1");
        let mut sum = 0.0;
        for (lij, xj) in row.iter().zip(xs.iter()) {
            if *xj != 0.0 {
                sum += lij * xj;
            }
        }
        xs[i] = sum;
    }
}

fn rmul_strided(l: &MatView, x: &mut VecViewMut) {
    let n = x.len();
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in 0..=i {
            let xj = x.get(j);
            if xj != 0.0 {
                sum += l.get(i, j) * xj;
            }
        }
        x.set(i, sum);
    }
}

/// Compute `x <- x * L` in place.
pub fn lmul(l: &MatView, x: &mut VecViewMut) {
    let n = x.len();
    assert!(
        l.nrows() >= n && l.ncols() >= n,
        "triangular matrix is {}x{}, need at least {n}x{n}",
        l.nrows(),
        l.ncols()
    );
    if l.row_inc() == 1 && x.is_unit_stride() {
        lmul_unit(l, x);
    } else {
        lmul_strided(l, x);
    }
}

fn lmul_unit(l: &MatView, x: &mut VecViewMut) {
    let n = x.len();
    let xs = x.as_slice_mut().expect("unit-stride path requires inc == 1");
    for j in 0..n {
        let col = l.col_slice(j, j, n - j).expect("unit-stride path requires row_inc == 1");
        let mut sum = 0.0;
        for (lkj, xk) in col.iter().zip(xs[j..].iter()) {
            if *xk != 0.0 {
                sum += lkj * xk;
            }
        }
        xs[j] = sum;
    }
}

fn lmul_strided(l: &MatView, x: &mut VecViewMut) {
    let n = x.len();
    for j in 0..n {
        let mut sum = 0.0;
        for k in j..n {
            let xk = x.get(k);
            if xk != 0.0 {
                sum += l.get(k, j) * xk;
            }
        }
        x.set(j, sum);
    }
}

/// Upper-triangular counterparts, obtained by transposing index traversal.
///
/// For an upper-triangular `U`, `U * x = b` is the same system as
/// `x * U' = b` with `U'` lower-triangular, so each operation delegates to
/// its lower-triangular dual on the transposed view. The transposition is a
/// zero-copy re-description of the same storage.
pub mod upper {
    use super::KernelError;
    use crate::view::{MatView, VecViewMut};

    /// Solve `U * x = b` in place (backward substitution).
    pub fn rsolve(u: &MatView, b: &mut VecViewMut, zero: f64) -> Result<(), KernelError> {
        super::lsolve(&u.transposed(), b, zero)
    }

    /// Solve `x * U = b` in place (forward substitution).
    pub fn lsolve(u: &MatView, b: &mut VecViewMut, zero: f64) -> Result<(), KernelError> {
        super::rsolve(&u.transposed(), b, zero)
    }

    /// Compute `x <- U * x` in place.
    pub fn rmul(u: &MatView, x: &mut VecViewMut) {
        super::lmul(&u.transposed(), x)
    }

    /// Compute `x <- x * U` in place.
    pub fn lmul(u: &MatView, x: &mut VecViewMut) {
        super::rmul(&u.transposed(), x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::MatView;
    use approx::assert_abs_diff_eq;

    // Row-major 3x3 lower-triangular fixture.
    const L: [f64; 9] = [2.0, 0.0, 0.0, 1.0, 3.0, 0.0, -1.0, 2.0, 4.0];

    #[test]
    fn test_rsolve_forward_substitution() {
        let l = MatView::from_slice(&L, 3, 3);
        let mut data = [2.0, 7.0, 9.0];
        let mut b = VecViewMut::from_slice(&mut data);
        rsolve(&l, &mut b, 0.0).unwrap();
        // x0 = 1, x1 = (7 - 1)/3 = 2, x2 = (9 + 1 - 4)/4 = 1.5
        assert_abs_diff_eq!(data[0], 1.0, epsilon = 1e-14);
        assert_abs_diff_eq!(data[1], 2.0, epsilon = 1e-14);
        assert_abs_diff_eq!(data[2], 1.5, epsilon = 1e-14);
    }

    #[test]
    fn test_rmul_then_rsolve_round_trip() {
        let l = MatView::from_slice(&L, 3, 3);
        let mut data = [1.0, -2.0, 0.5];
        let expected = data;
        let mut x = VecViewMut::from_slice(&mut data);
        rmul(&l, &mut x);
        rsolve(&l, &mut x, 0.0).unwrap();
        for i in 0..3 {
            assert_abs_diff_eq!(data[i], expected[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_lmul_then_lsolve_round_trip() {
        let l = MatView::from_slice(&L, 3, 3);
        let mut data = [0.25, 1.0, -3.0];
        let expected = data;
        let mut x = VecViewMut::from_slice(&mut data);
        lmul(&l, &mut x);
        lsolve(&l, &mut x, 0.0).unwrap();
        for i in 0..3 {
            assert_abs_diff_eq!(data[i], expected[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_singular_diagonal_detected() {
        let sing = [0.0, 0.0, 1.0, 1.0];
        let l = MatView::from_slice(&sing, 2, 2);
        let mut data = [1.0, 1.0];
        let mut b = VecViewMut::from_slice(&mut data);
        assert!(matches!(rsolve(&l, &mut b, 0.0), Err(KernelError::Singular)));
    }

    #[test]
    fn test_soft_zero_absorbs_noise() {
        let sing = [0.0, 0.0, 1.0, 1.0];
        let l = MatView::from_slice(&sing, 2, 2);
        // Zero right-hand side over the zero diagonal entry: solution entry
        // is forced to 0 and the solve succeeds.
        let mut data = [0.0, 3.0];
        let mut b = VecViewMut::from_slice(&mut data);
        rsolve(&l, &mut b, 0.0).unwrap();
        assert_eq!(data[0], 0.0);
        assert_abs_diff_eq!(data[1], 3.0, epsilon = 1e-14);
    }

    #[test]
    fn test_upper_rsolve_matches_manual() {
        // U = [[2, 1], [0, 4]], b = [4, 8] -> x = [1, 2]
        let u = [2.0, 1.0, 0.0, 4.0];
        let uv = MatView::from_slice(&u, 2, 2);
        let mut data = [4.0, 8.0];
        let mut b = VecViewMut::from_slice(&mut data);
        upper::rsolve(&uv, &mut b, 0.0).unwrap();
        assert_abs_diff_eq!(data[0], 1.0, epsilon = 1e-14);
        assert_abs_diff_eq!(data[1], 2.0, epsilon = 1e-14);
    }

    #[test]
    fn test_strided_and_unit_paths_agree() {
        let l = MatView::from_slice(&L, 3, 3);
        let mut dense = [2.0, 7.0, 9.0];
        let mut spread = [2.0, 0.0, 7.0, 0.0, 9.0];

        let mut b_dense = VecViewMut::from_slice(&mut dense);
        rsolve(&l, &mut b_dense, 0.0).unwrap();

        let mut b_spread = VecViewMut::new(&mut spread, 0, 3, 2);
        rsolve(&l, &mut b_spread, 0.0).unwrap();

        for i in 0..3 {
            assert_abs_diff_eq!(dense[i], spread[2 * i], epsilon = 1e-15);
        }
    }
}
