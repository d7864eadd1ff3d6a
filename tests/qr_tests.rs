//! Robust QR integration tests

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tslinalg::{MatView, RobustQr, VecView, VecViewMut};

fn random_matrix(m: usize, n: usize, rng: &mut StdRng) -> Vec<f64> {
    (0..m * n).map(|_| rng.gen_range(-2.0..2.0)).collect()
}

/// Materialize Q (m x m) by applying it to the canonical basis.
fn q_columns(qr: &RobustQr, m: usize) -> Vec<Vec<f64>> {
    (0..m)
        .map(|i| {
            let mut e = vec![0.0; m];
            e[i] = 1.0;
            qr.apply_q(&mut VecViewMut::from_slice(&mut e));
            e
        })
        .collect()
}

#[test]
fn test_qr_reconstruction() {
    let mut rng = StdRng::seed_from_u64(2024);
    for (m, n) in [(3, 3), (5, 3), (8, 6), (20, 7)] {
        let data = random_matrix(m, n, &mut rng);
        let a = MatView::from_slice(&data, m, n);
        let qr = RobustQr::decompose(&a, 1e-12);
        assert_eq!(qr.rank(), n, "{m}x{n} random matrix should be full rank");

        let q = q_columns(&qr, m);
        let r = qr.r(true);

        // Q * [R; 0] must reproduce the input.
        for i in 0..m {
            for j in 0..n {
                let mut sum = 0.0;
                for k in 0..n {
                    sum += q[k][i] * r[[k, j]];
                }
                assert!(
                    (sum - a.get(i, j)).abs() < 1e-9,
                    "{m}x{n}: reconstruction error at ({i}, {j}): {sum} vs {}",
                    a.get(i, j)
                );
            }
        }

        // Q' * Q = I.
        for i in 0..m {
            for j in 0..m {
                let mut dot = 0.0;
                for k in 0..m {
                    dot += q[i][k] * q[j][k];
                }
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!(
                    (dot - expected).abs() < 1e-9,
                    "{m}x{n}: Q'Q deviates from identity at ({i}, {j})"
                );
            }
        }
    }
}

#[test]
fn test_rank_detection_duplicate_column() {
    let mut rng = StdRng::seed_from_u64(5);
    let m = 6;
    let n = 4;
    let mut data = random_matrix(m, n, &mut rng);
    // Last column repeats column 1.
    for r in 0..m {
        data[r * n + (n - 1)] = data[r * n + 1];
    }
    let a = MatView::from_slice(&data, m, n);
    let qr = RobustQr::decompose(&a, 1e-9);
    assert_eq!(qr.rank(), n - 1);
    assert_eq!(qr.unused(), &[n - 1]);
}

#[test]
fn test_rank_detection_column_combination() {
    let mut rng = StdRng::seed_from_u64(6);
    let m = 7;
    let n = 5;
    let mut data = random_matrix(m, n, &mut rng);
    // Column 3 = 2*col0 - col2.
    for r in 0..m {
        data[r * n + 3] = 2.0 * data[r * n] - data[r * n + 2];
    }
    let a = MatView::from_slice(&data, m, n);
    let qr = RobustQr::decompose(&a, 1e-8);
    assert_eq!(qr.rank(), n - 1);
    assert_eq!(qr.unused(), &[3]);
}

#[test]
fn test_least_squares_worked_example() {
    // M = [[1, 0], [0, 1], [1, 1]], x = [1, 2, 2].
    let data = [1.0, 0.0, 0.0, 1.0, 1.0, 1.0];
    let a = MatView::from_slice(&data, 3, 2);
    let qr = RobustQr::decompose(&a, 1e-12);
    assert_eq!(qr.rank(), 2);

    let x = [1.0, 2.0, 2.0];
    let mut b = [0.0; 2];
    let mut res = [0.0; 1];
    qr.least_squares(
        &VecView::from_slice(&x),
        &mut VecViewMut::from_slice(&mut b),
        Some(&mut VecViewMut::from_slice(&mut res)),
    )
    .unwrap();

    // Normal equations give b = [2/3, 5/3]; the residual component has
    // magnitude 1/sqrt(3) (its sign is a convention of the Q factor).
    assert!((b[0] - 2.0 / 3.0).abs() < 1e-12, "b[0] = {}", b[0]);
    assert!((b[1] - 5.0 / 3.0).abs() < 1e-12, "b[1] = {}", b[1]);
    assert!(
        (res[0].abs() - 1.0 / 3.0_f64.sqrt()).abs() < 1e-12,
        "residual = {}",
        res[0]
    );

    // The residual norm matches ||x - M*b|| computed directly.
    let fitted = [b[0], b[1], b[0] + b[1]];
    let mut direct = 0.0;
    for i in 0..3 {
        direct += (x[i] - fitted[i]) * (x[i] - fitted[i]);
    }
    assert!((res[0] * res[0] - direct).abs() < 1e-12);
}

#[test]
fn test_least_squares_exact_fit() {
    let mut rng = StdRng::seed_from_u64(11);
    let m = 9;
    let n = 4;
    let data = random_matrix(m, n, &mut rng);
    let a = MatView::from_slice(&data, m, n);
    let truth: Vec<f64> = (0..n).map(|i| (i as f64) - 1.5).collect();
    let x: Vec<f64> = (0..m)
        .map(|r| (0..n).map(|c| data[r * n + c] * truth[c]).sum())
        .collect();

    let qr = RobustQr::decompose(&a, 1e-12);
    let mut b = vec![0.0; n];
    let mut res = vec![0.0; m - n];
    qr.least_squares(
        &VecView::from_slice(&x),
        &mut VecViewMut::from_slice(&mut b),
        Some(&mut VecViewMut::from_slice(&mut res)),
    )
    .unwrap();

    for i in 0..n {
        assert!((b[i] - truth[i]).abs() < 1e-9, "coefficient {i}");
    }
    for r in &res {
        assert!(r.abs() < 1e-9, "exact fit must have zero residual");
    }
}

#[test]
fn test_least_squares_on_rank_deficient_design() {
    // A constant column duplicated: the fit still goes through, with the
    // coefficient reported only for the kept columns.
    let data = [
        1.0, 1.0, 2.0, //
        1.0, 1.0, 3.0, //
        1.0, 1.0, 4.0, //
        1.0, 1.0, 5.0,
    ];
    let a = MatView::from_slice(&data, 4, 3);
    let qr = RobustQr::decompose(&a, 1e-9);
    assert_eq!(qr.rank(), 2);
    assert_eq!(qr.unused(), &[1]);

    // y = 1 + 2*t over t = 2..5.
    let x = [5.0, 7.0, 9.0, 11.0];
    let mut b = [0.0; 2];
    qr.least_squares(
        &VecView::from_slice(&x),
        &mut VecViewMut::from_slice(&mut b),
        None,
    )
    .unwrap();
    assert!((b[0] - 1.0).abs() < 1e-9);
    assert!((b[1] - 2.0).abs() < 1e-9);
}

#[test]
fn test_apply_qt_then_q_round_trips() {
    let mut rng = StdRng::seed_from_u64(77);
    let m = 10;
    let data = random_matrix(m, 6, &mut rng);
    let a = MatView::from_slice(&data, m, 6);
    let qr = RobustQr::decompose(&a, 1e-12);

    let x: Vec<f64> = (0..m).map(|i| (i as f64).sin()).collect();
    let mut work = x.clone();
    qr.apply_qt(&mut VecViewMut::from_slice(&mut work));
    qr.apply_q(&mut VecViewMut::from_slice(&mut work));
    for i in 0..m {
        assert!((work[i] - x[i]).abs() < 1e-11);
    }
}

#[test]
fn test_qr_of_strided_submatrix() {
    // Decompose a sub-matrix viewed out of a larger buffer without copying.
    let mut rng = StdRng::seed_from_u64(31);
    let big = random_matrix(8, 8, &mut rng);
    let whole = MatView::from_slice(&big, 8, 8);
    let sub = whole.submatrix(2, 3, 5, 4);

    let mut copied = Vec::with_capacity(5 * 4);
    for r in 0..5 {
        for c in 0..4 {
            copied.push(big[(r + 2) * 8 + (c + 3)]);
        }
    }
    let dense = MatView::from_slice(&copied, 5, 4);

    let qr_sub = RobustQr::decompose(&sub, 1e-12);
    let qr_dense = RobustQr::decompose(&dense, 1e-12);
    assert_eq!(qr_sub.rank(), qr_dense.rank());
    for (a, b) in qr_sub.rdiag().iter().zip(qr_dense.rdiag().iter()) {
        assert!((a - b).abs() < 1e-13);
    }
}
