//! Hyperbolic (J-unitary) Householder reflections
//!
//! Generalizes the standard reflection to the indefinite inner product
//! `<x, y> = x0*y0 + sum(x[i]*y[i], 0 < i < p) - sum(x[i]*y[i], i >= p)`,
//! where `p` is the pivot position splitting the vector into a positive and
//! a negative sub-block. The reflection preserves the signed quadratic form
//! `x0^2 + sum(+) - sum(-)` while collapsing both sub-blocks onto the
//! leading coordinate.
//!
//! Downstream this is what lets square-root covariance propagation combine
//! variance contributions of mixed sign without forming the full, possibly
//! ill-conditioned covariance matrix.

use crate::utils::NeumaierSum;
use crate::view::{VecView, VecViewMut};

/// A J-unitary reflection `H = I - beta * v * v' * J` with
/// `beta = 2 / (v'Jv)` and `J = diag(+1 for i < pivot, -1 for i >= pivot)`.
#[derive(Debug, Clone)]
pub struct HyperbolicHouseholder {
    v: Vec<f64>,
    beta: f64,
    pivot: usize,
    mu: f64,
}

impl HyperbolicHouseholder {
    /// Build the reflection for `x`, partitioned at `pivot`.
    ///
    /// Indices `1..pivot` contribute positively to the form, indices
    /// `pivot..` negatively. Requires a nonnegative form value
    /// `sigma = x0^2 + sum(+) - sum(-)`; the reflection maps `x` onto
    /// `(sqrt(sigma), 0, ..., 0)`. If both sub-block sums are negligible
    /// the reflection degenerates to the identity; there is no failure
    /// mode.
    pub fn of(x: &VecView, pivot: usize) -> Self {
        let n = x.len();
        assert!(
            pivot >= 1 && pivot <= n,
            "pivot {pivot} out of range for vector of length {n}"
        );
        let mut v = x.to_vec();

        // Signed partial sums, excluding the leading coordinate. Mixed-sign
        // accumulation is exactly where compensation pays off.
        let mut pos_acc = NeumaierSum::new();
        for vi in &v[1..pivot] {
            pos_acc.add_prod(*vi, *vi);
        }
        let mut neg_acc = NeumaierSum::new();
        for vi in &v[pivot..] {
            neg_acc.add_prod(*vi, *vi);
        }
        let pos = pos_acc.value();
        let neg = neg_acc.value();

        let x0 = v[0];
        if pos <= f64::EPSILON && neg <= f64::EPSILON {
            return Self { v, beta: 0.0, pivot, mu: x0.abs() };
        }

        let sigma_rest = pos - neg;
        let sigma = x0 * x0 + sigma_rest;
        debug_assert!(sigma >= 0.0, "indefinite form value {sigma} must be nonnegative");
        let mu = sigma.max(0.0).sqrt();

        // Pivot update. The second branch is the cancellation-free identity
        // for x0 - mu when x0 and mu are close in magnitude.
        v[0] = if x0 <= 0.0 { x0 - mu } else { -sigma_rest / (x0 + mu) };

        let mut jnorm = NeumaierSum::seeded(v[0] * v[0]);
        jnorm.add(pos);
        jnorm.add(-neg);
        let vjv = jnorm.value();
        if vjv.abs() < f64::EPSILON {
            // Light-like reflection vector; no well-defined reflection.
            return Self { v, beta: 0.0, pivot, mu };
        }

        Self { v, beta: 2.0 / vjv, pivot, mu }
    }

    /// Apply the reflection: `y <- y - beta * v * (v'Jy)`.
    pub fn transform(&self, y: &mut VecViewMut) {
        assert_eq!(
            y.len(),
            self.v.len(),
            "vector length {} does not match reflection dimension {}",
            y.len(),
            self.v.len()
        );
        if self.beta == 0.0 {
            return;
        }
        let mut acc = NeumaierSum::new();
        for (i, vi) in self.v.iter().enumerate() {
            if i < self.pivot {
                acc.add_prod(*vi, y.get(i));
            } else {
                acc.sub_prod(*vi, y.get(i));
            }
        }
        let s = self.beta * acc.value();
        for (i, vi) in self.v.iter().enumerate() {
            y.set(i, y.get(i) - s * vi);
        }
    }

    /// The norm `sqrt(sigma)` of the input under the indefinite form.
    pub fn mu(&self) -> f64 {
        self.mu
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn pivot(&self) -> usize {
        self.pivot
    }

    pub fn len(&self) -> usize {
        self.v.len()
    }

    pub fn is_empty(&self) -> bool {
        self.v.is_empty()
    }
}
