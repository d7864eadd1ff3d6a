//! Standard Householder reflections
//!
//! A reflection maps a vector `x` to `(mu, 0, ..., 0)` with `mu = ±||x||`,
//! and is the column-zeroing building block of the QR decomposition. The
//! sign of `mu` is chosen opposite to `x[0]` so that the pivot update
//! `v[0] = x[0] - mu` adds magnitudes instead of cancelling.

use crate::utils::{norms::norm2, NeumaierSum};
use crate::view::{VecView, VecViewMut};

/// A Householder reflection `H = I - beta * v * v'` with `beta = 2 / (v'v)`.
///
/// Immutable once constructed; [`transform`](Householder::transform) may be
/// applied to any number of vectors of the same length.
#[derive(Debug, Clone)]
pub struct Householder {
    v: Vec<f64>,
    beta: f64,
    mu: f64,
}

impl Householder {
    /// Build the reflection that zeroes all but the first coordinate of `x`.
    ///
    /// Non-destructive: `x` is copied and left untouched.
    pub fn of(x: &VecView) -> Self {
        Self::make(x.to_vec())
    }

    /// Destructive variant: `x` is overwritten with the reflection result,
    /// `(mu, v[1], ..., v[n-1])`, the packed layout the QR decomposition
    /// stores below its diagonal.
    pub fn in_place(x: &mut VecViewMut) -> Self {
        let h = Self::make(x.to_vec());
        if !h.v.is_empty() {
            x.set(0, h.mu);
            for i in 1..h.v.len() {
                x.set(i, h.v[i]);
            }
        }
        h
    }

    fn make(mut v: Vec<f64>) -> Self {
        let n = v.len();
        if n == 0 {
            return Self { v, beta: 0.0, mu: 0.0 };
        }
        if n == 1 {
            // Sign normalization only: flip when the single entry is negative.
            let x0 = v[0];
            v[0] = 1.0;
            let beta = if x0 < 0.0 { 2.0 } else { 0.0 };
            return Self { v, beta, mu: x0.abs() };
        }

        let nrm = {
            let view = VecView::from_slice(&v);
            norm2(&view)
        };
        if nrm == 0.0 {
            return Self { v, beta: 0.0, mu: 0.0 };
        }

        let x0 = v[0];
        let mu = if x0 >= 0.0 { -nrm } else { nrm };
        v[0] = x0 - mu;

        let mut vtv = NeumaierSum::new();
        for vi in &v {
            vtv.add_prod(*vi, *vi);
        }
        let beta = 2.0 / vtv.value();

        Self { v, beta, mu }
    }

    /// Apply the reflection: `y <- y - beta * v * (v'y)`.
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
            acc.add_prod(*vi, y.get(i));
        }
        let s = self.beta * acc.value();
        for (i, vi) in self.v.iter().enumerate() {
            y.set(i, y.get(i) - s * vi);
        }
    }

    /// The signed norm `±||x||` that `x` is mapped onto.
    pub fn mu(&self) -> f64 {
        self.mu
    }

    /// The reflection coefficient `2 / (v'v)`; `0.0` means identity.
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// The stored reflection vector.
    pub fn vector(&self) -> &[f64] {
        &self.v
    }

    pub fn len(&self) -> usize {
        self.v.len()
    }

    pub fn is_empty(&self) -> bool {
        self.v.is_empty()
    }
}
