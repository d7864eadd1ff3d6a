//! Vector 2-norm computations over strided views

use super::NeumaierSum;
use crate::view::VecView;

/// Compute the 2-norm of a vector with compensated accumulation.
///
/// This is the robust entry point used by default throughout the kernel:
/// the sum of squares is tracked with a [`NeumaierSum`] so the result stays
/// accurate across long vectors.
pub fn norm2(vec: &VecView) -> f64 {
    let mut acc = NeumaierSum::new();
    for i in 0..vec.len() {
        let val = vec.get(i);
        acc.add_prod(val, val);
    }
    acc.value().sqrt()
}

/// Compute the 2-norm of a vector with plain accumulation.
///
/// Faster than [`norm2`] but without error compensation; selectable in the
/// QR decomposition when speed matters more than the last bits of accuracy.
pub fn norm2_fast(vec: &VecView) -> f64 {
    let mut sum = 0.0;
    for i in 0..vec.len() {
        let val = vec.get(i);
        sum += val * val;
    }
    sum.sqrt()
}
