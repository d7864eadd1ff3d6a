//! Numerical utilities: compensated summation and vector norms

pub mod accum;
pub mod norms;

pub use accum::NeumaierSum;
pub use norms::{norm2, norm2_fast};
