//! # tslinalg: Dense strided linear-algebra kernel
//!
//! The numerical core of an econometric time-series toolkit (seasonal
//! adjustment, ARIMA and state-space estimation). It provides:
//!
//! - zero-copy strided [views](view) over caller-owned `f64` buffers, so
//!   sub-matrices and sub-vectors can be manipulated without copying;
//! - an in-place [triangular](triangular) solve and multiply engine with
//!   unit-stride fast paths;
//! - standard and hyperbolic (indefinite-metric) [Householder](qr)
//!   reflections;
//! - a rank-revealing Householder [QR decomposition](qr::RobustQr) with
//!   compensated (Neumaier) summation and a least-squares solver.
//!
//! The kernel is single-threaded and synchronous; all mutation happens in
//! place on caller-supplied buffers through mutable views, so exclusive
//! access is enforced by the borrow checker. Rank deficiency is reported as
//! data; the only runtime failure is [`KernelError::Singular`].

pub mod error;
pub mod qr;
pub mod triangular;
pub mod utils;
pub mod view;

pub use error::KernelError;
pub use qr::{Householder, HyperbolicHouseholder, QrOptions, RobustQr};
pub use utils::{norm2, norm2_fast, NeumaierSum};
pub use view::{MatView, MatViewMut, VecView, VecViewMut};

// Re-export mdarray types
pub use mdarray::{DTensor, Tensor};

// Type aliases for convenience
pub type Matrix = DTensor<f64, 2>;
pub type Vector = DTensor<f64, 1>;
