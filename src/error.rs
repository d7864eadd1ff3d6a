//! Kernel error types

/// Errors surfaced by the kernel at run time
///
/// `Singular` is the only recoverable failure: a triangular solve or a
/// least-squares back-substitution hit an exactly-zero diagonal while the
/// right-hand side was above the caller's threshold. Rank deficiency is not
/// an error (it is reported through [`crate::RobustQr::unused`]), and
/// dimension mismatches are programmer errors that panic instead.
///
/// After a `Singular` failure the contents of partially-written output
/// buffers are unspecified; callers must re-initialize them before reuse.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    #[error("matrix is singular")]
    Singular,
}
