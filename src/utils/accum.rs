//! Compensated (Neumaier) summation

/// Running sum with deferred error correction.
///
/// Implements Neumaier's variant of Kahan summation: each addition tracks
/// the low-order bits lost to rounding in a separate compensation term,
/// which is re-injected when the total is read. Unlike plain Kahan
/// summation this stays accurate when an incoming term is larger in
/// magnitude than the running sum, which happens constantly in the
/// mixed-sign accumulations of the triangular solver and the QR updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeumaierSum {
    sum: f64,
    correction: f64,
}

impl NeumaierSum {
    pub fn new() -> Self {
        Self { sum: 0.0, correction: 0.0 }
    }

    /// Start the accumulation from `value` with no accumulated error.
    pub fn seeded(value: f64) -> Self {
        Self { sum: value, correction: 0.0 }
    }

    /// Add a term, capturing the rounding error of the addition.
    #[inline]
    pub fn add(&mut self, term: f64) {
        let t = self.sum + term;
        if self.sum.abs() >= term.abs() {
            self.correction += (self.sum - t) + term;
        } else {
            self.correction += (term - t) + self.sum;
        }
        self.sum = t;
    }

    /// Add the product `a * b`; convenience for dot-product loops.
    #[inline]
    pub fn add_prod(&mut self, a: f64, b: f64) {
        self.add(a * b);
    }

    /// Subtract the product `a * b`.
    #[inline]
    pub fn sub_prod(&mut self, a: f64, b: f64) {
        self.add(-(a * b));
    }

    /// Current total with the compensation re-injected.
    #[inline]
    pub fn value(&self) -> f64 {
        self.sum + self.correction
    }
}
