//! Small numeric helpers shared by the kernel implementations.

/// Minimum of three values. `f64::min` keeps NaN out as long as inputs are
/// ordered or infinite, which holds for all DP cell values.
#[inline]
pub(crate) fn min3(a: f64, b: f64, c: f64) -> f64 {
    f64::min(a, f64::min(b, c))
}

/// Tighten a cutoff for the `<= ub` cell test: one ulp up to absorb a single
/// rounding step, minus the cheapest cost of the final alignment.
#[inline]
pub(crate) fn tighten(cutoff: f64, last_step: f64) -> f64 {
    cutoff.next_up() - last_step
}
