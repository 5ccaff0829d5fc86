//! Lockstep distances: direct alignment along the diagonal, modified
//! Minkowski and Lorentzian. No warping, plain accumulation with early
//! abandoning where a cut-off is supplied.

use crate::cost::ade;

/// Direct alignment: `Σ cost(i, i)` over equal-length sequences, abandoning
/// as soon as the accumulator exceeds the cut-off. Unequal lengths yield
/// `+∞` since no lockstep alignment exists.
pub fn directa<C>(nblines: usize, nbcols: usize, cost: C, ub: f64) -> f64
where
    C: Fn(usize, usize) -> f64,
{
    if nblines == 0 && nbcols == 0 {
        return 0.0;
    }
    if nblines != nbcols {
        return f64::INFINITY;
    }

    let cutoff = if ub.is_nan() { f64::INFINITY } else { ub };
    let mut acc = 0.0;
    for i in 0..nblines {
        acc += cost(i, i);
        if acc > cutoff {
            return f64::INFINITY;
        }
    }
    acc
}

/// Univariate direct alignment over raw slices with cost `|a - b|^e`.
pub fn directa_univariate(a: &[f64], b: &[f64], exponent: f64, ub: f64) -> f64 {
    directa(a.len(), b.len(), |i, _| ade(exponent, a[i], b[i]), ub)
}

/// Modified Minkowski distance: `Σ |a - b|^e` without taking the e-th root.
/// Requires equal lengths; unequal lengths yield `+∞`.
pub fn minkowski(a: &[f64], b: &[f64], exponent: f64) -> f64 {
    directa(a.len(), b.len(), |i, _| ade(exponent, a[i], b[i]), f64::NAN)
}

/// Lorentzian distance: `Σ ln(1 + |a - b|)`. Requires equal lengths; unequal
/// lengths yield `+∞`.
pub fn lorentzian(a: &[f64], b: &[f64]) -> f64 {
    directa(
        a.len(),
        b.len(),
        |i, _| (1.0 + (a[i] - b[i]).abs()).ln(),
        f64::NAN,
    )
}
