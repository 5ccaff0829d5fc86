//! DTW constrained to a Sakoe-Chiba band of half-width `w`.
//!
//! Same pruning skeleton as the unconstrained kernel, with per-line window
//! clamps. Each line keeps an infinity sentinel one slot left of its start and
//! one slot past its last computed cell, so diagonal reads across lines see
//! infinity exactly where the band or the pruning pointers say they should.

use crate::cost::ade;
use crate::util::{min3, tighten};

/// Constrained DTW with window `w` (`|i - j| <= w`) and a cut-off for early
/// abandoning and pruning. `nbcols` must not exceed `nblines`; a window too
/// small to align the length difference yields `+∞`.
pub fn cdtw<C>(
    nblines: usize,
    nbcols: usize,
    cost: C,
    w: usize,
    ub: f64,
    buffer: &mut Vec<f64>,
) -> f64
where
    C: Fn(usize, usize) -> f64,
{
    if nblines == 0 && nbcols == 0 {
        return 0.0;
    }
    if (nblines == 0) != (nbcols == 0) {
        return f64::INFINITY;
    }
    debug_assert!(nbcols <= nblines);

    let w = w.min(nblines);
    if nblines - nbcols > w {
        return f64::INFINITY;
    }

    let cutoff = if ub.is_infinite() {
        // The diagonal and the last column stay inside the band.
        let mut b = 0.0;
        for i in 0..nbcols {
            b += cost(i, i);
        }
        for i in nbcols..nblines {
            b += cost(i, nbcols - 1);
        }
        b
    } else if ub.is_nan() {
        f64::INFINITY
    } else {
        ub
    };

    cdtw_core(nblines, nbcols, cost, w, cutoff, buffer)
}

/// Univariate constrained DTW over raw slices with cost `|a - b|^e`.
pub fn cdtw_univariate(
    a: &[f64],
    b: &[f64],
    exponent: f64,
    w: usize,
    ub: f64,
    buffer: &mut Vec<f64>,
) -> f64 {
    let (lines, cols) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    cdtw(
        lines.len(),
        cols.len(),
        |i, j| ade(exponent, lines[i], cols[j]),
        w,
        ub,
        buffer,
    )
}

fn cdtw_core<C>(
    nblines: usize,
    nbcols: usize,
    cost: C,
    w: usize,
    cutoff: f64,
    buffer: &mut Vec<f64>,
) -> f64
where
    C: Fn(usize, usize) -> f64,
{
    let ub = if nbcols >= 2 {
        tighten(cutoff, cost(nblines - 1, nbcols - 1))
    } else {
        cutoff
    };

    // One extra slot per line for the left sentinel.
    let width = nbcols + 1;
    buffer.clear();
    buffer.resize(width * 2, f64::INFINITY);
    let (mut c, mut p) = (1usize, width + 1);

    let mut next_start = 0usize;
    let mut prev_pp;
    let mut acc;
    let mut j;

    // First line, clamped to the band.
    {
        let stop = (w + 1).min(nbcols);
        acc = cost(0, 0);
        buffer[c] = acc;
        if acc <= ub {
            prev_pp = 1;
        } else {
            return f64::INFINITY;
        }
        j = 1;
        while j < stop {
            acc += cost(0, j);
            buffer[c + j] = acc;
            if acc <= ub {
                prev_pp = j + 1;
            } else {
                break;
            }
            j += 1;
        }
        if j < nbcols {
            buffer[c + j] = f64::INFINITY;
        }
    }

    for i in 1..nblines {
        std::mem::swap(&mut c, &mut p);
        let j_start = i.saturating_sub(w).max(next_start);
        let j_stop = (i + w + 1).min(nbcols);
        if j_start >= j_stop {
            return f64::INFINITY;
        }
        // Left sentinel; lands on the extra slot when the line starts at 0.
        buffer[c + j_start - 1] = f64::INFINITY;
        next_start = j_start;
        let mut curr_pp = j_start;
        j = j_start;
        // Stage 1: advancing next_start: diagonal and above (the sentinel
        // stands in for a missing diagonal).
        while j == next_start && j < prev_pp {
            acc = f64::min(buffer[p + j - 1], buffer[p + j]) + cost(i, j);
            buffer[c + j] = acc;
            if acc <= ub {
                curr_pp = j + 1;
            } else {
                next_start += 1;
            }
            j += 1;
        }
        // Stage 2: left, diagonal and above.
        while j < prev_pp {
            acc = min3(acc, buffer[p + j - 1], buffer[p + j]) + cost(i, j);
            buffer[c + j] = acc;
            if acc <= ub {
                curr_pp = j + 1;
            }
            j += 1;
        }
        // Stage 3: at the previous pruning point.
        if j < j_stop {
            if j == next_start {
                acc = buffer[p + j - 1] + cost(i, j);
                buffer[c + j] = acc;
                if acc <= ub {
                    curr_pp = j + 1;
                } else if i == nblines - 1 && j == nbcols - 1 && acc <= cutoff {
                    return acc;
                } else {
                    return f64::INFINITY;
                }
            } else {
                acc = f64::min(acc, buffer[p + j - 1]) + cost(i, j);
                buffer[c + j] = acc;
                if acc <= ub {
                    curr_pp = j + 1;
                }
            }
            j += 1;
        } else if j == next_start {
            if acc > cutoff {
                return f64::INFINITY;
            }
            next_start = nbcols - 1;
        }
        // Stage 4: left only.
        while j == curr_pp && j < j_stop {
            acc += cost(i, j);
            buffer[c + j] = acc;
            if acc <= ub {
                curr_pp += 1;
            }
            j += 1;
        }
        // Mark the end of the computed range for the next line's reads.
        if j < nbcols {
            buffer[c + j] = f64::INFINITY;
        }
        prev_pp = curr_pp;
    }

    if j == nbcols && acc <= cutoff {
        acc
    } else {
        f64::INFINITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(a: &[f64], b: &[f64], w: usize) -> f64 {
        let mut buf = Vec::new();
        cdtw_univariate(a, b, 2.0, w, f64::INFINITY, &mut buf)
    }

    #[test]
    fn identity_is_exact_zero() {
        let a = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(d(&a, &a, 1), 0.0);
    }

    #[test]
    fn infeasible_window_returns_infinity() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [1.0, 2.0];
        assert_eq!(d(&a, &b, 1), f64::INFINITY);
    }

    #[test]
    fn wide_window_matches_full_dtw() {
        let a = [1.0, 2.0, 3.0, 2.0];
        let b = [2.0, 3.0, 4.0];
        let mut buf = Vec::new();
        let full = crate::dtw::dtw_univariate(&a, &b, 2.0, f64::INFINITY, &mut buf);
        assert_eq!(d(&a, &b, 10), full);
    }

    #[test]
    fn zero_window_forces_diagonal() {
        // a=[0,0,0], b=[1,1,1]: three diagonal cells of cost 1 each.
        let a = [0.0, 0.0, 0.0];
        let b = [1.0, 1.0, 1.0];
        assert_eq!(d(&a, &b, 0), 3.0);
    }

    #[test]
    fn banded_at_least_unconstrained() {
        let a = [0.0, 1.0, 0.0, 1.0, 0.0];
        let b = [1.0, 0.0, 1.0, 0.0, 1.0];
        let mut buf = Vec::new();
        let full = crate::dtw::dtw_univariate(&a, &b, 2.0, f64::INFINITY, &mut buf);
        assert!(d(&a, &b, 1) >= full);
    }

    #[test]
    fn symmetric() {
        let a = [1.0, 3.0, 5.0, 2.0];
        let b = [2.0, 4.0, 1.0];
        assert_eq!(d(&a, &b, 2), d(&b, &a, 2));
    }

    #[test]
    fn abandons_under_tight_cutoff() {
        let a = [0.0, 0.0, 0.0];
        let b = [5.0, 5.0, 5.0];
        let mut buf = Vec::new();
        assert_eq!(
            cdtw_univariate(&a, &b, 2.0, 1, 10.0, &mut buf),
            f64::INFINITY
        );
    }
}
