//! Dynamic Time Warping with early abandoning and pruning.
//!
//! Double-buffered O(n) band with per-row pruning pointers. The value
//! returned, when finite, is bit-for-bit the value a full-matrix dynamic
//! program would produce with the same cost function.

use crate::cost::ade;
use crate::util::{min3, tighten};

/// DTW between two sequences described by their lengths and a pointwise cost
/// closure, with a cut-off for early abandoning and pruning.
///
/// `nbcols` must not exceed `nblines`; callers swap their arguments so that
/// the shorter sequence indexes the columns. The cut-off `ub` follows the
/// shared convention: a finite value prunes and abandons, `+∞` prunes against
/// a diagonal-walk bound, `NaN` disables both.
///
/// Returns the exact DTW cost, or `+∞` when abandoned.
pub fn dtw<C>(nblines: usize, nbcols: usize, cost: C, ub: f64, buffer: &mut Vec<f64>) -> f64
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

    let cutoff = if ub.is_infinite() {
        // Feasible path bound: walk the diagonal, then down the last column.
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

    dtw_core(nblines, nbcols, cost, cutoff, buffer)
}

/// Univariate DTW over raw slices with cost `|a - b|^e`, swapping so the
/// shorter input runs along the columns.
pub fn dtw_univariate(a: &[f64], b: &[f64], exponent: f64, ub: f64, buffer: &mut Vec<f64>) -> f64 {
    let (lines, cols) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    dtw(
        lines.len(),
        cols.len(),
        |i, j| ade(exponent, lines[i], cols[j]),
        ub,
        buffer,
    )
}

/// EAP core. Preconditions: `0 < nbcols <= nblines`, `cutoff` not NaN.
pub(crate) fn dtw_core<C>(
    nblines: usize,
    nbcols: usize,
    cost: C,
    cutoff: f64,
    buffer: &mut Vec<f64>,
) -> f64
where
    C: Fn(usize, usize) -> f64,
{
    // Tightened bound: the last alignment exists once nbcols >= 2.
    let ub = if nbcols >= 2 {
        tighten(cutoff, cost(nblines - 1, nbcols - 1))
    } else {
        cutoff
    };

    buffer.clear();
    buffer.resize(nbcols * 2, 0.0);
    let (mut c, mut p) = (0usize, nbcols);

    // Pruning pointers: index 0 is both the next start and the previous
    // pruning point before the first line is computed.
    let mut next_start = 0usize;
    let mut prev_pp = 0usize;
    let mut acc;
    let mut j;

    // First line: cells only depend on their left neighbour.
    {
        acc = cost(0, 0);
        buffer[c] = acc;
        if acc <= ub {
            prev_pp = 1;
        } else {
            return f64::INFINITY;
        }
        j = 1;
        while j < nbcols {
            acc += cost(0, j);
            buffer[c + j] = acc;
            if acc <= ub {
                prev_pp = j + 1;
            } else {
                break;
            }
            j += 1;
        }
    }

    for i in 1..nblines {
        std::mem::swap(&mut c, &mut p);
        let mut curr_pp = next_start;
        j = next_start;
        // Stage 0: first column of the line, only the above predecessor.
        {
            acc = buffer[p + j] + cost(i, j);
            buffer[c + j] = acc;
            if acc <= ub {
                curr_pp = j + 1;
            } else {
                next_start += 1;
            }
            j += 1;
        }
        // Stage 1: advancing next_start up to the previous pruning point:
        // diagonal and above.
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
        // Stage 2: up to the previous pruning point: left, diagonal and above.
        while j < prev_pp {
            acc = min3(acc, buffer[p + j - 1], buffer[p + j]) + cost(i, j);
            buffer[c + j] = acc;
            if acc <= ub {
                curr_pp = j + 1;
            }
            j += 1;
        }
        // Stage 3: at the previous pruning point.
        if j < nbcols {
            if j == next_start {
                // Still advancing: diagonal only.
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
            // next_start ran past the end of the line: abandon unless the last
            // computed cell still beats the original cutoff.
            if acc > cutoff {
                return f64::INFINITY;
            }
            next_start = nbcols - 1;
        }
        // Stage 4: past the previous pruning point, only the left predecessor
        // extends the front.
        while j == curr_pp && j < nbcols {
            acc += cost(i, j);
            buffer[c + j] = acc;
            if acc <= ub {
                curr_pp += 1;
            }
            j += 1;
        }
        prev_pp = curr_pp;
    }

    if j == nbcols && acc <= cutoff {
        acc
    } else {
        f64::INFINITY
    }
}
