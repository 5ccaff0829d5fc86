//! Weighted Dynamic Time Warping: each alignment is weighted by a sigmoid of
//! its distance to the diagonal.

use crate::cost::ade;
use crate::util::{min3, tighten};

/// Weight ceiling of the sigmoid used by [`generate_weights`].
pub const WDTW_MAX_WEIGHT: f64 = 1.0;

/// Precompute the WDTW weight vector for alignments up to `length` steps away
/// from the diagonal: `w[k] = wmax / (1 + exp(-g * (k - length/2)))`.
#[must_use]
pub fn generate_weights(g: f64, length: usize) -> Vec<f64> {
    let half = length as f64 / 2.0;
    (0..length)
        .map(|k| WDTW_MAX_WEIGHT / (1.0 + (-g * (k as f64 - half)).exp()))
        .collect()
}

/// WDTW with a precomputed weight vector indexed by `|i - j|`, with a cut-off
/// for early abandoning and pruning. `nbcols` must not exceed `nblines` and
/// `weights` must cover `nblines` entries.
pub fn wdtw<C>(
    nblines: usize,
    nbcols: usize,
    cost: C,
    weights: &[f64],
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
    debug_assert!(weights.len() >= nblines);

    let wcost = |i: usize, j: usize| weights[i.abs_diff(j)] * cost(i, j);

    let cutoff = if ub.is_infinite() {
        let mut b = 0.0;
        for i in 0..nbcols {
            b += wcost(i, i);
        }
        for i in nbcols..nblines {
            b += wcost(i, nbcols - 1);
        }
        b
    } else if ub.is_nan() {
        f64::INFINITY
    } else {
        ub
    };

    wdtw_core(nblines, nbcols, wcost, cutoff, buffer)
}

/// Univariate WDTW over raw slices with base cost `|a - b|^e`.
pub fn wdtw_univariate(
    a: &[f64],
    b: &[f64],
    exponent: f64,
    weights: &[f64],
    ub: f64,
    buffer: &mut Vec<f64>,
) -> f64 {
    let (lines, cols) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    wdtw(
        lines.len(),
        cols.len(),
        |i, j| ade(exponent, lines[i], cols[j]),
        weights,
        ub,
        buffer,
    )
}

fn wdtw_core<C>(
    nblines: usize,
    nbcols: usize,
    wcost: C,
    cutoff: f64,
    buffer: &mut Vec<f64>,
) -> f64
where
    C: Fn(usize, usize) -> f64,
{
    let ub = if nbcols >= 2 {
        tighten(cutoff, wcost(nblines - 1, nbcols - 1))
    } else {
        cutoff
    };

    buffer.clear();
    buffer.resize(nbcols * 2, 0.0);
    let (mut c, mut p) = (0usize, nbcols);

    let mut next_start = 0usize;
    let mut prev_pp = 0usize;
    let mut acc;
    let mut j;

    // First line: left accumulation of weighted costs.
    {
        acc = wcost(0, 0);
        buffer[c] = acc;
        if acc <= ub {
            prev_pp = 1;
        } else {
            return f64::INFINITY;
        }
        j = 1;
        while j < nbcols {
            acc += wcost(0, j);
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
        // Stage 0: above only.
        {
            acc = buffer[p + j] + wcost(i, j);
            buffer[c + j] = acc;
            if acc <= ub {
                curr_pp = j + 1;
            } else {
                next_start += 1;
            }
            j += 1;
        }
        // Stage 1: diagonal and above.
        while j == next_start && j < prev_pp {
            acc = f64::min(buffer[p + j - 1], buffer[p + j]) + wcost(i, j);
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
            acc = min3(acc, buffer[p + j - 1], buffer[p + j]) + wcost(i, j);
            buffer[c + j] = acc;
            if acc <= ub {
                curr_pp = j + 1;
            }
            j += 1;
        }
        // Stage 3: at the previous pruning point.
        if j < nbcols {
            if j == next_start {
                acc = buffer[p + j - 1] + wcost(i, j);
                buffer[c + j] = acc;
                if acc <= ub {
                    curr_pp = j + 1;
                } else if i == nblines - 1 && j == nbcols - 1 && acc <= cutoff {
                    return acc;
                } else {
                    return f64::INFINITY;
                }
            } else {
                acc = f64::min(acc, buffer[p + j - 1]) + wcost(i, j);
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
        while j == curr_pp && j < nbcols {
            acc += wcost(i, j);
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
