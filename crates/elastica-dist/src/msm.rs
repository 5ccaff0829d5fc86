//! Move-Split-Merge distance.
//!
//! The diagonal step moves a point; vertical and horizontal steps split or
//! merge, paying the fixed cost `c` plus a deviation term when the inserted
//! point falls outside the interval spanned by its neighbours.

use crate::cost::ad1;
use crate::util::{min3, tighten};

/// MSM split/merge cost of inserting `xnew` between `xprev` and `yj`.
#[inline]
#[must_use]
pub fn msm_cost(xnew: f64, xprev: f64, yj: f64, c: f64) -> f64 {
    if (xprev <= xnew && xnew <= yj) || (yj <= xnew && xnew <= xprev) {
        c
    } else {
        c + f64::min((xnew - xprev).abs(), (xnew - yj).abs())
    }
}

/// MSM described by three step-cost closures: the diagonal move, the
/// line-direction split/merge and the column-direction split/merge. `nbcols`
/// must not exceed `nblines`.
pub fn msm<CD, CL, CC>(
    nblines: usize,
    nbcols: usize,
    cost_diag: CD,
    cost_lines: CL,
    cost_cols: CC,
    ub: f64,
    buffer: &mut Vec<f64>,
) -> f64
where
    CD: Fn(usize, usize) -> f64,
    CL: Fn(usize, usize) -> f64,
    CC: Fn(usize, usize) -> f64,
{
    if nblines == 0 && nbcols == 0 {
        return 0.0;
    }
    if (nblines == 0) != (nbcols == 0) {
        return f64::INFINITY;
    }
    debug_assert!(nbcols <= nblines);

    let cutoff = if ub.is_infinite() {
        // Diagonal walk, then down the last column with split/merge steps.
        let mut b = 0.0;
        for i in 0..nbcols {
            b += cost_diag(i, i);
        }
        for i in nbcols..nblines {
            b += cost_lines(i, nbcols - 1);
        }
        b
    } else if ub.is_nan() {
        f64::INFINITY
    } else {
        ub
    };

    msm_core(nblines, nbcols, cost_diag, cost_lines, cost_cols, cutoff, buffer)
}

/// Univariate MSM over raw slices with move cost `|a - b|` and split/merge
/// cost parameter `c`.
pub fn msm_univariate(a: &[f64], b: &[f64], c: f64, ub: f64, buffer: &mut Vec<f64>) -> f64 {
    let (lines, cols) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    msm(
        lines.len(),
        cols.len(),
        |i, j| ad1(lines[i], cols[j]),
        |i, j| msm_cost(lines[i], lines[i - 1], cols[j], c),
        |i, j| msm_cost(cols[j], cols[j - 1], lines[i], c),
        ub,
        buffer,
    )
}

#[allow(clippy::too_many_arguments)]
fn msm_core<CD, CL, CC>(
    nblines: usize,
    nbcols: usize,
    cost_diag: CD,
    cost_lines: CL,
    cost_cols: CC,
    cutoff: f64,
    buffer: &mut Vec<f64>,
) -> f64
where
    CD: Fn(usize, usize) -> f64,
    CL: Fn(usize, usize) -> f64,
    CC: Fn(usize, usize) -> f64,
{
    // The last alignment can arrive by move, split or merge.
    let ub = if nbcols >= 2 {
        let i = nblines - 1;
        let j = nbcols - 1;
        let la = min3(cost_diag(i, j), cost_cols(i, j), cost_lines(i, j));
        tighten(cutoff, la)
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

    // First line: cells only depend on their left neighbour.
    {
        acc = cost_diag(0, 0);
        buffer[c] = acc;
        if acc <= ub {
            prev_pp = 1;
        } else {
            return f64::INFINITY;
        }
        j = 1;
        while j < nbcols {
            acc += cost_cols(0, j);
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
            acc = buffer[p + j] + cost_lines(i, j);
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
            acc = f64::min(
                buffer[p + j - 1] + cost_diag(i, j),
                buffer[p + j] + cost_lines(i, j),
            );
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
            acc = min3(
                buffer[p + j - 1] + cost_diag(i, j),
                acc + cost_cols(i, j),
                buffer[p + j] + cost_lines(i, j),
            );
            buffer[c + j] = acc;
            if acc <= ub {
                curr_pp = j + 1;
            }
            j += 1;
        }
        // Stage 3: at the previous pruning point.
        if j < nbcols {
            if j == next_start {
                acc = buffer[p + j - 1] + cost_diag(i, j);
                buffer[c + j] = acc;
                if acc <= ub {
                    curr_pp = j + 1;
                } else if i == nblines - 1 && j == nbcols - 1 && acc <= cutoff {
                    return acc;
                } else {
                    return f64::INFINITY;
                }
            } else {
                acc = f64::min(buffer[p + j - 1] + cost_diag(i, j), acc + cost_cols(i, j));
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
            acc += cost_cols(i, j);
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
