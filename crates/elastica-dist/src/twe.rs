//! Time Warp Edit distance.
//!
//! Stiffness `nu` penalises timestamp drift, `lambda` penalises deletions.
//! Series are implicitly padded with a zero sample before their first point,
//! so every step cost is defined at the borders.

use crate::cost::ade;
use crate::util::{min3, tighten};

/// TWE described by three step-cost closures: the match (carrying both
/// current points, both predecessors and the drift penalty), the
/// line-direction deletion and the column-direction deletion. `nbcols` must
/// not exceed `nblines`.
pub fn twe<CD, CL, CC>(
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
        // Diagonal walk, then delete the remaining line points.
        let mut bound = 0.0;
        for i in 0..nbcols {
            bound += cost_diag(i, i);
        }
        for i in nbcols..nblines {
            bound += cost_lines(i, nbcols - 1);
        }
        bound
    } else if ub.is_nan() {
        f64::INFINITY
    } else {
        ub
    };

    twe_core(nblines, nbcols, cost_diag, cost_lines, cost_cols, cutoff, buffer)
}

/// TWE between two raw univariate slices with cost exponent `e`, stiffness
/// `nu` and deletion penalty `lambda`, with a cut-off for early abandoning
/// and pruning.
pub fn twe_univariate(
    a: &[f64],
    b: &[f64],
    exponent: f64,
    nu: f64,
    lambda: f64,
    ub: f64,
    buffer: &mut Vec<f64>,
) -> f64 {
    let (lines, cols) = if a.len() >= b.len() { (a, b) } else { (b, a) };

    let nu_lambda = nu + lambda;
    let nu2 = 2.0 * nu;

    let at = |s: &[f64], k: usize| if k == 0 { 0.0 } else { s[k - 1] };
    // Match: both current points plus both predecessors, weighted by drift.
    let cost_diag = move |i: usize, j: usize| {
        ade(exponent, lines[i], cols[j])
            + ade(exponent, at(lines, i), at(cols, j))
            + nu2 * i.abs_diff(j) as f64
    };
    // Deletion in the line series.
    let cost_lines = move |i: usize, _j: usize| {
        ade(exponent, lines[i], at(lines, i)) + nu_lambda
    };
    // Deletion in the column series.
    let cost_cols = move |_i: usize, j: usize| {
        ade(exponent, cols[j], at(cols, j)) + nu_lambda
    };

    twe(
        lines.len(),
        cols.len(),
        cost_diag,
        cost_lines,
        cost_cols,
        ub,
        buffer,
    )
}

#[allow(clippy::too_many_arguments)]
fn twe_core<CD, CL, CC>(
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

    // First line: the first cell is a padded match, the rest delete columns.
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
