//! Edit distance with Real Penalty, windowed.
//!
//! ERP aligns against a fixed gap value: vertical steps pay the line point
//! against the gap, horizontal steps the column point against the gap. The
//! dynamic program runs over the bordered matrix (one extra line and column
//! of cumulative gap costs) so that paths entering through the borders are
//! priced exactly as in the textbook recurrence.

use crate::cost::{ade, adegv};
use crate::util::{min3, tighten};

/// ERP described by the diagonal cost and the two gap costs, with window `w`
/// and a cut-off for early abandoning and pruning. `nbcols` must not exceed
/// `nblines`; a window too small to align the length difference yields `+∞`.
#[allow(clippy::too_many_arguments)]
pub fn erp<CD, GL, GC>(
    nblines: usize,
    nbcols: usize,
    gap_lines: GL,
    gap_cols: GC,
    cost: CD,
    w: usize,
    ub: f64,
    buffer: &mut Vec<f64>,
) -> f64
where
    CD: Fn(usize, usize) -> f64,
    GL: Fn(usize) -> f64,
    GC: Fn(usize) -> f64,
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
        // Diagonal walk, then gap out the remaining line points.
        let mut b = 0.0;
        for i in 0..nbcols {
            b += cost(i, i);
        }
        for i in nbcols..nblines {
            b += gap_lines(i);
        }
        b
    } else if ub.is_nan() {
        f64::INFINITY
    } else {
        ub
    };

    erp_core(nblines, nbcols, gap_lines, gap_cols, cost, w, cutoff, buffer)
}

/// Univariate ERP over raw slices with cost `|a - b|^e` and gap value `gv`.
pub fn erp_univariate(
    a: &[f64],
    b: &[f64],
    exponent: f64,
    gv: f64,
    w: usize,
    ub: f64,
    buffer: &mut Vec<f64>,
) -> f64 {
    let (lines, cols) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    erp(
        lines.len(),
        cols.len(),
        |i| adegv(exponent, lines[i], gv),
        |j| adegv(exponent, cols[j], gv),
        |i, j| ade(exponent, lines[i], cols[j]),
        w,
        ub,
        buffer,
    )
}

#[allow(clippy::too_many_arguments)]
fn erp_core<CD, GL, GC>(
    nblines: usize,
    nbcols: usize,
    gap_lines: GL,
    gap_cols: GC,
    cost: CD,
    w: usize,
    cutoff: f64,
    buffer: &mut Vec<f64>,
) -> f64
where
    CD: Fn(usize, usize) -> f64,
    GL: Fn(usize) -> f64,
    GC: Fn(usize) -> f64,
{
    // Bordered dimensions: row 0 and column 0 hold cumulative gap costs.
    let rows = nblines + 1;
    let width = nbcols + 1;

    // The last alignment can arrive by match or by gapping either side.
    let la = min3(
        cost(nblines - 1, nbcols - 1),
        gap_lines(nblines - 1),
        gap_cols(nbcols - 1),
    );
    let ub = tighten(cutoff, la);

    // One extra slot per line for the left sentinel.
    buffer.clear();
    buffer.resize((width + 1) * 2, f64::INFINITY);
    let (mut c, mut p) = (1usize, width + 2);

    let mut next_start = 0usize;
    let mut prev_pp;
    let mut acc;
    let mut j;

    // Border line: cumulative column gaps, reachable up to w+1 steps in.
    {
        let stop = (w + 2).min(width);
        acc = 0.0;
        buffer[c] = acc;
        if acc <= ub {
            prev_pp = 1;
        } else {
            return f64::INFINITY;
        }
        j = 1;
        while j < stop {
            acc += gap_cols(j - 1);
            buffer[c + j] = acc;
            if acc <= ub {
                prev_pp = j + 1;
            } else {
                break;
            }
            j += 1;
        }
        if j < width {
            buffer[c + j] = f64::INFINITY;
        }
    }

    for ib in 1..rows {
        std::mem::swap(&mut c, &mut p);
        // The border column stays reachable one step beyond the band.
        let j_min = if ib <= w + 1 { 0 } else { ib - w };
        let j_start = j_min.max(next_start);
        let j_stop = (ib + w + 1).min(width);
        if j_start >= j_stop {
            return f64::INFINITY;
        }
        buffer[c + j_start - 1] = f64::INFINITY;
        next_start = j_start;
        let mut curr_pp = j_start;
        j = j_start;
        // Stage 0: the border column accumulates line gaps, above only.
        if j == 0 {
            acc = buffer[p] + gap_lines(ib - 1);
            buffer[c] = acc;
            if acc <= ub {
                curr_pp = 1;
            } else {
                next_start = 1;
            }
            j = 1;
        }
        // Stage 1: advancing next_start: diagonal (match) and above (line gap).
        while j == next_start && j < prev_pp {
            acc = f64::min(
                buffer[p + j - 1] + cost(ib - 1, j - 1),
                buffer[p + j] + gap_lines(ib - 1),
            );
            buffer[c + j] = acc;
            if acc <= ub {
                curr_pp = j + 1;
            } else {
                next_start += 1;
            }
            j += 1;
        }
        // Stage 2: left (column gap), diagonal and above.
        while j < prev_pp {
            acc = min3(
                buffer[p + j - 1] + cost(ib - 1, j - 1),
                acc + gap_cols(j - 1),
                buffer[p + j] + gap_lines(ib - 1),
            );
            buffer[c + j] = acc;
            if acc <= ub {
                curr_pp = j + 1;
            }
            j += 1;
        }
        // Stage 3: at the previous pruning point.
        if j < j_stop {
            if j == next_start {
                acc = buffer[p + j - 1] + cost(ib - 1, j - 1);
                buffer[c + j] = acc;
                if acc <= ub {
                    curr_pp = j + 1;
                } else if ib == rows - 1 && j == width - 1 && acc <= cutoff {
                    return acc;
                } else {
                    return f64::INFINITY;
                }
            } else {
                acc = f64::min(
                    buffer[p + j - 1] + cost(ib - 1, j - 1),
                    acc + gap_cols(j - 1),
                );
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
            next_start = width - 1;
        }
        // Stage 4: left only.
        while j == curr_pp && j < j_stop {
            acc += gap_cols(j - 1);
            buffer[c + j] = acc;
            if acc <= ub {
                curr_pp += 1;
            }
            j += 1;
        }
        if j < width {
            buffer[c + j] = f64::INFINITY;
        }
        prev_pp = curr_pp;
    }

    if j == width && acc <= cutoff {
        acc
    } else {
        f64::INFINITY
    }
}
