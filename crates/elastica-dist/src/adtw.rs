//! Amerced Dynamic Time Warping: DTW where every non-diagonal step pays a
//! fixed additive penalty.

use crate::cost::ade;
use crate::util::{min3, tighten};

/// ADTW with penalty `penalty` on the above and left steps, with a cut-off for
/// early abandoning and pruning. `nbcols` must not exceed `nblines`.
pub fn adtw<C>(
    nblines: usize,
    nbcols: usize,
    cost: C,
    penalty: f64,
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

    let cutoff = if ub.is_infinite() {
        // Diagonal walk, then down the last column paying the penalty.
        let mut b = 0.0;
        for i in 0..nbcols {
            b += cost(i, i);
        }
        for i in nbcols..nblines {
            b += cost(i, nbcols - 1) + penalty;
        }
        b
    } else if ub.is_nan() {
        f64::INFINITY
    } else {
        ub
    };

    adtw_core(nblines, nbcols, cost, penalty, cutoff, buffer)
}

/// Univariate ADTW over raw slices with cost `|a - b|^e`.
pub fn adtw_univariate(
    a: &[f64],
    b: &[f64],
    exponent: f64,
    penalty: f64,
    ub: f64,
    buffer: &mut Vec<f64>,
) -> f64 {
    let (lines, cols) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    adtw(
        lines.len(),
        cols.len(),
        |i, j| ade(exponent, lines[i], cols[j]),
        penalty,
        ub,
        buffer,
    )
}

pub(crate) fn adtw_core<C>(
    nblines: usize,
    nbcols: usize,
    cost: C,
    penalty: f64,
    cutoff: f64,
    buffer: &mut Vec<f64>,
) -> f64
where
    C: Fn(usize, usize) -> f64,
{
    // The cheapest step into the last cell is the diagonal one.
    let ub = if nbcols >= 2 {
        tighten(cutoff, cost(nblines - 1, nbcols - 1))
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

    // First line: left accumulation, each step amerced.
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
            acc = acc + cost(0, j) + penalty;
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
            acc = buffer[p + j] + cost(i, j) + penalty;
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
            let d = cost(i, j);
            acc = f64::min(buffer[p + j - 1] + d, buffer[p + j] + d + penalty);
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
            let d = cost(i, j);
            acc = min3(
                acc + d + penalty,
                buffer[p + j - 1] + d,
                buffer[p + j] + d + penalty,
            );
            buffer[c + j] = acc;
            if acc <= ub {
                curr_pp = j + 1;
            }
            j += 1;
        }
        // Stage 3: at the previous pruning point.
        if j < nbcols {
            let d = cost(i, j);
            if j == next_start {
                acc = buffer[p + j - 1] + d;
                buffer[c + j] = acc;
                if acc <= ub {
                    curr_pp = j + 1;
                } else if i == nblines - 1 && j == nbcols - 1 && acc <= cutoff {
                    return acc;
                } else {
                    return f64::INFINITY;
                }
            } else {
                acc = f64::min(acc + d + penalty, buffer[p + j - 1] + d);
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
            acc = acc + cost(i, j) + penalty;
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

#[cfg(test)]
mod tests {
    use super::*;

    fn d(a: &[f64], b: &[f64], penalty: f64) -> f64 {
        let mut buf = Vec::new();
        adtw_univariate(a, b, 2.0, penalty, f64::INFINITY, &mut buf)
    }

    #[test]
    fn identity_is_exact_zero() {
        let a = [0.5, 1.5, 0.5, -1.0];
        assert_eq!(d(&a, &a, 3.0), 0.0);
    }

    #[test]
    fn zero_penalty_matches_dtw() {
        let a = [1.0, 2.0, 3.0];
        let b = [2.0, 3.0, 4.0];
        let mut buf = Vec::new();
        let dtw = crate::dtw::dtw_univariate(&a, &b, 2.0, f64::INFINITY, &mut buf);
        assert_eq!(d(&a, &b, 0.0), dtw);
    }

    #[test]
    fn huge_penalty_forces_diagonal() {
        // With an overwhelming penalty the only affordable path is diagonal.
        let a = [1.0, 2.0, 3.0];
        let b = [2.0, 3.0, 4.0];
        assert_eq!(d(&a, &b, 1e9), 3.0);
    }

    #[test]
    fn monotone_in_penalty() {
        let a = [1.0, 2.0, 3.0, 2.0, 1.0];
        let b = [2.0, 3.0, 4.0, 1.0];
        let mut prev = 0.0;
        for penalty in [0.0, 0.1, 0.5, 1.0, 5.0, 50.0] {
            let v = d(&a, &b, penalty);
            assert!(v >= prev, "penalty {penalty}: {v} < {prev}");
            prev = v;
        }
    }

    #[test]
    fn symmetric() {
        let a = [1.0, 3.0, 5.0, 2.0];
        let b = [2.0, 4.0, 1.0];
        assert_eq!(d(&a, &b, 0.7), d(&b, &a, 0.7));
    }

    #[test]
    fn abandons_under_tight_cutoff() {
        let a = [1.0, 2.0, 3.0];
        let b = [5.0, 6.0, 7.0];
        let mut buf = Vec::new();
        let full = adtw_univariate(&a, &b, 2.0, 1.0, f64::INFINITY, &mut buf);
        assert!(full.is_finite());
        let cut = adtw_univariate(&a, &b, 2.0, 1.0, full / 2.0, &mut buf);
        assert_eq!(cut, f64::INFINITY);
    }
}
