//! Series-level transforms: normalisations applied before classification and
//! the slope-based derivative used by derivative-space distances.

use elastica_dist::TimeSeries;

fn rebuild(values: Vec<f64>, dim: usize) -> TimeSeries {
    TimeSeries::multivariate(values, dim).expect("transform of a valid series stays valid")
}

/// Derivative transform: centred slope average
/// `d[i] = ((s[i] - s[i-1]) + (s[i+1] - s[i-1]) / 2) / 2` per channel, with
/// the endpoint slopes copied from their neighbours. Series shorter than
/// three points carry no slope information and map to zeros.
#[must_use]
pub fn derive(ts: &TimeSeries) -> TimeSeries {
    let s = ts.as_slice();
    let dim = ts.dim();
    let n = ts.len();
    if n < 3 {
        return rebuild(vec![0.0; s.len()], dim);
    }
    let mut d = vec![0.0; s.len()];
    for ch in 0..dim {
        let at = |t: usize| s[t * dim + ch];
        for t in 1..n - 1 {
            d[t * dim + ch] = ((at(t) - at(t - 1)) + (at(t + 1) - at(t - 1)) / 2.0) / 2.0;
        }
        d[ch] = d[dim + ch];
        d[(n - 1) * dim + ch] = d[(n - 2) * dim + ch];
    }
    rebuild(d, dim)
}

/// Mean normalisation: `(x - mean) / (max - min)`; a constant series maps to
/// zeros.
#[must_use]
pub fn meannorm(ts: &TimeSeries) -> TimeSeries {
    let s = ts.as_slice();
    if s.is_empty() {
        return ts.clone();
    }
    let mean = s.iter().sum::<f64>() / s.len() as f64;
    let (min, max) = min_max(s);
    let range = max - min;
    let values = if range == 0.0 {
        vec![0.0; s.len()]
    } else {
        s.iter().map(|v| (v - mean) / range).collect()
    };
    rebuild(values, ts.dim())
}

/// Min-max normalisation into `[range_min, range_max]`; a constant series
/// maps to `range_min`.
#[must_use]
pub fn minmax(ts: &TimeSeries, range_min: f64, range_max: f64) -> TimeSeries {
    let s = ts.as_slice();
    if s.is_empty() {
        return ts.clone();
    }
    let (min, max) = min_max(s);
    let range = max - min;
    let values = if range == 0.0 {
        vec![range_min; s.len()]
    } else {
        s.iter()
            .map(|v| range_min + (v - min) * (range_max - range_min) / range)
            .collect()
    };
    rebuild(values, ts.dim())
}

/// Unit-length normalisation: `x / ‖x‖₂`; an all-zero series stays zero.
#[must_use]
pub fn unitlength(ts: &TimeSeries) -> TimeSeries {
    let s = ts.as_slice();
    let norm = s.iter().map(|v| v * v).sum::<f64>().sqrt();
    let values = if norm == 0.0 {
        s.to_vec()
    } else {
        s.iter().map(|v| v / norm).collect()
    };
    rebuild(values, ts.dim())
}

/// Z-score normalisation: `(x - mean) / stddev` with the population standard
/// deviation; a constant series maps to zeros.
#[must_use]
pub fn zscore(ts: &TimeSeries) -> TimeSeries {
    let s = ts.as_slice();
    if s.is_empty() {
        return ts.clone();
    }
    let n = s.len() as f64;
    let mean = s.iter().sum::<f64>() / n;
    let var = s.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    let std = var.sqrt();
    let values = if std == 0.0 {
        vec![0.0; s.len()]
    } else {
        s.iter().map(|v| (v - mean) / std).collect()
    };
    rebuild(values, ts.dim())
}

fn min_max(s: &[f64]) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in s {
        if v < min {
            min = v;
        }
        if v > max {
            max = v;
        }
    }
    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(values: &[f64]) -> TimeSeries {
        TimeSeries::new(values.to_vec()).unwrap()
    }

    #[test]
    fn derive_constant_slope() {
        // A perfect ramp has unit slope everywhere.
        let d = derive(&ts(&[0.0, 1.0, 2.0, 3.0, 4.0]));
        for &v in d.as_slice() {
            assert!((v - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn derive_preserves_length() {
        assert_eq!(derive(&ts(&[1.0, 5.0, 2.0, 8.0])).len(), 4);
        assert_eq!(derive(&ts(&[1.0, 2.0])).len(), 2);
    }

    #[test]
    fn zscore_zero_mean_unit_std() {
        let z = zscore(&ts(&[1.0, 2.0, 3.0, 4.0]));
        let s = z.as_slice();
        let mean = s.iter().sum::<f64>() / s.len() as f64;
        let var = s.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / s.len() as f64;
        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zscore_constant_series_is_zero() {
        let z = zscore(&ts(&[5.0, 5.0, 5.0]));
        assert_eq!(z.as_slice(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn minmax_hits_range_ends() {
        let m = minmax(&ts(&[2.0, 4.0, 6.0]), 0.0, 1.0);
        assert_eq!(m.as_slice()[0], 0.0);
        assert_eq!(m.as_slice()[2], 1.0);
    }

    #[test]
    fn unitlength_has_unit_norm() {
        let u = unitlength(&ts(&[3.0, 4.0]));
        let norm = u.as_slice().iter().map(|v| v * v).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-12);
    }

    #[test]
    fn meannorm_centres() {
        let m = meannorm(&ts(&[0.0, 10.0]));
        assert_eq!(m.as_slice(), &[-0.5, 0.5]);
    }
}
