//! Cross-checks every EAP kernel against a naive full-matrix dynamic program
//! on generated inputs. The kernels promise bit-exact agreement whenever they
//! return a finite value, and `+∞` only when the value exceeds the cut-off.

use rand::distributions::{Distribution, Uniform};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use elastica_dist::{
    adtw_univariate, cdtw_univariate, dtw_univariate, erp_univariate, generate_weights,
    lcss_univariate, msm_cost, msm_univariate, twe_univariate, wdtw_univariate,
};

const INF: f64 = f64::INFINITY;
const FIXED_LEN: usize = 25;

fn make_set(seed: u64, nbitems: usize, min_len: usize, max_len: usize) -> Vec<Vec<f64>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let value = Uniform::new(0.0f64, 1.0);
    let length = Uniform::new_inclusive(min_len, max_len);
    (0..nbitems)
        .map(|_| {
            let len = length.sample(&mut rng);
            (0..len).map(|_| value.sample(&mut rng)).collect()
        })
        .collect()
}

fn sq(a: f64, b: f64) -> f64 {
    let d = a - b;
    d * d
}

fn min3(a: f64, b: f64, c: f64) -> f64 {
    f64::min(a, f64::min(b, c))
}

// --- Naive references ------------------------------------------------------
//
// Each reference swaps its inputs exactly like the kernel (longer series on
// the lines) and prices each cell option the same way, so finite results must
// agree to the last bit.

fn naive_dtw(a: &[f64], b: &[f64]) -> f64 {
    let (lines, cols) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let (nl, nc) = (lines.len(), cols.len());
    if nl == 0 && nc == 0 {
        return 0.0;
    }
    if nc == 0 {
        return INF;
    }
    let mut m = vec![vec![INF; nc]; nl];
    for i in 0..nl {
        for j in 0..nc {
            let d = sq(lines[i], cols[j]);
            m[i][j] = if i == 0 && j == 0 {
                d
            } else {
                let left = if j > 0 { m[i][j - 1] } else { INF };
                let diag = if i > 0 && j > 0 { m[i - 1][j - 1] } else { INF };
                let above = if i > 0 { m[i - 1][j] } else { INF };
                min3(left, diag, above) + d
            };
        }
    }
    m[nl - 1][nc - 1]
}

fn naive_cdtw(a: &[f64], b: &[f64], w: usize) -> f64 {
    let (lines, cols) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let (nl, nc) = (lines.len(), cols.len());
    if nl == 0 && nc == 0 {
        return 0.0;
    }
    if nc == 0 {
        return INF;
    }
    let w = w.min(nl);
    if nl - nc > w {
        return INF;
    }
    let mut m = vec![vec![INF; nc]; nl];
    for i in 0..nl {
        let lo = i.saturating_sub(w);
        let hi = (i + w + 1).min(nc);
        for j in lo..hi {
            let d = sq(lines[i], cols[j]);
            m[i][j] = if i == 0 && j == 0 {
                d
            } else {
                let left = if j > 0 { m[i][j - 1] } else { INF };
                let diag = if i > 0 && j > 0 { m[i - 1][j - 1] } else { INF };
                let above = if i > 0 { m[i - 1][j] } else { INF };
                min3(left, diag, above) + d
            };
        }
    }
    m[nl - 1][nc - 1]
}

fn naive_adtw(a: &[f64], b: &[f64], penalty: f64) -> f64 {
    let (lines, cols) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let (nl, nc) = (lines.len(), cols.len());
    let mut m = vec![vec![INF; nc]; nl];
    for i in 0..nl {
        for j in 0..nc {
            let d = sq(lines[i], cols[j]);
            m[i][j] = if i == 0 && j == 0 {
                d
            } else {
                let left = if j > 0 { m[i][j - 1] + d + penalty } else { INF };
                let diag = if i > 0 && j > 0 {
                    m[i - 1][j - 1] + d
                } else {
                    INF
                };
                let above = if i > 0 { m[i - 1][j] + d + penalty } else { INF };
                min3(left, diag, above)
            };
        }
    }
    m[nl - 1][nc - 1]
}

fn naive_wdtw(a: &[f64], b: &[f64], weights: &[f64]) -> f64 {
    let (lines, cols) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let (nl, nc) = (lines.len(), cols.len());
    let mut m = vec![vec![INF; nc]; nl];
    for i in 0..nl {
        for j in 0..nc {
            let d = weights[i.abs_diff(j)] * sq(lines[i], cols[j]);
            m[i][j] = if i == 0 && j == 0 {
                d
            } else {
                let left = if j > 0 { m[i][j - 1] } else { INF };
                let diag = if i > 0 && j > 0 { m[i - 1][j - 1] } else { INF };
                let above = if i > 0 { m[i - 1][j] } else { INF };
                min3(left, diag, above) + d
            };
        }
    }
    m[nl - 1][nc - 1]
}

fn naive_erp(a: &[f64], b: &[f64], gv: f64, w: usize) -> f64 {
    let (lines, cols) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let (nl, nc) = (lines.len(), cols.len());
    if nl == 0 && nc == 0 {
        return 0.0;
    }
    if nc == 0 {
        return INF;
    }
    let w = w.min(nl);
    if nl - nc > w {
        return INF;
    }
    // Bordered matrix with cumulative gap costs.
    let mut m = vec![vec![INF; nc + 1]; nl + 1];
    m[0][0] = 0.0;
    for j in 1..=nc {
        m[0][j] = m[0][j - 1] + sq(gv, cols[j - 1]);
    }
    for i in 1..=nl {
        m[i][0] = m[i - 1][0] + sq(lines[i - 1], gv);
    }
    for i in 1..=nl {
        let lo = (i.saturating_sub(w)).max(1);
        let hi = (i + w + 1).min(nc + 1);
        for j in lo..hi {
            let left = m[i][j - 1] + sq(gv, cols[j - 1]);
            let diag = m[i - 1][j - 1] + sq(lines[i - 1], cols[j - 1]);
            let above = m[i - 1][j] + sq(lines[i - 1], gv);
            m[i][j] = min3(left, diag, above);
        }
    }
    m[nl][nc]
}

fn naive_lcss(a: &[f64], b: &[f64], epsilon: f64, w: usize) -> f64 {
    let (lines, cols) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let (nl, nc) = (lines.len(), cols.len());
    if nl == 0 && nc == 0 {
        return 0.0;
    }
    if nc == 0 {
        return INF;
    }
    let w = w.min(nl);
    if nl - nc > w {
        return INF;
    }
    let mut m = vec![vec![0usize; nc + 1]; nl + 1];
    for i in 1..=nl {
        let lo = (i.saturating_sub(w)).max(1);
        let hi = (i + w).min(nc);
        for j in lo..=hi {
            m[i][j] = if (lines[i - 1] - cols[j - 1]).abs() <= epsilon {
                m[i - 1][j - 1] + 1
            } else {
                m[i - 1][j].max(m[i][j - 1])
            };
        }
    }
    1.0 - m[nl][nc] as f64 / nc as f64
}

fn naive_msm(a: &[f64], b: &[f64], c: f64) -> f64 {
    let (lines, cols) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let (nl, nc) = (lines.len(), cols.len());
    let mut m = vec![vec![INF; nc]; nl];
    for i in 0..nl {
        for j in 0..nc {
            m[i][j] = if i == 0 && j == 0 {
                (lines[0] - cols[0]).abs()
            } else {
                let left = if j > 0 {
                    m[i][j - 1] + msm_cost(cols[j], cols[j - 1], lines[i], c)
                } else {
                    INF
                };
                let diag = if i > 0 && j > 0 {
                    m[i - 1][j - 1] + (lines[i] - cols[j]).abs()
                } else {
                    INF
                };
                let above = if i > 0 {
                    m[i - 1][j] + msm_cost(lines[i], lines[i - 1], cols[j], c)
                } else {
                    INF
                };
                min3(diag, left, above)
            };
        }
    }
    m[nl - 1][nc - 1]
}

fn naive_twe(a: &[f64], b: &[f64], nu: f64, lambda: f64) -> f64 {
    let (lines, cols) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let (nl, nc) = (lines.len(), cols.len());
    if nl == 0 && nc == 0 {
        return 0.0;
    }
    if nc == 0 {
        return INF;
    }
    let at = |s: &[f64], k: usize| if k == 0 { 0.0 } else { s[k - 1] };
    let diag = |i: usize, j: usize| {
        sq(lines[i], cols[j]) + sq(at(lines, i), at(cols, j)) + 2.0 * nu * i.abs_diff(j) as f64
    };
    let del_l = |i: usize| sq(lines[i], at(lines, i)) + nu + lambda;
    let del_c = |j: usize| sq(cols[j], at(cols, j)) + nu + lambda;
    let mut m = vec![vec![INF; nc]; nl];
    for i in 0..nl {
        for j in 0..nc {
            m[i][j] = if i == 0 && j == 0 {
                diag(0, 0)
            } else {
                let left = if j > 0 { m[i][j - 1] + del_c(j) } else { INF };
                let d = if i > 0 && j > 0 {
                    m[i - 1][j - 1] + diag(i, j)
                } else {
                    INF
                };
                let above = if i > 0 { m[i - 1][j] + del_l(i) } else { INF };
                min3(d, left, above)
            };
        }
    }
    m[nl - 1][nc - 1]
}

// --- Properties ------------------------------------------------------------

/// Kernel under `+∞` equals the naive DP exactly, and a finite cut-off either
/// reproduces the value or abandons.
fn check_eap<K, R>(mut kernel: K, reference: R, set: &[Vec<f64>])
where
    K: FnMut(&[f64], &[f64], f64) -> f64,
    R: Fn(&[f64], &[f64]) -> f64,
{
    for pair in set.windows(2) {
        let (s1, s2) = (&pair[0], &pair[1]);
        let expected = reference(s1, s2);
        assert_eq!(kernel(s1, s2, INF), expected, "full computation differs");
        assert_eq!(kernel(s1, s2, f64::NAN), expected, "NaN cut-off differs");
        if expected.is_finite() {
            assert_eq!(kernel(s1, s2, expected), expected, "exact cut-off differs");
            let tightened = kernel(s1, s2, expected * 0.75);
            assert!(
                tightened == expected || tightened == INF,
                "tight cut-off produced a third value: {tightened} vs {expected}"
            );
        }
        assert_eq!(kernel(s1, s1, INF), 0.0, "self distance must be exact zero");
    }
}

#[test]
fn dtw_matches_reference() {
    let set = make_set(0xD7, 40, FIXED_LEN, FIXED_LEN);
    let mut buf = Vec::new();
    check_eap(
        |a, b, ub| dtw_univariate(a, b, 2.0, ub, &mut buf),
        naive_dtw,
        &set,
    );
}

#[test]
fn dtw_matches_reference_variable_length() {
    let set = make_set(0xD8, 30, 20, 30);
    let mut buf = Vec::new();
    check_eap(
        |a, b, ub| dtw_univariate(a, b, 2.0, ub, &mut buf),
        naive_dtw,
        &set,
    );
}

#[test]
fn cdtw_matches_reference() {
    let set = make_set(0xCD, 30, 20, 30);
    let mut buf = Vec::new();
    for wr in [0.0, 0.1, 0.25, 0.5, 1.0] {
        let w = (wr * FIXED_LEN as f64) as usize;
        check_eap(
            |a, b, ub| cdtw_univariate(a, b, 2.0, w, ub, &mut buf),
            |a, b| naive_cdtw(a, b, w),
            &set,
        );
    }
}

#[test]
fn adtw_matches_reference() {
    let set = make_set(0xAD, 30, 20, 30);
    let mut buf = Vec::new();
    for penalty in [0.0, 0.01, 0.1, 1.0] {
        check_eap(
            |a, b, ub| adtw_univariate(a, b, 2.0, penalty, ub, &mut buf),
            |a, b| naive_adtw(a, b, penalty),
            &set,
        );
    }
}

#[test]
fn wdtw_matches_reference() {
    let set = make_set(0x3D, 30, 20, 30);
    let weights = generate_weights(0.35, 30);
    let mut buf = Vec::new();
    check_eap(
        |a, b, ub| wdtw_univariate(a, b, 2.0, &weights, ub, &mut buf),
        |a, b| naive_wdtw(a, b, &weights),
        &set,
    );
}

#[test]
fn erp_matches_reference() {
    let set = make_set(0xE9, 30, 20, 30);
    let mut buf = Vec::new();
    for wr in [0.1, 0.25, 0.5, 1.0] {
        let w = (wr * FIXED_LEN as f64) as usize;
        for gv in [0.0, 0.3, 1.0] {
            check_eap(
                |a, b, ub| erp_univariate(a, b, 2.0, gv, w, ub, &mut buf),
                |a, b| naive_erp(a, b, gv, w),
                &set,
            );
        }
    }
}

#[test]
fn lcss_matches_reference() {
    let set = make_set(0x1C, 30, 20, 30);
    for wr in [0.1, 0.25, 0.5, 1.0] {
        let w = (wr * FIXED_LEN as f64) as usize;
        for epsilon in [0.01, 0.05, 0.2] {
            check_eap(
                |a, b, ub| lcss_univariate(a, b, epsilon, w, ub),
                |a, b| naive_lcss(a, b, epsilon, w),
                &set,
            );
        }
    }
}

#[test]
fn msm_matches_reference() {
    let set = make_set(0x35, 30, 20, 30);
    let mut buf = Vec::new();
    for c in [0.01, 0.1, 1.0] {
        check_eap(
            |a, b, ub| msm_univariate(a, b, c, ub, &mut buf),
            |a, b| naive_msm(a, b, c),
            &set,
        );
    }
}

#[test]
fn twe_matches_reference() {
    let set = make_set(0x73, 30, 20, 30);
    let mut buf = Vec::new();
    for nu in [0.0001, 0.01, 0.5] {
        for lambda in [0.0, 0.05, 0.5] {
            check_eap(
                |a, b, ub| twe_univariate(a, b, 2.0, nu, lambda, ub, &mut buf),
                |a, b| naive_twe(a, b, nu, lambda),
                &set,
            );
        }
    }
}

/// 1-NN with a shared best-so-far cut-off selects the same neighbour as the
/// unpruned scan.
#[test]
fn nn1_agrees_with_and_without_pruning() {
    let set = make_set(0x4E, 40, FIXED_LEN, FIXED_LEN);
    let mut buf = Vec::new();
    for (qi, query) in set.iter().enumerate().step_by(7) {
        let mut idx_ref = usize::MAX;
        let mut bsf_ref = INF;
        let mut idx_eap = usize::MAX;
        let mut bsf_eap = INF;
        for (ci, candidate) in set.iter().enumerate() {
            if ci == qi {
                continue;
            }
            let v_ref = naive_dtw(query, candidate);
            if v_ref < bsf_ref {
                idx_ref = ci;
                bsf_ref = v_ref;
            }
            let v = dtw_univariate(query, candidate, 2.0, bsf_eap, &mut buf);
            if v < bsf_eap {
                idx_eap = ci;
                bsf_eap = v;
            }
        }
        assert_eq!(idx_ref, idx_eap);
        assert_eq!(bsf_ref, bsf_eap);
    }
}
