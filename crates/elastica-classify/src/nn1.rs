//! Nearest-neighbour primitives over elastic distances.
//!
//! The scans thread the running best-so-far through the distance as its
//! cut-off, so most candidate evaluations abandon early. Equal distances
//! collect their labels in encounter order and the caller's PRNG breaks the
//! tie; a scan where every distance is `+∞` falls back to the largest label
//! seen, deterministically.

use elastica_dist::{DistanceInstance, TimeSeriesView};
use rand::Rng;

/// 1-NN label of `query` among the `(label, series)` candidates.
///
/// Returns `None` when there are no candidates.
pub fn nn1_label<'a, R: Rng>(
    candidates: impl IntoIterator<Item = (usize, TimeSeriesView<'a>)>,
    query: TimeSeriesView<'_>,
    distance: &DistanceInstance,
    rng: &mut R,
) -> Option<usize> {
    let mut bsf = f64::INFINITY;
    let mut ties: Vec<usize> = Vec::new();
    let mut largest_label: Option<usize> = None;

    for (label, series) in candidates {
        largest_label = Some(largest_label.map_or(label, |l| l.max(label)));
        let d = distance.eval(series, query, bsf);
        if d < bsf {
            ties.clear();
            ties.push(label);
            bsf = d;
        } else if d.is_finite() && d == bsf && !ties.contains(&label) {
            ties.push(label);
        }
    }

    match ties.len() {
        0 => largest_label,
        1 => Some(ties[0]),
        n => Some(ties[rng.gen_range(0..n)]),
    }
}

/// k-NN majority label of `query` among the `(label, series)` candidates.
///
/// Maintains the k best distances; the k-th best serves as the cut-off for
/// the remaining candidates. Majority ties are broken with the caller's PRNG.
/// Returns `None` when there are no candidates.
pub fn knn_label<'a, R: Rng>(
    candidates: impl IntoIterator<Item = (usize, TimeSeriesView<'a>)>,
    query: TimeSeriesView<'_>,
    distance: &DistanceInstance,
    k: usize,
    rng: &mut R,
) -> Option<usize> {
    debug_assert!(k >= 1);
    // (distance, label), ascending by distance, ties kept in arrival order.
    let mut best: Vec<(f64, usize)> = Vec::with_capacity(k + 1);
    let mut largest_label: Option<usize> = None;

    for (label, series) in candidates {
        largest_label = Some(largest_label.map_or(label, |l| l.max(label)));
        let cutoff = if best.len() < k {
            f64::INFINITY
        } else {
            best[k - 1].0
        };
        let d = distance.eval(series, query, cutoff);
        if !d.is_finite() {
            continue;
        }
        let pos = best.partition_point(|&(bd, _)| bd <= d);
        best.insert(pos, (d, label));
        if best.len() > k {
            best.pop();
        }
    }

    if best.is_empty() {
        return largest_label;
    }

    // Majority vote over the kept neighbours.
    let mut counts: Vec<(usize, usize)> = Vec::new();
    for &(_, label) in &best {
        match counts.iter_mut().find(|(l, _)| *l == label) {
            Some((_, c)) => *c += 1,
            None => counts.push((label, 1)),
        }
    }
    let max = counts.iter().map(|&(_, c)| c).max().unwrap_or(0);
    let winners: Vec<usize> = counts
        .iter()
        .filter(|&&(_, c)| c == max)
        .map(|&(l, _)| l)
        .collect();
    match winners.len() {
        1 => Some(winners[0]),
        n => Some(winners[rng.gen_range(0..n)]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elastica_dist::{Band, Elastic, TimeSeries};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn dtw() -> DistanceInstance {
        DistanceInstance::new(
            Elastic::Dtw {
                exponent: 2.0,
                window: Band::Full,
            },
            8,
        )
        .unwrap()
    }

    fn series(values: &[f64]) -> TimeSeries {
        TimeSeries::new(values.to_vec()).unwrap()
    }

    #[test]
    fn picks_the_nearest() {
        let a = series(&[0.0, 0.0]);
        let b = series(&[10.0, 10.0]);
        let q = series(&[0.5, 0.5]);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let label = nn1_label(
            vec![(0, a.as_view()), (1, b.as_view())],
            q.as_view(),
            &dtw(),
            &mut rng,
        );
        assert_eq!(label, Some(0));
    }

    #[test]
    fn empty_candidates_give_none() {
        let q = series(&[1.0]);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(nn1_label(vec![], q.as_view(), &dtw(), &mut rng), None);
    }

    #[test]
    fn exact_tie_resolves_to_a_tied_label() {
        let a = series(&[1.0, 1.0]);
        let b = series(&[3.0, 3.0]);
        let q = series(&[2.0, 2.0]);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let label = nn1_label(
            vec![(7, a.as_view()), (9, b.as_view())],
            q.as_view(),
            &dtw(),
            &mut rng,
        )
        .unwrap();
        assert!(label == 7 || label == 9);
    }

    #[test]
    fn infinite_scan_falls_back_to_largest_label() {
        // Unequal lengths make direct alignment infeasible for every candidate.
        let inst = DistanceInstance::new(Elastic::Direct { exponent: 2.0 }, 8).unwrap();
        let a = series(&[1.0, 2.0]);
        let b = series(&[1.0, 2.0, 3.0]);
        let q = series(&[1.0]);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let label = nn1_label(
            vec![(2, a.as_view()), (5, b.as_view()), (3, q.as_view())],
            series(&[9.0, 9.0, 9.0, 9.0]).as_view(),
            &inst,
            &mut rng,
        );
        assert_eq!(label, Some(5));
    }

    #[test]
    fn knn_majority_wins() {
        let far = series(&[10.0, 10.0]);
        let near1 = series(&[0.0, 0.0]);
        let near2 = series(&[0.1, 0.1]);
        let q = series(&[0.0, 0.1]);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let label = knn_label(
            vec![(1, far.as_view()), (0, near1.as_view()), (0, near2.as_view())],
            q.as_view(),
            &dtw(),
            3,
            &mut rng,
        );
        assert_eq!(label, Some(0));
    }

    #[test]
    fn knn_k1_matches_nn1() {
        let a = series(&[0.0, 0.0]);
        let b = series(&[4.0, 4.0]);
        let q = series(&[3.5, 3.5]);
        let mut r1 = ChaCha8Rng::seed_from_u64(2);
        let mut r2 = ChaCha8Rng::seed_from_u64(2);
        let cands = vec![(0, a.as_view()), (1, b.as_view())];
        assert_eq!(
            nn1_label(cands.clone(), q.as_view(), &dtw(), &mut r1),
            knn_label(cands, q.as_view(), &dtw(), 1, &mut r2)
        );
    }
}
