//! Proximity tree induction.
//!
//! Nodes live in an arena (`Vec<Node>`) with index references, the same
//! layout as a CART tree but with 1-NN splitters instead of thresholds: each
//! internal node holds one exemplar per class and routes a row to the branch
//! of its nearest exemplar.

use elastica_data::{ByClassMap, IndexSet};
use rand::Rng;
use tracing::trace;

use crate::error::ClassifyError;
use crate::runtime::CancelToken;
use crate::splitter::{Splitter, SplitterMeasure, TrainContext, TransformId};

#[derive(Debug, Clone)]
pub(crate) enum Node {
    Leaf {
        distribution: Vec<f64>,
    },
    Split {
        splitter: Splitter,
        children: Vec<usize>,
    },
}

/// A grown proximity tree.
#[derive(Debug, Clone)]
pub struct PfTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) nb_classes: usize,
}

pub(crate) struct GrowSettings<'a> {
    pub nb_candidates: usize,
    pub min_split_size: usize,
    pub measures: &'a [SplitterMeasure],
}

/// Gini impurity of a class map.
fn gini(bcm: &ByClassMap) -> f64 {
    let total = bcm.size() as f64;
    if total == 0.0 {
        return 0.0;
    }
    let mut acc = 0.0;
    for (_, rows) in bcm.iter() {
        let p = rows.len() as f64 / total;
        acc += p * p;
    }
    1.0 - acc
}

fn push_leaf(arena: &mut Vec<Node>, bcm: &ByClassMap, nb_classes: usize) -> usize {
    let distribution = if bcm.size() == 0 {
        // An empty branch keeps its exemplar's class as a certain outcome.
        let mut one_hot = vec![0.0; nb_classes];
        let label = bcm.classes().next().expect("empty branches keep their class key");
        one_hot[label] = 1.0;
        one_hot
    } else {
        bcm.distribution(nb_classes)
    };
    arena.push(Node::Leaf { distribution });
    arena.len() - 1
}

pub(crate) fn grow_tree<R: Rng>(
    ctx: &TrainContext,
    settings: &GrowSettings<'_>,
    rng: &mut R,
    cancel: &CancelToken,
) -> Result<PfTree, ClassifyError> {
    let nb_classes = ctx.raw().header().nb_classes();
    let root_bcm = ByClassMap::from_dataset(ctx.raw(), &IndexSet::all(ctx.raw().len()));
    let mut arena = Vec::new();
    grow(ctx, &root_bcm, settings, nb_classes, rng, &mut arena, cancel)?;
    Ok(PfTree { nodes: arena, nb_classes })
}

fn grow<R: Rng>(
    ctx: &TrainContext,
    bcm: &ByClassMap,
    settings: &GrowSettings<'_>,
    nb_classes: usize,
    rng: &mut R,
    arena: &mut Vec<Node>,
    cancel: &CancelToken,
) -> Result<usize, ClassifyError> {
    cancel.check()?;

    if bcm.is_pure() || bcm.size() < settings.min_split_size {
        return Ok(push_leaf(arena, bcm, nb_classes));
    }

    let parent_gini = gini(bcm);
    let parent_size = bcm.size() as f64;
    let rows = bcm.index_set();

    // Evaluate candidate splitters; keep the first one achieving the best
    // weighted Gini gain. Candidates that fail to separate anything are
    // discarded so recursion always shrinks.
    let mut best: Option<(f64, Splitter, Vec<ByClassMap>)> = None;
    for _ in 0..settings.nb_candidates {
        let candidate = Splitter::draw(ctx, bcm, settings.measures, rng);
        let mut branch_rows: Vec<Vec<usize>> = vec![Vec::new(); candidate.nb_branches()];
        for row in rows.iter() {
            let branch = candidate.route_train(ctx, row, rng);
            branch_rows[branch].push(row);
        }
        if branch_rows.iter().any(|r| r.len() == bcm.size()) {
            continue;
        }
        let children: Vec<ByClassMap> = branch_rows
            .iter()
            .enumerate()
            .map(|(branch, rows)| {
                if rows.is_empty() {
                    // Stable branch count: an empty child keeps its class key.
                    ByClassMap::from_entries([(candidate.exemplars[branch].0, Vec::new())])
                } else {
                    ByClassMap::from_dataset(
                        ctx.raw(),
                        &IndexSet::from_indices(rows.clone()),
                    )
                }
            })
            .collect();
        let weighted: f64 = children
            .iter()
            .map(|child| child.size() as f64 / parent_size * gini(child))
            .sum();
        let gain = parent_gini - weighted;
        if best.as_ref().is_none_or(|(g, _, _)| gain > *g) {
            best = Some((gain, candidate, children));
        }
    }

    let Some((gain, splitter, children_bcm)) = best else {
        return Ok(push_leaf(arena, bcm, nb_classes));
    };
    trace!(size = bcm.size(), gain, "split selected");

    // Arena pattern: reserve the index, recurse, then overwrite.
    let node_idx = arena.len();
    arena.push(Node::Leaf {
        distribution: vec![0.0; nb_classes],
    });
    let mut children = Vec::with_capacity(children_bcm.len());
    for child in &children_bcm {
        children.push(grow(ctx, child, settings, nb_classes, rng, arena, cancel)?);
    }
    arena[node_idx] = Node::Split { splitter, children };
    Ok(node_idx)
}

impl PfTree {
    /// Leaf distribution for a query given in both representations.
    pub(crate) fn predict_proba<R: Rng>(
        &self,
        ctx: &TrainContext,
        raw: elastica_dist::TimeSeriesView<'_>,
        derivative: elastica_dist::TimeSeriesView<'_>,
        rng: &mut R,
    ) -> &[f64] {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { distribution } => return distribution,
                Node::Split { splitter, children } => {
                    let query = match splitter.transform() {
                        TransformId::Raw => raw,
                        TransformId::Derivative => derivative,
                    };
                    let branch = splitter.route_view(ctx, query, rng);
                    idx = children[branch];
                }
            }
        }
    }

    /// Total number of nodes.
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of leaves.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }
}
