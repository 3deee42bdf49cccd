//! Pairing positions from a correlation matrix

use std::collections::BTreeSet;

use crate::error::{error_codes, AttackError, AttackResult};
use crate::permutation::Permutation;
use crate::signatures::CorrelationMatrix;

/// Cost that keeps the assignment off the diagonal
const SELF_LOOP_COST: f64 = 1.0e6;

/// A perfect matching of `0..size` into `size / 2` canonical pairs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matching {
    size: usize,
    pairs: BTreeSet<(usize, usize)>,
}

impl Matching {
    /// Validate that `pairs` are disjoint and cover `0..size`
    pub fn new(
        size: usize,
        pairs: impl IntoIterator<Item = (usize, usize)>,
    ) -> AttackResult<Self> {
        let mut covered = vec![false; size];
        let mut set = BTreeSet::new();
        for (a, b) in pairs {
            let (lo, hi) = (a.min(b), a.max(b));
            if lo == hi || hi >= size || covered[lo] || covered[hi] {
                return Err(AttackError::InvalidPermutation {
                    cause: format!("pair ({}, {}) overlaps or leaves 0..{}", a, b, size),
                    error_code: error_codes::INCOMPLETE_MATCHING,
                });
            }
            covered[lo] = true;
            covered[hi] = true;
            set.insert((lo, hi));
        }
        if let Some(missing) = covered.iter().position(|&c| !c) {
            return Err(AttackError::InvalidPermutation {
                cause: format!("position {} is not matched", missing),
                error_code: error_codes::INCOMPLETE_MATCHING,
            });
        }
        Ok(Self { size, pairs: set })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &BTreeSet<(usize, usize)> {
        &self.pairs
    }

    pub fn contains(&self, a: usize, b: usize) -> bool {
        self.pairs.contains(&(a.min(b), a.max(b)))
    }
}

/// Minimum-cost assignment (Kuhn-Munkres with potentials), row -> column
fn min_cost_assignment(cost: &[f64], n: usize) -> Vec<usize> {
    let mut u = vec![0.0f64; n + 1];
    let mut v = vec![0.0f64; n + 1];
    let mut owner = vec![0usize; n + 1];
    let mut way = vec![0usize; n + 1];

    for i in 1..=n {
        owner[0] = i;
        let mut j0 = 0;
        let mut min_slack = vec![f64::INFINITY; n + 1];
        let mut used = vec![false; n + 1];
        loop {
            used[j0] = true;
            let i0 = owner[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0;
            for j in 1..=n {
                if used[j] {
                    continue;
                }
                let slack = cost[(i0 - 1) * n + (j - 1)] - u[i0] - v[j];
                if slack < min_slack[j] {
                    min_slack[j] = slack;
                    way[j] = j0;
                }
                if min_slack[j] < delta {
                    delta = min_slack[j];
                    j1 = j;
                }
            }
            for j in 0..=n {
                if used[j] {
                    u[owner[j]] += delta;
                    v[j] -= delta;
                } else {
                    min_slack[j] -= delta;
                }
            }
            j0 = j1;
            if owner[j0] == 0 {
                break;
            }
        }
        while j0 != 0 {
            let j1 = way[j0];
            owner[j0] = owner[j1];
            j0 = j1;
        }
    }

    let mut assignment = vec![0; n];
    for j in 1..=n {
        if owner[j] != 0 {
            assignment[owner[j] - 1] = j - 1;
        }
    }
    assignment
}

/// Maximum-weight perfect matching of the positions of `correlation`
///
/// The assignment problem is solved on the full bipartite graph with the
/// diagonal forbidden. Its 2-cycles are pairs already; an even longer cycle
/// is split into the heavier of its two alternating matchings, and vertices
/// on odd cycles are paired greedily by descending correlation.
pub fn match_from_correlation(correlation: &CorrelationMatrix) -> AttackResult<Matching> {
    let n = correlation.size();
    if n < 2 || n % 2 != 0 {
        return Err(AttackError::invalid_parameter(
            "correlation size",
            "an even number of at least 2",
            &n.to_string(),
        ));
    }

    let mut cost = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..n {
            cost[i * n + j] = if i == j {
                SELF_LOOP_COST
            } else {
                -correlation.get(i, j)
            };
        }
    }
    let assignment = min_cost_assignment(&cost, n);

    let mut pairs = Vec::with_capacity(n / 2);
    let mut leftovers = Vec::new();
    let mut visited = vec![false; n];
    for start in 0..n {
        if visited[start] {
            continue;
        }
        let mut cycle = Vec::new();
        let mut i = start;
        while !visited[i] {
            visited[i] = true;
            cycle.push(i);
            i = assignment[i];
        }
        match cycle.len() {
            2 => pairs.push((cycle[0], cycle[1])),
            len if len % 2 == 0 => {
                let weight = |offset: usize| -> f64 {
                    (0..len / 2)
                        .map(|k| {
                            let a = cycle[(2 * k + offset) % len];
                            let b = cycle[(2 * k + offset + 1) % len];
                            correlation.get(a, b)
                        })
                        .sum()
                };
                let offset = if weight(0) >= weight(1) { 0 } else { 1 };
                for k in 0..len / 2 {
                    pairs.push((cycle[(2 * k + offset) % len], cycle[(2 * k + offset + 1) % len]));
                }
            }
            _ => leftovers.extend(cycle),
        }
    }

    if !leftovers.is_empty() {
        log::debug!("Pairing {} positions left on odd cycles greedily", leftovers.len());
        let mut candidates = Vec::new();
        for (x, &a) in leftovers.iter().enumerate() {
            for &b in &leftovers[x + 1..] {
                candidates.push((correlation.get(a, b), a, b));
            }
        }
        candidates.sort_by(|x, y| y.0.total_cmp(&x.0));
        let mut taken = vec![false; n];
        for (_, a, b) in candidates {
            if !taken[a] && !taken[b] {
                taken[a] = true;
                taken[b] = true;
                pairs.push((a, b));
            }
        }
    }

    Matching::new(n, pairs)
}

/// Lay out pairs as `[first elements..., second elements...]`
///
/// Pair `i` (in ascending order) lands at positions `i` and `i + size/2`,
/// which is the twin distance the swap corrector works with.
pub fn permutation_from_pairs(matching: &Matching) -> AttackResult<Permutation> {
    let firsts = matching.pairs().iter().map(|&(a, _)| a);
    let seconds = matching.pairs().iter().map(|&(_, b)| b);
    Permutation::new(firsts.chain(seconds).collect())
}

/// Relabel each block of `sequence` by `refinement`
pub fn apply_blockwise_permutation(
    sequence: &Permutation,
    refinement: &Permutation,
) -> AttackResult<Permutation> {
    sequence.apply_blockwise(refinement)
}
