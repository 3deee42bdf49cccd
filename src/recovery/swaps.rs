//! Twin orientation correction
//!
//! After pairing, the two columns of every pair are known but not which of
//! them carries `u` and which carries `u + v`. Writing the column-ordered
//! generator as GP = [L | R], the transform GPJ = GP * [[I, I], [I, 0]] gives
//! [L + R | L]: codewords (u, u + v) become (v, u). Swapping pair `i` adds
//! column `i` of GPJ to column `R + i`.
//!
//! Rows of the reduced GPJ whose pivot lies in the left half span V plus
//! the appended rows. The rank of their right halves (the offending rank)
//! drops to the number of appended rows once every pair is oriented
//! consistently.

use serde::Serialize;

use crate::error::{error_codes, AttackError, AttackResult};
use crate::gf2::{left_kernel, solve_left, vector_times, BinaryMatrix, Solution};
use crate::params::RecoveryConfig;
use crate::permutation::Permutation;

/// Bit `i` set means "swap the two columns of pair `i`"
pub type SwapVector = Vec<bool>;

/// Result of a swap correction run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapOutcome {
    pub swaps: SwapVector,
    pub initial_rank: usize,
    pub final_rank: usize,
    pub rounds: usize,
}

impl SwapOutcome {
    pub fn swap_count(&self) -> usize {
        self.swaps.iter().filter(|&&s| s).count()
    }
}

/// GP * J for a generator with an even number of columns
pub fn plotkin_transform(gp: &BinaryMatrix) -> AttackResult<BinaryMatrix> {
    if gp.cols() % 2 != 0 {
        return Err(AttackError::DimensionMismatch {
            operation: "plotkin transform".to_string(),
            expected: "an even number of columns".to_string(),
            actual: gp.cols().to_string(),
            error_code: error_codes::ODD_COLUMN_COUNT,
        });
    }
    let half = gp.cols() / 2;
    let mut gpj = gp.clone();
    for i in 0..half {
        gpj.add_column(i, i + half);
    }
    for i in 0..half {
        gpj.add_column(i + half, i);
    }
    Ok(gpj)
}

/// Reduced GPJ together with the size of its left-pivot block
pub(crate) struct TwinView {
    pub(crate) gpj: BinaryMatrix,
    pub(crate) half: usize,
    pub(crate) dim_va: usize,
}

impl TwinView {
    pub(crate) fn new(gp: &BinaryMatrix) -> AttackResult<Self> {
        let mut gpj = plotkin_transform(gp)?;
        gpj.echelonize();
        let half = gp.cols() / 2;
        let dim_va = gpj.pivot_columns().iter().filter(|&&p| p < half).count();
        Ok(Self { gpj, half, dim_va })
    }

    pub(crate) fn upper_right(&self) -> BinaryMatrix {
        self.gpj.submatrix(0..self.dim_va, self.half..2 * self.half)
    }

    pub(crate) fn offending_rank(&self) -> usize {
        self.upper_right().rank()
    }

    /// Swap the given pairs and re-reduce
    fn toggle(&mut self, pairs: &[usize]) {
        for &i in pairs {
            self.gpj.add_column(self.half + i, i);
        }
        self.gpj.echelonize();
    }

    fn equations(&self) -> Equations {
        let half = self.half;
        let mut pivot_row = vec![None; half];
        for (p, &col) in self
            .gpj
            .pivot_columns()
            .iter()
            .filter(|&&c| c >= half)
            .enumerate()
        {
            pivot_row[col - half] = Some(self.dim_va + p);
        }
        let support: Vec<usize> = (0..half).filter(|&i| pivot_row[i].is_none()).collect();
        let support_cols: Vec<usize> = support.iter().map(|&i| half + i).collect();

        let mut table = BinaryMatrix::zeros(half, support.len());
        for i in 0..half {
            match pivot_row[i] {
                Some(row) => {
                    for (c, &col) in support_cols.iter().enumerate() {
                        if self.gpj.get(row, col) {
                            table.set(i, c, true);
                        }
                    }
                }
                None => {
                    if let Ok(c) = support.binary_search(&i) {
                        table.set(i, c, true);
                    }
                }
            }
        }
        Equations {
            pivot_row,
            support_cols,
            table,
        }
    }
}

/// How toggling each swap moves a row's residual
///
/// Swap `i` adds `e_i` to the right half of every upper row with a one in
/// column `i`. If `i` is a pivot of the lower block, re-reducing replaces
/// that with the pivot row's residual; otherwise it is a unit vector on the
/// residual support.
struct Equations {
    pivot_row: Vec<Option<usize>>,
    support_cols: Vec<usize>,
    table: BinaryMatrix,
}

impl Equations {
    fn residual(&self, view: &TwinView, row: usize) -> Vec<bool> {
        view.gpj.row_bits_at(row, &self.support_cols)
    }

    fn residuals(&self, view: &TwinView) -> BinaryMatrix {
        view.gpj
            .row_range(0..view.dim_va)
            .select_columns(&self.support_cols)
    }

    /// Equations of the `active` swaps stacked over the residuals of `deferred` rows
    fn row_system(&self, view: &TwinView, active: &[usize], deferred: &[usize]) -> BinaryMatrix {
        let mut system =
            BinaryMatrix::zeros(active.len() + deferred.len(), self.support_cols.len());
        for (r, &i) in active.iter().enumerate() {
            for c in 0..self.support_cols.len() {
                if self.table.get(i, c) {
                    system.set(r, c, true);
                }
            }
        }
        for (r, &d) in deferred.iter().enumerate() {
            for (c, &col) in self.support_cols.iter().enumerate() {
                if view.gpj.get(d, col) {
                    system.set(active.len() + r, c, true);
                }
            }
        }
        system
    }

    /// Swaps that touch `row`, i.e. columns where its left half is set
    fn active(&self, view: &TwinView, row: usize) -> Vec<usize> {
        (0..view.half).filter(|&i| view.gpj.get(row, i)).collect()
    }

    /// Left halves of the upper rows reduced modulo the lower block
    fn reduced_left(&self, view: &TwinView) -> BinaryMatrix {
        let half = view.half;
        let mut reduced = BinaryMatrix::zeros(view.dim_va, self.support_cols.len());
        for j in 0..view.dim_va {
            let mut left: Vec<bool> = (0..half).map(|i| view.gpj.get(j, i)).collect();
            for (i, row) in self.pivot_row.iter().enumerate() {
                let Some(row) = *row else { continue };
                if left[i] {
                    for (k, bit) in left.iter_mut().enumerate() {
                        *bit ^= view.gpj.get(row, half + k);
                    }
                }
            }
            for (c, &col) in self.support_cols.iter().enumerate() {
                if left[col - half] {
                    reduced.set(j, c, true);
                }
            }
        }
        reduced
    }
}

/// Offending rank of a column-ordered generator
pub fn offending_rank(gp: &BinaryMatrix) -> AttackResult<usize> {
    Ok(TwinView::new(gp)?.offending_rank())
}

/// Find swaps that bring the offending rank of `gp` down to `target_rank`
///
/// Each round first solves the upper rows one by one: a row whose residual
/// can be cancelled by toggling the swaps it touches (modulo the residuals
/// of rows deferred earlier) gets those toggles, anything else is deferred.
/// If that does not reach the target, single swaps are probed for a strict
/// rank decrease, and failing that, all rows whose left half lies in the
/// lower block's span are solved jointly. No step may take the rank below
/// `target_rank`, so success always ends exactly on it.
pub fn find_swaps(
    gp: &BinaryMatrix,
    target_rank: usize,
    config: &RecoveryConfig,
) -> AttackResult<SwapOutcome> {
    let mut view = TwinView::new(gp)?;
    let half = view.half;
    let mut swaps = vec![false; half];
    let initial_rank = view.offending_rank();
    let mut rank = initial_rank;
    let mut rounds = 0;

    log::debug!(
        "Swap correction at half-length {}: dim(V+A) = {}, offending rank {}, target {}",
        half,
        view.dim_va,
        rank,
        target_rank
    );

    if rank < target_rank {
        return Err(AttackError::CorrectionFailed {
            half_length: half,
            offending_rank: rank,
            target_rank,
            rounds,
            error_code: error_codes::CORRECTION_BELOW_TARGET,
        });
    }

    while rank > target_rank {
        if rounds >= config.max_correction_rounds {
            return Err(AttackError::CorrectionFailed {
                half_length: half,
                offending_rank: rank,
                target_rank,
                rounds,
                error_code: error_codes::CORRECTION_ROUND_LIMIT,
            });
        }
        rounds += 1;
        let round_start = rank;

        rank = row_pass(&mut view, &mut swaps, rank, target_rank);
        log::debug!("Round {}: row pass left offending rank {}", rounds, rank);
        if rank == target_rank {
            break;
        }

        if let Some(reduced) = single_bit_probe(&mut view, &mut swaps, rank, target_rank) {
            log::debug!("Round {}: single swap probe reached rank {}", rounds, reduced);
            rank = reduced;
            continue;
        }

        if let Some(reduced) =
            joint_solve(&mut view, &mut swaps, rank, target_rank, config.joint_solve_rows)
        {
            log::debug!("Round {}: joint solve reached rank {}", rounds, reduced);
            rank = reduced;
            continue;
        }

        if rank >= round_start {
            return Err(AttackError::CorrectionFailed {
                half_length: half,
                offending_rank: rank,
                target_rank,
                rounds,
                error_code: error_codes::CORRECTION_NO_PROGRESS,
            });
        }
    }

    Ok(SwapOutcome {
        swaps,
        initial_rank,
        final_rank: rank,
        rounds,
    })
}

fn apply_toggles(view: &mut TwinView, swaps: &mut [bool], toggles: &[usize]) {
    view.toggle(toggles);
    for &i in toggles {
        swaps[i] = !swaps[i];
    }
}

/// Whether a toggle that left `new_rank` behind should be kept
fn accepts(new_rank: usize, rank: usize, target: usize) -> bool {
    new_rank < rank && new_rank >= target
}

/// One pass over the upper rows; keeps the offending rank within `target..=rank`
fn row_pass(view: &mut TwinView, swaps: &mut [bool], mut rank: usize, target: usize) -> usize {
    let mut equations = view.equations();
    let mut deferred: Vec<usize> = Vec::new();

    for row in 0..view.dim_va {
        if rank <= target {
            break;
        }
        let residual = equations.residual(view, row);
        if !residual.iter().any(|&b| b) {
            continue;
        }

        let active = equations.active(view, row);
        let system = equations.row_system(view, &active, &deferred);
        let Solution::Found(x) = solve_left(&system, &residual) else {
            deferred.push(row);
            continue;
        };
        let toggles: Vec<usize> = active
            .iter()
            .zip(&x)
            .filter(|(_, &bit)| bit)
            .map(|(&i, _)| i)
            .collect();
        if toggles.is_empty() {
            continue;
        }

        apply_toggles(view, swaps, &toggles);
        let new_rank = view.offending_rank();
        if new_rank > rank || new_rank < target {
            apply_toggles(view, swaps, &toggles);
            deferred.push(row);
        } else {
            rank = new_rank;
            equations = view.equations();
        }
    }
    rank
}

/// Toggle single swaps; keep the first one that lowers the rank without
/// passing `target`
fn single_bit_probe(
    view: &mut TwinView,
    swaps: &mut [bool],
    rank: usize,
    target: usize,
) -> Option<usize> {
    for i in 0..view.half {
        apply_toggles(view, swaps, &[i]);
        let new_rank = view.offending_rank();
        if accepts(new_rank, rank, target) {
            return Some(new_rank);
        }
        apply_toggles(view, swaps, &[i]);
    }
    None
}

/// Solve the orientation of all pure V combinations at once
///
/// A combination `z` of upper rows whose left half reduces to zero modulo
/// the lower block must end with a zero residual; for each such `z` the
/// residual is linear in the toggles. Up to `max_rows` kernel vectors are
/// stacked into one system.
fn joint_solve(
    view: &mut TwinView,
    swaps: &mut [bool],
    rank: usize,
    target_rank: usize,
    max_rows: usize,
) -> Option<usize> {
    let equations = view.equations();
    let support = equations.support_cols.len();
    let kernel = left_kernel(&equations.reduced_left(view));
    let rows = kernel.rows().min(max_rows);
    if rows == 0 || support == 0 {
        return None;
    }

    let upper_left = view.gpj.submatrix(0..view.dim_va, 0..view.half);
    let residuals = equations.residuals(view);
    let mut system = BinaryMatrix::zeros(view.half, rows * support);
    let mut target = Vec::with_capacity(rows * support);
    for t in 0..rows {
        let z = kernel.row_bits(t);
        let touched = vector_times(&z, &upper_left);
        for (i, _) in touched.iter().enumerate().filter(|(_, &b)| b) {
            for c in 0..support {
                if equations.table.get(i, c) {
                    system.set(i, t * support + c, true);
                }
            }
        }
        target.extend(vector_times(&z, &residuals));
    }

    let Solution::Found(delta) = solve_left(&system, &target) else {
        return None;
    };
    let toggles: Vec<usize> = (0..view.half).filter(|&i| delta[i]).collect();
    if toggles.is_empty() {
        return None;
    }
    apply_toggles(view, swaps, &toggles);
    let new_rank = view.offending_rank();
    if accepts(new_rank, rank, target_rank) {
        Some(new_rank)
    } else {
        apply_toggles(view, swaps, &toggles);
        None
    }
}

/// Swap twins inside every block of `2 * swaps.len()` entries
///
/// Entry `j` of a block trades places with entry `j + swaps.len()` when
/// `swaps[j]` is set. Applying the same vector twice is the identity.
pub fn apply_swaps(permutation: &Permutation, swaps: &[bool]) -> AttackResult<Permutation> {
    let k = swaps.len();
    if k == 0 || permutation.len() % (2 * k) != 0 {
        return Err(AttackError::dimension_mismatch(
            "apply swaps",
            &format!("a permutation length divisible by {}", 2 * k),
            &permutation.len().to_string(),
        ));
    }
    let mut entries = permutation.as_slice().to_vec();
    for block in entries.chunks_mut(2 * k) {
        for (j, _) in swaps.iter().enumerate().filter(|(_, &s)| s) {
            block.swap(j, j + k);
        }
    }
    Permutation::new(entries)
}
