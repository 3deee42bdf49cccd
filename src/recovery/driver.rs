//! Two-level decomposition driver

use serde::Serialize;

use super::extract::{extract_codes, CodeDimensions};
use super::matching::{
    apply_blockwise_permutation, match_from_correlation, permutation_from_pairs,
};
use super::swaps::{apply_swaps, find_swaps, SwapOutcome};
use crate::error::{AttackError, AttackResult};
use crate::gf2::{dual, BinaryMatrix};
use crate::params::{CodeParameters, Depth, RecoveryConfig};
use crate::permutation::Permutation;
use crate::signatures::{
    check_path_len, Correlation, CorrelationCache, CorrelationMatrix, Path, SignatureBuffer,
    UvPaths,
};

/// What one depth of the decomposition found
#[derive(Debug, Clone, Serialize)]
pub struct DepthReport {
    pub depth: usize,
    pub correlation_size: usize,
    pub pairs: usize,
    pub mean_pair_correlation: f64,
    pub swap: SwapOutcome,
    pub codes: Option<CodeDimensions>,
}

/// Output of a depth: the permutation and its statistics
#[derive(Debug, Clone)]
pub struct DepthOutcome {
    pub permutation: Permutation,
    pub report: DepthReport,
}

/// Full recovery result
#[derive(Debug, Clone, Serialize)]
pub struct RecoveryReport {
    pub code_n: usize,
    pub signatures: usize,
    pub depths: Vec<DepthReport>,
    pub finished_at: String,
}

#[derive(Debug, Clone)]
pub struct Recovery {
    /// Column order exposing the structure: position `i` holds public column `permutation[i]`
    pub permutation: Permutation,
    pub report: RecoveryReport,
}

impl Recovery {
    /// The recovered order in the secret-key layout (public column -> position)
    pub fn secret_layout(&self) -> Permutation {
        self.permutation.inverse()
    }
}

/// Generator matrix G = Dual([I | T]) from the public key block T
pub fn generator_from_public_key(
    t: &BinaryMatrix,
    params: &CodeParameters,
) -> AttackResult<BinaryMatrix> {
    if t.rows() != params.dim_t() || t.cols() != params.len_t() {
        return Err(AttackError::dimension_mismatch(
            "public key",
            &format!("{}x{}", params.dim_t(), params.len_t()),
            &format!("{}x{}", t.rows(), t.cols()),
        ));
    }
    let h = BinaryMatrix::identity(params.dim_t()).hstack(t)?;
    Ok(dual(&h))
}

/// Correlation over every path `start + w`, `w` with `u` U's and `v` V's
///
/// Each path is folded on its own clone of the population, and all of them
/// feed one accumulator of size N / 2^len.
pub fn pearson_for_paths(
    signatures: &SignatureBuffer,
    start_paths: &[Path],
    u: usize,
    v: usize,
    params: &CodeParameters,
    cache: Option<&CorrelationCache>,
) -> AttackResult<CorrelationMatrix> {
    let paths = UvPaths::new(start_paths.to_vec(), u, v);
    let depth = paths.path_len()?;
    check_path_len(depth, params.code_m)?;
    let size = params.code_n >> depth;

    let key = cache.map(|_| {
        let all: Vec<Path> = paths.clone().collect();
        CorrelationCache::key(signatures, &all)
    });
    if let (Some(cache), Some(key)) = (cache, key.as_deref()) {
        if let Some(matrix) = cache.load(key)? {
            return Ok(matrix);
        }
    }

    let mut correlation = Correlation::new(size);
    for path in paths {
        let mut work = signatures.clone();
        path.apply(&mut work, params.code_m)?;
        correlation.update(&work)?;
        log::debug!("Accumulated path '{}' into a {}x{} correlation", path, size, size);
    }
    let matrix = correlation.finish()?;

    if let (Some(cache), Some(key)) = (cache, key.as_deref()) {
        cache.store(key, &matrix)?;
    }
    Ok(matrix)
}

fn mean_pair_correlation(correlation: &CorrelationMatrix, pairs: &super::Matching) -> f64 {
    if pairs.is_empty() {
        return 0.0;
    }
    let total: f64 = pairs
        .pairs()
        .iter()
        .map(|&(a, b)| correlation.get(a, b))
        .sum();
    total / pairs.len() as f64
}

/// Top-level split: pair all N positions and orient the pairs
pub fn depth1(
    signatures: &SignatureBuffer,
    generator: &BinaryMatrix,
    params: &CodeParameters,
    config: &RecoveryConfig,
    cache: Option<&CorrelationCache>,
) -> AttackResult<DepthOutcome> {
    log::info!(
        "Depth 1: correlating {} signatures over {} positions",
        signatures.len(),
        params.code_n
    );
    let correlation = pearson_for_paths(signatures, &[Path::empty()], 0, 0, params, cache)?;
    let matching = match_from_correlation(&correlation)?;
    let mean = mean_pair_correlation(&correlation, &matching);
    log::info!("Depth 1: matched {} pairs, mean pair correlation {:.4}", matching.len(), mean);

    let permutation = permutation_from_pairs(&matching)?;
    let gp = generator.select_columns(permutation.as_slice());
    let swap = find_swaps(&gp, params.appended_dimension(Depth::One), config)?;
    let permutation = apply_swaps(&permutation, &swap.swaps)?;
    log::info!(
        "Depth 1: {} swaps, offending rank {} -> {} in {} rounds",
        swap.swap_count(),
        swap.initial_rank,
        swap.final_rank,
        swap.rounds
    );

    Ok(DepthOutcome {
        permutation,
        report: DepthReport {
            depth: 1,
            correlation_size: correlation.size(),
            pairs: matching.len(),
            mean_pair_correlation: mean,
            swap,
            codes: None,
        },
    })
}

/// Second level: refine inside each half and orient the U child
pub fn depth2(
    signatures: &SignatureBuffer,
    generator: &BinaryMatrix,
    perm1: &Permutation,
    params: &CodeParameters,
    config: &RecoveryConfig,
    cache: Option<&CorrelationCache>,
) -> AttackResult<DepthOutcome> {
    let mut relabelled = signatures.clone();
    relabelled.apply_bitwise_permutation(perm1);

    let starts = [Path::parse("U")?, Path::parse("V")?];
    let correlation = pearson_for_paths(&relabelled, &starts, 0, 0, params, cache)?;
    let matching = match_from_correlation(&correlation)?;
    let mean = mean_pair_correlation(&correlation, &matching);
    log::info!(
        "Depth 2: matched {} pairs over {} folded positions, mean pair correlation {:.4}",
        matching.len(),
        correlation.size(),
        mean
    );

    let refinement = permutation_from_pairs(&matching)?;
    let permutation = apply_blockwise_permutation(perm1, &refinement)?;
    let codes = extract_codes(&generator.select_columns(permutation.as_slice()))?;
    let dimensions = codes.dimensions();
    if dimensions.dim_a != params.k_app {
        log::warn!(
            "Depth 2: realised appended dimension {} differs from the expected {}",
            dimensions.dim_a,
            params.k_app
        );
    }

    let swap = find_swaps(&codes.u, params.appended_dimension(Depth::Two), config)?;
    let permutation = apply_swaps(&permutation, &swap.swaps)?;
    log::info!(
        "Depth 2: {} swaps, offending rank {} -> {} in {} rounds",
        swap.swap_count(),
        swap.initial_rank,
        swap.final_rank,
        swap.rounds
    );

    Ok(DepthOutcome {
        permutation,
        report: DepthReport {
            depth: 2,
            correlation_size: correlation.size(),
            pairs: matching.len(),
            mean_pair_correlation: mean,
            swap,
            codes: Some(dimensions),
        },
    })
}

/// Run both depths and return the recovered column order
pub fn recover_permutation(
    signatures: &SignatureBuffer,
    generator: &BinaryMatrix,
    params: &CodeParameters,
    config: &RecoveryConfig,
) -> AttackResult<Recovery> {
    if generator.cols() != params.code_n {
        return Err(AttackError::dimension_mismatch(
            "generator",
            &format!("{} columns", params.code_n),
            &format!("{} columns", generator.cols()),
        ));
    }
    let cache = config
        .cache_dir
        .as_deref()
        .map(CorrelationCache::open)
        .transpose()?;

    let first = depth1(signatures, generator, params, config, cache.as_ref())?;
    let second = depth2(
        signatures,
        generator,
        &first.permutation,
        params,
        config,
        cache.as_ref(),
    )?;

    Ok(Recovery {
        permutation: second.permutation,
        report: RecoveryReport {
            code_n: params.code_n,
            signatures: signatures.len(),
            depths: vec![first.report, second.report],
            finished_at: chrono::Utc::now().to_rfc3339(),
        },
    })
}
