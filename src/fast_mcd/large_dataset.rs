//! # Large-dataset strategy
//!
//! When `n ≥ 2 · min_group_size` running every trial on the full data is too expensive. The
//! search instead proceeds on nested datasets:
//!
//! 1. **Sampling** – draw `sample_size` observations without replacement
//!    (all of them when fewer than `max_n_groups` groups fit) and split them into
//!    `n_groups` disjoint groups of nearly equal size ([`GroupPlan`]).
//! 2. **Group search** – inside each group run `n_trials / n_groups` trials
//!    (initial subset + `k1` steps) with coverage `⌊group_size · h / n⌋`, keep the `n_best`
//!    lowest determinants of each group.
//! 3. **Merge** – apply `k2` steps to every pooled trial on the merged sample, with coverage
//!    `⌊sample_size · h / n⌋`.
//! 4. **Final refinement** – the best `n_reps` merged trials (`n_best` for `n ≤ 5000`, one
//!    otherwise) get up to `k4` steps on the full dataset with the original `h`.
//!
//! `k4` follows [`k4_schedule`], a tapering step budget trading accuracy for run time on very
//! large inputs.
use log::{debug, warn};
use rand::seq::{index, SliceRandom};

use crate::constants::{FULL_REFINE_MAX_N, K4_FIRST_TAPERED_STEPS, K4_MAX_VOLUME, K4_TIER_WIDTH};
use crate::fast_mcd::concentration::{refine, Origin};
use crate::fast_mcd::initial_subset::form_initial_subset;
use crate::fast_mcd::trial::{
    collect_successful, keep_best, run_indexed, trial_rng, Stream, Trial,
};
use crate::fast_mcd::McdParams;
use crate::mcd_errors::McdError;
use crate::observation_set::ObservationSet;

/// Number of groups and sample size of the partition step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupPlan {
    pub n_groups: usize,
    pub sample_size: usize,
}

impl GroupPlan {
    /// Plan the partition of `n` observations.
    ///
    /// If fewer than `max_n_groups` groups of `min_group_size` fit in the data, the whole
    /// dataset is used and split into `n / min_group_size` groups. Otherwise a sample of
    /// `max_n_groups · min_group_size` observations is split into `max_n_groups` groups.
    pub fn new(n: usize, min_group_size: usize, max_n_groups: usize) -> Self {
        let n_groups = n / min_group_size;
        if n_groups < max_n_groups {
            GroupPlan {
                n_groups,
                sample_size: n,
            }
        } else {
            GroupPlan {
                n_groups: max_n_groups,
                sample_size: max_n_groups * min_group_size,
            }
        }
    }

    /// Size of every group; the remainder goes one-per-group to the first groups.
    pub fn group_sizes(&self) -> Vec<usize> {
        let base = self.sample_size / self.n_groups;
        let rem = self.sample_size % self.n_groups;
        (0..self.n_groups)
            .map(|g| base + usize::from(g < rem))
            .collect()
    }
}

/// Step budget of the final refinement for a dataset of `volume = n · p` elements.
///
/// | volume | steps |
/// |---|---|
/// | ≤ 100 000 | `k3` |
/// | (100 000, 200 000] | 10 |
/// | … one step less per additional 100 000 … | |
/// | (900 000, 1 000 000] | 2 |
/// | > 1 000 000 | 1 |
pub fn k4_schedule(volume: usize, k3: usize) -> usize {
    if volume <= K4_TIER_WIDTH {
        k3
    } else if volume > K4_MAX_VOLUME {
        1
    } else {
        let tier = volume.div_ceil(K4_TIER_WIDTH);
        K4_FIRST_TAPERED_STEPS + 2 - tier
    }
}

/// Random split of `sample` into disjoint groups of the given sizes.
fn split_into_groups(
    sample: &ObservationSet,
    sizes: &[usize],
    rng: &mut impl rand::Rng,
) -> Vec<ObservationSet> {
    let mut permutation: Vec<usize> = (0..sample.n()).collect();
    permutation.shuffle(rng);

    let mut start = 0;
    sizes
        .iter()
        .map(|&size| {
            let group = sample.select_rows(&permutation[start..start + size]);
            start += size;
            group
        })
        .collect()
}

/// Scale the coverage `h` of `n` observations to a dataset of `size` observations.
fn scaled_coverage(size: usize, h_frac: f64, p: usize) -> usize {
    ((size as f64 * h_frac).floor() as usize).clamp(p + 1, size)
}

fn search_group(
    group: &ObservationSet,
    g: usize,
    h_frac: f64,
    n_trials: usize,
    params: &McdParams,
) -> Result<Vec<Trial>, McdError> {
    let h_sub = scaled_coverage(group.n(), h_frac, group.p());
    let trials = run_indexed(n_trials, params.parallel, |i| {
        let mut rng = trial_rng(params.seed, Stream::Group(g), i);
        let start = form_initial_subset(group, h_sub, &mut rng)?;
        refine(
            group,
            h_sub,
            start,
            params.k1,
            Origin::SameData,
            params.strict_monotonicity,
        )
    });
    let trials = collect_successful(trials, &format!("group {g} trials"))?;
    Ok(keep_best(trials, params.n_best))
}

/// Run the partition-and-merge search with coverage `h` and return the best trial.
///
/// The returned trial has been concentrated on the full dataset, so its `support` indexes
/// `data`.
pub(crate) fn large_dataset_estimate(
    data: &ObservationSet,
    h: usize,
    params: &McdParams,
) -> Result<Trial, McdError> {
    let n = data.n();
    let p = data.p();
    let plan = GroupPlan::new(n, params.min_group_size, params.max_n_groups);
    let h_frac = h as f64 / n as f64;

    let mut rng = trial_rng(params.seed, Stream::Partition, 0);
    let mut sample_idx = index::sample(&mut rng, n, plan.sample_size).into_vec();
    sample_idx.sort_unstable();
    let sample = data.select_rows(&sample_idx);
    let groups = split_into_groups(&sample, &plan.group_sizes(), &mut rng);
    debug!(
        "partitioned {} of {n} observations into {} groups",
        plan.sample_size, plan.n_groups
    );

    // Group search
    let trials_per_group = (params.n_trials / plan.n_groups).max(1);
    let per_group = run_indexed(groups.len(), params.parallel, |g| {
        search_group(&groups[g], g, h_frac, trials_per_group, params)
    });
    let mut pooled = Vec::with_capacity(plan.n_groups * params.n_best);
    let mut first_err = None;
    for (g, result) in per_group.into_iter().enumerate() {
        match result {
            Ok(best) => pooled.extend(best),
            Err(err) if err.is_trial_local() => {
                warn!("group {g} produced no usable trial: {err}");
                first_err.get_or_insert(err);
            }
            Err(err) => return Err(err),
        }
    }
    if pooled.is_empty() {
        return Err(first_err.unwrap_or(McdError::SingularSubset {
            observations: plan.sample_size,
        }));
    }

    // Merge on the whole sample
    let h_merged = scaled_coverage(plan.sample_size, h_frac, p);
    let merged = run_indexed(pooled.len(), params.parallel, |i| {
        refine(
            &sample,
            h_merged,
            pooled[i].clone(),
            params.k2,
            Origin::OtherData,
            params.strict_monotonicity,
        )
    });
    let n_reps = if n <= FULL_REFINE_MAX_N {
        params.n_best
    } else {
        1
    };
    let candidates = keep_best(collect_successful(merged, "merged trials")?, n_reps);

    // Final refinement on the full dataset
    let k4 = params
        .k4
        .unwrap_or_else(|| k4_schedule(n * p, params.k3))
        .max(1);
    debug!(
        "refining {} candidates with up to {k4} steps on the full data",
        candidates.len()
    );
    let finals = run_indexed(candidates.len(), params.parallel, |i| {
        refine(
            data,
            h,
            candidates[i].clone(),
            k4,
            Origin::OtherData,
            params.strict_monotonicity,
        )
    });

    keep_best(collect_successful(finals, "final refinement")?, 1)
        .pop()
        .ok_or_else(|| McdError::InvalidInput("final refinement produced no trial".into()))
}
