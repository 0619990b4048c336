//! # Small-dataset strategy
//!
//! When `n < 2 · min_group_size` every trial works directly on the full dataset:
//!
//! 1. `n_trials` independent initial subsets, each followed by up to `k1` concentration steps,
//! 2. the `n_best` trials with the smallest determinant are refined with up to `k3` further
//!    steps, stopping on convergence,
//! 3. the refined trial with the globally smallest determinant wins.
use log::debug;

use crate::fast_mcd::concentration::{refine, Origin};
use crate::fast_mcd::initial_subset::form_initial_subset;
use crate::fast_mcd::trial::{
    collect_successful, keep_best, run_indexed, trial_rng, Stream, Trial,
};
use crate::fast_mcd::McdParams;
use crate::mcd_errors::McdError;
use crate::observation_set::ObservationSet;

/// Run the small-dataset search with coverage `h` and return the best trial.
pub(crate) fn small_dataset_estimate(
    data: &ObservationSet,
    h: usize,
    params: &McdParams,
) -> Result<Trial, McdError> {
    let trials = run_indexed(params.n_trials, params.parallel, |i| {
        let mut rng = trial_rng(params.seed, Stream::SmallTrials, i);
        let start = form_initial_subset(data, h, &mut rng)?;
        refine(
            data,
            h,
            start,
            params.k1,
            Origin::SameData,
            params.strict_monotonicity,
        )
    });
    let best = keep_best(
        collect_successful(trials, "small-dataset trials")?,
        params.n_best,
    );

    let refined = run_indexed(best.len(), params.parallel, |i| {
        refine(
            data,
            h,
            best[i].clone(),
            params.k3,
            Origin::SameData,
            params.strict_monotonicity,
        )
    });
    let refined = collect_successful(refined, "small-dataset refinement")?;
    for (i, trial) in refined.iter().enumerate() {
        debug!(
            "candidate {i}: det = {:e}, converged = {}",
            trial.determinant, trial.converged
        );
    }

    keep_best(refined, 1)
        .pop()
        .ok_or_else(|| McdError::InvalidInput("small-dataset refinement produced no trial".into()))
}
