//! # Trials and search bookkeeping
//!
//! A [`Trial`] is one candidate `(determinant, location, scatter)` of the FAST-MCD search,
//! together with the h-subset it was computed from. Trials are ordered by determinant,
//! smaller being better.
//!
//! This module also hosts the plumbing shared by both search strategies:
//!
//! * [`trial_rng`] – deterministic per-trial generator derived from the run seed,
//! * [`run_indexed`] – sequential or rayon-parallel evaluation of independent work items,
//! * [`collect_successful`] – drops trials that failed locally, escalates if none are left,
//! * [`keep_best`] – stable sort by determinant and truncation.
use log::warn;
use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::constants::{Location, Scatter};
use crate::mcd_errors::McdError;

/// One candidate of the search.
///
/// `support` holds the sorted indices of the h observations the statistics were computed from,
/// relative to the dataset the trial was last concentrated on (a group, the merged sample or
/// the full set).
#[derive(Debug, Clone, PartialEq)]
pub struct Trial {
    pub determinant: f64,
    pub location: Location,
    pub scatter: Scatter,
    pub support: Vec<usize>,
    pub converged: bool,
}

/// Independent random streams of one estimation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    /// Trials of the small-dataset strategy.
    SmallTrials,
    /// Sampling and partitioning of the large-dataset strategy.
    Partition,
    /// Trials inside group `g` of the large-dataset strategy.
    Group(usize),
}

impl Stream {
    fn id(self) -> u64 {
        match self {
            Stream::SmallTrials => 1,
            Stream::Partition => 2,
            Stream::Group(g) => 16 + g as u64,
        }
    }
}

#[inline]
fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Generator for work item `index` of `stream`, a pure function of the run seed.
///
/// Results therefore do not depend on how rayon schedules the items.
pub fn trial_rng(seed: u64, stream: Stream, index: usize) -> StdRng {
    let base = splitmix64(seed ^ splitmix64(stream.id()));
    StdRng::seed_from_u64(splitmix64(base ^ index as u64))
}

/// Evaluate `f(0..count)` and return the results in index order.
pub(crate) fn run_indexed<T, F>(count: usize, parallel: bool, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    if parallel {
        (0..count).into_par_iter().map(f).collect()
    } else {
        (0..count).map(f).collect()
    }
}

/// Keep the successful trials of a stage.
///
/// Trial-local failures (see [`McdError::is_trial_local`]) are dropped with a warning. Any
/// other error aborts the stage, and so does a stage where every trial failed, in which case
/// the first failure is returned.
pub(crate) fn collect_successful(
    results: Vec<Result<Trial, McdError>>,
    stage: &str,
) -> Result<Vec<Trial>, McdError> {
    let total = results.len();
    let mut trials = Vec::with_capacity(total);
    let mut first_err = None;

    for result in results {
        match result {
            Ok(trial) => trials.push(trial),
            Err(err) if err.is_trial_local() => {
                first_err.get_or_insert(err);
            }
            Err(err) => return Err(err),
        }
    }

    match first_err {
        Some(err) if trials.is_empty() => Err(err),
        Some(err) => {
            warn!(
                "{stage}: discarded {} of {total} trials (first failure: {err})",
                total - trials.len()
            );
            Ok(trials)
        }
        None if trials.is_empty() => Err(McdError::InvalidInput(format!(
            "{stage}: no trial was run"
        ))),
        None => Ok(trials),
    }
}

/// Sort trials by ascending determinant (stable) and keep the first `k`.
pub(crate) fn keep_best(mut trials: Vec<Trial>, k: usize) -> Vec<Trial> {
    trials.sort_by_key(|t| OrderedFloat(t.determinant));
    trials.truncate(k);
    trials
}
