//! # FAST-MCD estimation
//!
//! This module defines the [`McdParams`] configuration struct and its builder, and the
//! [`McdEstimation`] entry point that runs the **FAST-MCD** algorithm of Rousseeuw & Van Driessen
//! on an [`ObservationSet`].
//!
//! ## Purpose
//!
//! The Minimum Covariance Determinant estimator looks for the `h` observations (out of `n`)
//! whose sample covariance has the smallest determinant, and reports their mean and covariance.
//! Up to `n − h` arbitrarily placed outliers cannot move this estimate far, unlike the classical
//! mean and covariance.
//!
//! ## Pipeline overview
//!
//! 1. **Validation**
//!    `p ≥ 2`, `n > p` and a coverage `h < n` (see [`coverage_h`]).
//!
//! 2. **Dispatch**
//!    `n < 2 · min_group_size` runs the [small-dataset](crate::fast_mcd::small_dataset) search,
//!    larger inputs the [large-dataset](crate::fast_mcd::large_dataset) partition-and-merge search.
//!
//! 3. **Search**
//!    Random [initial subsets](crate::fast_mcd::initial_subset) are improved by
//!    [concentration steps](crate::fast_mcd::concentration), each of which can only decrease the
//!    covariance determinant. Only the best candidates of each stage are refined further.
//!
//! 4. **Result**
//!    The lowest-determinant candidate becomes the [`McdEstimate`].
//!
//! ## Reproducibility
//!
//! Every trial draws from its own generator derived from `seed` and the trial index, so a run
//! gives the same estimate for the same seed whether `parallel` is enabled or not.
//!
//! ## Example
//!
//! ```rust,no_run
//! use fastmcd::fast_mcd::{McdEstimation, McdParams};
//! use fastmcd::observation_set::ObservationSet;
//!
//! let data = ObservationSet::from_columns(&[
//!     vec![10.1, 9.5, 10.7, 3.4, 3.1, 0.0, 2.3, 0.8, 3.1, 2.6],
//!     vec![19.6, 20.5, 20.2, 2.9, 2.2, 1.6, 1.6, 2.9, 3.4, 2.2],
//!     vec![28.3, 28.9, 31.0, 2.1, 0.3, 0.2, 2.0, 1.6, 2.2, 1.9],
//! ]).unwrap();
//!
//! let params = McdParams::builder()
//!     .n_trials(200)
//!     .seed(42)
//!     .build()
//!     .unwrap();
//!
//! let estimate = data.estimate_mcd(&params).unwrap();
//! println!("{estimate}");
//! ```
use std::cmp::Ordering::{Equal, Less};
use std::fmt;

use log::info;

use crate::constants::{
    DEFAULT_ALPHA, DEFAULT_K1, DEFAULT_K2, DEFAULT_K3, DEFAULT_MAX_N_GROUPS,
    DEFAULT_MIN_GROUP_SIZE, DEFAULT_N_BEST, DEFAULT_N_TRIALS,
};
use crate::mcd_errors::McdError;
use crate::observation_set::{coverage_h, ObservationSet};

pub mod concentration;
pub mod initial_subset;
pub mod large_dataset;
pub mod mcd_result;
pub mod small_dataset;
pub mod trial;

use large_dataset::large_dataset_estimate;
pub use mcd_result::{McdEstimate, Strategy};
use small_dataset::small_dataset_estimate;

/// Configuration of a FAST-MCD run.
///
/// Fields
/// -----------------
/// **Coverage**
/// * `alpha` – breakdown fraction mapped to the coverage `h` by [`coverage_h`]; `0.5` gives the
///   most robust choice `h ≈ (n + p + 1) / 2`, values closer to `1` give more efficiency.
///
/// **Search size**
/// * `n_trials` – number of random restarts (split across groups for large datasets).
/// * `n_best` – number of lowest-determinant candidates kept at each stage.
/// * `min_group_size` – group size of the large-dataset strategy; datasets with at least
///   `2 · min_group_size` observations use that strategy.
/// * `max_n_groups` – cap on the number of groups.
///
/// **Step budgets**
/// * `k1` – concentration steps applied to every fresh trial.
/// * `k2` – steps on the merged sample (large datasets).
/// * `k3` – maximum steps of the small-dataset refinement, also the large-dataset final budget
///   for inputs of at most 100 000 elements.
/// * `k4` – maximum steps of the large-dataset final refinement; `None` follows
///   [`k4_schedule`](crate::fast_mcd::large_dataset::k4_schedule).
///
/// **Execution**
/// * `seed` – run seed from which every per-trial generator is derived.
/// * `strict_monotonicity` – fail a trial whose determinant increases beyond the rounding
///   tolerance instead of logging a warning.
/// * `parallel` – evaluate independent trials on the rayon thread pool.
///
/// Defaults
/// -----------------
/// * `alpha`: 0.5
/// * `n_trials`: 500, `n_best`: 10
/// * `min_group_size`: 300, `max_n_groups`: 5
/// * `k1`: 2, `k2`: 2, `k3`: 100, `k4`: schedule
/// * `seed`: 0, `strict_monotonicity`: false, `parallel`: true
#[derive(Debug, Clone, PartialEq)]
pub struct McdParams {
    pub alpha: f64,
    pub max_n_groups: usize,
    pub min_group_size: usize,
    pub n_trials: usize,
    pub n_best: usize,
    pub k1: usize,
    pub k2: usize,
    pub k3: usize,
    pub k4: Option<usize>,
    pub seed: u64,
    pub strict_monotonicity: bool,
    pub parallel: bool,
}

impl McdParams {
    /// Construct a new [`McdParams`] with the default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new [`McdParamsBuilder`] to override defaults before a run.
    ///
    /// # Example
    ///
    /// ```rust
    /// use fastmcd::fast_mcd::McdParams;
    ///
    /// let params = McdParams::builder()
    ///     .alpha(0.75)
    ///     .n_trials(100)
    ///     .seed(7)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(params.n_trials, 100);
    /// ```
    pub fn builder() -> McdParamsBuilder {
        McdParamsBuilder::new()
    }

    /// Strategy used for a dataset of `n` observations.
    pub fn strategy_for(&self, n: usize) -> Strategy {
        if n < 2 * self.min_group_size {
            Strategy::SmallDataset
        } else {
            Strategy::LargeDataset
        }
    }
}

impl Default for McdParams {
    fn default() -> Self {
        McdParams {
            alpha: DEFAULT_ALPHA,
            max_n_groups: DEFAULT_MAX_N_GROUPS,
            min_group_size: DEFAULT_MIN_GROUP_SIZE,
            n_trials: DEFAULT_N_TRIALS,
            n_best: DEFAULT_N_BEST,
            k1: DEFAULT_K1,
            k2: DEFAULT_K2,
            k3: DEFAULT_K3,
            k4: None,
            seed: 0,
            strict_monotonicity: false,
            parallel: true,
        }
    }
}

/// Builder for [`McdParams`], with validation.
#[derive(Debug, Clone)]
pub struct McdParamsBuilder {
    params: McdParams,
}

impl Default for McdParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl McdParamsBuilder {
    /// Create a new builder initialized with default values.
    pub fn new() -> Self {
        Self {
            params: McdParams::default(),
        }
    }

    pub fn alpha(mut self, v: f64) -> Self {
        self.params.alpha = v;
        self
    }
    pub fn max_n_groups(mut self, v: usize) -> Self {
        self.params.max_n_groups = v;
        self
    }
    pub fn min_group_size(mut self, v: usize) -> Self {
        self.params.min_group_size = v;
        self
    }
    pub fn n_trials(mut self, v: usize) -> Self {
        self.params.n_trials = v;
        self
    }
    pub fn n_best(mut self, v: usize) -> Self {
        self.params.n_best = v;
        self
    }
    pub fn k1(mut self, v: usize) -> Self {
        self.params.k1 = v;
        self
    }
    pub fn k2(mut self, v: usize) -> Self {
        self.params.k2 = v;
        self
    }
    pub fn k3(mut self, v: usize) -> Self {
        self.params.k3 = v;
        self
    }
    pub fn k4(mut self, v: usize) -> Self {
        self.params.k4 = Some(v);
        self
    }
    pub fn seed(mut self, v: u64) -> Self {
        self.params.seed = v;
        self
    }
    pub fn strict_monotonicity(mut self, v: bool) -> Self {
        self.params.strict_monotonicity = v;
        self
    }
    pub fn parallel(mut self, v: bool) -> Self {
        self.params.parallel = v;
        self
    }

    /// Finalize the builder and produce an [`McdParams`] instance.
    ///
    /// Returns
    /// -----------------
    /// * `Ok(McdParams)` if [`McdParams::validate`] accepts the values.
    /// * `Err(McdError::InvalidMcdParameter)` otherwise.
    pub fn build(self) -> Result<McdParams, McdError> {
        self.params.validate()?;
        Ok(self.params)
    }
}

/// Return true iff a <= b and comparable (i.e., not NaN).
#[inline]
fn le(a: f64, b: f64) -> bool {
    matches!(a.partial_cmp(&b), Some(Less) | Some(Equal))
}

/// Return true iff a < b and comparable (i.e., not NaN).
#[inline]
fn lt(a: f64, b: f64) -> bool {
    a.partial_cmp(&b) == Some(Less)
}

impl McdParams {
    /// Check the parameter values.
    ///
    /// The fields are public, so [`McdEstimation::estimate_mcd`] runs this check again on
    /// every call.
    ///
    /// Validation rules
    /// -----------------
    /// * `0.5 ≤ alpha < 1` – `alpha = 1` would ask for the whole dataset as coverage.
    /// * `n_trials ≥ 1`, `n_best ≥ 1`.
    /// * `max_n_groups ≥ 1`, `min_group_size ≥ 1`.
    /// * `k4 ≥ 1` when set: the final estimate must be concentrated on the full dataset.
    pub fn validate(&self) -> Result<(), McdError> {
        let p = self;

        if !(le(0.5, p.alpha) && lt(p.alpha, 1.0)) {
            return Err(McdError::InvalidMcdParameter(format!(
                "alpha must be in [0.5, 1), got {}",
                p.alpha
            )));
        }
        if p.n_trials == 0 {
            return Err(McdError::InvalidMcdParameter(
                "n_trials must be >= 1".into(),
            ));
        }
        if p.n_best == 0 {
            return Err(McdError::InvalidMcdParameter("n_best must be >= 1".into()));
        }
        if p.max_n_groups == 0 {
            return Err(McdError::InvalidMcdParameter(
                "max_n_groups must be >= 1".into(),
            ));
        }
        if p.min_group_size == 0 {
            return Err(McdError::InvalidMcdParameter(
                "min_group_size must be >= 1".into(),
            ));
        }
        if p.k4 == Some(0) {
            return Err(McdError::InvalidMcdParameter("k4 must be >= 1".into()));
        }

        Ok(())
    }
}

impl fmt::Display for McdParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            const PARAM_COL: usize = 34; // width reserved for "name = value"
            writeln!(f, "FAST-MCD Parameters")?;
            writeln!(f, "-------------------")?;

            macro_rules! line {
                ($fmt:expr, $val:expr, $comment:expr) => {{
                    let s = format!($fmt, $val);
                    let pad = if s.len() < PARAM_COL {
                        " ".repeat(PARAM_COL - s.len())
                    } else {
                        " ".to_string()
                    };
                    writeln!(f, "  {}{}# {}", s, pad, $comment)
                }};
            }

            writeln!(f, "[Coverage / search size]")?;
            line!("alpha          = {:.3}", self.alpha, "Breakdown fraction")?;
            line!("n_trials       = {}", self.n_trials, "Random restarts")?;
            line!("n_best         = {}", self.n_best, "Candidates kept per stage")?;
            line!("min_group_size = {}", self.min_group_size, "Group size")?;
            line!("max_n_groups   = {}", self.max_n_groups, "Maximum number of groups")?;

            writeln!(f, "\n[Concentration step budgets]")?;
            line!("k1             = {}", self.k1, "Steps per fresh trial")?;
            line!("k2             = {}", self.k2, "Steps on the merged sample")?;
            line!("k3             = {}", self.k3, "Maximum refinement steps")?;
            match self.k4 {
                Some(k4) => line!("k4             = {}", k4, "Final refinement steps")?,
                None => line!("k4             = {}", "schedule", "Keyed on n x p")?,
            }

            writeln!(f, "\n[Execution]")?;
            line!("seed           = {}", self.seed, "Run seed")?;
            line!(
                "strict_monotonicity = {}",
                self.strict_monotonicity,
                "Fail trials on determinant increase"
            )?;
            line!("parallel       = {}", self.parallel, "Use the rayon pool")?;

            Ok(())
        } else {
            write!(
                f,
                "McdParams(alpha={:.2}, n_trials={}, n_best={}, groups≤{}x{}, k1={}, k2={}, k3={}, k4={}, seed={})",
                self.alpha,
                self.n_trials,
                self.n_best,
                self.max_n_groups,
                self.min_group_size,
                self.k1,
                self.k2,
                self.k3,
                self.k4
                    .map_or_else(|| "schedule".to_string(), |k| k.to_string()),
                self.seed,
            )
        }
    }
}

/// Robust location/scatter estimation on a set of observations.
pub trait McdEstimation {
    /// Run FAST-MCD and return the minimum covariance determinant estimate.
    ///
    /// Arguments
    /// -----------------
    /// * `params`: search configuration, see [`McdParams`].
    ///
    /// Return
    /// ----------
    /// * The [`McdEstimate`] of the lowest determinant found.
    ///
    /// Errors
    /// ----------
    /// * [`McdError::InvalidMcdParameter`] if `params` fails [`McdParams::validate`].
    /// * [`McdError::InvalidInput`] if `p < 2`, `n ≤ p`, the coverage `h` reaches `n`, or the
    ///   large-dataset groups would not hold more than `p` observations.
    /// * [`McdError::SingularSubset`] / [`McdError::SingularScatter`] if every trial of a stage
    ///   hit degenerate data.
    fn estimate_mcd(&self, params: &McdParams) -> Result<McdEstimate, McdError>;
}

impl McdEstimation for ObservationSet {
    fn estimate_mcd(&self, params: &McdParams) -> Result<McdEstimate, McdError> {
        params.validate()?;
        self.validate_for_mcd()?;
        let (n, p) = (self.n(), self.p());
        let h = coverage_h(n, p, params.alpha)?;
        let strategy = params.strategy_for(n);
        info!("FAST-MCD on {n} x {p} observations, h = {h}, {strategy} strategy");

        let best = match strategy {
            Strategy::SmallDataset => small_dataset_estimate(self, h, params)?,
            Strategy::LargeDataset => {
                if params.min_group_size <= p {
                    return Err(McdError::InvalidInput(format!(
                        "min_group_size = {} must exceed p = {p}",
                        params.min_group_size
                    )));
                }
                large_dataset_estimate(self, h, params)?
            }
        };

        info!(
            "minimum covariance determinant {:e} ({})",
            best.determinant,
            if best.converged {
                "converged"
            } else {
                "did not fully converge"
            }
        );
        Ok(McdEstimate::from_trial(best, h, strategy))
    }
}
