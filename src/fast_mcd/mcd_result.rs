//! # MCD estimation result
//!
//! [`McdEstimate`] is the terminal output of a FAST-MCD run: the robust location and scatter,
//! the determinant they achieve, and enough metadata to tell how they were obtained.
//!
//! * [`Strategy`] tells whether the direct or the partition-and-merge search was used.
//! * `converged` reports whether the winning candidate stopped moving within its final step
//!   budget. An unconverged estimate is still the best one found and is returned normally.
//! * `support` lists the indices (into the input [`ObservationSet`](crate::observation_set::ObservationSet))
//!   of the `h` observations the estimate is computed from.
use std::fmt;

use itertools::Itertools;

use crate::constants::{Location, Scatter};
use crate::fast_mcd::trial::Trial;

/// Search strategy selected from the dataset size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Direct multi-trial search on the whole dataset.
    SmallDataset,
    /// Partition a sample into groups, search within groups, merge, refine on the full set.
    LargeDataset,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::SmallDataset => write!(f, "small-dataset"),
            Strategy::LargeDataset => write!(f, "large-dataset"),
        }
    }
}

/// Minimum covariance determinant estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct McdEstimate {
    pub location: Location,
    pub scatter: Scatter,
    pub determinant: f64,
    /// Coverage used for the run.
    pub h: usize,
    /// Sorted indices of the h observations behind `location` and `scatter`.
    pub support: Vec<usize>,
    pub converged: bool,
    pub strategy: Strategy,
}

impl McdEstimate {
    pub(crate) fn from_trial(trial: Trial, h: usize, strategy: Strategy) -> Self {
        McdEstimate {
            location: trial.location,
            scatter: trial.scatter,
            determinant: trial.determinant,
            h,
            support: trial.support,
            converged: trial.converged,
            strategy,
        }
    }

    /// Number of dimensions of the estimate.
    pub fn dim(&self) -> usize {
        self.location.len()
    }
}

impl fmt::Display for McdEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "MCD estimate ({} strategy, h = {}, {})",
            self.strategy,
            self.h,
            if self.converged {
                "converged"
            } else {
                "did not fully converge"
            }
        )?;
        writeln!(f, "  determinant = {:.6e}", self.determinant)?;
        writeln!(
            f,
            "  location    = [{}]",
            self.location.iter().map(|v| format!("{v:.6}")).join(", ")
        )?;
        write!(f, "  scatter     ={}", self.scatter)
    }
}
