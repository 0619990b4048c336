//! # Constants and type definitions for fastmcd
//!
//! This module centralizes the **default tuning constants** of the FAST-MCD search and the
//! **common type aliases** used throughout the crate.
//!
//! ## Overview
//!
//! - Type aliases for location vectors, scatter matrices and squared distances
//! - Default search budgets (trials, concentration step caps, group sizing)
//! - Numerical tolerances
//! - Thresholds of the final-refinement step schedule

use nalgebra::{DMatrix, DVector};

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Estimated center, one entry per dimension
pub type Location = DVector<f64>;

/// Symmetric p×p covariance estimate
pub type Scatter = DMatrix<f64>;

/// Squared Mahalanobis distances, aligned with observation order
pub type DistanceSq = Vec<f64>;

// -------------------------------------------------------------------------------------------------
// Search defaults
// -------------------------------------------------------------------------------------------------

/// Breakdown fraction used to derive the coverage h
pub const DEFAULT_ALPHA: f64 = 0.5;

/// Maximum number of disjoint groups for the large-dataset strategy
pub const DEFAULT_MAX_N_GROUPS: usize = 5;

/// Group size, also defines the small/large switch at twice this value
pub const DEFAULT_MIN_GROUP_SIZE: usize = 300;

/// Number of random restarts
pub const DEFAULT_N_TRIALS: usize = 500;

/// Number of lowest-determinant candidates retained at each stage
pub const DEFAULT_N_BEST: usize = 10;

/// Concentration steps applied to every fresh trial
pub const DEFAULT_K1: usize = 2;

/// Concentration steps applied on the merged sample
pub const DEFAULT_K2: usize = 2;

/// Maximum concentration steps during final refinement
pub const DEFAULT_K3: usize = 100;

/// Relative slack allowed when checking det(S_new) <= det(S_old)
pub const MONOTONICITY_RTOL: f64 = 1e-9;

/// Above this number of observations the large-dataset strategy refines a single candidate
pub const FULL_REFINE_MAX_N: usize = 5_000;

// -------------------------------------------------------------------------------------------------
// Final refinement schedule (k4)
// -------------------------------------------------------------------------------------------------

/// Width of one tier of the k4 schedule, in data elements (n × p)
pub const K4_TIER_WIDTH: usize = 100_000;

/// Step budget of the first tier above [`K4_TIER_WIDTH`]
pub const K4_FIRST_TAPERED_STEPS: usize = 10;

/// Beyond this data volume a single final concentration step is taken
pub const K4_MAX_VOLUME: usize = 1_000_000;

/// Default cutoff quantile of the chi-square distribution for outlier flagging
pub const DEFAULT_CHI2_QUANTILE: f64 = 0.975;

// -------------------------------------------------------------------------------------------------
// Singularity and exact fit
// -------------------------------------------------------------------------------------------------

/// Smallest LU pivot of the correlation matrix still considered nonzero
pub const SINGULAR_PIVOT_RTOL: f64 = 1e-12;

/// Eigenvalues below this fraction of the largest one span the null space of a singular scatter
pub const NULL_SPACE_RTOL: f64 = 1e-10;

/// Relative distance (in units of the largest spread) beyond which a point leaves a hyperplane
pub const EXACT_FIT_RTOL: f64 = 1e-8;
