use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum McdError {
    #[error("Invalid input data: {0}")]
    InvalidInput(String),

    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error(
        "No nonsingular subset found after growing to {observations} observations; data may be collinear"
    )]
    SingularSubset { observations: usize },

    #[error("Scatter matrix is singular (cannot be inverted)")]
    SingularScatter,

    #[error(
        "Concentration step increased the covariance determinant: {previous:e} -> {current:e}"
    )]
    MonotonicityViolation { previous: f64, current: f64 },

    #[error("Invalid MCD parameter: {0}")]
    InvalidMcdParameter(String),
}

impl McdError {
    /// Return true for failures that only invalidate a single trial.
    ///
    /// Sibling trials may still succeed when one of them hits a degenerate
    /// subset, so these errors are absorbed by the search stages and only
    /// escalated once every trial of a stage has failed.
    pub fn is_trial_local(&self) -> bool {
        matches!(
            self,
            McdError::SingularSubset { .. }
                | McdError::SingularScatter
                | McdError::MonotonicityViolation { .. }
        )
    }
}
