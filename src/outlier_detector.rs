//! # Outlier detection
//!
//! Classify every observation as inlier or outlier from its squared Mahalanobis distance to a
//! robust FAST-MCD estimate.
//!
//! ## Procedure
//!
//! 1. **Raw estimate** – [`McdEstimation::estimate_mcd`] gives the location `T` and scatter `S`
//!    of the h-subset with minimum covariance determinant.
//! 2. **Consistency correction** (optional, on by default) – the covariance of the `h` most
//!    central observations underestimates the spread of the bulk. `S` is multiplied by
//!    `median(d²) / χ²_p⁻¹(0.5)` so that the median distance matches its value under normality.
//! 3. **Reweighting** (optional, on by default) – the observations with `d² ≤ cutoff` give a
//!    new mean and covariance (again consistency-corrected). If that covariance is singular the
//!    raw estimate is kept.
//! 4. **Classification** – observation `i` is flagged when `d²ᵢ > χ²_p⁻¹(quantile)`.
//!
//! ## Exact fit
//!
//! When at least `h` observations lie on a hyperplane the MCD scatter is singular and no
//! Mahalanobis distance exists. The report is then marked `exact_fit`, `distances` hold the
//! squared orthogonal distances to that [`Hyperplane`], and every observation off the plane is
//! flagged. Correction and reweighting are skipped.
//!
//! Under a clean multivariate normal model the expected fraction of flagged observations is
//! `1 − quantile`. Each observation is tested on its own; no multiple-testing adjustment is
//! applied, pick a larger `quantile` for very large datasets if that matters.
//!
//! ## Example
//!
//! ```rust,no_run
//! use fastmcd::observation_set::ObservationSet;
//! use fastmcd::outlier_detector::{OutlierDetector, OutlierParams};
//!
//! # let data: ObservationSet = unimplemented!();
//! let params = OutlierParams::builder().quantile(0.99).build().unwrap();
//! let report = OutlierDetector::new(params).detect(&data).unwrap();
//! println!("{} outliers: {:?}", report.n_outliers(), report.outlier_indices());
//! ```
use log::{debug, warn};
use statrs::distribution::{ChiSquared, ContinuousCDF};
use statrs::statistics::{Data, Median};

use crate::constants::{DistanceSq, Location, Scatter, DEFAULT_CHI2_QUANTILE};
use crate::fast_mcd::{McdEstimate, McdEstimation, McdParams};
use crate::linalg::{is_nonsingular, means_and_covariance};
use crate::mahalanobis::{maha_dist_sq, Hyperplane};
use crate::mcd_errors::McdError;
use crate::observation_set::ObservationSet;

/// Rescaling applied to an MCD scatter before classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScatterCorrection {
    /// Use the scatter as estimated.
    None,
    /// Scale so that the median squared distance equals the χ²_p median.
    Consistency,
}

/// Configuration of the [`OutlierDetector`].
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierParams {
    /// χ²_p quantile used as cutoff (default 0.975).
    pub quantile: f64,
    pub correction: ScatterCorrection,
    pub reweight: bool,
    /// Parameters of the underlying FAST-MCD run.
    pub mcd: McdParams,
}

impl OutlierParams {
    pub fn builder() -> OutlierParamsBuilder {
        OutlierParamsBuilder::new()
    }

    /// `quantile` must lie in the open interval (0, 1) and `mcd` must pass
    /// [`McdParams::validate`].
    pub fn validate(&self) -> Result<(), McdError> {
        let q = self.quantile;
        if !(q > 0.0 && q < 1.0) {
            return Err(McdError::InvalidMcdParameter(format!(
                "quantile must be in (0, 1), got {q}"
            )));
        }
        self.mcd.validate()
    }
}

impl Default for OutlierParams {
    fn default() -> Self {
        OutlierParams {
            quantile: DEFAULT_CHI2_QUANTILE,
            correction: ScatterCorrection::Consistency,
            reweight: true,
            mcd: McdParams::default(),
        }
    }
}

/// Builder for [`OutlierParams`], with validation.
#[derive(Debug, Clone, Default)]
pub struct OutlierParamsBuilder {
    params: OutlierParams,
}

impl OutlierParamsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quantile(mut self, v: f64) -> Self {
        self.params.quantile = v;
        self
    }
    pub fn correction(mut self, v: ScatterCorrection) -> Self {
        self.params.correction = v;
        self
    }
    pub fn reweight(mut self, v: bool) -> Self {
        self.params.reweight = v;
        self
    }
    pub fn mcd(mut self, v: McdParams) -> Self {
        self.params.mcd = v;
        self
    }

    /// Validate and return the parameters, see [`OutlierParams::validate`].
    pub fn build(self) -> Result<OutlierParams, McdError> {
        self.params.validate()?;
        Ok(self.params)
    }
}

/// Classification of every observation of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierReport {
    /// Raw FAST-MCD estimate.
    pub estimate: McdEstimate,
    /// Location used for the final distances (reweighted when enabled).
    pub location: Location,
    /// Scatter used for the final distances (corrected and/or reweighted when enabled).
    pub scatter: Scatter,
    /// Squared Mahalanobis distances, input order. Squared distances to the fitted
    /// hyperplane for an exact fit.
    pub distances: DistanceSq,
    /// `true` for outliers (`distances[i] > cutoff`), input order.
    pub flags: Vec<bool>,
    pub cutoff: f64,
    /// At least `h` observations lie on a hyperplane.
    pub exact_fit: bool,
}

impl OutlierReport {
    pub fn n_outliers(&self) -> usize {
        self.flags.iter().filter(|&&f| f).count()
    }

    pub fn outlier_indices(&self) -> Vec<usize> {
        self.flags
            .iter()
            .enumerate()
            .filter_map(|(i, &f)| f.then_some(i))
            .collect()
    }

    pub fn outlier_fraction(&self) -> f64 {
        self.n_outliers() as f64 / self.flags.len() as f64
    }
}

/// `quantile` of the χ² distribution with `p` degrees of freedom.
pub fn chi2_cutoff(p: usize, quantile: f64) -> Result<f64, McdError> {
    Ok(chi_squared(p)?.inverse_cdf(quantile))
}

fn chi_squared(p: usize) -> Result<ChiSquared, McdError> {
    ChiSquared::new(p as f64).map_err(|e| McdError::InvalidMcdParameter(e.to_string()))
}

/// Ratio `median(d²) / χ²_p median`, or `None` when the distances are degenerate.
fn consistency_factor(d2: &[f64], chi2: &ChiSquared) -> Option<f64> {
    let median = Data::new(d2.to_vec()).median();
    let factor = median / chi2.inverse_cdf(0.5);
    (factor.is_finite() && factor > 0.0).then_some(factor)
}

/// Outlier classifier built on FAST-MCD.
#[derive(Debug, Clone, Default)]
pub struct OutlierDetector {
    params: OutlierParams,
}

impl OutlierDetector {
    pub fn new(params: OutlierParams) -> Self {
        OutlierDetector { params }
    }

    pub fn params(&self) -> &OutlierParams {
        &self.params
    }

    /// Estimate location and scatter with FAST-MCD, then classify every observation.
    ///
    /// Errors
    /// ----------
    /// Every error of [`McdEstimation::estimate_mcd`] is propagated.
    pub fn detect(&self, data: &ObservationSet) -> Result<OutlierReport, McdError> {
        self.params.validate()?;
        let estimate = data.estimate_mcd(&self.params.mcd)?;
        self.classify(data, estimate)
    }

    /// Classify the observations of `data` against an existing estimate.
    ///
    /// Errors
    /// ----------
    /// * [`McdError::InvalidMcdParameter`] if the parameters fail [`OutlierParams::validate`].
    /// * [`McdError::DimensionMismatch`] if the estimate was computed for another dimension.
    ///
    /// A singular estimate is classified as an exact fit, see the module documentation.
    pub fn classify(
        &self,
        data: &ObservationSet,
        estimate: McdEstimate,
    ) -> Result<OutlierReport, McdError> {
        self.params.validate()?;
        if !is_nonsingular(&estimate.scatter) {
            return Self::classify_exact_fit(data, estimate);
        }

        let chi2 = chi_squared(data.p())?;
        let cutoff = chi2.inverse_cdf(self.params.quantile);

        let mut location = estimate.location.clone();
        let mut scatter = estimate.scatter.clone();
        let mut distances = maha_dist_sq(data, &location, &scatter)?;
        self.correct(&chi2, &mut scatter, &mut distances);

        if self.params.reweight {
            let inliers: Vec<usize> = (0..data.n()).filter(|&i| distances[i] <= cutoff).collect();
            debug!("reweighting on {} of {} observations", inliers.len(), data.n());

            if inliers.len() > data.p() {
                let (t, mut s) = means_and_covariance(&data.select_rows(&inliers));
                match maha_dist_sq(data, &t, &s) {
                    Ok(mut d2) => {
                        self.correct(&chi2, &mut s, &mut d2);
                        location = t;
                        scatter = s;
                        distances = d2;
                    }
                    Err(McdError::SingularScatter) => {
                        warn!("reweighted scatter is singular, keeping the raw estimate");
                    }
                    Err(err) => return Err(err),
                }
            } else {
                warn!(
                    "only {} inliers in {} dimensions, keeping the raw estimate",
                    inliers.len(),
                    data.p()
                );
            }
        }

        let flags = distances.iter().map(|&d| d > cutoff).collect();
        Ok(OutlierReport {
            estimate,
            location,
            scatter,
            distances,
            flags,
            cutoff,
            exact_fit: false,
        })
    }

    fn classify_exact_fit(
        data: &ObservationSet,
        estimate: McdEstimate,
    ) -> Result<OutlierReport, McdError> {
        let plane = Hyperplane::from_scatter(&estimate.location, &estimate.scatter)?;
        let distances = plane.dist_sq(data)?;
        let cutoff = plane.tolerance_sq();
        let flags: Vec<bool> = distances.iter().map(|&d| d > cutoff).collect();
        warn!(
            "exact fit: {} of {} observations lie on a hyperplane of codimension {}",
            flags.iter().filter(|&&f| !f).count(),
            data.n(),
            plane.codim()
        );

        Ok(OutlierReport {
            location: estimate.location.clone(),
            scatter: estimate.scatter.clone(),
            estimate,
            distances,
            flags,
            cutoff,
            exact_fit: true,
        })
    }

    fn correct(&self, chi2: &ChiSquared, scatter: &mut Scatter, distances: &mut [f64]) {
        if self.params.correction == ScatterCorrection::None {
            return;
        }
        match consistency_factor(distances, chi2) {
            Some(factor) => {
                debug!("consistency factor {factor:.6}");
                *scatter *= factor;
                distances.iter_mut().for_each(|d| *d /= factor);
            }
            None => warn!("degenerate distances, scatter left uncorrected"),
        }
    }
}
