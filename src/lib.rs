pub mod constants;
pub mod fast_mcd;
pub mod linalg;
pub mod mahalanobis;
pub mod mcd_errors;
pub mod observation_set;
pub mod outlier_detector;

pub use fast_mcd::{McdEstimate, McdEstimation, McdParams, Strategy};
pub use mcd_errors::McdError;
pub use observation_set::ObservationSet;
pub use outlier_detector::{OutlierDetector, OutlierParams, OutlierReport, ScatterCorrection};
