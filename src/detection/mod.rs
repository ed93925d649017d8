//! Detection utilities for sales series.
//!
//! Currently provides z-score outlier flagging of a whole column.

mod outlier;

pub use outlier::{detect_outliers, z_scores, OutlierConfig, OutlierResult};
