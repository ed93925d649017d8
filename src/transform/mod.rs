//! Series transformations used for display smoothing.
//!
//! # Example
//!
//! ```
//! use pharma_sales::transform::rolling_mean;
//!
//! let smoothed = rolling_mean(&[10.0, 20.0, 30.0, 40.0], 3, 1);
//! assert_eq!(smoothed, vec![10.0, 15.0, 20.0, 30.0]);
//! ```

pub mod window;

pub use window::rolling_mean;
