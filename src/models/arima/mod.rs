//! ARIMA (Autoregressive Integrated Moving Average) models.
//!
//! Orders are fixed by the caller; parameters are estimated by minimising the
//! conditional sum of squares with Nelder-Mead.

mod diff;
mod model;

pub use diff::{difference, integrate};
pub use model::{Arima, ArimaOrder};
