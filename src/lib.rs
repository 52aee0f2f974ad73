//! hist-rs: binning and recomputation engine for activity histograms.
//!
//! Samples from a single recording session or from a date-range aggregate are
//! discretized per series precision, optionally classified into training
//! zones, and accumulated into time- or count-weighted histograms. The engine
//! memoizes its last result and only re-reads samples when a configuration
//! field that affects the result has changed.

pub mod api;
pub mod core;
pub mod error;
pub mod source;
pub mod telemetry;

pub use api::{EngineState, HistogramConfig, HistogramEngine, HistogramResult};
pub use error::{HistError, HistResult};
