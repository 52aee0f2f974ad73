//! Sample providers consumed by the histogram engine.
//!
//! The engine only depends on [`SampleSource::stream`]; the session and the
//! date-range aggregate are two implementations of the same capability.

mod range;
mod session;

pub use range::{RangeAggregate, RangeSource, default_range_end, default_range_start};
pub use session::{RideSession, SessionSource};

use chrono::NaiveDate;

use crate::core::{Sample, SeriesType, SourceId, TimeRange};
use crate::error::HistResult;

/// Lazy, ordered sequence of samples for one series.
pub type SampleStream<'a> = Box<dyn Iterator<Item = Sample> + 'a>;

/// Contract implemented by every provider of histogram samples.
///
/// Implementations filter NaN and infinite values before yielding samples and
/// never yield negative duration weights.
pub trait SampleSource {
    /// Identity used by the engine for cache invalidation.
    fn id(&self) -> SourceId;

    /// Date used to size zone arrays before any sample is read.
    fn reference_date(&self) -> NaiveDate;

    /// Opens the sample stream for `series`.
    ///
    /// Returns `HistError::SourceUnavailable` when the provider holds no data
    /// for the series at all.
    fn stream(&self, series: SeriesType) -> HistResult<SampleStream<'_>>;

    /// Replaces the highlighted interval selection.
    ///
    /// Returns `false` when the source has no selection concept.
    fn set_selection(&mut self, _ranges: &[TimeRange]) -> bool {
        false
    }
}
