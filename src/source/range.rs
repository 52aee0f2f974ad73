use std::sync::Arc;

use chrono::NaiveDate;
use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use tracing::debug;

use crate::core::{Sample, SeriesType, SourceId};
use crate::error::{HistError, HistResult};

use super::{RideSession, SampleSource, SampleStream};

/// Lower bound used when a season has no start date.
#[must_use]
pub fn default_range_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Upper bound used when a season has no end date.
#[must_use]
pub fn default_range_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(3000, 12, 31).unwrap_or(NaiveDate::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct AggregateKey {
    date: NaiveDate,
    value: OrderedFloat<f64>,
    mass_kg: Option<OrderedFloat<f64>>,
}

/// Time spent at each distinct value, per series, over an inclusive date range.
///
/// Per-mass power is served from the power buckets, which keep the rider mass
/// of the contributing session.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeAggregate {
    start: NaiveDate,
    end: NaiveDate,
    buckets: IndexMap<SeriesType, IndexMap<AggregateKey, f64>>,
    session_count: usize,
}

impl RangeAggregate {
    pub fn new(start: NaiveDate, end: NaiveDate) -> HistResult<Self> {
        if end < start {
            return Err(HistError::InvalidData(format!(
                "range end {end} precedes start {start}"
            )));
        }
        Ok(Self {
            start,
            end,
            buckets: IndexMap::new(),
            session_count: 0,
        })
    }

    /// Range with missing bounds widened to the default season limits.
    pub fn open_ended(start: Option<NaiveDate>, end: Option<NaiveDate>) -> HistResult<Self> {
        Self::new(
            start.unwrap_or_else(default_range_start),
            end.unwrap_or_else(default_range_end),
        )
    }

    #[must_use]
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    #[must_use]
    pub fn session_count(&self) -> usize {
        self.session_count
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Folds `session` into the aggregate. Sessions dated outside the range
    /// are ignored and reported with `false`.
    pub fn add_session(&mut self, session: &RideSession) -> bool {
        let date = session.date();
        if !self.contains(date) {
            debug!(session = %session.key, %date, "session outside aggregate range");
            return false;
        }

        let weight = session.recording_interval_secs;
        for series in SeriesType::ALL {
            if series.is_per_mass() {
                continue;
            }
            let mass_kg = match series {
                SeriesType::Power => session.mass_kg.map(OrderedFloat),
                _ => None,
            };
            for (_, value) in session.finite_values(series) {
                let key = AggregateKey {
                    date,
                    value: OrderedFloat(value),
                    mass_kg,
                };
                *self
                    .buckets
                    .entry(series)
                    .or_default()
                    .entry(key)
                    .or_insert(0.0) += weight;
            }
        }
        self.session_count += 1;
        true
    }

    /// Number of distinct pre-aggregated samples stored for `series`.
    #[must_use]
    pub fn bucket_count(&self, series: SeriesType) -> usize {
        self.buckets
            .get(&storage_series(series))
            .map_or(0, IndexMap::len)
    }

    fn samples(&self, series: SeriesType) -> Option<impl Iterator<Item = Sample> + '_> {
        let buckets = self.buckets.get(&storage_series(series))?;
        Some(buckets.iter().map(|(key, seconds)| Sample {
            value: key.value.into_inner(),
            duration_secs: *seconds,
            mass_kg: key.mass_kg.map(OrderedFloat::into_inner),
            date: key.date,
            zone: None,
            selected: false,
        }))
    }
}

fn storage_series(series: SeriesType) -> SeriesType {
    if series.is_per_mass() {
        SeriesType::Power
    } else {
        series
    }
}

/// Sample source over a shared date-range aggregate.
#[derive(Debug, Clone)]
pub struct RangeSource {
    aggregate: Arc<RangeAggregate>,
}

impl RangeSource {
    #[must_use]
    pub fn new(aggregate: Arc<RangeAggregate>) -> Self {
        Self { aggregate }
    }

    #[must_use]
    pub fn aggregate(&self) -> &RangeAggregate {
        &self.aggregate
    }
}

impl SampleSource for RangeSource {
    fn id(&self) -> SourceId {
        SourceId::Range {
            start: self.aggregate.start,
            end: self.aggregate.end,
        }
    }

    fn reference_date(&self) -> NaiveDate {
        self.aggregate.end
    }

    fn stream(&self, series: SeriesType) -> HistResult<SampleStream<'_>> {
        match self.aggregate.samples(series) {
            Some(samples) => Ok(Box::new(samples)),
            None if self.aggregate.session_count == 0 => Ok(Box::new(std::iter::empty())),
            None => Err(HistError::SourceUnavailable(format!(
                "range {}..={} has no {series} samples",
                self.aggregate.start, self.aggregate.end
            ))),
        }
    }
}
