use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::{RidePoint, Sample, SeriesType, SessionKey, SourceId, TimeRange};
use crate::error::{HistError, HistResult};

use super::{SampleSource, SampleStream};

/// One recording session as handed over by ride storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RideSessionFields")]
pub struct RideSession {
    pub key: SessionKey,
    pub start: DateTime<Utc>,
    pub recording_interval_secs: f64,
    pub mass_kg: Option<f64>,
    pub points: Vec<RidePoint>,
}

#[derive(Deserialize)]
struct RideSessionFields {
    key: SessionKey,
    start: DateTime<Utc>,
    recording_interval_secs: f64,
    #[serde(default)]
    mass_kg: Option<f64>,
    #[serde(default)]
    points: Vec<RidePoint>,
}

impl TryFrom<RideSessionFields> for RideSession {
    type Error = HistError;

    fn try_from(fields: RideSessionFields) -> HistResult<Self> {
        let mut session = Self::new(fields.key, fields.start, fields.recording_interval_secs)?;
        session.mass_kg = fields.mass_kg;
        session.points = fields.points;
        Ok(session)
    }
}

impl RideSession {
    pub fn new(
        key: SessionKey,
        start: DateTime<Utc>,
        recording_interval_secs: f64,
    ) -> HistResult<Self> {
        if !recording_interval_secs.is_finite() || recording_interval_secs < 0.0 {
            return Err(HistError::InvalidData(
                "recording interval must be finite and >= 0".to_owned(),
            ));
        }
        Ok(Self {
            key,
            start,
            recording_interval_secs,
            mass_kg: None,
            points: Vec::new(),
        })
    }

    #[must_use]
    pub fn with_mass_kg(mut self, mass_kg: f64) -> Self {
        self.mass_kg = Some(mass_kg);
        self
    }

    #[must_use]
    pub fn with_points(mut self, points: Vec<RidePoint>) -> Self {
        self.points = points;
        self
    }

    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    #[must_use]
    pub fn has_channel(&self, series: SeriesType) -> bool {
        self.points
            .iter()
            .any(|point| point.channel(series).is_some())
    }

    /// Finite channel values paired with their point, in recording order.
    pub(super) fn finite_values(
        &self,
        series: SeriesType,
    ) -> impl Iterator<Item = (&RidePoint, f64)> + '_ {
        self.points.iter().filter_map(move |point| {
            let value = point.channel(series)?;
            if value.is_finite() {
                Some((point, value))
            } else {
                trace!(secs = point.secs, %series, "drop non-finite sample value");
                None
            }
        })
    }
}

/// Sample source over a single session with an optional interval selection.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSource {
    session: RideSession,
    selection: Vec<TimeRange>,
}

impl SessionSource {
    #[must_use]
    pub fn new(session: RideSession) -> Self {
        Self {
            session,
            selection: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_selection(mut self, selection: Vec<TimeRange>) -> Self {
        self.selection = selection;
        self
    }

    #[must_use]
    pub fn session(&self) -> &RideSession {
        &self.session
    }

    #[must_use]
    pub fn selection(&self) -> &[TimeRange] {
        &self.selection
    }

    fn is_selected(&self, secs: f64) -> bool {
        self.selection.iter().any(|range| range.contains(secs))
    }
}

impl SampleSource for SessionSource {
    fn id(&self) -> SourceId {
        SourceId::Session {
            key: self.session.key.clone(),
        }
    }

    fn reference_date(&self) -> NaiveDate {
        self.session.date()
    }

    fn stream(&self, series: SeriesType) -> HistResult<SampleStream<'_>> {
        if !self.session.points.is_empty() && !self.session.has_channel(series) {
            return Err(HistError::SourceUnavailable(format!(
                "session {} has no {series} channel",
                self.session.key
            )));
        }

        let date = self.session.date();
        let duration_secs = self.session.recording_interval_secs;
        let mass_kg = self.session.mass_kg;
        Ok(Box::new(self.session.finite_values(series).map(
            move |(point, value)| Sample {
                value,
                duration_secs,
                mass_kg,
                date,
                zone: None,
                selected: self.is_selected(point.secs),
            },
        )))
    }

    fn set_selection(&mut self, ranges: &[TimeRange]) -> bool {
        self.selection = ranges.to_vec();
        true
    }
}
