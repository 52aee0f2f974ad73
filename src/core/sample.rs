use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::series::SeriesType;

/// One input data point as produced by a sample source.
///
/// `value` is in native units of the requested series; for
/// [`SeriesType::PowerPerMass`] it is the undivided power in watts and
/// `mass_kg` carries the divisor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub value: f64,
    pub duration_secs: f64,
    pub mass_kg: Option<f64>,
    pub date: NaiveDate,
    /// Zone index already assigned by the source, if any.
    pub zone: Option<usize>,
    pub selected: bool,
}

impl Sample {
    #[must_use]
    pub fn new(value: f64, duration_secs: f64, date: NaiveDate) -> Self {
        Self {
            value,
            duration_secs,
            mass_kg: None,
            date,
            zone: None,
            selected: false,
        }
    }

    #[must_use]
    pub fn with_mass_kg(mut self, mass_kg: f64) -> Self {
        self.mass_kg = Some(mass_kg);
        self
    }

    #[must_use]
    pub fn with_zone(mut self, zone: usize) -> Self {
        self.zone = Some(zone);
        self
    }

    #[must_use]
    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }
}

/// One recorded instant of a session. Missing channels are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RidePoint {
    pub secs: f64,
    #[serde(default)]
    pub watts: Option<f64>,
    #[serde(default)]
    pub heart_rate: Option<f64>,
    #[serde(default)]
    pub speed_kph: Option<f64>,
    #[serde(default)]
    pub cadence: Option<f64>,
    #[serde(default)]
    pub torque_nm: Option<f64>,
}

impl RidePoint {
    #[must_use]
    pub fn new(secs: f64) -> Self {
        Self {
            secs,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_watts(mut self, watts: f64) -> Self {
        self.watts = Some(watts);
        self
    }

    #[must_use]
    pub fn with_heart_rate(mut self, heart_rate: f64) -> Self {
        self.heart_rate = Some(heart_rate);
        self
    }

    #[must_use]
    pub fn with_speed_kph(mut self, speed_kph: f64) -> Self {
        self.speed_kph = Some(speed_kph);
        self
    }

    #[must_use]
    pub fn with_cadence(mut self, cadence: f64) -> Self {
        self.cadence = Some(cadence);
        self
    }

    #[must_use]
    pub fn with_torque_nm(mut self, torque_nm: f64) -> Self {
        self.torque_nm = Some(torque_nm);
        self
    }

    /// Channel backing `series`. Per-mass power reads the watts channel.
    #[must_use]
    pub fn channel(&self, series: SeriesType) -> Option<f64> {
        match series {
            SeriesType::Power | SeriesType::PowerPerMass => self.watts,
            SeriesType::HeartRate => self.heart_rate,
            SeriesType::Speed => self.speed_kph,
            SeriesType::Cadence => self.cadence,
            SeriesType::Torque => self.torque_nm,
        }
    }
}

/// Inclusive span of session time, in seconds from the session start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start_secs: f64,
    pub end_secs: f64,
}

impl TimeRange {
    #[must_use]
    pub fn new(start_secs: f64, end_secs: f64) -> Self {
        Self {
            start_secs: start_secs.min(end_secs),
            end_secs: start_secs.max(end_secs),
        }
    }

    #[must_use]
    pub fn contains(self, secs: f64) -> bool {
        secs >= self.start_secs && secs <= self.end_secs
    }
}

/// Stable key of a recording session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionKey(pub String);

impl SessionKey {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of the provider a histogram was computed from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SourceId {
    Session { key: SessionKey },
    Range { start: NaiveDate, end: NaiveDate },
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session { key } => write!(f, "session:{key}"),
            Self::Range { start, end } => write!(f, "range:{start}..={end}"),
        }
    }
}
