use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::zones::ZoneContext;
use crate::error::HistError;

/// Kilometres to miles, applied to speed when imperial units are requested.
pub const MILES_PER_KM: f64 = 0.621_371_192;

/// Measured quantity selected for histogramming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesType {
    Power,
    PowerPerMass,
    HeartRate,
    Speed,
    Cadence,
    Torque,
}

/// Static discretization metadata for one series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesSpec {
    /// Bin resolution in native units.
    pub delta: f64,
    /// Decimal digits used when showing real-unit values.
    pub digits: u8,
}

/// Catalog lookup. Total over `SeriesType`.
#[must_use]
pub const fn series_spec(series: SeriesType) -> SeriesSpec {
    match series {
        SeriesType::Power => SeriesSpec {
            delta: 1.0,
            digits: 0,
        },
        SeriesType::PowerPerMass => SeriesSpec {
            delta: 0.01,
            digits: 2,
        },
        SeriesType::Torque => SeriesSpec {
            delta: 0.1,
            digits: 1,
        },
        SeriesType::HeartRate => SeriesSpec {
            delta: 1.0,
            digits: 0,
        },
        SeriesType::Speed => SeriesSpec {
            delta: 0.1,
            digits: 1,
        },
        SeriesType::Cadence => SeriesSpec {
            delta: 1.0,
            digits: 0,
        },
    }
}

impl SeriesType {
    pub const ALL: [SeriesType; 6] = [
        SeriesType::Power,
        SeriesType::PowerPerMass,
        SeriesType::HeartRate,
        SeriesType::Speed,
        SeriesType::Cadence,
        SeriesType::Torque,
    ];

    #[must_use]
    pub const fn spec(self) -> SeriesSpec {
        series_spec(self)
    }

    #[must_use]
    pub const fn delta(self) -> f64 {
        series_spec(self).delta
    }

    #[must_use]
    pub const fn digits(self) -> u8 {
        series_spec(self).digits
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Power => "power",
            Self::PowerPerMass => "power_per_mass",
            Self::HeartRate => "heart_rate",
            Self::Speed => "speed",
            Self::Cadence => "cadence",
            Self::Torque => "torque",
        }
    }

    /// Whether sample values are divided by rider mass before binning.
    #[must_use]
    pub const fn is_per_mass(self) -> bool {
        matches!(self, Self::PowerPerMass)
    }

    /// Zone table used when the histogram is shown in zones.
    ///
    /// Power-derived series share the power table; everything else is
    /// classified against heart-rate zones.
    #[must_use]
    pub const fn zone_context(self) -> ZoneContext {
        match self {
            Self::Power | Self::PowerPerMass | Self::Torque => ZoneContext::Power,
            Self::HeartRate | Self::Speed | Self::Cadence => ZoneContext::HeartRate,
        }
    }

    #[must_use]
    pub const fn unit_label(self, metric_units: bool) -> &'static str {
        match self {
            Self::Power => "W",
            Self::PowerPerMass => "W/kg",
            Self::HeartRate => "bpm",
            Self::Speed => {
                if metric_units {
                    "km/h"
                } else {
                    "mph"
                }
            }
            Self::Cadence => "rpm",
            Self::Torque => "Nm",
        }
    }

    /// Factor applied to native values before they are binned.
    #[must_use]
    pub const fn display_scale(self, metric_units: bool) -> f64 {
        match self {
            Self::Speed if !metric_units => MILES_PER_KM,
            _ => 1.0,
        }
    }
}

impl fmt::Display for SeriesType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SeriesType {
    type Err = HistError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let normalized = input.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|series| series.name() == normalized)
            .ok_or_else(|| HistError::InvalidConfiguration(format!("unknown series type: {input}")))
    }
}
