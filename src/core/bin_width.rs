use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::core::series::SeriesType;
use crate::error::{HistError, HistResult};

/// Smallest bin width offered by the bin-width slider, in discretized units.
pub const BIN_WIDTH_SLIDER_MIN: u32 = 1;
/// Largest bin width offered by the bin-width slider, in discretized units.
pub const BIN_WIDTH_SLIDER_MAX: u32 = 100;

/// Outcome of converting a real-unit bin width into discretized units.
///
/// `clamped` is a non-fatal signal for UI feedback: the requested width
/// rounded below one unit (or was not a usable number) and was raised to 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinWidthConversion {
    pub bin_width: u32,
    pub clamped: bool,
}

#[must_use]
pub fn to_real_units(bin_width: u32, series: SeriesType) -> f64 {
    f64::from(bin_width) * series.delta()
}

#[must_use]
pub fn to_discretized_units(real_value: f64, series: SeriesType) -> BinWidthConversion {
    if !real_value.is_finite() {
        return BinWidthConversion {
            bin_width: 1,
            clamped: true,
        };
    }

    let units = (real_value / series.delta()).round();
    if units < 1.0 {
        return BinWidthConversion {
            bin_width: 1,
            clamped: true,
        };
    }

    BinWidthConversion {
        bin_width: units.min(f64::from(u32::MAX)) as u32,
        clamped: false,
    }
}

/// Real-unit range accepted by the bin-width text entry for `series`.
#[must_use]
pub fn real_bin_width_bounds(series: SeriesType) -> (f64, f64) {
    (
        to_real_units(BIN_WIDTH_SLIDER_MIN, series),
        to_real_units(BIN_WIDTH_SLIDER_MAX, series),
    )
}

/// Parses user-entered real-unit text without binary float drift
/// (`"0.3"` km/h is exactly three speed units).
pub fn parse_real_bin_width(text: &str, series: SeriesType) -> HistResult<BinWidthConversion> {
    let trimmed = text.trim();
    let value = Decimal::from_str(trimmed).map_err(|e| {
        HistError::InvalidConfiguration(format!("bin width `{trimmed}` is not a number: {e}"))
    })?;
    let delta = Decimal::from_str(&series.delta().to_string()).map_err(|e| {
        HistError::InvalidData(format!("series delta cannot be represented exactly: {e}"))
    })?;

    let units = value
        .checked_div(delta)
        .ok_or_else(|| {
            HistError::InvalidConfiguration(format!("bin width `{trimmed}` is out of range"))
        })?
        .round();
    if units < Decimal::ONE {
        return Ok(BinWidthConversion {
            bin_width: 1,
            clamped: true,
        });
    }
    let bin_width = units.to_u32().ok_or_else(|| {
        HistError::InvalidConfiguration(format!("bin width `{trimmed}` is out of range"))
    })?;

    Ok(BinWidthConversion {
        bin_width,
        clamped: false,
    })
}
