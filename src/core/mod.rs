pub mod bin_width;
pub mod sample;
pub mod series;
pub mod zones;

pub use bin_width::{
    BIN_WIDTH_SLIDER_MAX, BIN_WIDTH_SLIDER_MIN, BinWidthConversion, parse_real_bin_width,
    real_bin_width_bounds, to_discretized_units, to_real_units,
};
pub use sample::{RidePoint, Sample, SessionKey, SourceId, TimeRange};
pub use series::{MILES_PER_KM, SeriesSpec, SeriesType, series_spec};
pub use zones::{ZoneBand, ZoneClassifier, ZoneContext, ZoneRange, ZoneTable};
