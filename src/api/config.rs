use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::core::{SeriesType, SourceId, to_real_units};

/// Every input that determines a histogram result.
///
/// Plain value record: two configs produce the same result iff they compare
/// equal, which is what the engine uses to decide whether to recompute. The
/// type is serializable so host applications can persist chart setup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HistogramConfig {
    #[serde(default)]
    pub source: Option<SourceId>,
    #[serde(default = "default_series")]
    pub series: SeriesType,
    /// Bin width in discretized units of `series` (see `SeriesSpec::delta`).
    #[serde(
        default = "default_bin_width",
        deserialize_with = "deserialize_bin_width"
    )]
    pub bin_width: u32,
    #[serde(default)]
    pub with_zeros: bool,
    #[serde(default)]
    pub zoned: bool,
    /// Rendering-only toggle, kept so cached results follow every chart setting.
    #[serde(default = "default_true")]
    pub shade_zones: bool,
    #[serde(default)]
    pub normalize_to_percent: bool,
    #[serde(default = "default_true")]
    pub use_absolute_time: bool,
    #[serde(default = "default_true")]
    pub metric_units: bool,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            source: None,
            series: default_series(),
            bin_width: default_bin_width(),
            with_zeros: false,
            zoned: false,
            shade_zones: default_true(),
            normalize_to_percent: false,
            use_absolute_time: default_true(),
            metric_units: default_true(),
        }
    }
}

impl HistogramConfig {
    #[must_use]
    pub fn new(series: SeriesType, bin_width: u32) -> Self {
        Self {
            series,
            bin_width,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: SourceId) -> Self {
        self.source = Some(source);
        self
    }

    #[must_use]
    pub fn with_series(mut self, series: SeriesType) -> Self {
        self.series = series;
        self
    }

    #[must_use]
    pub fn with_bin_width(mut self, bin_width: u32) -> Self {
        self.bin_width = bin_width;
        self
    }

    #[must_use]
    pub fn with_zeros(mut self, with_zeros: bool) -> Self {
        self.with_zeros = with_zeros;
        self
    }

    #[must_use]
    pub fn with_zoned(mut self, zoned: bool) -> Self {
        self.zoned = zoned;
        self
    }

    #[must_use]
    pub fn with_shade_zones(mut self, shade_zones: bool) -> Self {
        self.shade_zones = shade_zones;
        self
    }

    #[must_use]
    pub fn with_normalize_to_percent(mut self, normalize_to_percent: bool) -> Self {
        self.normalize_to_percent = normalize_to_percent;
        self
    }

    #[must_use]
    pub fn with_absolute_time(mut self, use_absolute_time: bool) -> Self {
        self.use_absolute_time = use_absolute_time;
        self
    }

    #[must_use]
    pub fn with_metric_units(mut self, metric_units: bool) -> Self {
        self.metric_units = metric_units;
        self
    }

    /// Bin width in display units.
    #[must_use]
    pub fn real_bin_width(&self) -> f64 {
        to_real_units(self.bin_width, self.series)
    }

    /// Raises a zero bin width to the minimum discretized unit.
    ///
    /// Returns `true` when clamping happened.
    pub(super) fn clamp_bin_width(&mut self) -> bool {
        if self.bin_width == 0 {
            warn!(series = %self.series, "bin width 0 clamped to 1");
            self.bin_width = 1;
            return true;
        }
        false
    }
}

fn default_series() -> SeriesType {
    SeriesType::Power
}

fn default_bin_width() -> u32 {
    10
}

fn default_true() -> bool {
    true
}

/// Accepts any integer so non-positive widths reach `configure`, where they
/// are clamped and reported instead of failing deserialization.
fn deserialize_bin_width<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = i64::deserialize(deserializer)?;
    Ok(u32::try_from(raw.max(0)).unwrap_or(u32::MAX))
}
