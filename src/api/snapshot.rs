use serde::{Deserialize, Serialize};

use crate::core::ZoneBand;

use super::{EngineState, HistogramConfig, HistogramEngine, HistogramResult, RecomputeStats};

/// Serializable view of an engine for regression fixtures and debugging.
///
/// `zone_bands` are the bands applying on the source's reference date, in
/// native units; empty unless the histogram is zoned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub state: EngineState,
    pub config: HistogramConfig,
    pub stats: RecomputeStats,
    pub unit: String,
    pub real_bin_width: f64,
    pub zone_bands: Vec<ZoneBand>,
    pub result: Option<HistogramResult>,
}

impl HistogramEngine {
    #[must_use]
    pub fn snapshot(&self) -> EngineSnapshot {
        let config = self.config();
        let context = config.series.zone_context();
        let classifier = self.zone_classifier();
        let zone_bands = self
            .reference_date()
            .filter(|_| config.zoned)
            .and_then(|date| classifier.which_range(context, date))
            .map(|range| classifier.zone_bands(context, range, None))
            .unwrap_or_default();

        EngineSnapshot {
            state: self.state(),
            config: config.clone(),
            stats: self.stats(),
            unit: config.series.unit_label(config.metric_units).to_owned(),
            real_bin_width: self.bin_width_real_units(),
            zone_bands,
            result: self.result().map(|result| (*result).clone()),
        }
    }
}
