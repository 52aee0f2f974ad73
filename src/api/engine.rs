use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::core::{
    BinWidthConversion, SourceId, TimeRange, ZoneClassifier, parse_real_bin_width,
    to_discretized_units,
};
use crate::error::{HistError, HistResult};
use crate::source::SampleSource;

use super::accumulator::HistogramAccumulator;
use super::{HistogramConfig, HistogramResult};

/// Cache state of the engine relative to its active configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EngineState {
    /// No result computed yet.
    #[default]
    Empty,
    /// The published result matches the active configuration.
    Valid,
    /// An input changed since the last computation.
    Stale,
}

/// What `configure` did with the requested configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigureOutcome {
    pub state: EngineState,
    /// `true` when a zero bin width was raised to 1.
    pub clamped_bin_width: bool,
}

/// Runtime counters exposed for diagnostics and cache tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecomputeStats {
    pub cache_hits: u64,
    pub full_passes: u64,
    pub samples_read: u64,
}

/// Histogram state machine: owns configuration, source, zone tables and the
/// last published result.
///
/// Operations take `&mut self`; callers serialize configuration changes and
/// recompute requests. Each instance keeps its own last-computed
/// configuration, so several chart views can hold independent engines.
pub struct HistogramEngine {
    config: HistogramConfig,
    last_computed: Option<HistogramConfig>,
    result: Option<Arc<HistogramResult>>,
    source: Option<Box<dyn SampleSource>>,
    classifier: ZoneClassifier,
    inputs_dirty: bool,
    state: EngineState,
    stats: RecomputeStats,
}

impl Default for HistogramEngine {
    fn default() -> Self {
        Self::new(HistogramConfig::default())
    }
}

impl HistogramEngine {
    #[must_use]
    pub fn new(mut config: HistogramConfig) -> Self {
        config.clamp_bin_width();
        // identity only comes from an attached source
        config.source = None;
        Self {
            config,
            last_computed: None,
            result: None,
            source: None,
            classifier: ZoneClassifier::default(),
            inputs_dirty: false,
            state: EngineState::Empty,
            stats: RecomputeStats::default(),
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: Box<dyn SampleSource>) -> Self {
        let _ = self.replace_source(source);
        self
    }

    #[must_use]
    pub fn with_zone_classifier(mut self, classifier: ZoneClassifier) -> Self {
        self.set_zone_classifier(classifier);
        self
    }

    #[must_use]
    pub fn config(&self) -> &HistogramConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> EngineState {
        self.state
    }

    #[must_use]
    pub fn stats(&self) -> RecomputeStats {
        self.stats
    }

    #[must_use]
    pub fn result(&self) -> Option<Arc<HistogramResult>> {
        self.result.clone()
    }

    #[must_use]
    pub fn source_id(&self) -> Option<SourceId> {
        self.source.as_ref().map(|source| source.id())
    }

    /// Date the attached source sizes zone arrays with.
    #[must_use]
    pub fn reference_date(&self) -> Option<NaiveDate> {
        self.source.as_ref().map(|source| source.reference_date())
    }

    #[must_use]
    pub fn zone_classifier(&self) -> &ZoneClassifier {
        &self.classifier
    }

    /// Replaces the active configuration.
    ///
    /// A zero bin width is clamped to 1 and reported in the outcome. A `None`
    /// source keeps the attached source; a different identity is rejected with
    /// `InvalidConfiguration` and leaves the engine untouched, since sources
    /// are swapped through [`Self::replace_source`].
    pub fn configure(&mut self, mut config: HistogramConfig) -> HistResult<ConfigureOutcome> {
        let attached = self.source_id();
        if config.source.is_none() {
            config.source = attached;
        } else if config.source != attached {
            return Err(HistError::InvalidConfiguration(format!(
                "source {} is not attached (attached: {})",
                describe_source(config.source.as_ref()),
                describe_source(attached.as_ref())
            )));
        }

        let clamped_bin_width = config.clamp_bin_width();
        self.config = config;
        self.refresh_state();
        debug!(state = ?self.state, series = %self.config.series, bin_width = self.config.bin_width, "configure");

        Ok(ConfigureOutcome {
            state: self.state,
            clamped_bin_width,
        })
    }

    /// Attaches `source` and returns the previously attached one.
    ///
    /// The new source is in place before the old one is handed back, so no
    /// reader ever observes a half-swapped engine. Any swap invalidates the
    /// cache, even when the identity is unchanged (reloaded session data).
    pub fn replace_source(
        &mut self,
        source: Box<dyn SampleSource>,
    ) -> Option<Box<dyn SampleSource>> {
        let id = source.id();
        let previous = self.source.replace(source);
        debug!(source = %id, had_previous = previous.is_some(), "replace sample source");
        self.config.source = Some(id);
        self.inputs_dirty = true;
        self.refresh_state();
        previous
    }

    pub fn detach_source(&mut self) -> Option<Box<dyn SampleSource>> {
        let previous = self.source.take();
        if previous.is_some() {
            self.config.source = None;
            self.inputs_dirty = true;
            self.refresh_state();
        }
        previous
    }

    /// Forwards a new interval selection to the source.
    ///
    /// Returns `false` when the source has no selection concept; otherwise the
    /// next non-forced recompute re-reads samples.
    pub fn update_selection(&mut self, ranges: &[TimeRange]) -> bool {
        let Some(source) = self.source.as_mut() else {
            return false;
        };
        if !source.set_selection(ranges) {
            trace!("source ignores interval selection");
            return false;
        }
        self.inputs_dirty = true;
        self.refresh_state();
        true
    }

    /// Replaces zone tables. Only zoned histograms depend on them.
    pub fn set_zone_classifier(&mut self, classifier: ZoneClassifier) {
        self.classifier = classifier;
        if self.config.zoned {
            self.inputs_dirty = true;
        }
        self.refresh_state();
    }

    /// Returns the result for the active configuration.
    ///
    /// Without `force`, a valid cached result is returned as the same `Arc`
    /// without touching the source. Otherwise samples are re-read and a new
    /// result is published in one step.
    pub fn recompute(&mut self, force: bool) -> Arc<HistogramResult> {
        if !force && self.state == EngineState::Valid {
            if let Some(result) = &self.result {
                self.stats.cache_hits += 1;
                trace!("recompute skipped: configuration unchanged");
                return Arc::clone(result);
            }
        }

        let result = Arc::new(self.compute());
        debug!(
            series = %result.series,
            bins = result.bin_count,
            samples = result.diagnostics.samples_read,
            skipped_clamped = result.diagnostics.skipped_clamped,
            force,
            "histogram recomputed"
        );

        self.stats.full_passes += 1;
        self.stats.samples_read += result.diagnostics.samples_read;
        self.result = Some(Arc::clone(&result));
        self.last_computed = Some(self.config.clone());
        self.inputs_dirty = false;
        self.state = EngineState::Valid;
        result
    }

    fn compute(&self) -> HistogramResult {
        let series = self.config.series;
        let zone_count = self.source.as_ref().map_or(0, |source| {
            self.classifier
                .zone_count(series.zone_context(), source.reference_date())
        });
        let mut accumulator = HistogramAccumulator::new(&self.config, &self.classifier, zone_count);

        match &self.source {
            None => {
                warn!(%series, "no sample source attached; publishing empty histogram");
                accumulator.mark_source_unavailable();
            }
            Some(source) => match source.stream(series) {
                Ok(stream) => stream.for_each(|sample| accumulator.push(sample)),
                Err(err) => {
                    warn!(error = %err, "sample source unavailable; publishing empty histogram");
                    accumulator.mark_source_unavailable();
                }
            },
        }

        accumulator.finish()
    }

    fn refresh_state(&mut self) {
        self.state = match (&self.result, &self.last_computed) {
            (None, _) => EngineState::Empty,
            (Some(_), Some(last)) if !self.inputs_dirty && *last == self.config => {
                EngineState::Valid
            }
            _ => EngineState::Stale,
        };
    }

    /// Bin resolution of the active series, for input validators.
    #[must_use]
    pub fn get_delta(&self) -> f64 {
        self.config.series.delta()
    }

    /// Display precision of the active series, for input validators.
    #[must_use]
    pub fn get_digits(&self) -> u8 {
        self.config.series.digits()
    }

    #[must_use]
    pub fn bin_width_real_units(&self) -> f64 {
        self.config.real_bin_width()
    }

    /// Sets the bin width from a display-unit value and returns the
    /// discretized width actually applied.
    pub fn set_bin_width_real_units(&mut self, value: f64) -> BinWidthConversion {
        let conversion = to_discretized_units(value, self.config.series);
        if conversion.clamped {
            warn!(requested = value, series = %self.config.series, "bin width clamped to 1 unit");
        }
        self.apply_bin_width(conversion);
        conversion
    }

    /// Same as [`Self::set_bin_width_real_units`] for raw text entry.
    pub fn set_bin_width_text(&mut self, text: &str) -> HistResult<BinWidthConversion> {
        let conversion = parse_real_bin_width(text, self.config.series)?;
        if conversion.clamped {
            warn!(requested = text, series = %self.config.series, "bin width clamped to 1 unit");
        }
        self.apply_bin_width(conversion);
        Ok(conversion)
    }

    fn apply_bin_width(&mut self, conversion: BinWidthConversion) {
        self.config.bin_width = conversion.bin_width;
        self.refresh_state();
    }
}

fn describe_source(id: Option<&SourceId>) -> String {
    id.map_or_else(|| "none".to_owned(), ToString::to_string)
}
