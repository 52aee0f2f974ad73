use chrono::NaiveDate;
use tracing::trace;

use crate::core::{Sample, ZoneClassifier, ZoneContext};

use super::{HistogramConfig, HistogramResult, RecomputeDiagnostics};

/// Upper bound on bins grown by a single pass.
pub const MAX_BIN_COUNT: usize = 1 << 20;

/// Upper bound on zone slots when no zone table applies to a pre-assigned zone.
pub const MAX_ZONE_COUNT: usize = 64;

/// Absorbs float noise so `0.3 / 0.1` lands on unit 3, not 2.
const UNIT_EPSILON: f64 = 1e-9;

/// Single-pass accumulator behind `HistogramEngine::recompute`.
///
/// Zero filtering and zone classification happen per sample; percent
/// normalization only runs in `finish`.
pub(super) struct HistogramAccumulator<'a> {
    config: &'a HistogramConfig,
    classifier: &'a ZoneClassifier,
    context: ZoneContext,
    delta: f64,
    scale: f64,
    counts: Vec<f64>,
    selected_counts: Vec<f64>,
    zone_counts: Vec<f64>,
    selected_zone_counts: Vec<f64>,
    diagnostics: RecomputeDiagnostics,
}

impl<'a> HistogramAccumulator<'a> {
    pub(super) fn new(
        config: &'a HistogramConfig,
        classifier: &'a ZoneClassifier,
        zone_count: usize,
    ) -> Self {
        let zone_count = if config.zoned { zone_count } else { 0 };
        Self {
            config,
            classifier,
            context: config.series.zone_context(),
            delta: config.series.delta(),
            scale: config.series.display_scale(config.metric_units),
            counts: Vec::new(),
            selected_counts: Vec::new(),
            zone_counts: vec![0.0; zone_count],
            selected_zone_counts: vec![0.0; zone_count],
            diagnostics: RecomputeDiagnostics::default(),
        }
    }

    pub(super) fn mark_source_unavailable(&mut self) {
        self.diagnostics.source_unavailable = true;
    }

    pub(super) fn push(&mut self, sample: Sample) {
        self.diagnostics.samples_read += 1;

        if !sample.value.is_finite()
            || sample.value < 0.0
            || !sample.duration_secs.is_finite()
            || sample.duration_secs < 0.0
        {
            trace!(value = sample.value, "skip malformed sample");
            self.diagnostics.skipped_clamped += 1;
            return;
        }

        let value = sample.value * self.scale;
        if value == 0.0 && !self.config.with_zeros {
            self.diagnostics.skipped_zero += 1;
            return;
        }

        let binned_value = if self.config.series.is_per_mass() {
            match sample.mass_kg {
                Some(mass) if mass.is_finite() && mass > 0.0 => value / mass,
                _ => {
                    trace!(mass_kg = ?sample.mass_kg, "skip per-mass sample without usable mass");
                    self.diagnostics.skipped_clamped += 1;
                    return;
                }
            }
        } else {
            value
        };

        let Some(bin) = self.bin_index(binned_value) else {
            trace!(value = binned_value, "skip sample beyond bin limit");
            self.diagnostics.skipped_clamped += 1;
            return;
        };

        let weight = if self.config.use_absolute_time {
            sample.duration_secs
        } else {
            1.0
        };

        if self.counts.len() <= bin {
            self.counts.resize(bin + 1, 0.0);
            self.selected_counts.resize(bin + 1, 0.0);
        }
        self.counts[bin] += weight;
        if sample.selected {
            self.selected_counts[bin] += weight;
        }
        self.diagnostics.samples_binned += 1;

        if self.config.zoned {
            // zone tables are authored in native units, so per-mass power is
            // classified on the undivided watts
            let zone = match sample.zone {
                Some(zone) => self.accept_assigned_zone(zone, sample.date),
                None => self.classifier.classify(value, sample.date, self.context),
            };
            match zone {
                Some(zone) => {
                    if self.zone_counts.len() <= zone {
                        self.zone_counts.resize(zone + 1, 0.0);
                        self.selected_zone_counts.resize(zone + 1, 0.0);
                    }
                    self.zone_counts[zone] += weight;
                    if sample.selected {
                        self.selected_zone_counts[zone] += weight;
                    }
                }
                None => self.diagnostics.unclassified += 1,
            }
        }
    }

    /// A zone handed over by the source must fit the bands applying on its
    /// date, or the fixed cap when no table covers that date.
    fn accept_assigned_zone(&self, zone: usize, date: NaiveDate) -> Option<usize> {
        let limit = match self.classifier.zone_count(self.context, date) {
            0 => MAX_ZONE_COUNT,
            bands => bands,
        };
        if zone < limit {
            Some(zone)
        } else {
            trace!(zone, limit, %date, "drop out-of-range pre-assigned zone");
            None
        }
    }

    fn bin_index(&self, value: f64) -> Option<usize> {
        let units = (value / self.delta + UNIT_EPSILON).floor();
        let bin = (units / f64::from(self.config.bin_width)).floor();
        if bin >= MAX_BIN_COUNT as f64 {
            return None;
        }
        Some(bin as usize)
    }

    pub(super) fn finish(mut self) -> HistogramResult {
        if self.config.normalize_to_percent {
            percentify(&mut self.counts, &mut self.selected_counts);
            percentify(&mut self.zone_counts, &mut self.selected_zone_counts);
        }

        HistogramResult {
            series: self.config.series,
            bin_width: self.config.bin_width,
            real_bin_width: self.config.real_bin_width(),
            normalized: self.config.normalize_to_percent,
            bin_count: self.counts.len(),
            counts: self.counts,
            zone_counts: self.zone_counts,
            selected_counts: self.selected_counts,
            selected_zone_counts: self.selected_zone_counts,
            diagnostics: self.diagnostics,
        }
    }
}

/// Scales `values` to sum 100 and applies the same factor to its selected
/// mirror. All-zero input is left untouched.
fn percentify(values: &mut [f64], selected: &mut [f64]) {
    let total: f64 = values.iter().sum();
    if total <= 0.0 {
        return;
    }
    let factor = 100.0 / total;
    values.iter_mut().for_each(|value| *value *= factor);
    selected.iter_mut().for_each(|value| *value *= factor);
}
