use serde::{Deserialize, Serialize};

use crate::core::SeriesType;

/// Per-pass bookkeeping of what happened to the sample stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecomputeDiagnostics {
    pub samples_read: u64,
    pub samples_binned: u64,
    /// Zero values dropped because zeros were excluded.
    pub skipped_zero: u64,
    /// Clamped samples: negative, oversized, or missing a usable mass.
    pub skipped_clamped: u64,
    /// Binned samples without an applicable zone band.
    pub unclassified: u64,
    pub source_unavailable: bool,
}

/// Histogram arrays published by the engine.
///
/// Published behind an `Arc` and never mutated afterwards; a recompute that
/// is not a no-op replaces the whole value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramResult {
    pub series: SeriesType,
    pub bin_width: u32,
    pub real_bin_width: f64,
    pub normalized: bool,
    pub counts: Vec<f64>,
    pub zone_counts: Vec<f64>,
    pub selected_counts: Vec<f64>,
    pub selected_zone_counts: Vec<f64>,
    pub bin_count: usize,
    pub diagnostics: RecomputeDiagnostics,
}

/// One bucket expressed in real units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub index: usize,
    pub range_start: f64,
    pub range_end: f64,
    pub count: f64,
    pub selected: f64,
}

impl HistogramResult {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|count| *count == 0.0)
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.counts.iter().sum()
    }

    #[must_use]
    pub fn selected_total(&self) -> f64 {
        self.selected_counts.iter().sum()
    }

    #[must_use]
    pub fn zone_total(&self) -> f64 {
        self.zone_counts.iter().sum()
    }

    pub fn bins(&self) -> impl Iterator<Item = HistogramBin> + '_ {
        let width = self.real_bin_width;
        self.counts
            .iter()
            .zip(&self.selected_counts)
            .enumerate()
            .map(move |(index, (count, selected))| HistogramBin {
                index,
                range_start: index as f64 * width,
                range_end: (index + 1) as f64 * width,
                count: *count,
                selected: *selected,
            })
    }
}
