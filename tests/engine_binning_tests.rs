use approx::assert_abs_diff_eq;
use chrono::{NaiveDate, TimeZone, Utc};
use hist_rs::api::{HistogramConfig, HistogramEngine};
use hist_rs::core::{
    MILES_PER_KM, RidePoint, SeriesType, SessionKey, TimeRange, ZoneClassifier, ZoneRange,
    ZoneTable,
};
use hist_rs::source::{RideSession, SessionSource};

fn session_with_watts(watts: &[f64]) -> RideSession {
    let start = Utc
        .with_ymd_and_hms(2024, 4, 12, 6, 0, 0)
        .single()
        .expect("start");
    let points = watts
        .iter()
        .enumerate()
        .map(|(i, w)| RidePoint::new(i as f64).with_watts(*w))
        .collect();
    RideSession::new(SessionKey::new("scenario"), start, 1.0)
        .expect("session")
        .with_mass_kg(50.0)
        .with_points(points)
}

fn power_zones() -> ZoneClassifier {
    let from = NaiveDate::from_ymd_opt(2024, 1, 1).expect("date");
    let power = ZoneTable::new(vec![
        ZoneRange::new(from, None, [0.0, 100.0, 200.0], ["Z1", "Z2", "Z3"]).expect("range"),
    ]);
    ZoneClassifier::new(power, ZoneTable::default())
}

fn engine_for(session: RideSession, config: HistogramConfig) -> HistogramEngine {
    let mut engine = HistogramEngine::new(config)
        .with_zone_classifier(power_zones())
        .with_source(Box::new(SessionSource::new(session)));
    let config = engine.config().clone();
    engine.configure(config).expect("configure");
    engine
}

#[test]
fn absolute_time_scenario_bins_by_ten_watts() {
    let config = HistogramConfig::new(SeriesType::Power, 10)
        .with_zeros(true)
        .with_absolute_time(true);
    let mut engine = engine_for(session_with_watts(&[5.0, 15.0, 25.0, 5.0]), config);

    let result = engine.recompute(false);
    assert_eq!(result.counts, vec![2.0, 1.0, 1.0]);
    assert_eq!(result.bin_count, 3);
    assert_eq!(result.selected_counts, vec![0.0, 0.0, 0.0]);
    assert!(result.zone_counts.is_empty());
}

#[test]
fn zero_values_are_excluded_from_every_array_without_zeros() {
    let config = HistogramConfig::new(SeriesType::Power, 10)
        .with_zeros(false)
        .with_zoned(true);
    let session = session_with_watts(&[5.0, 15.0, 0.0, 25.0, 5.0]);
    let mut engine = engine_for(session.clone(), config.clone());

    let result = engine.recompute(false);
    assert_eq!(result.counts, vec![2.0, 1.0, 1.0]);
    assert_eq!(result.zone_counts, vec![4.0, 0.0, 0.0]);
    assert_eq!(result.diagnostics.skipped_zero, 1);

    let mut with_zeros = engine_for(session, config.with_zeros(true));
    let result = with_zeros.recompute(false);
    assert_eq!(result.counts, vec![3.0, 1.0, 1.0]);
    assert_eq!(result.zone_counts, vec![5.0, 0.0, 0.0]);
}

#[test]
fn count_mode_ignores_duration_weight() {
    let start = Utc
        .with_ymd_and_hms(2024, 4, 12, 6, 0, 0)
        .single()
        .expect("start");
    let session = RideSession::new(SessionKey::new("slow-logger"), start, 4.0)
        .expect("session")
        .with_points(vec![
            RidePoint::new(0.0).with_watts(90.0),
            RidePoint::new(4.0).with_watts(95.0),
            RidePoint::new(8.0).with_watts(120.0),
        ]);

    let mut timed = engine_for(
        session.clone(),
        HistogramConfig::new(SeriesType::Power, 50).with_absolute_time(true),
    );
    assert_eq!(timed.recompute(false).counts, vec![0.0, 8.0, 4.0]);

    let mut counted = engine_for(
        session,
        HistogramConfig::new(SeriesType::Power, 50).with_absolute_time(false),
    );
    assert_eq!(counted.recompute(false).counts, vec![0.0, 2.0, 1.0]);
}

#[test]
fn per_mass_power_divides_before_binning_and_classifies_watts() {
    let config = HistogramConfig::new(SeriesType::PowerPerMass, 50).with_zoned(true);
    let mut engine = engine_for(session_with_watts(&[100.0, 150.0, 240.0]), config);

    // 50 kg rider: 2.0, 3.0 and 4.8 W/kg in 0.5 W/kg bins
    let result = engine.recompute(false);
    assert_eq!(result.bin_count, 10);
    assert_eq!(result.counts[4], 1.0);
    assert_eq!(result.counts[6], 1.0);
    assert_eq!(result.counts[9], 1.0);
    assert_eq!(result.zone_counts, vec![0.0, 2.0, 1.0]);
    assert_abs_diff_eq!(result.real_bin_width, 0.5, epsilon = 1e-12);
}

#[test]
fn per_mass_power_skips_samples_without_usable_mass() {
    let mut session = session_with_watts(&[100.0, 150.0]);
    session.mass_kg = Some(0.0);
    let mut engine = engine_for(session.clone(), HistogramConfig::new(SeriesType::PowerPerMass, 10));

    let result = engine.recompute(false);
    assert!(result.counts.is_empty());
    assert_eq!(result.diagnostics.skipped_clamped, 2);
    assert_eq!(result.diagnostics.samples_read, 2);

    session.mass_kg = None;
    let mut engine = engine_for(session, HistogramConfig::new(SeriesType::PowerPerMass, 10));
    assert_eq!(engine.recompute(false).diagnostics.skipped_clamped, 2);
}

#[test]
fn imperial_units_rescale_speed_before_binning() {
    let start = Utc
        .with_ymd_and_hms(2024, 4, 12, 6, 0, 0)
        .single()
        .expect("start");
    let session = RideSession::new(SessionKey::new("speed"), start, 1.0)
        .expect("session")
        .with_points(vec![RidePoint::new(0.0).with_speed_kph(32.0)]);

    let metric = HistogramConfig::new(SeriesType::Speed, 10).with_metric_units(true);
    let mut engine = engine_for(session.clone(), metric);
    assert_eq!(engine.recompute(false).bin_count, 33);

    let imperial = HistogramConfig::new(SeriesType::Speed, 10).with_metric_units(false);
    let mut engine = engine_for(session, imperial);
    let expected_bins = (32.0 * MILES_PER_KM).floor() as usize + 1;
    assert_eq!(engine.recompute(false).bin_count, expected_bins);
}

#[test]
fn selected_interval_populates_mirrors() {
    let config = HistogramConfig::new(SeriesType::Power, 10).with_zoned(true);
    let source = SessionSource::new(session_with_watts(&[5.0, 15.0, 150.0, 250.0]))
        .with_selection(vec![TimeRange::new(1.0, 2.0)]);
    let mut engine = HistogramEngine::new(config)
        .with_zone_classifier(power_zones())
        .with_source(Box::new(source));

    let result = engine.recompute(false);
    assert_eq!(result.selected_counts.len(), result.counts.len());
    assert_eq!(result.selected_counts[1], 1.0);
    assert_eq!(result.selected_counts[15], 1.0);
    assert_eq!(result.selected_total(), 2.0);
    assert_eq!(result.selected_zone_counts, vec![1.0, 1.0, 0.0]);
    assert_eq!(result.zone_counts, vec![2.0, 1.0, 1.0]);
}

#[test]
fn percent_normalization_sums_to_one_hundred() {
    let config = HistogramConfig::new(SeriesType::Power, 10).with_normalize_to_percent(true);
    let mut engine = engine_for(session_with_watts(&[5.0, 15.0, 25.0, 5.0]), config);

    let result = engine.recompute(false);
    assert!(result.normalized);
    assert_abs_diff_eq!(result.total(), 100.0, epsilon = 1e-6);
    assert_abs_diff_eq!(result.counts[0], 50.0, epsilon = 1e-9);
}

#[test]
fn zoned_percent_without_zeros_filters_then_classifies_then_normalizes() {
    let config = HistogramConfig::new(SeriesType::Power, 100)
        .with_zeros(false)
        .with_zoned(true)
        .with_normalize_to_percent(true);
    let source = SessionSource::new(session_with_watts(&[0.0, 0.0, 50.0, 150.0, 150.0, 250.0]))
        .with_selection(vec![TimeRange::new(3.0, 3.0)]);
    let mut engine = HistogramEngine::new(config)
        .with_zone_classifier(power_zones())
        .with_source(Box::new(source));

    let result = engine.recompute(false);
    // zeros never reach the denominators: four samples make up 100%
    assert_eq!(result.diagnostics.skipped_zero, 2);
    assert_abs_diff_eq!(result.counts[0], 25.0, epsilon = 1e-9);
    assert_abs_diff_eq!(result.counts[1], 50.0, epsilon = 1e-9);
    assert_abs_diff_eq!(result.counts[2], 25.0, epsilon = 1e-9);
    assert_abs_diff_eq!(result.zone_total(), 100.0, epsilon = 1e-9);
    assert_abs_diff_eq!(result.zone_counts[1], 50.0, epsilon = 1e-9);
    // selected mirror uses the parent factor, so containment still holds
    assert_abs_diff_eq!(result.selected_counts[1], 25.0, epsilon = 1e-9);
    assert_abs_diff_eq!(result.selected_zone_counts[1], 25.0, epsilon = 1e-9);
}

#[test]
fn percent_normalization_leaves_all_zero_histogram_untouched() {
    let config = HistogramConfig::new(SeriesType::Power, 10)
        .with_zeros(true)
        .with_absolute_time(true)
        .with_normalize_to_percent(true);
    let start = Utc
        .with_ymd_and_hms(2024, 4, 12, 6, 0, 0)
        .single()
        .expect("start");
    let session = RideSession::new(SessionKey::new("instant"), start, 0.0)
        .expect("session")
        .with_points(vec![RidePoint::new(0.0).with_watts(40.0)]);
    let mut engine = engine_for(session, config);

    let result = engine.recompute(false);
    assert_eq!(result.counts, vec![0.0, 0.0, 0.0, 0.0, 0.0]);
    assert!(result.counts.iter().all(|count| count.is_finite()));
}

#[test]
fn unclassified_samples_stay_in_counts_only() {
    let config = HistogramConfig::new(SeriesType::Power, 10).with_zoned(true);
    let start = Utc
        .with_ymd_and_hms(2023, 4, 12, 6, 0, 0)
        .single()
        .expect("start");
    let session = RideSession::new(SessionKey::new("before-zones"), start, 1.0)
        .expect("session")
        .with_points(vec![RidePoint::new(0.0).with_watts(140.0)]);
    let mut engine = engine_for(session, config);

    let result = engine.recompute(false);
    assert_eq!(result.total(), 1.0);
    assert!(result.zone_counts.is_empty());
    assert_eq!(result.diagnostics.unclassified, 1);
}

#[test]
fn missing_source_or_channel_yields_empty_result() {
    let mut detached = HistogramEngine::new(HistogramConfig::new(SeriesType::Power, 10));
    let result = detached.recompute(false);
    assert!(result.counts.is_empty());
    assert!(result.diagnostics.source_unavailable);

    let mut no_cadence = engine_for(
        session_with_watts(&[100.0]),
        HistogramConfig::new(SeriesType::Cadence, 5),
    );
    let result = no_cadence.recompute(false);
    assert!(result.is_empty());
    assert_eq!(result.bin_count, 0);
    assert!(result.diagnostics.source_unavailable);
}

#[test]
fn bins_report_real_unit_ranges() {
    let config = HistogramConfig::new(SeriesType::Power, 20).with_zeros(true);
    let mut engine = engine_for(session_with_watts(&[5.0, 45.0]), config);

    let result = engine.recompute(false);
    let bins: Vec<(f64, f64, f64)> = result
        .bins()
        .map(|bin| (bin.range_start, bin.range_end, bin.count))
        .collect();
    assert_eq!(bins, vec![(0.0, 20.0, 1.0), (20.0, 40.0, 0.0), (40.0, 60.0, 1.0)]);
}

struct PreZonedSource {
    samples: Vec<hist_rs::core::Sample>,
}

impl hist_rs::source::SampleSource for PreZonedSource {
    fn id(&self) -> hist_rs::core::SourceId {
        hist_rs::core::SourceId::Session {
            key: SessionKey::new("pre-zoned"),
        }
    }

    fn reference_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 12).expect("date")
    }

    fn stream(
        &self,
        _series: SeriesType,
    ) -> hist_rs::HistResult<hist_rs::source::SampleStream<'_>> {
        Ok(Box::new(self.samples.iter().copied()))
    }
}

#[test]
fn oversized_pre_assigned_zones_are_unclassified_instead_of_growing_arrays() {
    let day = NaiveDate::from_ymd_opt(2024, 4, 12).expect("date");
    let samples = vec![
        hist_rs::core::Sample::new(50.0, 1.0, day).with_zone(usize::MAX),
        hist_rs::core::Sample::new(50.0, 1.0, day).with_zone(1 << 40),
        hist_rs::core::Sample::new(150.0, 1.0, day).with_zone(2),
    ];

    let config = HistogramConfig::new(SeriesType::Power, 10).with_zoned(true);
    let mut engine = HistogramEngine::new(config.clone())
        .with_source(Box::new(PreZonedSource { samples: samples.clone() }));
    let result = engine.recompute(false);
    assert_eq!(result.total(), 3.0);
    assert_eq!(result.zone_counts, vec![0.0, 0.0, 1.0]);
    assert_eq!(result.diagnostics.unclassified, 2);

    let mut engine = HistogramEngine::new(config)
        .with_zone_classifier(power_zones())
        .with_source(Box::new(PreZonedSource { samples }));
    let result = engine.recompute(false);
    assert_eq!(result.zone_counts, vec![0.0, 0.0, 1.0]);
    assert_eq!(result.zone_counts.len(), 3);
    assert_eq!(result.diagnostics.unclassified, 2);
}
