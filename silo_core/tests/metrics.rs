use rstest::rstest;
use silo_core::metrics;
use silo_core::{Bin, Converter, SystemSettings};

fn test_bin() -> (Bin, Converter) {
    let conv = Converter::try_new(25.0).unwrap();
    (Bin::new(1, "Bin 1", "Wheat H2", 130.0, &conv), conv)
}

#[test]
fn empty_idle_bin_metrics() {
    let (bin, _) = test_bin();
    let m = metrics::calculate(&bin, &SystemSettings::default(), 0);

    assert_eq!(m.fill_percentage, 0.0);
    assert_eq!(m.elapsed_time, "0s");
    assert_eq!(m.remaining_capacity_feet, 130.0);
    assert_eq!(m.remaining_capacity_tons, 3250.0);
    // 3250 t remaining at 30 t/trailer and 50 t/wagon, rounded up.
    assert_eq!(m.estimated_trailers_to_full, 109);
    assert_eq!(m.estimated_wagons_to_full, 65);
    // 130 ft at 0.12 ft/min is 1083 min 20 s.
    assert_eq!(m.estimated_time_to_full, "18h 3m 20s");
}

#[test]
fn rates_come_from_settings() {
    let (bin, _) = test_bin();
    let m = metrics::calculate(&bin, &SystemSettings::default(), 0);
    assert!((m.tons_per_minute - 3.0).abs() < 1e-9);
    assert!((m.feet_per_minute - 0.12).abs() < 1e-9);
}

#[test]
fn partial_fill_estimates_round_up() {
    let (mut bin, conv) = test_bin();
    bin.set_fill_tons(3250.0 - 31.0, &conv); // 31 t of headspace
    let m = metrics::calculate(&bin, &SystemSettings::default(), 0);
    // 31 t needs two trailers and one wagon.
    assert_eq!(m.estimated_trailers_to_full, 2);
    assert_eq!(m.estimated_wagons_to_full, 1);
}

#[test]
fn elapsed_time_tracks_the_session_start() {
    let (mut bin, _) = test_bin();
    bin.is_filling = true;
    bin.start_ms = Some(60_000);
    let m = metrics::calculate(&bin, &SystemSettings::default(), 60_000 + 150_000);
    assert_eq!(m.elapsed_time, "2m 30s");
}

#[rstest]
#[case(0.0, "0s")]
#[case(0.5, "30s")]
#[case(2.5, "2m 30s")]
#[case(61.0, "1h 1m 0s")]
#[case(1083.0 + 1.0 / 3.0, "18h 3m 20s")]
fn durations_format_with_leading_units_omitted(#[case] minutes: f64, #[case] expected: &str) {
    assert_eq!(metrics::format_minutes(minutes), expected);
}

#[test]
fn full_bin_reports_full_and_caps_percentage() {
    let (mut bin, conv) = test_bin();
    bin.set_fill_feet(130.0, &conv);
    let m = metrics::calculate(&bin, &SystemSettings::default(), 0);
    assert_eq!(m.fill_percentage, 100.0);
    assert_eq!(m.estimated_time_to_full, "Full");
    assert_eq!(m.estimated_trailers_to_full, 0);
    assert_eq!(m.estimated_wagons_to_full, 0);
}
