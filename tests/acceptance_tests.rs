//! Whole-pipeline scenarios through the re-exported surface

use approx::assert_relative_eq;
use flowhist::{
    peak_stats, pooled_variance, segment_peaks, FillValueWeight, StreamingHistogram, UnitWeight,
};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rand_distr::Normal;

#[test]
fn test_seven_value_seeding_scenario() {
    let mut hist = StreamingHistogram::new();
    let values = [1.0, 2.0, 2.0, 3.0, 100.0, 101.0, 102.0];
    hist.ingest_weighted(&values, &UnitWeight).unwrap();
    let snap = hist.snapshot();
    assert_eq!(snap.total(), Some(7.0));
    assert_eq!(snap.invalid_count(), Some(0));
    // Accommodating 100..102 next to 1..3 forces at least one coarsening
    assert!(snap.bin_width() > 1.0);
}

#[test]
fn test_fill_value_weighting_excludes_sentinel() {
    let mut hist = StreamingHistogram::new();
    let values = [-999.0, 1.0, 2.0, -999.0, 3.0, 4.0, 5.0, 6.0];
    hist.ingest_weighted(&values, &FillValueWeight::new(-999.0))
        .unwrap();
    let snap = hist.snapshot();
    assert_eq!(snap.total(), Some(6.0));
    assert_eq!(snap.invalid_count(), Some(2));
}

#[test]
fn test_ingest_analyze_round() {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let low = Normal::new(10.0, 1.5).unwrap();
    let high = Normal::new(400.0, 1.5).unwrap();
    let mut hist = StreamingHistogram::new().with_unit("us");
    let mut sum = 0.0;
    for _ in 0..400 {
        let v = low.sample(&mut rng);
        sum += v;
        hist.ingest(v, 1.0).unwrap();
    }
    for _ in 0..100 {
        let v = high.sample(&mut rng);
        sum += v;
        hist.ingest(v, 1.0).unwrap();
    }
    let snap = hist.snapshot();
    assert_eq!(snap.unit(), Some("us"));

    let stats = pooled_variance(&snap).unwrap();
    if snap.outlier_total() == 0.0 {
        assert_relative_eq!(stats.mean, sum / 500.0, max_relative = 1e-9);
    }

    let labels = segment_peaks(&snap).unwrap();
    assert_eq!(labels.len(), snap.len());
    let peaks = peak_stats(&snap).unwrap();
    assert!(!peaks.is_empty());
    for peak in &peaks {
        assert!(peak.mean.is_finite() && peak.stddev.is_finite());
    }
}
