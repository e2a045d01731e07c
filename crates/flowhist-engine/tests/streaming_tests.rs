//! End-to-end ingestion tests over realistic streams

use approx::assert_relative_eq;
use flowhist_engine::StreamingHistogram;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Normal, Uniform};

fn ingest_all(hist: &mut StreamingHistogram, values: &[f64]) {
    for &v in values {
        hist.ingest(v, 1.0).unwrap();
    }
}

#[test]
fn test_two_cluster_stream_lands_in_two_bins() {
    let mut hist = StreamingHistogram::new();
    ingest_all(&mut hist, &[1.0, 2.0, 2.0, 3.0, 100.0, 101.0, 102.0]);
    let snap = hist.snapshot();
    assert_eq!(snap.total(), Some(7.0));
    assert_eq!(snap.outliers().len(), 0);
    let populated: Vec<(f64, f64)> = snap
        .counts()
        .iter()
        .zip(snap.means())
        .filter(|(&c, _)| c > 0.0)
        .map(|(&c, &m)| (c, m))
        .collect();
    assert_eq!(populated.len(), 2);
    assert_eq!(populated[0].0, 4.0);
    assert_relative_eq!(populated[0].1, 2.0, max_relative = 1e-12);
    assert_eq!(populated[1].0, 3.0);
    assert_relative_eq!(populated[1].1, 101.0, max_relative = 1e-12);
}

#[test]
fn test_weight_conservation_under_random_stream() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let dist = Normal::new(50.0, 20.0).unwrap();
    let mut hist = StreamingHistogram::new();
    for _ in 0..2000 {
        hist.ingest(dist.sample(&mut rng), 1.0).unwrap();
    }
    let snap = hist.snapshot();
    let placed: f64 = snap.counts().iter().sum();
    assert_relative_eq!(placed, snap.total().unwrap(), max_relative = 1e-9);
    assert_relative_eq!(
        snap.total().unwrap() + snap.outlier_total(),
        2000.0,
        max_relative = 1e-9
    );
}

#[test]
fn test_grand_mean_survives_adaptation() {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let dist = Uniform::new(-30.0, 170.0);
    let mut hist = StreamingHistogram::new();
    let mut sum = 0.0;
    for _ in 0..1000 {
        let v = dist.sample(&mut rng);
        sum += v;
        hist.ingest(v, 1.0).unwrap();
    }
    let snap = hist.snapshot();
    let placed_mass: f64 = snap
        .counts()
        .iter()
        .zip(snap.means())
        .map(|(c, m)| c * m)
        .sum();
    let buffered_mass: f64 = snap.outliers().iter().map(|(v, w)| v * w).sum();
    assert_relative_eq!(placed_mass + buffered_mass, sum, max_relative = 1e-9);
}

#[test]
fn test_single_invalid_stream() {
    let mut hist = StreamingHistogram::new();
    hist.ingest(f64::NAN, 1.0).unwrap();
    let snap = hist.snapshot();
    assert!(snap.is_empty());
    assert_eq!(snap.invalid_count(), Some(1));
    assert_eq!(snap.total(), Some(0.0));
}

#[test]
fn test_invalid_samples_do_not_disturb_geometry() {
    let mut hist = StreamingHistogram::new();
    ingest_all(&mut hist, &[0.0, 1.0, 2.0, 3.0, 4.0]);
    let width = hist.bin_width();
    let edge = hist.left_edge();
    hist.ingest(f64::INFINITY, 1.0).unwrap();
    hist.ingest(2.0, 0.0).unwrap();
    assert_eq!(hist.bin_width(), width);
    assert_eq!(hist.left_edge(), edge);
    assert_eq!(hist.invalid_count(), 2);
}

#[test]
fn test_snapshot_does_not_disturb_ingestion() {
    let mut hist = StreamingHistogram::new();
    ingest_all(&mut hist, &[0.0, 1.0, 2.0, 3.0, 4.0]);
    let first = hist.snapshot();
    assert_eq!(first, hist.snapshot());
    hist.ingest(2.5, 1.0).unwrap();
    let second = hist.snapshot();
    assert_eq!(second.total(), Some(6.0));
}

#[test]
fn test_negative_values_extend_window_left() {
    let mut hist = StreamingHistogram::new();
    ingest_all(&mut hist, &[0.0, 1.0, 2.0, 3.0, 4.0]);
    ingest_all(&mut hist, &[-10.0, -11.0, -12.0]);
    let snap = hist.snapshot();
    assert_eq!(snap.total(), Some(8.0));
    assert_eq!(snap.outliers().len(), 0);
    assert!(snap.bin_start() <= -12.0);
}

#[test]
fn test_unit_passes_through_to_snapshot() {
    let mut hist = StreamingHistogram::new().with_unit("ms");
    ingest_all(&mut hist, &[0.0, 1.0, 2.0, 3.0, 4.0]);
    assert_eq!(hist.snapshot().unit(), Some("ms"));
}

#[test]
fn test_min_positive_in_snapshot() {
    let mut hist = StreamingHistogram::new();
    ingest_all(&mut hist, &[-2.0, 0.0, 0.125, 3.0, 4.0]);
    assert_eq!(hist.snapshot().min_positive(), Some(0.125));
}
