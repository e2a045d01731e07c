//! Shift, rescale, and force-grow behavior under hostile streams

use approx::assert_relative_eq;
use flowhist_engine::StreamingHistogram;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rand_distr::Uniform;

fn ingest_all(hist: &mut StreamingHistogram, values: &[f64]) {
    for &v in values {
        hist.ingest(v, 1.0).unwrap();
    }
}

#[test]
fn test_width_stays_on_decade_steps() {
    let mut hist = StreamingHistogram::new();
    ingest_all(&mut hist, &[0.0, 1.0, 2.0, 3.0, 4.0]);
    // Push the range out by powers of two; every width must stay on the
    // 1/5 decade ladder
    for k in 1..12 {
        hist.ingest((1 << k) as f64 * 10.0, 1.0).unwrap();
        let width = hist.bin_width();
        let mantissa = width / 10f64.powf(width.log10().floor());
        assert!(
            (mantissa - 1.0).abs() < 1e-9 || (mantissa - 5.0).abs() < 1e-9,
            "width {width} left the decade ladder"
        );
    }
}

#[test]
fn test_left_edge_stays_bin_aligned() {
    let mut hist = StreamingHistogram::new();
    ingest_all(&mut hist, &[3.0, 7.0, 13.0, 22.0, 41.0]);
    for v in [250.0, 900.0, 3000.0, -1500.0] {
        hist.ingest(v, 1.0).unwrap();
        let width = hist.bin_width();
        let rem = hist.left_edge().rem_euclid(width);
        assert!(
            rem < 1e-9 * width.max(1.0) || (width - rem) < 1e-9 * width.max(1.0),
            "left edge {} not aligned to width {width}",
            hist.left_edge()
        );
    }
}

#[test]
fn test_growing_range_preserves_weight() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let mut hist = StreamingHistogram::new();
    let mut span = 10.0;
    let mut n = 0.0;
    for _ in 0..50 {
        let dist = Uniform::new(-span, span);
        for _ in 0..20 {
            hist.ingest(dist.sample(&mut rng), 1.0).unwrap();
            n += 1.0;
        }
        span *= 1.5;
    }
    let snap = hist.snapshot();
    assert_relative_eq!(
        snap.total().unwrap() + snap.outlier_total(),
        n,
        max_relative = 1e-9
    );
    let placed: f64 = snap.counts().iter().sum();
    assert_relative_eq!(placed, snap.total().unwrap(), max_relative = 1e-9);
}

#[test]
fn test_distant_cluster_forces_growth() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let near = Uniform::new(0.0, 100.0);
    let far = Uniform::new(1_000_000.0, 1_000_100.0);
    let mut hist = StreamingHistogram::new();
    for _ in 0..500 {
        hist.ingest(near.sample(&mut rng), 1.0).unwrap();
    }
    for _ in 0..500 {
        hist.ingest(far.sample(&mut rng), 1.0).unwrap();
    }
    let snap = hist.snapshot();
    // The buffer cannot be left dominating the placed weight
    assert!(
        snap.outlier_total() <= snap.total().unwrap() / 10.0 + 30.0,
        "outlier weight {} never forced growth (total {})",
        snap.outlier_total(),
        snap.total().unwrap()
    );
    assert_relative_eq!(
        snap.total().unwrap() + snap.outlier_total(),
        1000.0,
        max_relative = 1e-9
    );
    // Both clusters are represented among the populated bins
    let centers = snap.bin_centers();
    let has_near = snap
        .counts()
        .iter()
        .zip(&centers)
        .any(|(&c, &x)| c > 0.0 && x < 10_000.0);
    let has_far = snap
        .counts()
        .iter()
        .zip(&centers)
        .any(|(&c, &x)| c > 0.0 && x > 500_000.0);
    assert!(has_near && has_far);
}

#[test]
fn test_identical_values_never_widen() {
    let mut hist = StreamingHistogram::new();
    ingest_all(&mut hist, &[5.0, 6.0, 7.0, 8.0, 9.0]);
    let width = hist.bin_width();
    for _ in 0..10_000 {
        hist.ingest(7.0, 1.0).unwrap();
    }
    assert_eq!(hist.bin_width(), width);
    assert_eq!(hist.total_weight(), 10_005.0);
}

#[test]
fn test_tiny_scale_stream() {
    let mut hist = StreamingHistogram::new();
    ingest_all(&mut hist, &[1e-9, 2e-9, 3e-9, 4e-9, 5e-9]);
    assert!(hist.is_seeded());
    assert!(hist.bin_width() <= 1e-9);
    let snap = hist.snapshot();
    assert_eq!(snap.total(), Some(5.0));
    assert_eq!(snap.outliers().len(), 0);
}

#[test]
fn test_coarsening_merges_spread_into_stddev() {
    let mut hist = StreamingHistogram::new();
    ingest_all(&mut hist, &[0.0, 1.0, 2.0, 3.0, 4.0]);
    // Force a wide rescale so the five unit-spaced singletons share bins
    hist.ingest(400.0, 1.0).unwrap();
    let snap = hist.snapshot();
    let spread: f64 = snap.stddevs().iter().sum();
    assert!(
        spread > 0.0,
        "merged multi-sample bins must report their spread"
    );
}
