//! Feed a bimodal stream through the accumulator and print the result.
//!
//! Run with: cargo run --example streaming_demo

use flowhist_engine::StreamingHistogram;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rand_distr::Normal;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = ChaCha8Rng::seed_from_u64(9);
    let low = Normal::new(20.0, 3.0)?;
    let high = Normal::new(480.0, 12.0)?;

    let mut hist = StreamingHistogram::new().with_unit("ms");
    for _ in 0..5_000 {
        hist.ingest(low.sample(&mut rng), 1.0)?;
    }
    for _ in 0..2_000 {
        hist.ingest(high.sample(&mut rng), 1.0)?;
    }
    println!("{hist}");

    let snap = hist.snapshot();
    println!("\n{snap}\n");
    let centers = snap.bin_centers();
    let peak = snap.counts().iter().cloned().fold(0.0f64, f64::max);
    for ((&count, &mean), &center) in snap.counts().iter().zip(snap.means()).zip(&centers) {
        if count == 0.0 {
            continue;
        }
        let bar = "#".repeat((50.0 * count / peak).round() as usize);
        println!("{center:>8.1} | {bar:<50} {count:>7.0}  (mean {mean:.2})");
    }
    Ok(())
}
