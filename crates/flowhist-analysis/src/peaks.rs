//! Peak segmentation over a finalized histogram
//!
//! Labels every bin with a peak id, a valley marker, or unassigned, by
//! seeding local maxima, absorbing flat plateaus backward, and expanding
//! peak boundaries outward while the neighboring mass plausibly belongs to
//! the same mode. Per-peak statistics pool the member bins with the same
//! decomposition as [`pooled_variance`](crate::pooled_variance).

use flowhist_core::{Error, Result};
use flowhist_engine::HistogramSnapshot;
use tracing::debug;

/// Pooled statistics of one peak's member bins
#[derive(Debug, Clone, PartialEq)]
pub struct PeakStat {
    pub mean: f64,
    pub stddev: f64,
}

/// Label each bin of the snapshot: 0 unassigned, -1 valley, >0 peak id
///
/// Peak seeds are bins whose count is at least its two left neighbors' and
/// strictly above its two right neighbors' (the trailing edge of a flat
/// plateau counts as the peak); valleys mirror that with missing neighbors
/// treated as unbeatably high. A plateau propagates its peak id backward
/// and merges into an adjacent peak when its population is 5 or less, or
/// when the flatter side's mean ± 2·stddev reaches the shared bin
/// boundary. Each peak then expands outward while the unassigned neighbor
/// holds more than a tenth of the peak height and its mean ± 2·stddev
/// overlaps the boundary. Ids are renumbered consecutively from 1.
///
/// Fails with `InsufficientData` below 3 populated bins and with
/// `MissingMetadata` on a snapshot not produced by an accumulator.
pub fn segment_peaks(snap: &HistogramSnapshot) -> Result<Vec<i32>> {
    snap.summary()
        .ok_or_else(|| Error::foreign_snapshot("segment_peaks"))?;
    let counts = snap.counts();
    let n = counts.len();
    let populated = counts.iter().filter(|&&c| c > 0.0).count();
    if populated < 3 {
        return Err(Error::too_few_bins(3, populated));
    }
    let means = snap.means();
    let stddevs = snap.stddevs();
    let width = snap.bin_width();
    let start = snap.bin_start();
    let edge = |i: usize| start + i as f64 * width;

    // Missing neighbors are empty for the peak test and unbeatably high
    // for the valley test
    let low = |i: isize| {
        if (0..n as isize).contains(&i) {
            counts[i as usize]
        } else {
            0.0
        }
    };
    let high = |i: isize| {
        if (0..n as isize).contains(&i) {
            counts[i as usize]
        } else {
            f64::INFINITY
        }
    };

    let mut labels = vec![0i32; n];
    let mut next_id = 1;
    for i in 0..n {
        let c = counts[i];
        if c <= 0.0 {
            continue;
        }
        let k = i as isize;
        if c >= low(k - 1) && c >= low(k - 2) && c > low(k + 1) && c > low(k + 2) {
            labels[i] = next_id;
            next_id += 1;
        }
    }
    for i in 0..n {
        if labels[i] != 0 {
            continue;
        }
        let c = counts[i];
        let k = i as isize;
        if c <= high(k - 1) && c <= high(k - 2) && c < high(k + 1) && c < high(k + 2) {
            labels[i] = -1;
        }
    }
    debug!(seeds = next_id - 1, populated, "seeded peak candidates");

    // Backward plateau propagation, merging across the junction when the
    // plateau is small or the flatter side's spread reaches the boundary
    let seeds: Vec<usize> = (0..n).filter(|&i| labels[i] > 0).collect();
    for &p in &seeds {
        let id = labels[p];
        let mut j = p;
        let mut plateau_pop = counts[p];
        while j > 0 && counts[j - 1] == counts[p] && labels[j - 1] == 0 {
            j -= 1;
            labels[j] = id;
            plateau_pop += counts[j];
        }
        if j == 0 {
            continue;
        }
        let neighbor = labels[j - 1];
        if neighbor <= 0 || neighbor == id {
            continue;
        }
        let boundary = edge(j);
        let absorb = if plateau_pop <= 5.0 {
            true
        } else if counts[j - 1] <= counts[j] {
            means[j - 1] + 2.0 * stddevs[j - 1] >= boundary
        } else {
            means[j] - 2.0 * stddevs[j] <= boundary
        };
        if absorb {
            debug!(from = id, into = neighbor, plateau_pop, "merging plateau");
            for label in labels.iter_mut() {
                if *label == id {
                    *label = neighbor;
                }
            }
        }
    }

    // Outward expansion
    let mut ids: Vec<i32> = Vec::new();
    for &label in &labels {
        if label > 0 && !ids.contains(&label) {
            ids.push(label);
        }
    }
    for id in ids {
        let first = match labels.iter().position(|&l| l == id) {
            Some(i) => i,
            None => continue,
        };
        let last = labels.iter().rposition(|&l| l == id).unwrap_or(first);
        let height = counts[first..=last]
            .iter()
            .cloned()
            .fold(0.0f64, f64::max);
        let threshold = height / 10.0;
        let mut j = first;
        while j > 0 && labels[j - 1] == 0 && counts[j - 1] > threshold {
            if means[j - 1] + 2.0 * stddevs[j - 1] < edge(j) {
                break;
            }
            j -= 1;
            labels[j] = id;
        }
        let mut j = last;
        while j + 1 < n && labels[j + 1] == 0 && counts[j + 1] > threshold {
            if means[j + 1] - 2.0 * stddevs[j + 1] > edge(j + 1) {
                break;
            }
            j += 1;
            labels[j] = id;
        }
    }

    // Renumber surviving ids consecutively from 1, in bin order
    let mut remap: Vec<(i32, i32)> = Vec::new();
    for label in labels.iter_mut() {
        if *label <= 0 {
            continue;
        }
        let fresh = match remap.iter().find(|(old, _)| old == label) {
            Some(&(_, fresh)) => fresh,
            None => {
                let fresh = remap.len() as i32 + 1;
                remap.push((*label, fresh));
                fresh
            }
        };
        *label = fresh;
    }
    debug!(peaks = remap.len(), "peak segmentation complete");
    Ok(labels)
}

/// Pooled mean and stddev of each peak's member bins, ordered by peak id
pub fn peak_stats(snap: &HistogramSnapshot) -> Result<Vec<PeakStat>> {
    let labels = segment_peaks(snap)?;
    let counts = snap.counts();
    let means = snap.means();
    let stddevs = snap.stddevs();
    let peak_count = labels.iter().copied().max().unwrap_or(0);
    let mut out = Vec::with_capacity(peak_count.max(0) as usize);
    for id in 1..=peak_count {
        let members: Vec<usize> = (0..labels.len()).filter(|&i| labels[i] == id).collect();
        let total: f64 = members.iter().map(|&i| counts[i]).sum();
        let mean = members.iter().map(|&i| counts[i] * means[i]).sum::<f64>() / total;
        let mut ss = 0.0;
        for &i in &members {
            if counts[i] > 0.0 {
                let d = means[i] - mean;
                ss += (counts[i] - 1.0) * stddevs[i] * stddevs[i] + counts[i] * d * d;
            }
        }
        let variance = if total > 1.0 { ss / (total - 1.0) } else { 0.0 };
        if !(mean.is_finite() && variance.is_finite()) {
            return Err(Error::non_finite("peak statistics"));
        }
        out.push(PeakStat {
            mean,
            stddev: variance.max(0.0).sqrt(),
        });
    }
    Ok(out)
}
