//! Signal helpers shared by the figure renderers.

/// One bar of a density histogram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    /// `count / (n * width)`, so the bars integrate to 1.
    pub density: f64,
}

/// `(seconds, amplitude)` points for plotting `samples` recorded at `sample_rate`.
///
/// Long signals are reduced with [`envelope`] so that at most `max_points`
/// points are produced.
pub fn time_series(samples: &[f32], sample_rate: u32, max_points: usize) -> Vec<(f64, f64)> {
    if sample_rate == 0 {
        return Vec::new();
    }
    let rate = sample_rate as f64;
    envelope(samples, max_points)
        .into_iter()
        .map(|(idx, value)| (idx as f64 / rate, value as f64))
        .collect()
}

/// Min/max decimation keyed by sample index.
///
/// Signals of at most `max_points` samples are returned untouched. Longer ones
/// are split into `max_points / 2` buckets and each bucket contributes its
/// minimum and maximum, in the order they occur, so a line through the points
/// covers the same vertical extent as a line through every sample.
pub fn envelope(samples: &[f32], max_points: usize) -> Vec<(usize, f32)> {
    if samples.len() <= max_points.max(2) {
        return samples.iter().copied().enumerate().collect();
    }

    let buckets = (max_points / 2).max(1);
    let per_bucket = samples.len().div_ceil(buckets);
    let mut points = Vec::with_capacity(buckets * 2);

    for (bucket, chunk) in samples.chunks(per_bucket).enumerate() {
        let base = bucket * per_bucket;
        let mut min_idx = 0;
        let mut max_idx = 0;
        for (i, &sample) in chunk.iter().enumerate() {
            if sample < chunk[min_idx] {
                min_idx = i;
            }
            if sample > chunk[max_idx] {
                max_idx = i;
            }
        }

        let (first, second) = if min_idx <= max_idx {
            (min_idx, max_idx)
        } else {
            (max_idx, min_idx)
        };
        points.push((base + first, chunk[first]));
        if second != first {
            points.push((base + second, chunk[second]));
        }
    }

    points
}

/// Equal-width histogram over the data range, normalized to a density.
///
/// A constant signal gets the range `[v - 0.5, v + 0.5]`. The last bin is
/// closed on the right so the maximum is counted. Non-finite samples are
/// ignored; an empty input yields no bins.
pub fn density_histogram(samples: &[f32], bins: usize) -> Vec<Bin> {
    let finite = || samples.iter().copied().filter(|s| s.is_finite());

    let n = finite().count();
    if n == 0 || bins == 0 {
        return Vec::new();
    }

    let (mut lo, mut hi) = finite().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
        (lo.min(s as f64), hi.max(s as f64))
    });
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0usize; bins];
    for s in finite() {
        let idx = (((s as f64 - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| Bin {
            start: lo + i as f64 * width,
            end: lo + (i + 1) as f64 * width,
            density: count as f64 / (n as f64 * width),
        })
        .collect()
}
