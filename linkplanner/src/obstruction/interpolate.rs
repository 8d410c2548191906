//! Piecewise-linear resampling.

/// Resamples `(xs, ys)` onto `targets` by linear interpolation.
///
/// `xs` must be ascending. Targets outside `xs` are extrapolated from the
/// nearest segment. A single known point yields a constant; no known points
/// yields an empty result.
pub fn linear(targets: &[f64], xs: &[f64], ys: &[f64]) -> Vec<f64> {
    let n = xs.len().min(ys.len());
    match n {
        0 => return Vec::new(),
        1 => return vec![ys[0]; targets.len()],
        _ => {}
    }
    let xs = &xs[..n];
    let ys = &ys[..n];

    targets
        .iter()
        .map(|&x| {
            // Index of the segment [lo, lo + 1] that brackets x, clamped to the ends.
            let upper = xs.partition_point(|&v| v < x);
            let lo = upper.saturating_sub(1).min(n - 2);
            let (x0, x1) = (xs[lo], xs[lo + 1]);
            let (y0, y1) = (ys[lo], ys[lo + 1]);
            if x1 == x0 {
                y0
            } else {
                y0 + (x - x0) * (y1 - y0) / (x1 - x0)
            }
        })
        .collect()
}
