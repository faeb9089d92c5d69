//! Simple (unweighted) trailing moving average.
//!
//! SMA(n)[i] = sum(X[i-n+1..=i]) / n, defined only when all n inputs are defined.
//! Warmup: first (n-1) points are undefined.

pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            let slice = &values[i + 1 - window..=i];
            let mut sum = 0.0;
            for v in slice {
                sum += (*v)?;
            }
            Some(sum / window as f64)
        })
        .collect()
}
