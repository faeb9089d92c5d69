//! Exponentially weighted moving average.
//!
//! k = 2/(n+1), EMA[0] = X[0], then EMA[i] = X[i]*k + EMA[i-1]*(1-k).
//! No warmup: every point is defined from the first input.

pub fn smoothing_factor(span: usize) -> f64 {
    2.0 / (span as f64 + 1.0)
}

pub fn ewm(values: &[f64], span: usize) -> Vec<f64> {
    if span == 0 || values.is_empty() {
        return Vec::new();
    }

    let k = smoothing_factor(span);
    let mut out = Vec::with_capacity(values.len());
    let mut ema = values[0];
    out.push(ema);

    for &x in &values[1..] {
        ema = x * k + ema * (1.0 - k);
        out.push(ema);
    }

    out
}
