//! Rolling and summary statistics over plain `f64` slices.
//!
//! `NaN` marks a missing observation throughout.

/// Mean of each full trailing window of `window` values. The first
/// `window - 1` entries, and any window containing a `NaN`, are `NaN`.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    if window == 0 {
        return vec![f64::NAN; values.len()];
    }

    let mut out = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        if i + 1 < window {
            out.push(f64::NAN);
            continue;
        }
        let slice = &values[i + 1 - window..=i];
        let sum: f64 = slice.iter().sum();
        // NaN in the window propagates through the sum.
        out.push(sum / window as f64);
    }
    out
}

/// Arithmetic mean of the defined values; `None` when there are none.
pub fn mean(values: &[f64]) -> Option<f64> {
    let defined: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if defined.is_empty() {
        return None;
    }
    Some(defined.iter().sum::<f64>() / defined.len() as f64)
}

/// Sample standard deviation (n - 1 denominator) of the defined values.
/// `None` with fewer than two defined values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    let defined: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if defined.len() < 2 {
        return None;
    }
    let n = defined.len() as f64;
    let avg = defined.iter().sum::<f64>() / n;
    let variance = defined.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt())
}
