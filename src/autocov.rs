//! Autocovariance routines.
//!
//! All three routines correlate two windows of the same signal. Each window
//! is centred on its own mean and scaled by its own sample standard
//! deviation (`ddof = 1`), so short windows near the edges of a signal are
//! normalised by their local spread rather than by a global one.
//!
//! Normalisation:
//!
//! | mode       | denominator              |
//! |------------|--------------------------|
//! | biased     | `N · σ1 · σ2`            |
//! | unbiased   | `(N - lag) · σ1 · σ2`    |
//!
//! Lags whose windows hold fewer than two samples (`lag > N - 2`) have no
//! defined standard deviation and yield `NaN`.

/// Mean of a slice, `NaN` when empty.
pub(crate) fn mean(x: &[f64]) -> f64 {
    if x.is_empty() {
        return f64::NAN;
    }
    x.iter().sum::<f64>() / x.len() as f64
}

/// Sample standard deviation (`ddof = 1`), `NaN` for fewer than 2 samples.
pub(crate) fn std_ddof1(x: &[f64], mean: f64) -> f64 {
    if x.len() < 2 {
        return f64::NAN;
    }
    let ss: f64 = x.iter().map(|v| (v - mean).powi(2)).sum();
    (ss / (x.len() - 1) as f64).sqrt()
}

/// Mean of the finite values of a slice, `NaN` when there are none.
pub(crate) fn nanmean(x: &[f64]) -> f64 {
    let (sum, count) = x
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        return f64::NAN;
    }
    sum / count as f64
}

/// Sample standard deviation (`ddof = 1`) ignoring `NaN` values.
pub(crate) fn nanstd_ddof1(x: &[f64]) -> f64 {
    let valid: Vec<f64> = x.iter().copied().filter(|v| !v.is_nan()).collect();
    std_ddof1(&valid, mean(&valid))
}

/// Normalised cross product of two windows.
///
/// `norm_len` is the count used in the denominator (`N` or `N - lag`).
fn window_covariance(a: &[f64], b: &[f64], norm_len: usize) -> f64 {
    let m1 = mean(a);
    let m2 = mean(b);
    let s1 = std_ddof1(a, m1);
    let s2 = std_ddof1(b, m2);

    if !(s1 > 0.0 && s2 > 0.0) || norm_len == 0 {
        return f64::NAN;
    }

    let cross: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x1, x2)| (x1 - m1) * (x2 - m2))
        .sum();

    cross / (norm_len as f64 * s1 * s2)
}

/// Autocovariance of `x` for every lag in `[0, max_lag)`.
///
/// The output always has `max_lag` entries. Entries for lags the signal is
/// too short to support (`lag > x.len() - 2`) are `NaN`.
pub fn autocovariance_function(x: &[f64], max_lag: usize, biased: bool) -> Vec<f64> {
    (0..max_lag)
        .map(|lag| autocovariance_at_lag(x, lag, biased))
        .collect()
}

/// Autocovariance of `x` at a single `lag`.
pub fn autocovariance_at_lag(x: &[f64], lag: usize, biased: bool) -> f64 {
    let n = x.len();
    if lag + 2 > n {
        return f64::NAN;
    }

    let head = &x[..n - lag];
    let tail = &x[lag..];
    let norm_len = if biased { n } else { n - lag };

    window_covariance(head, tail, norm_len)
}

/// Per-axis autocovariance function of a multi-axis signal.
///
/// Each axis is handled independently, exactly as
/// [`autocovariance_function`] would on that axis alone.
pub fn autocovariance_function_axes<const D: usize>(
    x: &[[f64; D]],
    max_lag: usize,
    biased: bool,
) -> Vec<[f64; D]> {
    let columns: Vec<Vec<f64>> = (0..D)
        .map(|axis| x.iter().map(|sample| sample[axis]).collect())
        .collect();
    let curves: Vec<Vec<f64>> = columns
        .iter()
        .map(|col| autocovariance_function(col, max_lag, biased))
        .collect();

    (0..max_lag)
        .map(|lag| {
            let mut row = [0.0; D];
            for (axis, curve) in curves.iter().enumerate() {
                row[axis] = curve[lag];
            }
            row
        })
        .collect()
}

/// Covariance of window `[i1, i2)` against window `[i2, i3)`.
///
/// The normalisation uses `N = i3 - i1` and `m = i2 - i1`, so the unbiased
/// denominator is `(N - m) · σ1 · σ2`. When the windows differ in length the
/// cross product runs over the shorter one.
///
/// Returns `NaN` when `i3` is past the end of `x` or the indices are not
/// strictly increasing.
pub fn autocovariance_window(x: &[f64], i1: usize, i2: usize, i3: usize, biased: bool) -> f64 {
    if i3 > x.len() || i1 >= i2 || i2 >= i3 {
        return f64::NAN;
    }

    let n = i3 - i1;
    let m = i2 - i1;
    let norm_len = if biased { n } else { n - m };

    window_covariance(&x[i1..i2], &x[i2..i3], norm_len)
}
