//! Regularity and symmetry estimators.
//!
//! Bout-level estimators ([`regularity`], [`gait_symmetry_index`],
//! [`phase_coordination_index`]) summarise a whole bout in one value.
//! Stride-level estimators ([`intra_covariance`], [`HarmonicRatio`]) work
//! on the samples between two initial contacts.
//!
//! None of these return errors. Bouts that are too short, flat or
//! irregular to yield an estimate produce `NaN`.

use crate::autocov::{
    autocovariance_function, autocovariance_function_axes, autocovariance_window, nanmean,
    nanstd_ddof1,
};
use crate::config::{HarmonicRatioConfig, PeakFallback, SymmetryIndexConfig};
use crate::filter::{FilterBand, SosFilter};
use crate::peaks::{find_peaks, nearest_peak};
use log::{trace, warn};
use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Mean duration (seconds) expressed in samples, `round(mean / dt)`.
///
/// Missing durations are ignored. `None` when no duration is available.
pub fn mean_lag(durations: &[f64], dt: f64) -> Option<usize> {
    let lag = (nanmean(durations) / dt).round();
    if lag.is_finite() && lag >= 0.0 {
        Some(lag as usize)
    } else {
        None
    }
}

/// Pick the value of `curve` at the local maximum nearest `target`.
fn value_at_nearest_peak(curve: &[f64], target: usize, fallback: PeakFallback) -> f64 {
    let peaks = find_peaks(curve);
    match nearest_peak(&peaks, target) {
        Some(peak) => {
            trace!("target lag {}: selected peak at {} of {}", target, peak, peaks.len());
            curve[peak]
        }
        None => match fallback {
            PeakFallback::Sentinel => {
                trace!("target lag {}: no peak found", target);
                f64::NAN
            }
            PeakFallback::NearestSample => {
                trace!("target lag {}: no peak, using sample", target);
                curve.get(target).copied().unwrap_or(f64::NAN)
            }
        },
    }
}

/// Step or stride regularity of a vertical acceleration signal.
///
/// The unbiased autocovariance function is computed up to `max_lag`
/// (clamped to the signal length) and evaluated at the peak nearest
/// `target_lag`, the mean step or stride duration in samples.
pub fn regularity(
    vertical: &[f64],
    target_lag: usize,
    max_lag: usize,
    fallback: PeakFallback,
) -> f64 {
    let max_lag = max_lag.min(vertical.len());
    let acf = autocovariance_function(vertical, max_lag, false);
    value_at_nearest_peak(&acf, target_lag, fallback)
}

/// Covariance of the window `[i1, i2)` against the equally long window
/// that follows it.
pub fn intra_covariance(vertical: &[f64], i1: usize, i2: usize) -> f64 {
    if i2 <= i1 {
        return f64::NAN;
    }
    let i3 = i2 + (i2 - i1);
    autocovariance_window(vertical, i1, i2, i3, false)
}

/// Gait symmetry index of a bout.
///
/// All axes are low-pass filtered, their biased autocovariance functions
/// are summed into a stride repetition curve, and the peak nearest half of
/// `stride_lag` gives `sqrt(C(m)) / sqrt(3)`. A negative repetition value
/// has no square root and yields `NaN`.
pub fn gait_symmetry_index(
    accel: &[[f64; 3]],
    stride_lag: usize,
    dt: f64,
    config: &SymmetryIndexConfig,
) -> f64 {
    let filter = match SosFilter::butterworth(
        config.order,
        FilterBand::LowPass(config.cutoff_hz),
        1.0 / dt,
    ) {
        Ok(f) => f,
        Err(e) => {
            warn!("gait symmetry index filter rejected: {}", e);
            return f64::NAN;
        }
    };

    let filtered = filter.filtfilt_axes(accel);
    let max_lag = config.lag_window.samples(dt).min(accel.len());
    let stride_coefficient: Vec<f64> = autocovariance_function_axes(&filtered, max_lag, true)
        .iter()
        .map(|axes| axes.iter().sum())
        .collect();

    let target = (0.5 * stride_lag as f64).round() as usize;
    let c = value_at_nearest_peak(&stride_coefficient, target, config.peak_fallback);
    if c >= 0.0 {
        c.sqrt() / 3f64.sqrt()
    } else {
        f64::NAN
    }
}

/// Phase coordination index of a bout.
///
/// Phase is `step_time / stride_time` per event; the index combines its
/// coefficient of variation and its mean absolute deviation from one half:
/// `100 · (CV + MAD / 0.5)`. Needs at least two valid phases.
pub fn phase_coordination_index(step_time: &[f64], stride_time: &[f64]) -> f64 {
    let phase: Vec<f64> = step_time
        .iter()
        .zip(stride_time)
        .map(|(step, stride)| step / stride)
        .filter(|p| p.is_finite())
        .collect();
    if phase.len() < 2 {
        return f64::NAN;
    }

    let deviation: Vec<f64> = phase.iter().map(|p| (p - 0.5).abs()).collect();
    let mad = nanmean(&deviation);
    let cv = nanstd_ddof1(&phase) / nanmean(&phase);

    100.0 * (cv + mad / 0.5)
}

/// Harmonic ratio estimator with a pre-planned FFT.
///
/// Each stride is zero padded (or truncated) to the configured FFT length.
/// The fundamental is the frequency bin closest to `1 / stride_time`; its
/// integer multiples up to the configured harmonic count are split into
/// even and odd harmonics and the ratio of their summed magnitudes is
/// returned. Harmonics above Nyquist are left out.
pub struct HarmonicRatio {
    fft: Arc<dyn Fft<f64>>,
    length: usize,
    harmonics: usize,
}

impl HarmonicRatio {
    pub fn new(config: &HarmonicRatioConfig) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            fft: planner.plan_fft_forward(config.fft_length),
            length: config.fft_length,
            harmonics: config.harmonics,
        }
    }

    /// Magnitude spectrum of the non-negative frequencies.
    fn spectrum(&self, segment: &[f64]) -> Vec<f64> {
        let mut buffer: Vec<Complex64> = segment
            .iter()
            .take(self.length)
            .map(|&v| Complex64::new(v, 0.0))
            .collect();
        buffer.resize(self.length, Complex64::new(0.0, 0.0));
        self.fft.process(&mut buffer);
        buffer
            .iter()
            .take(self.length / 2 + 1)
            .map(|c| c.norm())
            .collect()
    }

    /// Frequency bin closest to `freq` Hz.
    fn nearest_bin(&self, freq: f64, dt: f64) -> usize {
        let resolution = 1.0 / (self.length as f64 * dt);
        (0..=self.length / 2)
            .min_by(|&a, &b| {
                let da = (a as f64 * resolution - freq).abs();
                let db = (b as f64 * resolution - freq).abs();
                da.total_cmp(&db)
            })
            .unwrap_or(0)
    }

    /// Even to odd harmonic ratio of one stride.
    pub fn compute(&self, segment: &[f64], stride_time: f64, dt: f64) -> f64 {
        if segment.is_empty() || !(stride_time > 0.0) {
            return f64::NAN;
        }
        let fundamental = self.nearest_bin(1.0 / stride_time, dt);
        if fundamental == 0 {
            return f64::NAN;
        }

        let spectrum = self.spectrum(segment);
        let mut even = 0.0;
        let mut odd = 0.0;
        for h in 1..=self.harmonics {
            let Some(&magnitude) = spectrum.get(fundamental * h) else {
                break;
            };
            if h % 2 == 0 {
                even += magnitude;
            } else {
                odd += magnitude;
            }
        }

        if odd > 0.0 {
            even / odd
        } else {
            f64::NAN
        }
    }
}
