//! Metric computation configuration.
//!
//! Defaults reproduce the published parameterisation of each metric.

use crate::error::{ConfigError, GaitError};
use serde::{Deserialize, Serialize};

/// Master configuration for a metric run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricsConfig {
    /// Step / stride regularity search settings.
    pub regularity: RegularityConfig,

    /// Gait symmetry index settings.
    pub symmetry_index: SymmetryIndexConfig,

    /// Harmonic ratio settings.
    pub harmonic_ratio: HarmonicRatioConfig,

    /// Emit the paired "<metric> asymmetry" columns.
    pub asymmetry: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            regularity: RegularityConfig::default(),
            symmetry_index: SymmetryIndexConfig::default(),
            harmonic_ratio: HarmonicRatioConfig::default(),
            asymmetry: true,
        }
    }
}

impl MetricsConfig {
    /// Parse from JSON.
    pub fn from_json(json: &str) -> Result<Self, GaitError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, GaitError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the configuration against a sampling interval (seconds).
    pub fn validate(&self, dt: f64) -> Result<(), ConfigError> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(ConfigError::InvalidSamplingInterval(dt));
        }
        self.regularity.lag_window.validate(dt)?;
        self.symmetry_index.lag_window.validate(dt)?;

        let nyquist = 0.5 / dt;
        let cutoff = self.symmetry_index.cutoff_hz;
        if !(cutoff > 0.0 && cutoff < nyquist) {
            return Err(ConfigError::InvalidCutoff { cutoff, nyquist });
        }
        if self.symmetry_index.order == 0 {
            return Err(ConfigError::InvalidOrder(0));
        }
        if self.harmonic_ratio.fft_length < 2 {
            return Err(ConfigError::InvalidSpectral(format!(
                "fft_length {} is too short",
                self.harmonic_ratio.fft_length
            )));
        }
        if self.harmonic_ratio.harmonics < 2 {
            return Err(ConfigError::InvalidSpectral(format!(
                "at least 2 harmonics are needed, got {}",
                self.harmonic_ratio.harmonics
            )));
        }
        Ok(())
    }
}

/// Maximum lag searched by autocovariance-based metrics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum LagWindow {
    /// Window length in seconds, converted with `round(seconds / dt)`.
    Seconds(f64),
    /// Window length in samples.
    Samples(usize),
}

impl LagWindow {
    /// Window length in samples for a sampling interval `dt`.
    pub fn samples(&self, dt: f64) -> usize {
        match *self {
            LagWindow::Seconds(s) => {
                let n = (s / dt).round();
                if n.is_finite() && n > 0.0 {
                    n as usize
                } else {
                    0
                }
            }
            LagWindow::Samples(n) => n,
        }
    }

    fn validate(&self, dt: f64) -> Result<(), ConfigError> {
        let n = self.samples(dt);
        if n < 2 {
            return Err(ConfigError::InvalidLagWindow(format!(
                "{:?} resolves to {} samples at dt={}",
                self, n, dt
            )));
        }
        Ok(())
    }
}

/// What to do when the autocovariance curve has no local maximum.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PeakFallback {
    /// Report the missing-value sentinel.
    Sentinel,
    /// Use the curve value at the target lag itself.
    NearestSample,
}

/// Step / stride regularity configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegularityConfig {
    /// Maximum lag of the autocovariance function.
    pub lag_window: LagWindow,
    /// Behaviour when no peak is found.
    pub peak_fallback: PeakFallback,
}

impl Default for RegularityConfig {
    fn default() -> Self {
        Self {
            lag_window: LagWindow::Seconds(4.5),
            peak_fallback: PeakFallback::Sentinel,
        }
    }
}

/// Gait symmetry index configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SymmetryIndexConfig {
    /// Maximum lag of the autocovariance function.
    pub lag_window: LagWindow,
    /// Low-pass cutoff applied to all axes before the autocovariance (Hz).
    pub cutoff_hz: f64,
    /// Butterworth filter order.
    pub order: usize,
    /// Behaviour when no peak is found.
    pub peak_fallback: PeakFallback,
}

impl Default for SymmetryIndexConfig {
    fn default() -> Self {
        Self {
            lag_window: LagWindow::Seconds(4.5),
            cutoff_hz: 10.0,
            order: 4,
            peak_fallback: PeakFallback::Sentinel,
        }
    }
}

/// Harmonic ratio configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HarmonicRatioConfig {
    /// Zero-padded FFT length per stride. Longer strides are truncated.
    pub fft_length: usize,
    /// Number of stride-frequency harmonics summed (even and odd together).
    pub harmonics: usize,
}

impl Default for HarmonicRatioConfig {
    fn default() -> Self {
        Self {
            fft_length: 1024,
            harmonics: 20,
        }
    }
}

/// Acceleration activity metric configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityConfig {
    /// High-pass cutoff, and low edge of the band-pass (Hz).
    pub low_cutoff: f64,
    /// High edge of the band-pass (Hz).
    pub high_cutoff: f64,
    /// Butterworth filter order.
    pub order: usize,
    /// Take the absolute value of ENMO.
    pub take_abs: bool,
    /// Floor values at zero.
    pub trim_zero: bool,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            low_cutoff: 0.2,
            high_cutoff: 15.0,
            order: 4,
            take_abs: false,
            trim_zero: true,
        }
    }
}
