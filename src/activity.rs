//! Acceleration activity metrics.
//!
//! Sample-wise intensity measures of tri-axial acceleration in units of g.
//! Filtered variants run a zero-phase Butterworth filter over each axis
//! before taking the euclidean norm.

use crate::config::ActivityConfig;
use crate::error::ConfigError;
use crate::filter::{FilterBand, SosFilter};
use serde::{Deserialize, Serialize};

/// Activity metric selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityMetric {
    /// Euclidean norm.
    En,
    /// Euclidean norm minus one g.
    Enmo,
    /// Band-pass filtered euclidean norm.
    Bfen,
    /// High-pass filtered euclidean norm.
    Hfen,
    /// High-pass filtered norm plus low-pass filtered norm minus one g.
    HfenPlus,
}

impl ActivityMetric {
    /// Compute the metric for every sample of `accel` sampled at `fs` Hz.
    pub fn compute(
        &self,
        accel: &[[f64; 3]],
        fs: f64,
        config: &ActivityConfig,
    ) -> Result<Vec<f64>, ConfigError> {
        match self {
            ActivityMetric::En => Ok(en(accel)),
            ActivityMetric::Enmo => Ok(enmo(accel, config.take_abs, config.trim_zero)),
            ActivityMetric::Bfen => bfen(accel, fs, config),
            ActivityMetric::Hfen => hfen(accel, fs, config),
            ActivityMetric::HfenPlus => hfen_plus(accel, fs, config),
        }
    }
}

fn norm(sample: &[f64; 3]) -> f64 {
    sample.iter().map(|v| v * v).sum::<f64>().sqrt()
}

fn floor_at_zero(values: Vec<f64>, trim_zero: bool) -> Vec<f64> {
    if trim_zero {
        values.into_iter().map(|v| v.max(0.0)).collect()
    } else {
        values
    }
}

pub fn en(accel: &[[f64; 3]]) -> Vec<f64> {
    accel.iter().map(norm).collect()
}

pub fn enmo(accel: &[[f64; 3]], take_abs: bool, trim_zero: bool) -> Vec<f64> {
    let values = accel
        .iter()
        .map(|s| {
            let v = norm(s) - 1.0;
            if take_abs {
                v.abs()
            } else {
                v
            }
        })
        .collect();
    floor_at_zero(values, trim_zero)
}

pub fn bfen(accel: &[[f64; 3]], fs: f64, config: &ActivityConfig) -> Result<Vec<f64>, ConfigError> {
    let band = FilterBand::BandPass {
        low: config.low_cutoff,
        high: config.high_cutoff,
    };
    let filter = SosFilter::butterworth(config.order, band, fs)?;
    Ok(floor_at_zero(en(&filter.filtfilt_axes(accel)), config.trim_zero))
}

pub fn hfen(accel: &[[f64; 3]], fs: f64, config: &ActivityConfig) -> Result<Vec<f64>, ConfigError> {
    let filter = SosFilter::butterworth(config.order, FilterBand::HighPass(config.low_cutoff), fs)?;
    Ok(floor_at_zero(en(&filter.filtfilt_axes(accel)), config.trim_zero))
}

/// `low_cutoff` is used for both the high-pass and the low-pass filter.
pub fn hfen_plus(
    accel: &[[f64; 3]],
    fs: f64,
    config: &ActivityConfig,
) -> Result<Vec<f64>, ConfigError> {
    let high = SosFilter::butterworth(config.order, FilterBand::HighPass(config.low_cutoff), fs)?;
    let low = SosFilter::butterworth(config.order, FilterBand::LowPass(config.low_cutoff), fs)?;
    let values = en(&high.filtfilt_axes(accel))
        .into_iter()
        .zip(en(&low.filtfilt_axes(accel)))
        .map(|(h, l)| h + l - 1.0)
        .collect();
    Ok(floor_at_zero(values, config.trim_zero))
}
