// gaitkit Testdata - Walking bout generator
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Walking bout generation.
//!
//! Contacts are laid out step by step from a nominal stride time, with
//! optional left/right imbalance and Gaussian jitter. The acceleration
//! trace is built from the contacts so that the true step and stride
//! periods of the signal match the event table exactly.

use crate::bout::SyntheticBout;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Index of the vertical axis in generated acceleration.
pub const VERTICAL_AXIS: usize = 1;

/// Walker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkerConfig {
    /// Sampling interval in seconds.
    pub dt: f64,
    /// Number of strides; the bout holds two events per stride.
    pub strides: usize,
    /// Nominal stride duration in seconds.
    pub stride_time: f64,
    /// Standard deviation of each step duration in seconds.
    pub step_jitter: f64,
    /// Relative lengthening of even steps and shortening of odd ones.
    pub step_asymmetry: f64,
    /// Stance phase as a fraction of the stride.
    pub stance_fraction: f64,
    /// Initial double support as a fraction of the stride.
    pub double_support_fraction: f64,
    /// Nominal centre of mass height change per step in metres.
    pub delta_h: f64,
    /// Standard deviation of the height change in metres.
    pub delta_h_jitter: f64,
    /// Standard deviation of additive acceleration noise in g.
    pub noise_std: f64,
    /// Quiet samples before the first contact.
    pub lead_in: usize,
    /// Random seed for reproducibility.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            dt: 0.01,
            strides: 10,
            stride_time: 1.1,
            step_jitter: 0.0,
            step_asymmetry: 0.0,
            stance_fraction: 0.6,
            double_support_fraction: 0.1,
            delta_h: 0.04,
            delta_h_jitter: 0.0,
            noise_std: 0.0,
            lead_in: 25,
            seed: None,
        }
    }
}

impl WalkerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set sampling interval in seconds.
    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    /// Set number of strides.
    pub fn with_strides(mut self, strides: usize) -> Self {
        self.strides = strides;
        self
    }

    /// Set nominal stride time in seconds.
    pub fn with_stride_time(mut self, stride_time: f64) -> Self {
        self.stride_time = stride_time;
        self
    }

    /// Set step duration jitter in seconds.
    pub fn with_step_jitter(mut self, jitter: f64) -> Self {
        self.step_jitter = jitter;
        self
    }

    /// Set left/right step imbalance.
    pub fn with_step_asymmetry(mut self, asymmetry: f64) -> Self {
        self.step_asymmetry = asymmetry;
        self
    }

    /// Set centre of mass height change and its jitter.
    pub fn with_delta_h(mut self, delta_h: f64, jitter: f64) -> Self {
        self.delta_h = delta_h;
        self.delta_h_jitter = jitter;
        self
    }

    /// Set acceleration noise.
    pub fn with_noise(mut self, noise_std: f64) -> Self {
        self.noise_std = noise_std;
        self
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Nominal step duration in samples.
    pub fn step_samples(&self) -> usize {
        ((0.5 * self.stride_time / self.dt).round() as usize).max(1)
    }
}

fn gaussian(rng: &mut dyn RngCore, std_dev: f64) -> f64 {
    if std_dev > 0.0 {
        Normal::new(0.0, std_dev)
            .map(|d| d.sample(rng))
            .unwrap_or(0.0)
    } else {
        0.0
    }
}

fn samples(seconds: f64, dt: f64) -> usize {
    (seconds / dt).round().max(0.0) as usize
}

/// Generate one walking bout.
pub fn generate_bout(config: &WalkerConfig) -> SyntheticBout {
    let mut rng: Box<dyn RngCore> = match config.seed {
        Some(s) => Box::new(StdRng::seed_from_u64(s)),
        None => Box::new(StdRng::from_entropy()),
    };

    let events = 2 * config.strides;
    let nominal = config.step_samples();
    let half = 0.5 * config.stride_time;

    // Contacts
    let mut ic = Vec::with_capacity(events);
    let mut next = config.lead_in;
    for k in 0..events {
        ic.push(next);
        let side = if k % 2 == 0 { 1.0 } else { -1.0 };
        let step = half * (1.0 + side * config.step_asymmetry)
            + gaussian(rng.as_mut(), config.step_jitter);
        next += samples(step, config.dt).max(1);
    }

    let stance = samples(config.stance_fraction * config.stride_time, config.dt);
    let double_support = samples(config.double_support_fraction * config.stride_time, config.dt);
    let fc: Vec<usize> = ic.iter().map(|&c| c + stance).collect();
    let fc_opposite: Vec<usize> = ic.iter().map(|&c| c + double_support).collect();
    let delta_h: Vec<f64> = (0..events)
        .map(|_| config.delta_h + gaussian(rng.as_mut(), config.delta_h_jitter))
        .collect();

    // Step boundaries, padded with nominal steps on both sides
    let mut bounds: Vec<i64> = Vec::with_capacity(events + 4);
    let first = ic.first().copied().unwrap_or(config.lead_in) as i64;
    bounds.push(first - nominal as i64);
    bounds.extend(ic.iter().map(|&c| c as i64));
    let last = *bounds.last().unwrap_or(&first);
    for j in 1..=3 {
        bounds.push(last.max(first) + j * nominal as i64);
    }

    let length = ic.last().map_or(config.lead_in, |&c| c) + 2 * nominal + config.lead_in;
    let mut accel = Vec::with_capacity(length);
    let mut k = 0;
    for t in 0..length as i64 {
        while k + 2 < bounds.len() && bounds[k + 1] <= t {
            k += 1;
        }
        let span = (bounds[k + 1] - bounds[k]).max(1) as f64;
        let phase = (t - bounds[k]) as f64 / span;
        // bounds[1] is the first real contact, an even step
        let even = k % 2 == 1;
        let stride_phase = 0.5 * (phase + if even { 0.0 } else { 1.0 });
        let amplitude = if even {
            1.0 + config.step_asymmetry
        } else {
            1.0 - config.step_asymmetry
        };

        let ap = 0.15 * (2.0 * PI * phase + 0.6).sin();
        let v = 1.0 + 0.25 * amplitude * (2.0 * PI * phase).cos();
        let ml = 0.1 * (2.0 * PI * stride_phase).sin();

        let mut sample = [ap, v, ml];
        for axis in sample.iter_mut() {
            *axis += gaussian(rng.as_mut(), config.noise_std);
        }
        accel.push(sample);
    }

    SyntheticBout {
        dt: config.dt,
        vertical_axis: VERTICAL_AXIS,
        ic,
        fc,
        fc_opposite,
        delta_h,
        accel,
    }
}

/// Generate several bouts, each seeded from the configured seed plus its
/// index.
pub fn generate_session(config: &WalkerConfig, bouts: usize) -> Vec<SyntheticBout> {
    (0..bouts)
        .map(|i| {
            let mut c = config.clone();
            c.seed = config.seed.map(|s| s.wrapping_add(i as u64));
            generate_bout(&c)
        })
        .collect()
}
