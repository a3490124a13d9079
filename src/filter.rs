//! Butterworth filter design and zero-phase filtering.
//!
//! Filters are designed as an analog Butterworth prototype, mapped to the
//! requested band, discretised with the bilinear transform and split into
//! second-order sections. Filtering runs forward then backward over an
//! odd-extended copy of the signal, with each section started from its
//! steady-state response to the first sample, so the output has no phase
//! shift and no start-up transient.

use crate::error::ConfigError;
use num_complex::Complex64;
use std::f64::consts::PI;

/// Tolerance used to decide whether a pole or zero is real.
const REAL_TOL: f64 = 1e-12;

/// Pass band of a Butterworth filter, cutoffs in Hz.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterBand {
    LowPass(f64),
    HighPass(f64),
    BandPass { low: f64, high: f64 },
}

/// One second-order section: `[b0, b1, b2, a0, a1, a2]` with `a0 = 1`.
pub type Section = [f64; 6];

/// Cascade of second-order sections.
#[derive(Debug, Clone, PartialEq)]
pub struct SosFilter {
    sections: Vec<Section>,
}

impl SosFilter {
    /// Design a digital Butterworth filter.
    ///
    /// `fs` is the sampling frequency in Hz. Cutoffs must lie strictly
    /// between 0 and the Nyquist frequency.
    pub fn butterworth(order: usize, band: FilterBand, fs: f64) -> Result<Self, ConfigError> {
        if order == 0 {
            return Err(ConfigError::InvalidOrder(order));
        }
        if !(fs.is_finite() && fs > 0.0) {
            return Err(ConfigError::InvalidSamplingInterval(1.0 / fs));
        }
        let nyquist = fs / 2.0;
        let normalize = |cutoff: f64| -> Result<f64, ConfigError> {
            let wn = cutoff / nyquist;
            if wn > 0.0 && wn < 1.0 {
                Ok(wn)
            } else {
                Err(ConfigError::InvalidCutoff { cutoff, nyquist })
            }
        };
        // pre-warp for the bilinear transform (internal fs of 2)
        let warp = |wn: f64| 4.0 * (PI * wn / 2.0).tan();

        let proto = prototype_poles(order);
        let (zeros, poles, gain) = match band {
            FilterBand::LowPass(cutoff) => {
                let wo = warp(normalize(cutoff)?);
                let poles: Vec<Complex64> = proto.iter().map(|p| *p * wo).collect();
                (Vec::new(), poles, wo.powi(order as i32))
            }
            FilterBand::HighPass(cutoff) => {
                let wo = warp(normalize(cutoff)?);
                let poles: Vec<Complex64> = proto.iter().map(|p| wo / *p).collect();
                let prod = proto
                    .iter()
                    .fold(Complex64::new(1.0, 0.0), |acc, p| acc * (-*p));
                let gain = (Complex64::new(1.0, 0.0) / prod).re;
                (vec![Complex64::new(0.0, 0.0); order], poles, gain)
            }
            FilterBand::BandPass { low, high } => {
                let w1 = warp(normalize(low)?);
                let w2 = warp(normalize(high)?);
                if w2 <= w1 {
                    return Err(ConfigError::InvalidCutoff {
                        cutoff: high,
                        nyquist,
                    });
                }
                let bw = w2 - w1;
                let wo = (w1 * w2).sqrt();
                let mut poles = Vec::with_capacity(2 * order);
                for p in &proto {
                    let p_lp = *p * (bw / 2.0);
                    let root = (p_lp * p_lp - wo * wo).sqrt();
                    poles.push(p_lp + root);
                    poles.push(p_lp - root);
                }
                (
                    vec![Complex64::new(0.0, 0.0); order],
                    poles,
                    bw.powi(order as i32),
                )
            }
        };

        let (zeros, poles, gain) = bilinear(zeros, poles, gain);
        Ok(Self {
            sections: to_sections(zeros, poles, gain),
        })
    }

    /// Build a filter from explicit sections.
    pub fn from_sections(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    /// The second-order sections of this filter.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Gain of the cascade at DC.
    pub fn dc_gain(&self) -> f64 {
        self.sections.iter().map(section_dc_gain).product()
    }

    /// Run the cascade once over `x` starting from the given section states.
    fn run(&self, x: &[f64], mut state: Vec<[f64; 2]>) -> Vec<f64> {
        x.iter()
            .map(|&sample| {
                let mut v = sample;
                for (s, z) in self.sections.iter().zip(state.iter_mut()) {
                    // transposed direct form II
                    let y = s[0] * v + z[0];
                    z[0] = s[1] * v - s[4] * y + z[1];
                    z[1] = s[2] * v - s[5] * y;
                    v = y;
                }
                v
            })
            .collect()
    }

    /// Steady-state section states for a unit step input.
    fn steady_state(&self) -> Vec<[f64; 2]> {
        let mut scale = 1.0;
        self.sections
            .iter()
            .map(|s| {
                let h = section_dc_gain(s);
                let z1 = s[2] - s[5] * h;
                let z0 = s[1] - s[4] * h + z1;
                let zi = [scale * z0, scale * z1];
                scale *= h;
                zi
            })
            .collect()
    }

    /// Padding length for forward-backward filtering.
    fn pad_len(&self) -> usize {
        let trailing_b = self.sections.iter().filter(|s| s[2] == 0.0).count();
        let trailing_a = self.sections.iter().filter(|s| s[5] == 0.0).count();
        3 * (2 * self.sections.len() + 1 - trailing_b.min(trailing_a))
    }

    /// Zero-phase forward-backward filtering.
    ///
    /// Signals shorter than the default padding are padded by `len - 1`
    /// samples instead. Signals of fewer than two samples are returned
    /// unchanged.
    pub fn filtfilt(&self, x: &[f64]) -> Vec<f64> {
        let n = x.len();
        if n < 2 || self.sections.is_empty() {
            return x.to_vec();
        }
        let edge = self.pad_len().min(n - 1);

        let first = x[0];
        let last = x[n - 1];
        let mut ext = Vec::with_capacity(n + 2 * edge);
        ext.extend((0..edge).map(|j| 2.0 * first - x[edge - j]));
        ext.extend_from_slice(x);
        ext.extend((0..edge).map(|j| 2.0 * last - x[n - 2 - j]));

        let zi = self.steady_state();
        let scaled = |k: f64| -> Vec<[f64; 2]> { zi.iter().map(|z| [z[0] * k, z[1] * k]).collect() };

        let forward = self.run(&ext, scaled(ext[0]));
        let mut reversed: Vec<f64> = forward.into_iter().rev().collect();
        let y0 = reversed[0];
        reversed = self.run(&reversed, scaled(y0));
        reversed.reverse();

        reversed[edge..edge + n].to_vec()
    }

    /// Zero-phase filtering applied to every axis of a multi-axis signal.
    pub fn filtfilt_axes<const D: usize>(&self, x: &[[f64; D]]) -> Vec<[f64; D]> {
        let mut out = vec![[0.0; D]; x.len()];
        for axis in 0..D {
            let column: Vec<f64> = x.iter().map(|s| s[axis]).collect();
            for (row, v) in out.iter_mut().zip(self.filtfilt(&column)) {
                row[axis] = v;
            }
        }
        out
    }
}

fn section_dc_gain(s: &Section) -> f64 {
    (s[0] + s[1] + s[2]) / (s[3] + s[4] + s[5])
}

/// Poles of the analog Butterworth prototype with unit cutoff.
fn prototype_poles(order: usize) -> Vec<Complex64> {
    let n = order as i64;
    (0..order as i64)
        .map(|i| {
            let m = (-n + 1 + 2 * i) as f64;
            -Complex64::from_polar(1.0, PI * m / (2.0 * n as f64))
        })
        .collect()
}

/// Bilinear transform of an analog zero-pole-gain system (internal fs of 2).
fn bilinear(
    zeros: Vec<Complex64>,
    poles: Vec<Complex64>,
    gain: f64,
) -> (Vec<Complex64>, Vec<Complex64>, f64) {
    let fs2 = Complex64::new(4.0, 0.0);
    let one = Complex64::new(1.0, 0.0);

    let num = zeros.iter().fold(one, |acc, z| acc * (fs2 - *z));
    let den = poles.iter().fold(one, |acc, p| acc * (fs2 - *p));
    let gain = gain * (num / den).re;

    let mut dz: Vec<Complex64> = zeros.iter().map(|z| (fs2 + *z) / (fs2 - *z)).collect();
    let dp: Vec<Complex64> = poles.iter().map(|p| (fs2 + *p) / (fs2 - *p)).collect();
    // zeros at analog infinity land on Nyquist
    dz.extend(std::iter::repeat(Complex64::new(-1.0, 0.0)).take(poles.len() - zeros.len()));

    (dz, dp, gain)
}

/// Group roots into real-coefficient factors of degree 1 or 2.
///
/// Complex roots are paired with their conjugates; real roots are paired
/// with each other, leaving at most one first-order factor.
fn group_roots(roots: &[Complex64]) -> Vec<Vec<Complex64>> {
    let mut groups = Vec::new();
    let mut real: Vec<Complex64> = Vec::new();
    for r in roots {
        if r.im.abs() <= REAL_TOL {
            real.push(Complex64::new(r.re, 0.0));
        } else if r.im > 0.0 {
            groups.push(vec![*r, r.conj()]);
        }
    }
    real.sort_by(|a, b| a.re.total_cmp(&b.re));
    groups.extend(real.chunks(2).map(|chunk| chunk.to_vec()));
    groups
}

/// Monic polynomial `[1, c1, c2]` with the given (one or two) roots.
fn factor_coeffs(roots: &[Complex64]) -> [f64; 3] {
    match roots {
        [r] => [1.0, -r.re, 0.0],
        [r1, r2] => [1.0, -(*r1 + *r2).re, (*r1 * *r2).re],
        _ => [1.0, 0.0, 0.0],
    }
}

fn to_sections(zeros: Vec<Complex64>, poles: Vec<Complex64>, gain: f64) -> Vec<Section> {
    let pole_groups = group_roots(&poles);
    let zero_groups = group_roots(&zeros);

    let mut zero_roots: Vec<Complex64> = zero_groups.into_iter().flatten().collect();
    let mut sections: Vec<Section> = pole_groups
        .iter()
        .map(|pg| {
            let take = pg.len().min(zero_roots.len());
            let zg: Vec<Complex64> = zero_roots.drain(..take).collect();
            let b = factor_coeffs(&zg);
            let a = factor_coeffs(pg);
            [b[0], b[1], b[2], a[0], a[1], a[2]]
        })
        .collect();

    if let Some(first) = sections.first_mut() {
        first[0] *= gain;
        first[1] *= gain;
        first[2] *= gain;
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sine(n: usize, freq: f64, fs: f64) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f64 / fs).sin())
            .collect()
    }

    #[test]
    fn test_second_order_lowpass_coefficients() {
        // reference coefficients for butter(2, 0.2)
        let f = SosFilter::butterworth(2, FilterBand::LowPass(10.0), 100.0).unwrap();
        let s = f.sections()[0];
        assert_eq!(f.sections().len(), 1);
        assert_relative_eq!(s[0], 0.067_455_27, epsilon = 1e-6);
        assert_relative_eq!(s[1], 0.134_910_55, epsilon = 1e-6);
        assert_relative_eq!(s[2], 0.067_455_27, epsilon = 1e-6);
        assert_relative_eq!(s[4], -1.142_980_5, epsilon = 1e-6);
        assert_relative_eq!(s[5], 0.412_801_6, epsilon = 1e-6);
    }

    #[test]
    fn test_second_order_highpass_coefficients() {
        // butter(2, 3, 'high', fs=50)
        let f = SosFilter::butterworth(2, FilterBand::HighPass(3.0), 50.0).unwrap();
        let s = f.sections()[0];
        assert_relative_eq!(s[0], 0.8371, epsilon = 1e-3);
        assert_relative_eq!(s[1], -1.6742, epsilon = 1e-3);
        assert_relative_eq!(s[2], 0.8371, epsilon = 1e-3);
        assert_relative_eq!(s[4], -1.6475, epsilon = 1e-3);
        assert_relative_eq!(s[5], 0.7009, epsilon = 1e-3);
    }

    #[test]
    fn test_section_counts() {
        let lp = SosFilter::butterworth(4, FilterBand::LowPass(10.0), 100.0).unwrap();
        assert_eq!(lp.sections().len(), 2);
        let odd = SosFilter::butterworth(3, FilterBand::LowPass(10.0), 100.0).unwrap();
        assert_eq!(odd.sections().len(), 2);
        let bp = SosFilter::butterworth(
            4,
            FilterBand::BandPass {
                low: 0.2,
                high: 15.0,
            },
            100.0,
        )
        .unwrap();
        assert_eq!(bp.sections().len(), 4);
    }

    #[test]
    fn test_dc_gains() {
        let lp = SosFilter::butterworth(4, FilterBand::LowPass(10.0), 100.0).unwrap();
        assert_relative_eq!(lp.dc_gain(), 1.0, epsilon = 1e-9);
        let hp = SosFilter::butterworth(4, FilterBand::HighPass(0.5), 100.0).unwrap();
        assert!(hp.dc_gain().abs() < 1e-9);
    }

    #[test]
    fn test_lowpass_constant_passes_unchanged() {
        let lp = SosFilter::butterworth(4, FilterBand::LowPass(10.0), 100.0).unwrap();
        let y = lp.filtfilt(&vec![2.5; 300]);
        for v in y {
            assert_relative_eq!(v, 2.5, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_lowpass_keeps_slow_removes_fast() {
        let fs = 100.0;
        let slow = sine(1000, 1.0, fs);
        let fast = sine(1000, 35.0, fs);
        let mixed: Vec<f64> = slow.iter().zip(&fast).map(|(a, b)| a + b).collect();

        let lp = SosFilter::butterworth(4, FilterBand::LowPass(10.0), fs).unwrap();
        let y = lp.filtfilt(&mixed);
        for i in 100..900 {
            assert!((y[i] - slow[i]).abs() < 0.02, "i={} diff={}", i, y[i] - slow[i]);
        }
    }

    #[test]
    fn test_highpass_removes_offset() {
        let fs = 50.0;
        let x: Vec<f64> = sine(1000, 5.0, fs).iter().map(|v| v + 9.81).collect();
        let hp = SosFilter::butterworth(4, FilterBand::HighPass(0.5), fs).unwrap();
        let y = hp.filtfilt(&x);
        let mean: f64 = y[200..800].iter().sum::<f64>() / 600.0;
        assert!(mean.abs() < 0.05);
    }

    #[test]
    fn test_short_signal_does_not_panic() {
        let lp = SosFilter::butterworth(4, FilterBand::LowPass(10.0), 100.0).unwrap();
        assert_eq!(lp.filtfilt(&[1.0, 2.0, 3.0]).len(), 3);
        assert_eq!(lp.filtfilt(&[1.0]), vec![1.0]);
        assert!(lp.filtfilt(&[]).is_empty());
    }

    #[test]
    fn test_invalid_design() {
        assert!(SosFilter::butterworth(0, FilterBand::LowPass(10.0), 100.0).is_err());
        assert!(SosFilter::butterworth(4, FilterBand::LowPass(60.0), 100.0).is_err());
        assert!(SosFilter::butterworth(4, FilterBand::HighPass(0.0), 100.0).is_err());
        assert!(SosFilter::butterworth(
            4,
            FilterBand::BandPass {
                low: 10.0,
                high: 5.0
            },
            100.0
        )
        .is_err());
    }

    #[test]
    fn test_filtfilt_axes() {
        let lp = SosFilter::butterworth(4, FilterBand::LowPass(10.0), 100.0).unwrap();
        let x: Vec<[f64; 3]> = (0..200).map(|_| [1.0, 0.0, -1.0]).collect();
        let y = lp.filtfilt_axes(&x);
        assert_relative_eq!(y[100][0], 1.0, epsilon = 1e-9);
        assert_relative_eq!(y[100][2], -1.0, epsilon = 1e-9);
    }
}
