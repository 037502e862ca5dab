// src/preprocessing/filter.rs
//! Zero-phase Butterworth band-pass built from second-order sections
//!
//! The high-pass (`l_freq`) and low-pass (`h_freq`) edges are each a
//! 2nd-order Butterworth biquad designed with the bilinear transform. The
//! cascade runs forward and then backward over an odd-extended copy of each
//! channel, so the result has no phase shift and the effective magnitude
//! response is the square of the single-pass one.

use crate::error::{EegError, EegResult};
use ndarray::{Array2, ArrayView1, ArrayView2};
use std::f64::consts::{PI, SQRT_2};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandType {
    Lowpass,
    Highpass,
}

/// One biquad, `a[0]` normalized to 1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    pub b: [f64; 3],
    pub a: [f64; 3],
}

impl Biquad {
    /// 2nd-order Butterworth section
    pub fn butterworth(cutoff: f64, sample_rate: f64, band_type: BandType) -> EegResult<Self> {
        let nyquist = sample_rate / 2.0;
        if !(cutoff.is_finite() && cutoff > 0.0 && cutoff < nyquist) {
            return Err(EegError::configuration(
                "filter",
                format!(
                    "Cutoff {} Hz must lie in (0, {}) Hz for sampling rate {} Hz",
                    cutoff, nyquist, sample_rate
                ),
            ));
        }

        // Pre-warped analog cutoff
        let k = (PI * cutoff / sample_rate).tan();
        let k2 = k * k;
        let norm = 1.0 + SQRT_2 * k + k2;
        let a = [1.0, (2.0 * k2 - 2.0) / norm, (1.0 - SQRT_2 * k + k2) / norm];

        let b = match band_type {
            BandType::Lowpass => [k2 / norm, 2.0 * k2 / norm, k2 / norm],
            BandType::Highpass => [1.0 / norm, -2.0 / norm, 1.0 / norm],
        };

        Ok(Self { b, a })
    }

    /// Gain at DC
    fn dc_gain(&self) -> f64 {
        self.b.iter().sum::<f64>() / self.a.iter().sum::<f64>()
    }

    /// Transposed direct form II state for a unit-step steady state
    fn step_state(&self) -> [f64; 2] {
        let gain = self.dc_gain();
        let z2 = self.b[2] - self.a[2] * gain;
        let z1 = self.b[1] - self.a[1] * gain + z2;
        [z1, z2]
    }

    fn run(&self, data: &mut [f64], mut state: [f64; 2]) {
        for sample in data.iter_mut() {
            let x = *sample;
            let y = self.b[0] * x + state[0];
            state[0] = self.b[1] * x - self.a[1] * y + state[1];
            state[1] = self.b[2] * x - self.a[2] * y;
            *sample = y;
        }
    }
}

/// Band-pass with optional edges; `None` disables that side
#[derive(Debug, Clone)]
pub struct BandpassFilter {
    sections: Vec<Biquad>,
    l_freq: Option<f64>,
    h_freq: Option<f64>,
    sample_rate: f64,
}

impl BandpassFilter {
    pub fn new(l_freq: Option<f64>, h_freq: Option<f64>, sample_rate: f64) -> EegResult<Self> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(EegError::configuration(
                "filter",
                format!("Sampling rate must be positive, got {}", sample_rate),
            ));
        }
        if let (Some(low), Some(high)) = (l_freq, h_freq) {
            if high <= low {
                return Err(EegError::configuration(
                    "filter",
                    format!("h_freq ({} Hz) must be above l_freq ({} Hz)", high, low),
                ));
            }
        }

        let mut sections = Vec::with_capacity(2);
        if let Some(low) = l_freq {
            sections.push(Biquad::butterworth(low, sample_rate, BandType::Highpass)?);
        }
        if let Some(high) = h_freq {
            sections.push(Biquad::butterworth(high, sample_rate, BandType::Lowpass)?);
        }

        Ok(Self { sections, l_freq, h_freq, sample_rate })
    }

    /// Filter that leaves the signal untouched
    pub fn passthrough(sample_rate: f64) -> EegResult<Self> {
        Self::new(None, None, sample_rate)
    }

    pub fn is_passthrough(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn edges(&self) -> (Option<f64>, Option<f64>) {
        (self.l_freq, self.h_freq)
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn sections(&self) -> &[Biquad] {
        &self.sections
    }

    /// Zero-phase filter every channel into a new matrix
    pub fn apply(&self, signal: ArrayView2<'_, f64>) -> Array2<f64> {
        let mut output = signal.to_owned();
        if self.is_passthrough() {
            return output;
        }

        debug!(
            l_freq = ?self.l_freq,
            h_freq = ?self.h_freq,
            channels = signal.nrows(),
            samples = signal.ncols(),
            "applying zero-phase band-pass"
        );

        for (mut out, channel) in output.outer_iter_mut().zip(signal.outer_iter()) {
            let filtered = self.filtfilt(channel);
            for (dst, src) in out.iter_mut().zip(filtered) {
                *dst = src;
            }
        }
        output
    }

    fn padding(&self, n_samples: usize) -> usize {
        (3 * (2 * self.sections.len() + 1)).min(n_samples.saturating_sub(1))
    }

    fn filtfilt(&self, channel: ArrayView1<'_, f64>) -> Vec<f64> {
        let n = channel.len();
        if n == 0 {
            return Vec::new();
        }
        let pad = self.padding(n);

        let mut extended = odd_extension(channel, pad);
        self.cascade(&mut extended);
        extended.reverse();
        self.cascade(&mut extended);
        extended.reverse();

        extended[pad..pad + n].to_vec()
    }

    /// Run every section with its state primed for the leading sample
    fn cascade(&self, data: &mut [f64]) {
        let Some(&first) = data.first() else { return };
        let mut level = first;
        for section in &self.sections {
            let [z1, z2] = section.step_state();
            section.run(data, [z1 * level, z2 * level]);
            level *= section.dc_gain();
        }
    }
}

/// Reflect `pad` samples around each endpoint, point-symmetric
fn odd_extension(channel: ArrayView1<'_, f64>, pad: usize) -> Vec<f64> {
    let n = channel.len();
    let first = channel[0];
    let last = channel[n - 1];

    let mut extended = Vec::with_capacity(n + 2 * pad);
    extended.extend((1..=pad).rev().map(|i| 2.0 * first - channel[i]));
    extended.extend(channel.iter().copied());
    extended.extend((1..=pad).map(|i| 2.0 * last - channel[n - 1 - i]));
    extended
}
