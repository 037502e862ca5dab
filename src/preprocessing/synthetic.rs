//! Synthetic EEG-like recordings for demos, tests and benches
//! Location: src/preprocessing/synthetic.rs

use super::recording::Recording;
use crate::error::{EegError, EegResult};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// One sinusoidal rhythm present on every channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Oscillator {
    pub frequency_hz: f64,
    /// Peak amplitude (uV)
    pub amplitude: f64,
}

impl Oscillator {
    pub fn new(frequency_hz: f64, amplitude: f64) -> Self {
        Self { frequency_hz, amplitude }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticConfig {
    pub channel_count: usize,
    pub sampling_rate: f64,
    pub duration_seconds: f64,
    pub oscillators: Vec<Oscillator>,
    /// Standard deviation of the additive Gaussian noise (uV)
    pub noise_std: f64,
    /// Relative per-channel amplitude spread in [0, 1)
    pub channel_gain_spread: f64,
    /// Mains interference amplitude (uV); zero disables it
    pub powerline_amplitude: f64,
    pub powerline_hz: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self::resting_state()
    }
}

impl SyntheticConfig {
    /// Eyes-closed profile dominated by alpha
    pub fn resting_state() -> Self {
        Self {
            channel_count: 4,
            sampling_rate: 250.0,
            duration_seconds: 20.0,
            oscillators: vec![
                Oscillator::new(2.5, 6.0),
                Oscillator::new(6.0, 4.0),
                Oscillator::new(10.0, 12.0),
                Oscillator::new(20.0, 3.0),
                Oscillator::new(40.0, 1.0),
            ],
            noise_std: 2.0,
            channel_gain_spread: 0.2,
            powerline_amplitude: 0.0,
            powerline_hz: 50.0,
        }
    }

    /// Active task profile: suppressed alpha, stronger beta and gamma
    pub fn task_state() -> Self {
        Self {
            oscillators: vec![
                Oscillator::new(2.5, 5.0),
                Oscillator::new(6.0, 5.0),
                Oscillator::new(10.0, 5.0),
                Oscillator::new(20.0, 7.0),
                Oscillator::new(40.0, 2.5),
            ],
            ..Self::resting_state()
        }
    }

    pub fn sample_count(&self) -> usize {
        (self.duration_seconds * self.sampling_rate) as usize
    }
}

/// Seeded generator; the same seed and config always produce the same recording
pub struct SyntheticRecordingGenerator {
    config: SyntheticConfig,
    rng: StdRng,
}

impl SyntheticRecordingGenerator {
    pub fn new(config: SyntheticConfig, seed: u64) -> EegResult<Self> {
        if config.channel_count == 0 {
            return Err(EegError::configuration("synthetic", "At least one channel is required"));
        }
        if !(config.duration_seconds.is_finite() && config.duration_seconds > 0.0) {
            return Err(EegError::configuration("synthetic", "Duration must be positive"));
        }
        if !(config.noise_std.is_finite() && config.noise_std >= 0.0) {
            return Err(EegError::configuration("synthetic", "Noise level cannot be negative"));
        }
        if !(0.0..1.0).contains(&config.channel_gain_spread) {
            return Err(EegError::configuration("synthetic", "Channel gain spread must be in [0, 1)"));
        }

        Ok(Self { config, rng: StdRng::seed_from_u64(seed) })
    }

    pub fn config(&self) -> &SyntheticConfig {
        &self.config
    }

    /// Generate the next recording from the generator's random stream
    pub fn generate(&mut self) -> EegResult<Recording> {
        let n_channels = self.config.channel_count;
        let n_samples = self.config.sample_count();
        let fs = self.config.sampling_rate;
        let mut signal = Array2::zeros((n_channels, n_samples));

        for mut row in signal.outer_iter_mut() {
            let gain = 1.0 + self.config.channel_gain_spread * (self.rng.gen::<f64>() * 2.0 - 1.0);
            let phases: Vec<f64> = self
                .config
                .oscillators
                .iter()
                .map(|_| self.rng.gen::<f64>() * 2.0 * PI)
                .collect();

            for (i, sample) in row.iter_mut().enumerate() {
                let t = i as f64 / fs;
                let rhythm: f64 = self
                    .config
                    .oscillators
                    .iter()
                    .zip(&phases)
                    .map(|(osc, phase)| osc.amplitude * (2.0 * PI * osc.frequency_hz * t + phase).sin())
                    .sum();
                let mains = self.config.powerline_amplitude
                    * (2.0 * PI * self.config.powerline_hz * t).sin();
                let noise = self.config.noise_std * self.gaussian();

                *sample = gain * rhythm + mains + noise;
            }
        }

        Recording::with_default_channels(signal, fs)
    }

    /// Box-Muller standard normal sample
    fn gaussian(&mut self) -> f64 {
        // gen::<f64>() is in [0, 1); shift to (0, 1] for the log
        let u1 = 1.0 - self.rng.gen::<f64>();
        let u2 = self.rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }
}

/// Rest and task recordings for one simulated subject
pub fn rest_task_pair(seed: u64) -> EegResult<(Recording, Recording)> {
    let rest = SyntheticRecordingGenerator::new(SyntheticConfig::resting_state(), seed)?.generate()?;
    let task = SyntheticRecordingGenerator::new(SyntheticConfig::task_state(), seed.wrapping_add(1))?
        .generate()?;
    Ok((rest, task))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_generation_is_deterministic() {
        let a = SyntheticRecordingGenerator::new(SyntheticConfig::default(), 7)
            .unwrap()
            .generate()
            .unwrap();
        let b = SyntheticRecordingGenerator::new(SyntheticConfig::default(), 7)
            .unwrap()
            .generate()
            .unwrap();
        let c = SyntheticRecordingGenerator::new(SyntheticConfig::default(), 8)
            .unwrap()
            .generate()
            .unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_shape_follows_config() {
        let config = SyntheticConfig {
            channel_count: 3,
            sampling_rate: 200.0,
            duration_seconds: 5.0,
            ..SyntheticConfig::default()
        };
        let recording = SyntheticRecordingGenerator::new(config, 1).unwrap().generate().unwrap();
        assert_eq!(recording.signal().dim(), (3, 1000));
        assert_eq!(recording.sampling_rate(), 200.0);
    }

    #[test]
    fn test_noise_only_statistics() {
        let config = SyntheticConfig {
            channel_count: 1,
            oscillators: Vec::new(),
            noise_std: 3.0,
            duration_seconds: 200.0,
            ..SyntheticConfig::default()
        };
        let recording = SyntheticRecordingGenerator::new(config, 42).unwrap().generate().unwrap();
        let signal = recording.signal();
        let n = signal.len() as f64;
        let mean = signal.sum() / n;
        let var = signal.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;

        assert!(mean.abs() < 0.1, "mean = {}", mean);
        assert!((var.sqrt() - 3.0).abs() < 0.1, "std = {}", var.sqrt());
    }

    #[test]
    fn test_invalid_config() {
        let config = SyntheticConfig { channel_count: 0, ..SyntheticConfig::default() };
        assert!(SyntheticRecordingGenerator::new(config, 0).is_err());
        let config = SyntheticConfig { channel_gain_spread: 1.5, ..SyntheticConfig::default() };
        assert!(SyntheticRecordingGenerator::new(config, 0).is_err());
    }
}
