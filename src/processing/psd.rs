// src/processing/psd.rs
//! Welch power spectral density estimation
//!
//! Each channel is split into overlapping segments (4 s long with a 2 s hop by
//! default). Every segment is mean-removed, windowed with a periodic Hamming
//! window and transformed with `rustfft`; the one-sided periodograms are
//! averaged and scaled to density units (signal units squared per Hz).
//!
//! ```text
//! PSD[k] = c_k / (fs * S2 * n_seg) * sum_seg |X_seg[k]|^2
//! ```
//!
//! where `S2` is the window power and `c_k` is 2 for every bin except DC and
//! the Nyquist bin.

use crate::config::constants::spectral::MIN_SEGMENT_SAMPLES;
use crate::config::processing_config::{validate_spectral_config, SpectralConfig};
use crate::error::{EegError, EegResult, ProcessingStage};
use crate::processing::cancellation::CancellationToken;
use crate::processing::windowing::{generate_window, window_power};
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis};
use rayon::prelude::*;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Channel x sample matrix (microvolts)
pub type SignalMatrix = Array2<f64>;

/// Power spectral density per channel with its frequency axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPsdResult")]
pub struct PsdResult {
    psd: Array2<f64>,
    freqs: Array1<f64>,
    frequency_resolution: f64,
}

#[derive(Deserialize)]
struct RawPsdResult {
    psd: Array2<f64>,
    freqs: Array1<f64>,
    frequency_resolution: f64,
}

impl TryFrom<RawPsdResult> for PsdResult {
    type Error = EegError;

    fn try_from(raw: RawPsdResult) -> Result<Self, Self::Error> {
        Self::new(raw.psd, raw.freqs, raw.frequency_resolution)
    }
}

impl PsdResult {
    /// Assemble a result, checking the shape and axis invariants
    pub fn new(psd: Array2<f64>, freqs: Array1<f64>, frequency_resolution: f64) -> EegResult<Self> {
        if psd.ncols() != freqs.len() {
            return Err(EegError::shape_mismatch(
                ProcessingStage::SpectralEstimation,
                "frequency bin count",
                freqs.len(),
                psd.ncols(),
            ));
        }
        if !(frequency_resolution.is_finite() && frequency_resolution > 0.0) {
            return Err(EegError::configuration(
                "psd",
                format!("Frequency resolution must be positive, got {}", frequency_resolution),
            ));
        }
        if freqs.windows(2).into_iter().any(|pair| pair[1] <= pair[0]) {
            return Err(EegError::configuration("psd", "Frequency axis must be strictly increasing"));
        }
        Ok(Self { psd, freqs, frequency_resolution })
    }

    /// Power matrix, shape (channels, bins)
    pub fn psd(&self) -> ArrayView2<'_, f64> {
        self.psd.view()
    }

    /// Bin centers in Hz
    pub fn freqs(&self) -> ArrayView1<'_, f64> {
        self.freqs.view()
    }

    /// Bin spacing in Hz
    pub fn frequency_resolution(&self) -> f64 {
        self.frequency_resolution
    }

    pub fn channel_count(&self) -> usize {
        self.psd.nrows()
    }

    pub fn bin_count(&self) -> usize {
        self.freqs.len()
    }

    /// Channel-averaged PSD curve
    pub fn mean_over_channels(&self) -> Array1<f64> {
        self.psd
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(self.bin_count()))
    }

    /// Whether two results share an identical frequency axis
    pub fn same_frequency_axis(&self, other: &PsdResult) -> bool {
        self.frequency_resolution == other.frequency_resolution && self.freqs == other.freqs
    }
}

/// Welch estimator with fixed spectral parameters
#[derive(Debug, Clone)]
pub struct WelchEstimator {
    config: SpectralConfig,
}

/// Segment plan derived from the sampling rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentPlan {
    pub n_per_seg: usize,
    pub n_overlap: usize,
    pub n_fft: usize,
}

impl SegmentPlan {
    pub fn step(&self) -> usize {
        self.n_per_seg - self.n_overlap
    }

    /// Number of full segments in `n_samples`
    pub fn segment_count(&self, n_samples: usize) -> usize {
        if n_samples < self.n_per_seg {
            0
        } else {
            (n_samples - self.n_overlap) / self.step()
        }
    }
}

impl WelchEstimator {
    pub fn new(config: SpectralConfig) -> EegResult<Self> {
        validate_spectral_config(&config).map_err(|reason| EegError::configuration("psd", reason))?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SpectralConfig {
        &self.config
    }

    /// Segment and overlap lengths in samples for `sampling_rate`
    pub fn segment_plan(&self, sampling_rate: f64) -> EegResult<SegmentPlan> {
        if !(sampling_rate.is_finite() && sampling_rate > 0.0) {
            return Err(EegError::configuration(
                "psd",
                format!("Sampling rate must be positive, got {}", sampling_rate),
            ));
        }

        let n_per_seg = (self.config.window_seconds * sampling_rate) as usize;
        let n_overlap = (self.config.overlap_seconds * sampling_rate) as usize;

        if n_per_seg < MIN_SEGMENT_SAMPLES {
            return Err(EegError::configuration(
                "psd",
                format!("Segment of {} samples is too short", n_per_seg),
            ));
        }
        if n_overlap >= n_per_seg {
            return Err(EegError::configuration(
                "psd",
                format!("Overlap ({}) must be shorter than segment ({})", n_overlap, n_per_seg),
            ));
        }

        Ok(SegmentPlan { n_per_seg, n_overlap, n_fft: n_per_seg })
    }

    /// Estimate the PSD of every channel
    pub fn estimate(&self, signal: ArrayView2<'_, f64>, sampling_rate: f64) -> EegResult<PsdResult> {
        self.estimate_with_cancellation(signal, sampling_rate, &CancellationToken::new())
    }

    /// [`estimate`](Self::estimate), checking `token` between channels and segments
    pub fn estimate_with_cancellation(
        &self,
        signal: ArrayView2<'_, f64>,
        sampling_rate: f64,
        token: &CancellationToken,
    ) -> EegResult<PsdResult> {
        let plan = self.segment_plan(sampling_rate)?;
        let (n_channels, n_samples) = signal.dim();

        if n_channels == 0 {
            return Err(EegError::shape_mismatch(
                ProcessingStage::SpectralEstimation,
                "channel count",
                "at least 1",
                0,
            ));
        }
        if n_samples < plan.n_per_seg {
            return Err(EegError::InsufficientData {
                stage: ProcessingStage::SpectralEstimation,
                got: n_samples,
                need: plan.n_per_seg,
            });
        }

        let resolution = sampling_rate / plan.n_fft as f64;
        let bins: Vec<usize> = (0..=plan.n_fft / 2)
            .filter(|&k| {
                let freq = k as f64 * resolution;
                freq >= self.config.fmin && freq <= self.config.fmax
            })
            .collect();
        if bins.is_empty() {
            return Err(EegError::configuration(
                "psd",
                format!(
                    "No frequency bins in [{}, {}] Hz at {} Hz resolution",
                    self.config.fmin, self.config.fmax, resolution
                ),
            ));
        }

        let window = generate_window(self.config.window_type, plan.n_per_seg);
        let scale = 1.0 / (sampling_rate * window_power(&window));
        let fft = FftPlanner::<f64>::new().plan_fft_forward(plan.n_fft);
        let n_segments = plan.segment_count(n_samples);

        debug!(
            channels = n_channels,
            samples = n_samples,
            n_per_seg = plan.n_per_seg,
            n_overlap = plan.n_overlap,
            segments = n_segments,
            bins = bins.len(),
            "estimating Welch PSD"
        );

        let rows: Vec<Vec<f64>> = (0..n_channels)
            .into_par_iter()
            .map(|channel| -> EegResult<Vec<f64>> {
                token.check(ProcessingStage::SpectralEstimation)?;
                let periodogram = self.averaged_periodogram(
                    signal.row(channel),
                    &plan,
                    n_segments,
                    &window,
                    &fft,
                    token,
                )?;
                Ok(bins
                    .iter()
                    .map(|&k| {
                        let one_sided = if k == 0 || (plan.n_fft % 2 == 0 && k == plan.n_fft / 2) {
                            1.0
                        } else {
                            2.0
                        };
                        periodogram[k] * scale * one_sided
                    })
                    .collect())
            })
            .collect::<EegResult<_>>()?;

        let mut psd = Array2::zeros((n_channels, bins.len()));
        for (mut out, row) in psd.outer_iter_mut().zip(rows) {
            out.assign(&Array1::from(row));
        }
        let freqs = bins.iter().map(|&k| k as f64 * resolution).collect::<Array1<f64>>();

        PsdResult::new(psd, freqs, resolution)
    }

    /// Mean of |X|^2 over all segments of one channel, bins 0..=n_fft/2
    fn averaged_periodogram(
        &self,
        channel: ArrayView1<'_, f64>,
        plan: &SegmentPlan,
        n_segments: usize,
        window: &[f64],
        fft: &Arc<dyn Fft<f64>>,
        token: &CancellationToken,
    ) -> EegResult<Vec<f64>> {
        let n_bins = plan.n_fft / 2 + 1;
        let mut accum = vec![0.0; n_bins];
        let mut buffer = vec![Complex::new(0.0, 0.0); plan.n_fft];
        let mut scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        for segment_idx in 0..n_segments {
            token.check(ProcessingStage::SpectralEstimation)?;

            let start = segment_idx * plan.step();
            let segment = channel.slice(s![start..start + plan.n_per_seg]);
            let offset = if self.config.detrend {
                segment.mean().unwrap_or(0.0)
            } else {
                0.0
            };

            for (slot, (&sample, &w)) in buffer.iter_mut().zip(segment.iter().zip(window)) {
                *slot = Complex::new((sample - offset) * w, 0.0);
            }
            fft.process_with_scratch(&mut buffer, &mut scratch);

            for (acc, bin) in accum.iter_mut().zip(&buffer[..n_bins]) {
                *acc += bin.norm_sqr();
            }
        }

        let n_segments = n_segments as f64;
        accum.iter_mut().for_each(|acc| *acc /= n_segments);
        Ok(accum)
    }
}

/// Welch PSD with default windowing restricted to `[fmin, fmax]`
pub fn estimate_psd(
    signal: ArrayView2<'_, f64>,
    sampling_rate: f64,
    fmin: f64,
    fmax: f64,
) -> EegResult<PsdResult> {
    WelchEstimator::new(SpectralConfig::with_range(fmin, fmax))?.estimate(signal, sampling_rate)
}
