//! Decoded multichannel recording
//! Location: src/preprocessing/recording.rs

use crate::config::constants::preprocessing::{MAX_SAMPLING_RATE_HZ, MIN_SAMPLING_RATE_HZ};
use crate::error::{EegError, EegResult, ProcessingStage};
use crate::processing::psd::SignalMatrix;
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    #[default]
    Eeg,
    Eog,
    Emg,
    Stim,
    Misc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub name: String,
    #[serde(default)]
    pub kind: ChannelKind,
}

impl ChannelInfo {
    pub fn eeg(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: ChannelKind::Eeg }
    }
}

/// Per-channel metadata, one entry per signal row
pub type ChannelMetadata = Vec<ChannelInfo>;

/// Signal matrix paired with its sampling rate and channel metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    signal: SignalMatrix,
    sampling_rate: f64,
    channels: ChannelMetadata,
}

impl Recording {
    /// Validate and assemble a recording
    pub fn new(signal: SignalMatrix, sampling_rate: f64, channels: ChannelMetadata) -> EegResult<Self> {
        if !(sampling_rate.is_finite()
            && (MIN_SAMPLING_RATE_HZ..=MAX_SAMPLING_RATE_HZ).contains(&sampling_rate))
        {
            return Err(EegError::configuration(
                "recording",
                format!(
                    "Sampling rate {} Hz outside [{}, {}] Hz",
                    sampling_rate, MIN_SAMPLING_RATE_HZ, MAX_SAMPLING_RATE_HZ
                ),
            ));
        }
        if channels.len() != signal.nrows() {
            return Err(EegError::shape_mismatch(
                ProcessingStage::Decoding,
                "channel metadata count",
                signal.nrows(),
                channels.len(),
            ));
        }
        if let Some(position) = signal.iter().position(|x| !x.is_finite()) {
            let n_samples = signal.ncols().max(1);
            return Err(EegError::decode(
                "recording",
                format!(
                    "Non-finite sample at channel {}, index {}",
                    position / n_samples,
                    position % n_samples
                ),
            ));
        }

        Ok(Self { signal, sampling_rate, channels })
    }

    /// Recording with generated EEG channel names ("EEG 001", ...)
    pub fn with_default_channels(signal: SignalMatrix, sampling_rate: f64) -> EegResult<Self> {
        let channels = default_channel_names(signal.nrows());
        Self::new(signal, sampling_rate, channels)
    }

    /// Same metadata over a replacement signal of identical shape
    pub fn with_signal(&self, signal: SignalMatrix) -> EegResult<Self> {
        if signal.dim() != self.signal.dim() {
            return Err(EegError::shape_mismatch(
                ProcessingStage::Filtering,
                "signal shape",
                format!("{:?}", self.signal.dim()),
                format!("{:?}", signal.dim()),
            ));
        }
        Self::new(signal, self.sampling_rate, self.channels.clone())
    }

    pub fn signal(&self) -> ArrayView2<'_, f64> {
        self.signal.view()
    }

    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    pub fn channels(&self) -> &[ChannelInfo] {
        &self.channels
    }

    pub fn channel_count(&self) -> usize {
        self.signal.nrows()
    }

    pub fn sample_count(&self) -> usize {
        self.signal.ncols()
    }

    pub fn duration_seconds(&self) -> f64 {
        self.sample_count() as f64 / self.sampling_rate
    }
}

pub(crate) fn default_channel_names(count: usize) -> ChannelMetadata {
    (1..=count).map(|i| ChannelInfo::eeg(format!("EEG {:03}", i))).collect()
}
