//! Recording decoders
//! Location: src/preprocessing/decoder.rs
//!
//! The JSON layout is
//!
//! ```text
//! { "sampling_rate": 250.0,
//!   "channels": [{ "name": "Fz", "kind": "eeg" }, ...],   // optional
//!   "data": [[ch0 samples...], [ch1 samples...], ...] }
//! ```

use super::recording::{default_channel_names, ChannelInfo, Recording};
use crate::error::{EegError, EegResult};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Turns raw bytes into a [`Recording`]
pub trait RecordingDecoder: Send + Sync {
    /// Decode `bytes`; malformed input is an [`EegError::Decode`] naming `source_name`
    fn decode(&self, source_name: &str, bytes: &[u8]) -> EegResult<Recording>;
}

/// Serialized form of a recording
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingDocument {
    pub sampling_rate: f64,
    #[serde(default)]
    pub channels: Vec<ChannelInfo>,
    pub data: Vec<Vec<f64>>,
}

impl From<&Recording> for RecordingDocument {
    fn from(recording: &Recording) -> Self {
        Self {
            sampling_rate: recording.sampling_rate(),
            channels: recording.channels().to_vec(),
            data: recording.signal().outer_iter().map(|row| row.to_vec()).collect(),
        }
    }
}

/// JSON recording decoder
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRecordingDecoder;

impl JsonRecordingDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Serialize a recording in the layout this decoder reads
    pub fn encode(recording: &Recording) -> EegResult<Vec<u8>> {
        serde_json::to_vec(&RecordingDocument::from(recording))
            .map_err(|e| EegError::decode("recording", format!("JSON encoding failed: {}", e)))
    }
}

impl RecordingDecoder for JsonRecordingDecoder {
    fn decode(&self, source_name: &str, bytes: &[u8]) -> EegResult<Recording> {
        let document: RecordingDocument = serde_json::from_slice(bytes)
            .map_err(|e| EegError::decode(source_name, format!("invalid JSON: {}", e)))?;

        let n_channels = document.data.len();
        if n_channels == 0 {
            return Err(EegError::decode(source_name, "recording has no channels"));
        }
        let n_samples = document.data[0].len();
        if n_samples == 0 {
            return Err(EegError::decode(source_name, "recording has no samples"));
        }
        if let Some((idx, row)) = document
            .data
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != n_samples)
        {
            return Err(EegError::decode(
                source_name,
                format!(
                    "channel {} has {} samples, expected {}",
                    idx,
                    row.len(),
                    n_samples
                ),
            ));
        }

        let channels = if document.channels.is_empty() {
            default_channel_names(n_channels)
        } else if document.channels.len() == n_channels {
            document.channels
        } else {
            return Err(EegError::decode(
                source_name,
                format!(
                    "{} channel descriptions for {} data rows",
                    document.channels.len(),
                    n_channels
                ),
            ));
        };

        let flat: Vec<f64> = document.data.into_iter().flatten().collect();
        let signal = Array2::from_shape_vec((n_channels, n_samples), flat)
            .map_err(|e| EegError::decode(source_name, e.to_string()))?;

        Recording::new(signal, document.sampling_rate, channels)
            .map_err(|e| EegError::decode(source_name, e.to_string()))
    }
}
