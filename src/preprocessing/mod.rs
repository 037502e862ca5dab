//! Recording preparation: decoding and band-pass filtering
//! Location: src/preprocessing/mod.rs

pub mod decoder;
pub mod filter;
pub mod recording;
pub mod synthetic;

pub use decoder::{JsonRecordingDecoder, RecordingDecoder, RecordingDocument};
pub use filter::{BandType, BandpassFilter, Biquad};
pub use recording::{ChannelInfo, ChannelKind, ChannelMetadata, Recording};
pub use synthetic::{Oscillator, SyntheticConfig, SyntheticRecordingGenerator};

use crate::config::processing_config::{validate_preprocessing_config, PreprocessingConfig};
use crate::error::{EegError, EegResult};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Where a recording comes from
#[derive(Debug, Clone)]
pub enum RecordingSource {
    /// File read from disk and decoded
    File(PathBuf),
    /// In-memory encoded bytes
    Bytes { name: String, data: Vec<u8> },
    /// Already decoded recording
    Memory { name: String, recording: Arc<Recording> },
}

impl RecordingSource {
    pub fn from_recording(name: impl Into<String>, recording: Recording) -> Self {
        Self::Memory { name: name.into(), recording: Arc::new(recording) }
    }

    pub fn name(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Bytes { name, .. } | Self::Memory { name, .. } => name.clone(),
        }
    }
}

/// Turns a source into an analysis-ready recording
pub trait Preprocessor: Send + Sync {
    fn prepare(&self, source: &RecordingSource) -> EegResult<Recording>;
}

/// Decode, then band-pass filter with `(l_freq, h_freq)`
pub struct StandardPreprocessor {
    decoder: Box<dyn RecordingDecoder>,
    config: PreprocessingConfig,
}

impl StandardPreprocessor {
    pub fn new(config: PreprocessingConfig) -> EegResult<Self> {
        Self::with_decoder(Box::new(JsonRecordingDecoder::new()), config)
    }

    pub fn with_decoder(decoder: Box<dyn RecordingDecoder>, config: PreprocessingConfig) -> EegResult<Self> {
        validate_preprocessing_config(&config)
            .map_err(|reason| EegError::configuration("preprocessing", reason))?;
        Ok(Self { decoder, config })
    }

    pub fn config(&self) -> &PreprocessingConfig {
        &self.config
    }

    fn load(&self, source: &RecordingSource) -> EegResult<Recording> {
        match source {
            RecordingSource::File(path) => {
                let name = path.display().to_string();
                let bytes = std::fs::read(path)
                    .map_err(|e| EegError::decode(&name, format!("cannot read file: {}", e)))?;
                self.decoder.decode(&name, &bytes)
            }
            RecordingSource::Bytes { name, data } => self.decoder.decode(name, data),
            RecordingSource::Memory { recording, .. } => Ok(recording.as_ref().clone()),
        }
    }
}

impl Preprocessor for StandardPreprocessor {
    fn prepare(&self, source: &RecordingSource) -> EegResult<Recording> {
        let recording = self.load(source)?;
        debug!(
            source = %source.name(),
            channels = recording.channel_count(),
            samples = recording.sample_count(),
            sampling_rate = recording.sampling_rate(),
            "recording decoded"
        );

        let filter = BandpassFilter::new(self.config.l_freq, self.config.h_freq, recording.sampling_rate())?;
        if filter.is_passthrough() {
            return Ok(recording);
        }

        let filtered = filter.apply(recording.signal());
        info!(source = %source.name(), l_freq = ?self.config.l_freq, h_freq = ?self.config.h_freq, "recording filtered");
        recording.with_signal(filtered)
    }
}
