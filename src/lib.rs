//! EEG-Core: spectral feature extraction for multichannel EEG recordings
//!
//! This library estimates power spectral densities with Welch's method,
//! integrates them over named frequency bands, compares band power between a
//! rest and a task condition, and simulates averaging per-client feature
//! collections into one combined update. It features:
//!
//! - Welch PSD estimation (`rustfft`, parallel over channels with `rayon`)
//! - Configurable band catalog and boundary policy
//! - Zero-phase Butterworth band-pass preprocessing
//! - Parallel client simulation and exact elementwise aggregation
//! - Layered TOML configuration
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use eeg_core::config::AnalysisConfig;
//! use eeg_core::preprocessing::{synthetic, RecordingSource};
//! use eeg_core::processing::{ConditionAnalysis, FeaturePipeline};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (rest, task) = synthetic::rest_task_pair(42)?;
//!
//!     let pipeline = FeaturePipeline::from_config(&AnalysisConfig::default())?;
//!     let report = ConditionAnalysis::new(pipeline).run(
//!         &RecordingSource::from_recording("rest", rest),
//!         &RecordingSource::from_recording("task", task),
//!     )?;
//!
//!     for band in report.comparison.iter() {
//!         println!("{}: {:+.1}%", band.band, band.percent_change);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod error;
pub mod federation;
pub mod preprocessing;
pub mod processing;

// Re-export commonly used types for convenience
pub use config::{AnalysisConfig, BandCatalog, BoundaryPolicy, FrequencyBand};
pub use error::{EegError, EegResult, ProcessingStage};
pub use federation::{aggregate, AggregatedUpdate, ClientFeatureSimulator, ClientUpdate, RunningAggregator};
pub use preprocessing::{Preprocessor, Recording, RecordingSource};
pub use processing::{
    compare, estimate_psd, extract_all_bands, extract_band_power, BandPowerVector, CancellationToken,
    ConditionComparison, FeatureSet, PsdResult, SignalMatrix,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: "Spectral feature extraction and aggregation for EEG recordings".to_string(),
        features: vec![
            "Welch power spectral density".to_string(),
            "Band power integration".to_string(),
            "Rest vs. task comparison".to_string(),
            "Client feature aggregation".to_string(),
        ],
    }
}

/// Library version information
#[derive(Debug, Clone, serde::Serialize)]
pub struct VersionInfo {
    /// Library name
    pub name: String,
    /// Version string
    pub version: String,
    /// Description
    pub description: String,
    /// List of features
    pub features: Vec<String>,
}
