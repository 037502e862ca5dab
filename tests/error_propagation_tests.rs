// tests/error_propagation_tests.rs
//! Error propagation through the public pipeline
//!
//! Each stage's failure must reach the caller unchanged, tagged with the
//! stage that produced it.

use eeg_core::config::{AnalysisConfig, ConfigError, ConfigLoader, PreprocessingConfig, SpectralConfig};
use eeg_core::error::{EegError, ProcessingStage};
use eeg_core::federation::{simulate_clients, ClientFeatureSimulator};
use eeg_core::preprocessing::{Recording, RecordingSource};
use eeg_core::processing::{ConditionAnalysis, FeaturePipeline, WelchEstimator};
use eeg_core::CancellationToken;
use ndarray::Array2;
use std::io::Write;
use tempfile::NamedTempFile;

fn unfiltered() -> AnalysisConfig {
    AnalysisConfig {
        preprocessing: PreprocessingConfig { l_freq: None, h_freq: None },
        ..AnalysisConfig::default()
    }
}

fn constant_source(name: &str, channels: usize, samples: usize, fs: f64) -> RecordingSource {
    let recording = Recording::with_default_channels(Array2::from_elem((channels, samples), 1.0), fs).unwrap();
    RecordingSource::from_recording(name, recording)
}

#[test]
fn test_insufficient_data_reaches_caller() {
    let pipeline = FeaturePipeline::from_config(&unfiltered()).unwrap();
    let err = pipeline.process(&constant_source("short", 2, 500, 250.0)).unwrap_err();

    assert_eq!(err.stage(), Some(ProcessingStage::SpectralEstimation));
    assert!(err.to_string().contains("need at least 1000"));
}

#[test]
fn test_flat_rest_signal_is_degenerate_baseline() {
    // Detrended constant signals have an all-zero PSD
    let analysis = ConditionAnalysis::new(FeaturePipeline::from_config(&unfiltered()).unwrap());
    let err = analysis
        .run(&constant_source("rest", 2, 2500, 250.0), &constant_source("task", 2, 2500, 250.0))
        .unwrap_err();

    match err {
        EegError::DegenerateBaseline { band, mean_rest } => {
            assert_eq!(band, "Delta");
            assert_eq!(mean_rest, 0.0);
        }
        other => panic!("Expected degenerate baseline, got {:?}", other),
    }
}

#[test]
fn test_decode_error_names_source() {
    let pipeline = FeaturePipeline::from_config(&unfiltered()).unwrap();
    let source = RecordingSource::Bytes { name: "rest.json".to_string(), data: b"[1, 2, 3]".to_vec() };

    let err = pipeline.process(&source).unwrap_err();
    assert!(matches!(&err, EegError::Decode { source_name, .. } if source_name == "rest.json"));
    assert!(err.to_string().starts_with("[DECODE]"));
}

#[test]
fn test_invalid_spectral_config_rejected_up_front() {
    let config = SpectralConfig { overlap_seconds: 4.0, ..SpectralConfig::default() };
    assert!(matches!(WelchEstimator::new(config), Err(EegError::Configuration { .. })));

    let config = AnalysisConfig { spectral: SpectralConfig::with_range(50.0, 10.0), ..unfiltered() };
    assert!(FeaturePipeline::from_config(&config).is_err());
}

#[test]
fn test_cancellation_is_not_partial_data() {
    let simulator = ClientFeatureSimulator::new(FeaturePipeline::from_config(&unfiltered()).unwrap());
    let clients = vec![vec![constant_source("a", 1, 2500, 250.0)]; 3];
    let token = CancellationToken::new();
    token.cancel();

    let err = simulate_clients(&simulator, &clients, &token).unwrap_err();
    assert!(matches!(err, EegError::Cancelled { .. }));
}

#[test]
fn test_config_error_conversion() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[spectral]\nfmin = \"one\"").unwrap();

    let loader = ConfigLoader::with_paths(vec![file.path().to_path_buf()]);
    let config_err = loader.load().unwrap_err();
    assert!(matches!(config_err, ConfigError::ParseError(_)));

    let err: EegError = config_err.into();
    assert!(matches!(err, EegError::Configuration { .. }));
    assert_eq!(err.stage(), None);
}
