// src/error.rs
//! Unified error handling for EEG Core
//!
//! Every stage of the pipeline fails fast and surfaces one of the kinds below to
//! the caller. No stage substitutes a default value or lets NaN/Infinity leak
//! into its output; turning an error into a user-visible message is the
//! presentation layer's job.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the entire EEG pipeline
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EegError {
    /// Signal shorter than one PSD segment (or otherwise too short for a stage)
    #[error("[DATA] Insufficient data for {stage}: got {got} samples, need at least {need}")]
    InsufficientData {
        /// Stage that rejected the input
        stage: ProcessingStage,
        /// Samples available
        got: usize,
        /// Samples required
        need: usize,
    },

    /// Channel, band or client structure disagreement
    #[error("[SHAPE] {what} mismatch during {stage}: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Stage that detected the mismatch
        stage: ProcessingStage,
        /// Which structural property disagreed
        what: String,
        /// Expected value
        expected: String,
        /// Value actually seen
        actual: String,
    },

    /// Zero (or non-finite) baseline in a percent-change computation
    #[error("[BASELINE] Degenerate rest baseline for band '{band}': mean power is {mean_rest}")]
    DegenerateBaseline {
        /// Band whose baseline is degenerate
        band: String,
        /// Offending channel-mean rest power
        mean_rest: f64,
    },

    /// Malformed recording source
    #[error("[DECODE] Failed to decode recording '{source_name}': {reason}")]
    Decode {
        /// Identifier of the recording source
        source_name: String,
        /// What was wrong with it
        reason: String,
    },

    /// Computation stopped through a cancellation token
    #[error("[CANCELLED] {stage} was cancelled before completion")]
    Cancelled {
        /// Stage that observed the cancellation
        stage: ProcessingStage,
    },

    /// Invalid parameters or configuration
    #[error("[CONFIG] Configuration error in {component}: {reason}")]
    Configuration {
        /// Component that rejected the configuration
        component: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Pipeline stages for error tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessingStage {
    Decoding,
    Filtering,
    SpectralEstimation,
    BandPower,
    Comparison,
    ClientSimulation,
    Aggregation,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ProcessingStage::Decoding => "decoding",
            ProcessingStage::Filtering => "filtering",
            ProcessingStage::SpectralEstimation => "spectral estimation",
            ProcessingStage::BandPower => "band power extraction",
            ProcessingStage::Comparison => "condition comparison",
            ProcessingStage::ClientSimulation => "client simulation",
            ProcessingStage::Aggregation => "aggregation",
        };
        write!(f, "{}", name)
    }
}

/// Result type alias for EEG operations
pub type EegResult<T> = Result<T, EegError>;

impl EegError {
    /// Build a shape mismatch error
    pub fn shape_mismatch(
        stage: ProcessingStage,
        what: &str,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        EegError::ShapeMismatch {
            stage,
            what: what.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Build a configuration error
    pub fn configuration(component: &str, reason: impl Into<String>) -> Self {
        EegError::Configuration {
            component: component.to_string(),
            reason: reason.into(),
        }
    }

    /// Build a decode error
    pub fn decode(source_name: &str, reason: impl Into<String>) -> Self {
        EegError::Decode {
            source_name: source_name.to_string(),
            reason: reason.into(),
        }
    }

    /// Stage the error originated from, when it is tied to one
    pub fn stage(&self) -> Option<ProcessingStage> {
        match self {
            EegError::InsufficientData { stage, .. }
            | EegError::ShapeMismatch { stage, .. }
            | EegError::Cancelled { stage } => Some(*stage),
            EegError::DegenerateBaseline { .. } => Some(ProcessingStage::Comparison),
            EegError::Decode { .. } => Some(ProcessingStage::Decoding),
            EegError::Configuration { .. } => None,
        }
    }
}

impl From<crate::config::ConfigError> for EegError {
    fn from(err: crate::config::ConfigError) -> Self {
        EegError::configuration("config_loader", err.to_string())
    }
}
