// src/config/mod.rs
//! Analysis configuration
//!
//! Everything the pipeline needs is carried in an [`AnalysisConfig`] value that
//! callers pass explicitly into each stage; nothing is read from process-wide
//! state.

pub mod bands;
pub mod constants;
pub mod loader;
pub mod processing_config;

pub use bands::{BandCatalog, BoundaryPolicy, FrequencyBand};
pub use constants::*;
pub use loader::{ConfigError, ConfigLoader};
pub use processing_config::*;

use serde::{Deserialize, Serialize};

/// Complete analysis configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub boundary_policy: BoundaryPolicy,

    #[serde(default)]
    pub preprocessing: PreprocessingConfig,

    #[serde(default)]
    pub spectral: SpectralConfig,

    #[serde(default)]
    pub bands: BandCatalog,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            boundary_policy: BoundaryPolicy::default(),
            preprocessing: PreprocessingConfig::default(),
            spectral: SpectralConfig::default(),
            bands: BandCatalog::default_eeg(),
        }
    }
}

impl AnalysisConfig {
    /// Validate configuration consistency
    pub fn validate_consistency(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if let Err(e) = validate_preprocessing_config(&self.preprocessing) {
            errors.push(e);
        }
        if let Err(e) = validate_spectral_config(&self.spectral) {
            errors.push(e);
        }

        if self.bands.is_empty() {
            errors.push("Band catalog must contain at least one band".to_string());
        }

        // Bands reaching outside the PSD range lose the outside part silently
        // during integration; a band entirely outside can never hold a bin.
        for band in &self.bands {
            if band.high_hz < self.spectral.fmin || band.low_hz > self.spectral.fmax {
                errors.push(format!(
                    "Band '{}' [{}, {}] Hz lies entirely outside the PSD range [{}, {}] Hz",
                    band.name, band.low_hz, band.high_hz, self.spectral.fmin, self.spectral.fmax
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Bands only partially covered by `[fmin, fmax]`
    pub fn partially_covered_bands(&self) -> Vec<&FrequencyBand> {
        self.bands
            .iter()
            .filter(|band| band.low_hz < self.spectral.fmin || band.high_hz > self.spectral.fmax)
            .collect()
    }

    /// Get configuration summary
    pub fn get_summary(&self) -> ConfigSummary {
        ConfigSummary {
            l_freq: self.preprocessing.l_freq,
            h_freq: self.preprocessing.h_freq,
            fmin: self.spectral.fmin,
            fmax: self.spectral.fmax,
            window_seconds: self.spectral.window_seconds,
            overlap_seconds: self.spectral.overlap_seconds,
            band_names: self.bands.names().into_iter().map(str::to_string).collect(),
            boundary_policy: self.boundary_policy,
        }
    }
}

/// Configuration summary for display/logging
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary {
    pub l_freq: Option<f64>,
    pub h_freq: Option<f64>,
    pub fmin: f64,
    pub fmax: f64,
    pub window_seconds: f64,
    pub overlap_seconds: f64,
    pub band_names: Vec<String>,
    pub boundary_policy: BoundaryPolicy,
}
