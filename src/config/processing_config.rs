// src/config/processing_config.rs
//! Preprocessing and spectral estimation configuration structures

use crate::config::constants::{preprocessing, spectral};
use serde::{Deserialize, Serialize};

/// Band-pass parameters handed to the preprocessor
///
/// `None` disables that side of the band-pass.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PreprocessingConfig {
    #[serde(default = "defaults::l_freq")]
    pub l_freq: Option<f64>,

    #[serde(default = "defaults::h_freq")]
    pub h_freq: Option<f64>,
}

/// Welch PSD parameters
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SpectralConfig {
    #[serde(default = "defaults::fmin")]
    pub fmin: f64,

    #[serde(default = "defaults::fmax")]
    pub fmax: f64,

    #[serde(default = "defaults::window_seconds")]
    pub window_seconds: f64,

    #[serde(default = "defaults::overlap_seconds")]
    pub overlap_seconds: f64,

    #[serde(default)]
    pub window_type: WindowType,

    /// Remove each segment's mean before windowing
    #[serde(default = "defaults::detrend")]
    pub detrend: bool,
}

/// Window function types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowType {
    Rectangular,
    #[default]
    Hamming,
    Hanning,
    Blackman,
}

mod defaults {
    use super::{preprocessing, spectral};

    pub fn l_freq() -> Option<f64> { Some(preprocessing::DEFAULT_L_FREQ_HZ) }
    pub fn h_freq() -> Option<f64> { Some(preprocessing::DEFAULT_H_FREQ_HZ) }

    pub fn fmin() -> f64 { spectral::DEFAULT_FMIN_HZ }
    pub fn fmax() -> f64 { spectral::DEFAULT_FMAX_HZ }
    pub fn window_seconds() -> f64 { spectral::DEFAULT_WINDOW_SECONDS }
    pub fn overlap_seconds() -> f64 { spectral::DEFAULT_OVERLAP_SECONDS }
    pub fn detrend() -> bool { true }
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            l_freq: defaults::l_freq(),
            h_freq: defaults::h_freq(),
        }
    }
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            fmin: defaults::fmin(),
            fmax: defaults::fmax(),
            window_seconds: defaults::window_seconds(),
            overlap_seconds: defaults::overlap_seconds(),
            window_type: WindowType::default(),
            detrend: defaults::detrend(),
        }
    }
}

impl SpectralConfig {
    /// Config with a custom frequency range and default windowing
    pub fn with_range(fmin: f64, fmax: f64) -> Self {
        Self {
            fmin,
            fmax,
            ..Self::default()
        }
    }
}

/// Validate preprocessing configuration
pub fn validate_preprocessing_config(config: &PreprocessingConfig) -> Result<(), String> {
    if let Some(l_freq) = config.l_freq {
        if !l_freq.is_finite() || l_freq <= 0.0 {
            return Err("High-pass edge l_freq must be positive".to_string());
        }
    }
    if let Some(h_freq) = config.h_freq {
        if !h_freq.is_finite() || h_freq <= 0.0 {
            return Err("Low-pass edge h_freq must be positive".to_string());
        }
    }
    if let (Some(l_freq), Some(h_freq)) = (config.l_freq, config.h_freq) {
        if h_freq <= l_freq {
            return Err("Low-pass edge h_freq must be above high-pass edge l_freq".to_string());
        }
    }
    Ok(())
}

/// Validate spectral configuration
pub fn validate_spectral_config(config: &SpectralConfig) -> Result<(), String> {
    if !config.fmin.is_finite() || config.fmin < 0.0 {
        return Err("fmin must be a non-negative frequency".to_string());
    }
    if !config.fmax.is_finite() || config.fmax < config.fmin {
        return Err("fmax must be at least fmin".to_string());
    }
    if !config.window_seconds.is_finite() || config.window_seconds <= 0.0 {
        return Err("Window length must be positive".to_string());
    }
    if !config.overlap_seconds.is_finite() || config.overlap_seconds < 0.0 {
        return Err("Window overlap cannot be negative".to_string());
    }
    if config.overlap_seconds >= config.window_seconds {
        return Err("Window overlap must be shorter than the window".to_string());
    }
    Ok(())
}
