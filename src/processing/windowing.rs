// src/processing/windowing.rs
//! Window functions for spectral estimation

use crate::config::processing_config::WindowType;
use std::f64::consts::PI;

/// Generate `size` coefficients of the periodic (DFT-even) window
pub fn generate_window(window_type: WindowType, size: usize) -> Vec<f64> {
    if size == 0 {
        return Vec::new();
    }
    if size == 1 {
        return vec![1.0];
    }

    let denom = size as f64;

    match window_type {
        WindowType::Rectangular => vec![1.0; size],
        WindowType::Hamming => (0..size)
            .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / denom).cos())
            .collect(),
        WindowType::Hanning => (0..size)
            .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / denom).cos()))
            .collect(),
        WindowType::Blackman => (0..size)
            .map(|i| {
                let n = i as f64 / denom;
                0.42 - 0.5 * (2.0 * PI * n).cos() + 0.08 * (4.0 * PI * n).cos()
            })
            .collect(),
    }
}

/// Sum of squared coefficients, the density normalization term
pub fn window_power(window: &[f64]) -> f64 {
    window.iter().map(|&w| w * w).sum()
}
