// src/processing/mod.rs
//! Spectral processing: PSD estimation, band power and condition comparison

pub mod band_power;
pub mod cancellation;
pub mod comparison;
pub mod pipeline;
pub mod psd;
pub mod windowing;

pub use band_power::*;
pub use cancellation::CancellationToken;
pub use comparison::*;
pub use pipeline::*;
pub use psd::*;
pub use windowing::*;
