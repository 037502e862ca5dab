// src/config/bands.rs
//! Frequency band catalog
//!
//! The catalog is an ordered, name-unique table of bands. Extraction code walks
//! the table; it never branches on band names.

use crate::config::constants::bands::DEFAULT_CATALOG;
use crate::error::{EegError, EegResult};
use serde::{Deserialize, Serialize};

/// A named frequency range `[low_hz, high_hz]` in Hz
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBand {
    pub name: String,
    pub low_hz: f64,
    pub high_hz: f64,
}

/// How bins sitting exactly on a band edge are assigned
///
/// `Inclusive` keeps both edges, so a bin on an edge shared by two adjacent
/// bands (12 Hz between Alpha and Beta) is counted in both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// `low <= f <= high`
    #[default]
    Inclusive,
    /// `low <= f < high`
    HalfOpen,
}

impl FrequencyBand {
    /// Create a validated band
    pub fn new(name: impl Into<String>, low_hz: f64, high_hz: f64) -> EegResult<Self> {
        let band = Self {
            name: name.into(),
            low_hz,
            high_hz,
        };
        band.validate()?;
        Ok(band)
    }

    /// Check name and range invariants
    pub fn validate(&self) -> EegResult<()> {
        if self.name.trim().is_empty() {
            return Err(EegError::configuration("band_catalog", "Band name must not be empty"));
        }
        if !self.low_hz.is_finite() || !self.high_hz.is_finite() {
            return Err(EegError::configuration(
                "band_catalog",
                format!("Band '{}' has a non-finite edge", self.name),
            ));
        }
        if self.low_hz < 0.0 {
            return Err(EegError::configuration(
                "band_catalog",
                format!("Band '{}' lower edge must be non-negative", self.name),
            ));
        }
        if self.low_hz >= self.high_hz {
            return Err(EegError::configuration(
                "band_catalog",
                format!(
                    "Band '{}' lower edge ({} Hz) must be below upper edge ({} Hz)",
                    self.name, self.low_hz, self.high_hz
                ),
            ));
        }
        Ok(())
    }

    /// Whether `freq_hz` falls inside the band under `policy`
    #[inline]
    pub fn contains(&self, freq_hz: f64, policy: BoundaryPolicy) -> bool {
        match policy {
            BoundaryPolicy::Inclusive => freq_hz >= self.low_hz && freq_hz <= self.high_hz,
            BoundaryPolicy::HalfOpen => freq_hz >= self.low_hz && freq_hz < self.high_hz,
        }
    }

    /// Band width in Hz
    pub fn width_hz(&self) -> f64 {
        self.high_hz - self.low_hz
    }
}

/// Ordered mapping band name -> range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FrequencyBand>", into = "Vec<FrequencyBand>")]
pub struct BandCatalog {
    bands: Vec<FrequencyBand>,
}

impl BandCatalog {
    /// Build a catalog, rejecting invalid bands and duplicate names
    pub fn new(bands: Vec<FrequencyBand>) -> EegResult<Self> {
        let mut catalog = Self { bands: Vec::with_capacity(bands.len()) };
        for band in bands {
            catalog.push(band)?;
        }
        Ok(catalog)
    }

    /// Delta, Theta, Alpha, Beta, Gamma
    pub fn default_eeg() -> Self {
        Self {
            bands: DEFAULT_CATALOG
                .iter()
                .map(|&(name, low_hz, high_hz)| FrequencyBand {
                    name: name.to_string(),
                    low_hz,
                    high_hz,
                })
                .collect(),
        }
    }

    /// Append a band at the end of the catalog
    pub fn push(&mut self, band: FrequencyBand) -> EegResult<()> {
        band.validate()?;
        if self.get(&band.name).is_some() {
            return Err(EegError::configuration(
                "band_catalog",
                format!("Duplicate band name '{}'", band.name),
            ));
        }
        self.bands.push(band);
        Ok(())
    }

    /// Builder-style [`push`](Self::push)
    pub fn with_band(mut self, name: &str, low_hz: f64, high_hz: f64) -> EegResult<Self> {
        self.push(FrequencyBand::new(name, low_hz, high_hz)?)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&FrequencyBand> {
        self.bands.iter().find(|band| band.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrequencyBand> {
        self.bands.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.bands.iter().map(|band| band.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Frequencies that are the upper edge of one band and the lower edge of another
    pub fn shared_edges(&self) -> Vec<f64> {
        let mut edges: Vec<f64> = self
            .bands
            .iter()
            .filter(|upper| self.bands.iter().any(|lower| lower.low_hz == upper.high_hz))
            .map(|band| band.high_hz)
            .collect();
        edges.sort_by(f64::total_cmp);
        edges.dedup();
        edges
    }
}

impl Default for BandCatalog {
    fn default() -> Self {
        Self::default_eeg()
    }
}

impl TryFrom<Vec<FrequencyBand>> for BandCatalog {
    type Error = EegError;

    fn try_from(bands: Vec<FrequencyBand>) -> Result<Self, Self::Error> {
        Self::new(bands)
    }
}

impl From<BandCatalog> for Vec<FrequencyBand> {
    fn from(catalog: BandCatalog) -> Self {
        catalog.bands
    }
}

impl<'a> IntoIterator for &'a BandCatalog {
    type Item = &'a FrequencyBand;
    type IntoIter = std::slice::Iter<'a, FrequencyBand>;

    fn into_iter(self) -> Self::IntoIter {
        self.bands.iter()
    }
}
