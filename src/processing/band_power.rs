// src/processing/band_power.rs
//! Band power integration over a PSD
//!
//! Band power is the rectangle-rule integral of the PSD over the bins a band
//! selects, scaled to picowatts:
//!
//! ```text
//! P[c] = df * sum_{f in band} PSD[c, f] * 1e12
//! ```
//!
//! A band that selects no bin (narrower than `df`, or outside the PSD range)
//! integrates to exactly zero.

use crate::config::bands::{BandCatalog, BoundaryPolicy, FrequencyBand};
use crate::config::constants::band_power::PICOWATT_SCALE;
use crate::error::{EegError, EegResult, ProcessingStage};
use crate::processing::psd::PsdResult;
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Per-channel power of one band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandPower {
    pub band: String,
    pub power: Array1<f64>,
}

/// Ordered mapping band name -> per-channel power (pW)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBandPowerVector")]
pub struct BandPowerVector {
    channel_count: usize,
    bands: Vec<BandPower>,
}

/// Wire form, checked through [`BandPowerVector::insert`] on the way in
#[derive(Deserialize)]
struct RawBandPowerVector {
    channel_count: usize,
    bands: Vec<BandPower>,
}

impl TryFrom<RawBandPowerVector> for BandPowerVector {
    type Error = EegError;

    fn try_from(raw: RawBandPowerVector) -> Result<Self, Self::Error> {
        let mut vector = Self::new(raw.channel_count);
        for entry in raw.bands {
            vector.insert(entry.band, entry.power)?;
        }
        Ok(vector)
    }
}

/// Features extracted from one recording
pub type FeatureSet = BandPowerVector;

impl BandPowerVector {
    /// Empty vector for `channel_count` channels
    pub fn new(channel_count: usize) -> Self {
        Self { channel_count, bands: Vec::new() }
    }

    /// Build from `(band, per-channel power)` pairs
    pub fn from_pairs<S, I>(pairs: I) -> EegResult<Self>
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, Vec<f64>)>,
    {
        let mut pairs = pairs.into_iter().peekable();
        let channel_count = pairs.peek().map(|(_, power)| power.len()).unwrap_or(0);
        let mut vector = Self::new(channel_count);
        for (band, power) in pairs {
            vector.insert(band, Array1::from(power))?;
        }
        Ok(vector)
    }

    /// Append one band's power; every value must be finite
    pub fn insert(&mut self, band: impl Into<String>, power: Array1<f64>) -> EegResult<()> {
        let band = band.into();
        if power.len() != self.channel_count {
            return Err(EegError::shape_mismatch(
                ProcessingStage::BandPower,
                &format!("channel count of band '{}'", band),
                self.channel_count,
                power.len(),
            ));
        }
        if self.get(&band).is_some() {
            return Err(EegError::shape_mismatch(
                ProcessingStage::BandPower,
                "band names",
                "unique names",
                format!("duplicate '{}'", band),
            ));
        }
        if let Some(channel) = power.iter().position(|p| !p.is_finite()) {
            return Err(EegError::configuration(
                "band_power",
                format!("Non-finite power for band '{}' at channel {}", band, channel),
            ));
        }
        self.bands.push(BandPower { band, power });
        Ok(())
    }

    pub fn get(&self, band: &str) -> Option<ArrayView1<'_, f64>> {
        self.bands
            .iter()
            .find(|entry| entry.band == band)
            .map(|entry| entry.power.view())
    }

    pub fn iter(&self) -> impl Iterator<Item = &BandPower> {
        self.bands.iter()
    }

    pub fn band_names(&self) -> Vec<&str> {
        self.bands.iter().map(|entry| entry.band.as_str()).collect()
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Arithmetic mean over channels for one band
    pub fn channel_mean(&self, band: &str) -> Option<f64> {
        self.get(band).and_then(|power| power.mean())
    }

    /// Fail unless `other` has the same bands (in order) and channel count
    pub fn check_same_structure(&self, other: &BandPowerVector, stage: ProcessingStage) -> EegResult<()> {
        if self.channel_count != other.channel_count {
            return Err(EegError::shape_mismatch(
                stage,
                "channel count",
                self.channel_count,
                other.channel_count,
            ));
        }
        let ours = self.band_names();
        let theirs = other.band_names();
        if ours != theirs {
            return Err(EegError::shape_mismatch(
                stage,
                "band list",
                ours.join(","),
                theirs.join(","),
            ));
        }
        for (mine, their) in self.bands.iter().zip(&other.bands) {
            if mine.power.len() != their.power.len() {
                return Err(EegError::shape_mismatch(
                    stage,
                    &format!("channel count of band '{}'", mine.band),
                    mine.power.len(),
                    their.power.len(),
                ));
            }
        }
        Ok(())
    }

    pub(crate) fn bands_mut(&mut self) -> impl Iterator<Item = &mut BandPower> {
        self.bands.iter_mut()
    }
}

/// Per-channel power of `band` in picowatts
pub fn extract_band_power(psd: &PsdResult, band: &FrequencyBand, policy: BoundaryPolicy) -> Array1<f64> {
    let freqs = psd.freqs();
    let power = psd.psd();
    let df = psd.frequency_resolution();

    let mut totals = Array1::<f64>::zeros(psd.channel_count());
    for (bin, &freq) in freqs.iter().enumerate() {
        if band.contains(freq, policy) {
            totals += &power.column(bin);
        }
    }

    totals.mapv_inplace(|sum| sum * df * PICOWATT_SCALE);
    totals
}

/// Band power for every band of `catalog`, in catalog order
pub fn extract_all_bands(psd: &PsdResult, catalog: &BandCatalog, policy: BoundaryPolicy) -> BandPowerVector {
    let freqs = psd.freqs();

    if policy == BoundaryPolicy::Inclusive {
        let counted_twice: Vec<f64> = catalog
            .shared_edges()
            .into_iter()
            .filter(|edge| freqs.iter().any(|f| f == edge))
            .collect();
        if !counted_twice.is_empty() {
            debug!(
                edges = ?counted_twice,
                "inclusive boundary policy counts bins on shared band edges in both bands"
            );
        }
    }

    if !freqs.is_empty() {
        let (first, last) = (freqs[0], freqs[freqs.len() - 1]);
        for band in catalog.iter().filter(|band| band.low_hz < first || band.high_hz > last) {
            debug!(
                band = %band.name,
                low_hz = band.low_hz,
                high_hz = band.high_hz,
                psd_min_hz = first,
                psd_max_hz = last,
                "band extends beyond the PSD range; the outside portion is excluded"
            );
        }
    }

    let mut vector = BandPowerVector::new(psd.channel_count());
    for band in catalog {
        vector.bands.push(BandPower {
            band: band.name.clone(),
            power: extract_band_power(psd, band, policy),
        });
    }
    vector
}

/// Band power extraction with a fixed catalog and boundary policy
#[derive(Debug, Clone)]
pub struct BandPowerExtractor {
    catalog: BandCatalog,
    policy: BoundaryPolicy,
}

impl BandPowerExtractor {
    pub fn new(catalog: BandCatalog, policy: BoundaryPolicy) -> Self {
        Self { catalog, policy }
    }

    pub fn extract(&self, psd: &PsdResult) -> BandPowerVector {
        extract_all_bands(psd, &self.catalog, self.policy)
    }

    pub fn catalog(&self) -> &BandCatalog {
        &self.catalog
    }

    pub fn policy(&self) -> BoundaryPolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    /// Flat PSD over 1..=100 Hz at 0.25 Hz resolution
    fn flat_psd(channels: usize, level: f64) -> PsdResult {
        let freqs: Array1<f64> = (4..=400).map(|k| k as f64 * 0.25).collect();
        let psd = Array2::from_elem((channels, freqs.len()), level);
        PsdResult::new(psd, freqs, 0.25).unwrap()
    }

    #[test]
    fn test_flat_alpha_inclusive() {
        let psd = flat_psd(2, 1.0);
        let alpha = FrequencyBand::new("Alpha", 8.0, 12.0).unwrap();
        let power = extract_band_power(&psd, &alpha, BoundaryPolicy::Inclusive);

        // 8.00, 8.25, ..., 12.00
        let expected = 17.0 * 0.25 * 1.0 * 1e12;
        assert_eq!(power.len(), 2);
        for &p in power.iter() {
            assert!((p - expected).abs() / expected < 1e-12);
        }
    }

    #[test]
    fn test_flat_alpha_half_open() {
        let psd = flat_psd(1, 2.0);
        let alpha = FrequencyBand::new("Alpha", 8.0, 12.0).unwrap();
        let power = extract_band_power(&psd, &alpha, BoundaryPolicy::HalfOpen);

        let expected = 16.0 * 0.25 * 2.0 * 1e12;
        assert!((power[0] - expected).abs() / expected < 1e-12);
    }

    #[test]
    fn test_band_narrower_than_resolution_is_zero() {
        let psd = flat_psd(3, 5.0);
        let sliver = FrequencyBand::new("Sliver", 10.05, 10.2).unwrap();
        let power = extract_band_power(&psd, &sliver, BoundaryPolicy::Inclusive);
        assert_eq!(power, Array1::<f64>::zeros(3));
    }

    #[test]
    fn test_band_outside_range_is_zero() {
        let psd = flat_psd(1, 1.0);
        let high = FrequencyBand::new("High", 150.0, 200.0).unwrap();
        assert_eq!(extract_band_power(&psd, &high, BoundaryPolicy::Inclusive)[0], 0.0);
    }

    #[test]
    fn test_partially_covered_band_keeps_inside_bins() {
        let psd = flat_psd(1, 1.0);
        let catalog = BandCatalog::new(vec![FrequencyBand::new("Upper", 90.0, 120.0).unwrap()]).unwrap();
        let vector = extract_all_bands(&psd, &catalog, BoundaryPolicy::Inclusive);

        // 90.00, 90.25, ..., 100.00
        let expected = 41.0 * 0.25 * 1e12;
        assert!((vector.get("Upper").unwrap()[0] - expected).abs() / expected < 1e-12);
    }

    #[test]
    fn test_shared_edge_double_counting() {
        let psd = flat_psd(1, 1.0);
        let catalog = BandCatalog::default_eeg();

        let inclusive = extract_all_bands(&psd, &catalog, BoundaryPolicy::Inclusive);
        let half_open = extract_all_bands(&psd, &catalog, BoundaryPolicy::HalfOpen);

        let sum = |v: &BandPowerVector| v.iter().map(|entry| entry.power[0]).sum::<f64>();
        // Four shared edges (4, 8, 12, 30 Hz) are counted twice under Inclusive;
        // HalfOpen drops the 100 Hz bin.
        let bin_power = 0.25 * 1e12;
        assert!((sum(&inclusive) - sum(&half_open) - 5.0 * bin_power).abs() < 1.0);
    }

    #[test]
    fn test_extract_all_bands_order() {
        let psd = flat_psd(2, 1.0);
        let vector = extract_all_bands(&psd, &BandCatalog::default_eeg(), BoundaryPolicy::Inclusive);
        assert_eq!(vector.band_names(), vec!["Delta", "Theta", "Alpha", "Beta", "Gamma"]);
        assert_eq!(vector.channel_count(), 2);
        assert!(vector.get("Gamma").unwrap().iter().all(|&p| p > 0.0));
    }

    #[test]
    fn test_vector_rejects_bad_inserts() {
        let mut vector = BandPowerVector::new(2);
        vector.insert("Alpha", Array1::from(vec![1.0, 2.0])).unwrap();
        assert!(vector.insert("Alpha", Array1::from(vec![1.0, 2.0])).is_err());
        assert!(vector.insert("Beta", Array1::from(vec![1.0])).is_err());
        assert_eq!(vector.channel_mean("Alpha"), Some(1.5));
    }

    #[test]
    fn test_structure_check() {
        let a = BandPowerVector::from_pairs(vec![("Alpha", vec![1.0, 2.0])]).unwrap();
        let b = BandPowerVector::from_pairs(vec![("Beta", vec![1.0, 2.0])]).unwrap();
        let c = BandPowerVector::from_pairs(vec![("Alpha", vec![1.0, 2.0, 3.0])]).unwrap();

        assert!(a.check_same_structure(&a.clone(), ProcessingStage::Aggregation).is_ok());
        assert!(a.check_same_structure(&b, ProcessingStage::Aggregation).is_err());
        assert!(a.check_same_structure(&c, ProcessingStage::Aggregation).is_err());
    }

    #[test]
    fn test_vector_rejects_non_finite_power() {
        let mut vector = BandPowerVector::new(2);
        let err = vector.insert("Alpha", Array1::from(vec![1.0, f64::NAN])).unwrap_err();
        assert!(matches!(err, EegError::Configuration { .. }));
        assert!(vector.insert("Beta", Array1::from(vec![f64::INFINITY, 1.0])).is_err());
        assert!(vector.is_empty());
    }

    #[test]
    fn test_deserialize_checks_channel_count() {
        let json = r#"{"channel_count":2,"bands":[{"band":"Alpha","power":{"v":1,"dim":[1],"data":[4.0]}}]}"#;
        let err = serde_json::from_str::<BandPowerVector>(json).unwrap_err();
        assert!(err.to_string().contains("[SHAPE]"));

        let json = r#"{"channel_count":1,"bands":[{"band":"Alpha","power":{"v":1,"dim":[1],"data":[4.0]}}]}"#;
        let vector: BandPowerVector = serde_json::from_str(json).unwrap();
        assert_eq!(vector.channel_mean("Alpha"), Some(4.0));
    }

    #[test]
    fn test_serialized_vector_reloads() {
        let vector = BandPowerVector::from_pairs(vec![("Alpha", vec![1.0, 2.0]), ("Beta", vec![3.0, 4.0])]).unwrap();
        let json = serde_json::to_string(&vector).unwrap();
        assert_eq!(serde_json::from_str::<BandPowerVector>(&json).unwrap(), vector);
    }
}
