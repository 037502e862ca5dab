// src/processing/comparison.rs
//! Rest vs. task band power comparison

use crate::error::{EegError, EegResult, ProcessingStage};
use crate::processing::band_power::BandPowerVector;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Summary statistics of one band across both conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandComparison {
    pub band: String,
    /// Channel-mean rest power (pW)
    pub mean_rest: f64,
    /// Channel-mean task power (pW)
    pub mean_task: f64,
    /// `(mean_task - mean_rest) / mean_rest * 100`
    pub percent_change: f64,
}

/// Per-band comparison in catalog order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionComparison {
    pub bands: Vec<BandComparison>,
}

impl ConditionComparison {
    pub fn get(&self, band: &str) -> Option<&BandComparison> {
        self.bands.iter().find(|entry| entry.band == band)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BandComparison> {
        self.bands.iter()
    }
}

/// Compare channel-mean band power between rest and task
///
/// Both vectors must have the same channel count and band list. A zero (or
/// non-finite) rest mean, or one so small that the percent change overflows,
/// is a [`EegError::DegenerateBaseline`]. A non-finite task mean is a
/// configuration error.
pub fn compare(rest: &BandPowerVector, task: &BandPowerVector) -> EegResult<ConditionComparison> {
    rest.check_same_structure(task, ProcessingStage::Comparison)?;
    if rest.channel_count() == 0 {
        return Err(EegError::shape_mismatch(
            ProcessingStage::Comparison,
            "channel count",
            "at least 1",
            0,
        ));
    }

    let bands = rest
        .iter()
        .zip(task.iter())
        .map(|(rest_band, task_band)| {
            let mean_rest = rest_band.power.mean().unwrap_or(0.0);
            let mean_task = task_band.power.mean().unwrap_or(0.0);

            if mean_rest == 0.0 || !mean_rest.is_finite() {
                return Err(EegError::DegenerateBaseline {
                    band: rest_band.band.clone(),
                    mean_rest,
                });
            }

            if !mean_task.is_finite() {
                return Err(EegError::configuration(
                    "comparison",
                    format!("Non-finite task mean power for band '{}'", task_band.band),
                ));
            }

            let percent_change = (mean_task - mean_rest) / mean_rest * 100.0;
            if !percent_change.is_finite() {
                return Err(EegError::DegenerateBaseline {
                    band: rest_band.band.clone(),
                    mean_rest,
                });
            }
            debug!(band = %rest_band.band, mean_rest, mean_task, percent_change, "band compared");

            Ok(BandComparison {
                band: rest_band.band.clone(),
                mean_rest,
                mean_task,
                percent_change,
            })
        })
        .collect::<EegResult<Vec<_>>>()?;

    Ok(ConditionComparison { bands })
}
