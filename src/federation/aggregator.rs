//! Elementwise mean of client feature collections
//! Location: src/federation/aggregator.rs
//!
//! Means are accumulated incrementally (`m += (x - m) / k`) so that averaging
//! identical inputs reproduces them exactly.

use super::client::ClientUpdate;
use crate::error::{EegError, EegResult, ProcessingStage};
use crate::processing::band_power::FeatureSet;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Combined features, same shape as one client's features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedUpdate {
    pub client_count: usize,
    pub features: Vec<FeatureSet>,
}

/// Mean across the client axis
pub fn aggregate(updates: &[ClientUpdate]) -> EegResult<AggregatedUpdate> {
    let Some(first) = updates.first() else {
        return Err(EegError::shape_mismatch(
            ProcessingStage::Aggregation,
            "client count",
            "at least 1",
            0,
        ));
    };

    let mut mean = first.features.clone();
    for (idx, update) in updates.iter().enumerate().skip(1) {
        check_structure(&mean, update)?;
        fold_into_mean(&mut mean, &update.features, idx + 1);
    }

    info!(clients = updates.len(), feature_sets = mean.len(), "client updates aggregated");
    Ok(AggregatedUpdate { client_count: updates.len(), features: mean })
}

fn check_structure(reference: &[FeatureSet], update: &ClientUpdate) -> EegResult<()> {
    if reference.len() != update.features.len() {
        return Err(EegError::shape_mismatch(
            ProcessingStage::Aggregation,
            &format!("recording count of client {}", update.client_id),
            reference.len(),
            update.features.len(),
        ));
    }
    reference
        .iter()
        .zip(&update.features)
        .try_for_each(|(ours, theirs)| ours.check_same_structure(theirs, ProcessingStage::Aggregation))
}

/// Fold the `k`-th contribution into a running mean
fn fold_into_mean(mean: &mut [FeatureSet], contribution: &[FeatureSet], k: usize) {
    let k = k as f64;
    for (mean_set, set) in mean.iter_mut().zip(contribution) {
        for (mean_band, band) in mean_set.bands_mut().zip(set.iter()) {
            mean_band
                .power
                .zip_mut_with(&band.power, |m, &x| *m += (x - *m) / k);
        }
    }
}

#[derive(Debug, Default)]
struct RunningState {
    mean: Option<Vec<FeatureSet>>,
    count: usize,
}

/// Aggregator that accepts updates one at a time, from any thread
#[derive(Debug, Default)]
pub struct RunningAggregator {
    state: Mutex<RunningState>,
}

impl RunningAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one client's features; the first contribution fixes the expected shape
    pub fn contribute(&self, update: &ClientUpdate) -> EegResult<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let count = state.count + 1;

        match &mut state.mean {
            None => state.mean = Some(update.features.clone()),
            Some(mean) => {
                check_structure(mean.as_slice(), update)?;
                fold_into_mean(mean.as_mut_slice(), &update.features, count);
            }
        }
        state.count = count;

        debug!(client_id = update.client_id, contributions = count, "client update contributed");
        Ok(())
    }

    pub fn contribution_count(&self) -> usize {
        self.state.lock().count
    }

    /// Current mean; fails when nothing has been contributed
    pub fn finalize(&self) -> EegResult<AggregatedUpdate> {
        let state = self.state.lock();
        match &state.mean {
            Some(mean) => Ok(AggregatedUpdate { client_count: state.count, features: mean.clone() }),
            None => Err(EegError::shape_mismatch(
                ProcessingStage::Aggregation,
                "client count",
                "at least 1",
                0,
            )),
        }
    }

    pub fn reset(&self) {
        *self.state.lock() = RunningState::default();
    }
}
