//! Per-client feature extraction
//! Location: src/federation/client.rs

use crate::config::constants::federation::MAX_CLIENT_COUNT;
use crate::error::{EegError, EegResult, ProcessingStage};
use crate::preprocessing::RecordingSource;
use crate::processing::band_power::FeatureSet;
use crate::processing::cancellation::CancellationToken;
use crate::processing::pipeline::FeaturePipeline;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span};

/// Feature collection contributed by one client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientUpdate {
    pub client_id: usize,
    /// One feature set per recording, in input order
    pub features: Vec<FeatureSet>,
}

/// Runs the feature pipeline over one client's recordings
#[derive(Clone)]
pub struct ClientFeatureSimulator {
    pipeline: FeaturePipeline,
}

impl ClientFeatureSimulator {
    pub fn new(pipeline: FeaturePipeline) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &FeaturePipeline {
        &self.pipeline
    }

    /// Band power of every recording, in order
    pub fn run(&self, recordings: &[RecordingSource]) -> EegResult<Vec<FeatureSet>> {
        self.run_with_cancellation(recordings, &CancellationToken::new())
    }

    pub fn run_with_cancellation(
        &self,
        recordings: &[RecordingSource],
        token: &CancellationToken,
    ) -> EegResult<Vec<FeatureSet>> {
        recordings
            .iter()
            .map(|source| {
                token.check(ProcessingStage::ClientSimulation)?;
                self.pipeline.features(source, token)
            })
            .collect()
    }

    /// Build one client's update
    pub fn simulate(&self, client_id: usize, recordings: &[RecordingSource], token: &CancellationToken) -> EegResult<ClientUpdate> {
        let _span = info_span!("client", id = client_id, recordings = recordings.len()).entered();
        let features = self.run_with_cancellation(recordings, token)?;
        debug!(feature_sets = features.len(), "client features extracted");
        Ok(ClientUpdate { client_id, features })
    }
}

/// Run every client in parallel; `clients[i]` is client `i`'s recording list
///
/// Results keep client order. The first failing client aborts the run.
pub fn simulate_clients(
    simulator: &ClientFeatureSimulator,
    clients: &[Vec<RecordingSource>],
    token: &CancellationToken,
) -> EegResult<Vec<ClientUpdate>> {
    if clients.len() > MAX_CLIENT_COUNT {
        return Err(EegError::configuration(
            "federation",
            format!("{} clients exceeds the limit of {}", clients.len(), MAX_CLIENT_COUNT),
        ));
    }

    info!(clients = clients.len(), "simulating clients");
    clients
        .par_iter()
        .enumerate()
        .map(|(client_id, recordings)| simulator.simulate(client_id, recordings, token))
        .collect()
}

/// `count` clients that all hold the same recordings
pub fn replicate_recordings(recordings: &[RecordingSource], count: usize) -> Vec<Vec<RecordingSource>> {
    (0..count).map(|_| recordings.to_vec()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnalysisConfig, PreprocessingConfig};
    use crate::preprocessing::synthetic::{SyntheticConfig, SyntheticRecordingGenerator};

    fn simulator() -> ClientFeatureSimulator {
        let config = AnalysisConfig {
            preprocessing: PreprocessingConfig { l_freq: None, h_freq: None },
            ..AnalysisConfig::default()
        };
        ClientFeatureSimulator::new(FeaturePipeline::from_config(&config).unwrap())
    }

    fn source(seed: u64) -> RecordingSource {
        let config = SyntheticConfig { duration_seconds: 8.0, ..SyntheticConfig::default() };
        let recording = SyntheticRecordingGenerator::new(config, seed).unwrap().generate().unwrap();
        RecordingSource::from_recording(format!("rec-{}", seed), recording)
    }

    #[test]
    fn test_run_keeps_order() {
        let sim = simulator();
        let sources = vec![source(1), source(2)];
        let features = sim.run(&sources).unwrap();

        assert_eq!(features.len(), 2);
        assert_eq!(features[0], sim.run(&sources[..1]).unwrap()[0]);
        assert_ne!(features[0], features[1]);
    }

    #[test]
    fn test_run_is_deterministic() {
        let sim = simulator();
        let sources = vec![source(5)];
        assert_eq!(sim.run(&sources).unwrap(), sim.run(&sources).unwrap());
    }

    #[test]
    fn test_parallel_clients_keep_ids() {
        let sim = simulator();
        let clients = vec![vec![source(1)], vec![source(2)], vec![source(3)]];
        let updates = simulate_clients(&sim, &clients, &CancellationToken::new()).unwrap();

        let ids: Vec<usize> = updates.iter().map(|update| update.client_id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(updates[1].features, sim.run(&clients[1]).unwrap());
    }

    #[test]
    fn test_cancelled_clients() {
        let token = CancellationToken::new();
        token.cancel();
        let clients = replicate_recordings(&[source(1)], 2);
        assert!(matches!(
            simulate_clients(&simulator(), &clients, &token),
            Err(EegError::Cancelled { .. })
        ));
    }

    #[test]
    fn test_too_many_clients() {
        let clients = vec![Vec::new(); MAX_CLIENT_COUNT + 1];
        assert!(simulate_clients(&simulator(), &clients, &CancellationToken::new()).is_err());
    }
}
