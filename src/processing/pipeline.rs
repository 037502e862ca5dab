// src/processing/pipeline.rs
//! Feature extraction pipeline and rest/task condition analysis

use crate::config::AnalysisConfig;
use crate::error::{EegError, EegResult, ProcessingStage};
use crate::preprocessing::{Preprocessor, Recording, RecordingSource, StandardPreprocessor};
use crate::processing::band_power::{BandPowerExtractor, FeatureSet};
use crate::processing::cancellation::CancellationToken;
use crate::processing::comparison::{compare, ConditionComparison};
use crate::processing::psd::{PsdResult, WelchEstimator};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Spectral features of one recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingFeatures {
    pub psd: PsdResult,
    pub band_power: FeatureSet,
}

/// Preprocess -> Welch PSD -> band power
#[derive(Clone)]
pub struct FeaturePipeline {
    preprocessor: Arc<dyn Preprocessor>,
    estimator: WelchEstimator,
    extractor: BandPowerExtractor,
}

impl FeaturePipeline {
    pub fn new(
        preprocessor: Arc<dyn Preprocessor>,
        estimator: WelchEstimator,
        extractor: BandPowerExtractor,
    ) -> Self {
        Self { preprocessor, estimator, extractor }
    }

    /// Pipeline with the standard JSON preprocessor
    pub fn from_config(config: &AnalysisConfig) -> EegResult<Self> {
        let preprocessor = StandardPreprocessor::new(config.preprocessing.clone())?;
        Self::with_preprocessor(Arc::new(preprocessor), config)
    }

    pub fn with_preprocessor(preprocessor: Arc<dyn Preprocessor>, config: &AnalysisConfig) -> EegResult<Self> {
        config
            .validate_consistency()
            .map_err(|errors| EegError::configuration("analysis", errors.join("; ")))?;
        for band in config.partially_covered_bands() {
            warn!(
                band = %band.name,
                fmin = config.spectral.fmin,
                fmax = config.spectral.fmax,
                "band only partially inside the PSD range"
            );
        }

        let estimator = WelchEstimator::new(config.spectral.clone())?;
        let extractor = BandPowerExtractor::new(config.bands.clone(), config.boundary_policy);
        Ok(Self::new(preprocessor, estimator, extractor))
    }

    pub fn estimator(&self) -> &WelchEstimator {
        &self.estimator
    }

    pub fn extractor(&self) -> &BandPowerExtractor {
        &self.extractor
    }

    pub fn process(&self, source: &RecordingSource) -> EegResult<RecordingFeatures> {
        self.process_with_cancellation(source, &CancellationToken::new())
    }

    pub fn process_with_cancellation(
        &self,
        source: &RecordingSource,
        token: &CancellationToken,
    ) -> EegResult<RecordingFeatures> {
        token.check(ProcessingStage::Decoding)?;
        let start = Instant::now();
        let recording = self.preprocessor.prepare(source)?;
        let features = self.analyze_recording(&recording, token)?;

        debug!(
            source = %source.name(),
            bins = features.psd.bin_count(),
            bands = features.band_power.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "recording processed"
        );
        Ok(features)
    }

    /// PSD and band power of an already prepared recording
    pub fn analyze_recording(&self, recording: &Recording, token: &CancellationToken) -> EegResult<RecordingFeatures> {
        let psd = self
            .estimator
            .estimate_with_cancellation(recording.signal(), recording.sampling_rate(), token)?;
        token.check(ProcessingStage::BandPower)?;
        let band_power = self.extractor.extract(&psd);
        Ok(RecordingFeatures { psd, band_power })
    }

    /// Band power only
    pub fn features(&self, source: &RecordingSource, token: &CancellationToken) -> EegResult<FeatureSet> {
        self.process_with_cancellation(source, token)
            .map(|features| features.band_power)
    }
}

/// Everything produced by one rest vs. task run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub rest: RecordingFeatures,
    pub task: RecordingFeatures,
    /// Channel-averaged PSD curves over the shared frequency axis
    pub freqs: Array1<f64>,
    pub rest_mean_psd: Array1<f64>,
    pub task_mean_psd: Array1<f64>,
    pub comparison: ConditionComparison,
}

/// Runs rest and task through one pipeline and compares them
#[derive(Clone)]
pub struct ConditionAnalysis {
    pipeline: FeaturePipeline,
}

impl ConditionAnalysis {
    pub fn new(pipeline: FeaturePipeline) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &FeaturePipeline {
        &self.pipeline
    }

    pub fn run(&self, rest: &RecordingSource, task: &RecordingSource) -> EegResult<AnalysisReport> {
        self.run_with_cancellation(rest, task, &CancellationToken::new())
    }

    pub fn run_with_cancellation(
        &self,
        rest: &RecordingSource,
        task: &RecordingSource,
        token: &CancellationToken,
    ) -> EegResult<AnalysisReport> {
        let rest = self.pipeline.process_with_cancellation(rest, token)?;
        let task = self.pipeline.process_with_cancellation(task, token)?;
        build_report(rest, task)
    }
}

/// Compare two processed recordings; their PSDs must share a frequency axis
pub fn build_report(rest: RecordingFeatures, task: RecordingFeatures) -> EegResult<AnalysisReport> {
    if !rest.psd.same_frequency_axis(&task.psd) {
        return Err(EegError::shape_mismatch(
            ProcessingStage::Comparison,
            "frequency axis",
            format!("{} bins at {} Hz", rest.psd.bin_count(), rest.psd.frequency_resolution()),
            format!("{} bins at {} Hz", task.psd.bin_count(), task.psd.frequency_resolution()),
        ));
    }

    let comparison = compare(&rest.band_power, &task.band_power)?;
    for entry in comparison.iter() {
        info!(
            band = %entry.band,
            mean_rest_pw = entry.mean_rest,
            mean_task_pw = entry.mean_task,
            percent_change = entry.percent_change,
            "condition comparison"
        );
    }

    Ok(AnalysisReport {
        freqs: rest.psd.freqs().to_owned(),
        rest_mean_psd: rest.psd.mean_over_channels(),
        task_mean_psd: task.psd.mean_over_channels(),
        rest,
        task,
        comparison,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PreprocessingConfig;
    use crate::preprocessing::synthetic::{SyntheticConfig, SyntheticRecordingGenerator};
    use ndarray::Array2;

    fn unfiltered_config() -> AnalysisConfig {
        AnalysisConfig {
            preprocessing: PreprocessingConfig { l_freq: None, h_freq: None },
            ..AnalysisConfig::default()
        }
    }

    fn synthetic(config: SyntheticConfig, seed: u64) -> RecordingSource {
        let recording = SyntheticRecordingGenerator::new(config, seed).unwrap().generate().unwrap();
        RecordingSource::from_recording(format!("synthetic-{}", seed), recording)
    }

    #[test]
    fn test_pipeline_produces_catalog_bands() {
        let pipeline = FeaturePipeline::from_config(&AnalysisConfig::default()).unwrap();
        let features = pipeline.process(&synthetic(SyntheticConfig::resting_state(), 1)).unwrap();

        assert_eq!(features.band_power.band_names(), vec!["Delta", "Theta", "Alpha", "Beta", "Gamma"]);
        assert_eq!(features.band_power.channel_count(), 4);
        assert_eq!(features.psd.frequency_resolution(), 0.25);
    }

    #[test]
    fn test_alpha_suppressed_during_task() {
        let analysis = ConditionAnalysis::new(FeaturePipeline::from_config(&AnalysisConfig::default()).unwrap());
        let report = analysis
            .run(
                &synthetic(SyntheticConfig::resting_state(), 3),
                &synthetic(SyntheticConfig::task_state(), 4),
            )
            .unwrap();

        assert!(report.comparison.get("Alpha").unwrap().percent_change < -50.0);
        assert!(report.comparison.get("Beta").unwrap().percent_change > 0.0);
        assert_eq!(report.freqs.len(), report.rest_mean_psd.len());
        assert_eq!(report.freqs.len(), report.task_mean_psd.len());
    }

    #[test]
    fn test_mismatched_sampling_rates_rejected() {
        let pipeline = FeaturePipeline::from_config(&unfiltered_config()).unwrap();
        let rest = RecordingSource::from_recording(
            "rest",
            Recording::with_default_channels(Array2::ones((2, 2000)), 250.0).unwrap(),
        );
        let task = RecordingSource::from_recording(
            "task",
            Recording::with_default_channels(Array2::ones((2, 2000)), 100.0).unwrap(),
        );

        let result = ConditionAnalysis::new(pipeline).run(&rest, &task);
        assert!(matches!(
            result,
            Err(EegError::ShapeMismatch { stage: ProcessingStage::Comparison, .. })
        ));
    }

    #[test]
    fn test_cancelled_before_start() {
        let pipeline = FeaturePipeline::from_config(&unfiltered_config()).unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let result = pipeline.process_with_cancellation(&synthetic(SyntheticConfig::default(), 0), &token);
        assert!(matches!(result, Err(EegError::Cancelled { .. })));
    }
}
