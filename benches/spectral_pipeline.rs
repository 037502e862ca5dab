use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use eeg_core::config::{AnalysisConfig, BandCatalog, BoundaryPolicy};
use eeg_core::federation::{aggregate, replicate_recordings, simulate_clients, ClientFeatureSimulator};
use eeg_core::preprocessing::synthetic::{SyntheticConfig, SyntheticRecordingGenerator};
use eeg_core::preprocessing::{BandpassFilter, Recording, RecordingSource};
use eeg_core::processing::{estimate_psd, extract_all_bands, FeaturePipeline};
use eeg_core::CancellationToken;

const SAMPLE_RATES: &[f64] = &[250.0, 500.0, 1000.0];
const CHANNEL_COUNTS: &[usize] = &[1, 8, 32];
const CLIENT_COUNTS: &[usize] = &[1, 4, 16];

fn recording(channels: usize, sampling_rate: f64, seconds: f64) -> Recording {
    let config = SyntheticConfig {
        channel_count: channels,
        sampling_rate,
        duration_seconds: seconds,
        ..SyntheticConfig::default()
    };
    SyntheticRecordingGenerator::new(config, 1)
        .and_then(|mut generator| generator.generate())
        .expect("synthetic recording")
}

fn benchmark_welch_psd(c: &mut Criterion) {
    let mut group = c.benchmark_group("welch_psd");

    for &fs in SAMPLE_RATES {
        for &channels in CHANNEL_COUNTS {
            let rec = recording(channels, fs, 60.0);
            group.throughput(Throughput::Elements((channels * rec.sample_count()) as u64));
            group.bench_with_input(
                BenchmarkId::new("estimate", format!("{}ch_{}hz", channels, fs)),
                &rec,
                |b, rec| b.iter(|| estimate_psd(black_box(rec.signal()), rec.sampling_rate(), 1.0, 100.0)),
            );
        }
    }

    group.finish();
}

fn benchmark_band_power(c: &mut Criterion) {
    let rec = recording(32, 1000.0, 60.0);
    let psd = estimate_psd(rec.signal(), rec.sampling_rate(), 1.0, 100.0).expect("psd");
    let catalog = BandCatalog::default_eeg();

    c.bench_function("band_power_32ch", |b| {
        b.iter(|| extract_all_bands(black_box(&psd), &catalog, BoundaryPolicy::Inclusive))
    });
}

fn benchmark_bandpass(c: &mut Criterion) {
    let mut group = c.benchmark_group("bandpass");

    for &channels in CHANNEL_COUNTS {
        let rec = recording(channels, 500.0, 60.0);
        let filter = BandpassFilter::new(Some(1.0), Some(100.0), 500.0).expect("filter");
        group.bench_with_input(BenchmarkId::new("zero_phase", channels), &rec, |b, rec| {
            b.iter(|| filter.apply(black_box(rec.signal())))
        });
    }

    group.finish();
}

fn benchmark_client_simulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("clients");
    group.sample_size(10);

    let pipeline = FeaturePipeline::from_config(&AnalysisConfig::default()).expect("pipeline");
    let simulator = ClientFeatureSimulator::new(pipeline);
    let sources = vec![RecordingSource::from_recording("rec", recording(8, 250.0, 60.0))];
    let token = CancellationToken::new();

    for &clients in CLIENT_COUNTS {
        let per_client = replicate_recordings(&sources, clients);
        group.bench_with_input(BenchmarkId::new("simulate_and_aggregate", clients), &per_client, |b, per_client| {
            b.iter(|| {
                let updates = simulate_clients(&simulator, per_client, &token).expect("simulate");
                aggregate(black_box(&updates)).expect("aggregate")
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_welch_psd,
    benchmark_band_power,
    benchmark_bandpass,
    benchmark_client_simulation
);
criterion_main!(benches);
