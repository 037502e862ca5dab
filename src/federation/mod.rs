//! Simulated multi-client feature extraction and aggregation
//! Location: src/federation/mod.rs

pub mod aggregator;
pub mod client;

pub use aggregator::{aggregate, AggregatedUpdate, RunningAggregator};
pub use client::{replicate_recordings, simulate_clients, ClientFeatureSimulator, ClientUpdate};
