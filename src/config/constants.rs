// src/config/constants.rs
//! Analysis-wide configuration constants

/// Preprocessing (band-pass) constants
pub mod preprocessing {
    pub const DEFAULT_L_FREQ_HZ: f64 = 1.0;
    pub const DEFAULT_H_FREQ_HZ: f64 = 100.0;
    pub const MIN_SAMPLING_RATE_HZ: f64 = 1.0;
    pub const MAX_SAMPLING_RATE_HZ: f64 = 100_000.0;
}

/// Welch PSD constants
pub mod spectral {
    pub const DEFAULT_FMIN_HZ: f64 = 1.0;
    pub const DEFAULT_FMAX_HZ: f64 = 100.0;
    /// Segment length in seconds (n_fft = 4 x fs)
    pub const DEFAULT_WINDOW_SECONDS: f64 = 4.0;
    /// Overlap in seconds (n_overlap = 2 x fs)
    pub const DEFAULT_OVERLAP_SECONDS: f64 = 2.0;
    pub const MIN_SEGMENT_SAMPLES: usize = 2;
}

/// Band power constants
pub mod band_power {
    /// Base power units to picowatts
    pub const PICOWATT_SCALE: f64 = 1e12;
}

/// Default EEG band catalog as (name, low Hz, high Hz)
pub mod bands {
    pub const DELTA: (&str, f64, f64) = ("Delta", 1.0, 4.0);
    pub const THETA: (&str, f64, f64) = ("Theta", 4.0, 8.0);
    pub const ALPHA: (&str, f64, f64) = ("Alpha", 8.0, 12.0);
    pub const BETA: (&str, f64, f64) = ("Beta", 12.0, 30.0);
    pub const GAMMA: (&str, f64, f64) = ("Gamma", 30.0, 100.0);

    pub const DEFAULT_CATALOG: [(&str, f64, f64); 5] = [DELTA, THETA, ALPHA, BETA, GAMMA];
}

/// Client simulation constants
pub mod federation {
    pub const DEFAULT_CLIENT_COUNT: usize = 3;
    pub const MAX_CLIENT_COUNT: usize = 1024;
}

/// Configuration file locations, lowest precedence first
pub mod paths {
    pub const DEFAULT_CONFIG_FILE: &str = "eeg-core.toml";
    pub const LOCAL_CONFIG_FILE: &str = "config/local.toml";
}
