// Library interface for the waveform analysis pipeline

pub mod analysis;
pub mod audio;
pub mod batch;
pub mod config;
pub mod error;
pub mod metrics;
pub mod render;
pub mod resample;
pub mod scanner;
pub mod utils;

// Test fixtures for synthetic audio generation
pub mod test_fixtures;

// Re-export commonly used types
pub use batch::{RunReport, WaveformAnalyzer};
pub use config::AppConfig;
pub use error::{AnalysisError, AudioError, RenderError, Result, ScanError};
pub use scanner::{Category, ScanResult};
