//! Error types for the waveform analysis pipeline.
//!
//! Each stage has its own enum; [`AnalysisError`] wraps them so the driver
//! can log any stage failure uniformly and move on to the next stage.

use std::path::PathBuf;
use symphonia::core::errors::Error as SymphoniaError;
use thiserror::Error;

use crate::scanner::Category;

/// Top-level error type for all pipeline operations.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Dataset discovery errors
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    /// Audio decoding or resampling errors
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    /// Figure drawing or serialization errors
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Dataset scanning errors
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Dataset root '{path}' is not a directory")]
    RootNotFound { path: PathBuf },

    #[error("Invalid search pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: glob::PatternError,
    },

    #[error("No audio files found under '{path}'")]
    NoAudioFiles { path: PathBuf },
}

/// Audio decoding errors
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to open audio file '{path}': {source}")]
    OpenFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Unrecognized audio format in '{path}': {source}")]
    Probe {
        path: PathBuf,
        source: SymphoniaError,
    },

    #[error("No decodable audio track in '{path}'")]
    NoAudioTrack { path: PathBuf },

    #[error("Audio track in '{path}' does not declare a sample rate")]
    UnknownSampleRate { path: PathBuf },

    #[error("Failed to decode '{path}': {source}")]
    Decode {
        path: PathBuf,
        source: SymphoniaError,
    },

    #[error("Empty audio file: {path}")]
    EmptyFile { path: PathBuf },

    #[error("Resampling {from} Hz -> {to} Hz failed: {reason}")]
    Resample { from: u32, to: u32, reason: String },
}

/// Figure rendering errors
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("No {category} example available")]
    MissingCategory { category: Category },

    #[error("Drawing failed: {0}")]
    Draw(String),

    #[error("Generated SVG could not be parsed: {0}")]
    Svg(String),

    #[error("PDF conversion failed: {0}")]
    Pdf(String),

    #[error("Failed to write figure to '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config file '{path}': {source}")]
    LoadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config format in '{path}': {source}")]
    InvalidFormat {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Config validation failed: {reason}")]
    ValidationFailed { reason: String },

    #[error("Failed to save config to '{path}': {source}")]
    SaveFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Config serialization failed: {source}")]
    SerializationFailed { source: toml::ser::Error },
}

/// Result type alias for pipeline operations
pub type Result<T, E = AnalysisError> = std::result::Result<T, E>;

impl RenderError {
    /// Wrap a plotters drawing error, whose concrete type depends on the backend.
    pub fn draw<E: std::fmt::Display>(err: E) -> Self {
        RenderError::Draw(err.to_string())
    }
}

impl ScanError {
    /// Get suggested recovery action
    pub fn recovery_hint(&self) -> Option<&str> {
        match self {
            ScanError::RootNotFound { .. } | ScanError::NoAudioFiles { .. } => {
                Some("Check the dataset path")
            }
            ScanError::InvalidPattern { .. } => None,
        }
    }
}

impl AudioError {
    /// Get user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            AudioError::OpenFailed { path, .. } => {
                format!("Could not open audio file '{}'", path.display())
            }
            AudioError::Probe { path, .. } | AudioError::NoAudioTrack { path } => {
                format!("'{}' is not a supported audio file", path.display())
            }
            AudioError::UnknownSampleRate { path } => {
                format!("'{}' has no usable sample rate", path.display())
            }
            AudioError::Decode { path, .. } => {
                format!("Audio file '{}' is damaged", path.display())
            }
            AudioError::EmptyFile { path } => {
                format!("Audio file '{}' is empty", path.display())
            }
            AudioError::Resample { from, to, .. } => {
                format!("Could not convert audio from {} Hz to {} Hz", from, to)
            }
        }
    }
}
