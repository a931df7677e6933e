//! Application configuration with TOML persistence.
//!
//! Every value has a default matching the built-in behaviour, so running
//! without a config file analyses [`DEFAULT_DATASET_PATH`] exactly as before.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Dataset location used when neither the command line nor a config file names one.
pub const DEFAULT_DATASET_PATH: &str = "Dataset";

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Dataset discovery configuration
    pub dataset: DatasetConfig,

    /// Figure rendering configuration
    pub render: RenderConfig,

    /// Metrics configuration
    pub metrics: MetricsConfig,
}

/// Where to look for audio and how to label it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Root directory scanned recursively
    pub root: PathBuf,

    /// File extensions searched, in scan order
    pub extensions: Vec<String>,

    /// Keywords marking a file as real (checked first)
    pub real_keywords: Vec<String>,

    /// Keywords marking a file as fake
    pub fake_keywords: Vec<String>,

    /// Output directory, relative to the root
    pub output_dir: PathBuf,
}

/// Serialized figure format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Pdf,
    Svg,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Svg => "svg",
        }
    }
}

/// Figure rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub format: OutputFormat,

    /// Raster resolution used for any rasterized content in the PDF
    pub dpi: f32,

    /// Length of the per-category preview panels in seconds
    pub preview_secs: f32,

    /// Length of the zoomed overlay in the detailed figure in seconds
    pub zoom_secs: f32,

    /// Number of bins in the amplitude distribution
    pub histogram_bins: usize,

    /// Upper bound on the common sample rate of the detailed figure (Hz)
    pub max_detail_rate: u32,

    /// Signals longer than this are drawn as a min/max envelope
    pub max_plot_points: usize,

    /// Comparison figure size in inches (width, height)
    pub comparison_size_in: (f32, f32),

    /// Detailed figure size in inches (width, height)
    pub detailed_size_in: (f32, f32),
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Enable metrics collection
    pub enabled: bool,

    /// Histogram precision (significant value digits)
    pub histogram_precision: u8,

    /// Maximum histogram value in milliseconds
    pub histogram_max_ms: u64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_DATASET_PATH),
            extensions: ["wav", "mp3", "flac", "m4a"].map(String::from).to_vec(),
            real_keywords: ["real", "genuine", "original", "natural"]
                .map(String::from)
                .to_vec(),
            fake_keywords: ["fake", "synthetic", "generated", "artificial"]
                .map(String::from)
                .to_vec(),
            output_dir: PathBuf::from("plots"),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Pdf,
            dpi: 300.0,
            preview_secs: 5.0,
            zoom_secs: 2.0,
            histogram_bins: 50,
            max_detail_rate: 22_050,
            max_plot_points: 20_000,
            comparison_size_in: (16.0, 12.0),
            detailed_size_in: (14.0, 12.0),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            histogram_precision: 2,
            histogram_max_ms: 600_000,
        }
    }
}

impl DatasetConfig {
    /// Absolute location of the plots directory
    pub fn output_path(&self) -> PathBuf {
        self.root.join(&self.output_dir)
    }
}

impl AppConfig {
    /// Default configuration pointed at a specific dataset
    pub fn for_dataset<P: Into<PathBuf>>(root: P) -> Self {
        let mut config = Self::default();
        config.dataset.root = root.into();
        config
    }

    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| ConfigError::InvalidFormat {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::SaveFailed {
                path: path.to_path_buf(),
                source,
            })?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|source| ConfigError::SerializationFailed { source })?;

        std::fs::write(path, contents).map_err(|source| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fail = |reason: String| Err(ConfigError::ValidationFailed { reason });

        if self.dataset.extensions.is_empty() {
            return fail("At least one audio extension is required".to_string());
        }

        if self.dataset.real_keywords.is_empty() || self.dataset.fake_keywords.is_empty() {
            return fail("Both keyword lists must be non-empty".to_string());
        }

        if let Some(ext) = self
            .dataset
            .extensions
            .iter()
            .find(|ext| ext.is_empty() || ext.contains(['/', '\\', '*', '.']))
        {
            return fail(format!("Extension '{}' must be a bare suffix like 'wav'", ext));
        }

        let render = &self.render;
        if !(render.dpi > 0.0) {
            return fail(format!("DPI {} must be > 0", render.dpi));
        }

        if !(render.preview_secs > 0.0) || !(render.zoom_secs > 0.0) {
            return fail(format!(
                "Preview ({}s) and zoom ({}s) durations must be > 0",
                render.preview_secs, render.zoom_secs
            ));
        }

        if render.histogram_bins == 0 {
            return fail("Histogram bin count must be > 0".to_string());
        }

        if render.max_detail_rate == 0 {
            return fail("Detail sample rate cap must be > 0".to_string());
        }

        if render.max_plot_points < 2 {
            return fail(format!(
                "max_plot_points {} must be at least 2",
                render.max_plot_points
            ));
        }

        for (name, (w, h)) in [
            ("comparison", render.comparison_size_in),
            ("detailed", render.detailed_size_in),
        ] {
            if !(w > 0.0 && h > 0.0) {
                return fail(format!("{} figure size {}x{}in must be positive", name, w, h));
            }
        }

        if !(1..=5).contains(&self.metrics.histogram_precision) {
            return fail(format!(
                "Histogram precision {} out of range 1-5",
                self.metrics.histogram_precision
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = AppConfig::default();
        config.validate().expect("Default config should be valid");
    }

    #[test]
    fn test_defaults_match_builtin_behaviour() {
        let config = AppConfig::default();
        assert_eq!(config.dataset.root, PathBuf::from(DEFAULT_DATASET_PATH));
        assert_eq!(config.dataset.extensions, vec!["wav", "mp3", "flac", "m4a"]);
        assert_eq!(config.render.dpi, 300.0);
        assert_eq!(config.render.histogram_bins, 50);
        assert_eq!(config.render.max_detail_rate, 22_050);
        assert_eq!(
            config.dataset.output_path(),
            PathBuf::from(DEFAULT_DATASET_PATH).join("plots")
        );
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).expect("Should serialize");
        let deserialized: AppConfig = toml::from_str(&toml_str).expect("Should deserialize");
        assert_eq!(deserialized.render.format, OutputFormat::Pdf);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [dataset]
            root = "/srv/audio"

            [render]
            format = "svg"
            "#,
        )
        .expect("Should deserialize");

        assert_eq!(config.dataset.root, PathBuf::from("/srv/audio"));
        assert_eq!(config.dataset.real_keywords.len(), 4);
        assert_eq!(config.render.format, OutputFormat::Svg);
        assert_eq!(config.render.zoom_secs, 2.0);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.render.histogram_bins = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.dataset.fake_keywords.clear();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.dataset.extensions = vec!["*.wav".to_string()];
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.render.dpi = f32::NAN;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.render.detailed_size_in = (14.0, 0.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = AppConfig::for_dataset("/data/voices");
        config.save_to_file(&path).unwrap();

        let loaded = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.dataset.root, PathBuf::from("/data/voices"));
    }
}
