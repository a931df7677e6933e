use crate::audio::AudioClip;
use crate::config::AppConfig;
use crate::error::{AnalysisError, AudioError, RenderError, ScanError};
use crate::metrics::RunMetrics;
use crate::render::{self, comparison, detailed, Figure};
use crate::scanner::{self, Category, ScanResult};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Figures written by one [`WaveformAnalyzer::run`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub real_files: usize,
    pub fake_files: usize,
    pub comparison: Option<PathBuf>,
    pub detailed: Option<PathBuf>,
}

/// Scans a dataset once and renders both comparison figures from it.
#[derive(Debug)]
pub struct WaveformAnalyzer {
    config: AppConfig,
    scan: ScanResult,
    metrics: RunMetrics,
}

impl WaveformAnalyzer {
    /// Validate `config` and set up an analyzer with an empty scan.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Config`] if the configuration is invalid.
    pub fn new(config: AppConfig) -> Result<Self, AnalysisError> {
        config.validate()?;

        let metrics = RunMetrics::new(&config.metrics);
        Ok(Self {
            config,
            scan: ScanResult::default(),
            metrics,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn scan_result(&self) -> &ScanResult {
        &self.scan
    }

    pub fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    /// Discover and label the dataset's audio files, replacing any earlier scan.
    pub fn find_audio_files(&mut self) -> Result<&ScanResult, ScanError> {
        tracing::info!("Scanning for audio files in: {}", self.config.dataset.root.display());

        self.scan = scanner::scan(&self.config.dataset)?;
        self.metrics.record_scan(self.scan.len());

        Ok(&self.scan)
    }

    /// Render the four-panel comparison of the first real and fake files.
    pub fn create_waveform_comparison(&mut self) -> Result<PathBuf, AnalysisError> {
        tracing::info!("Creating waveform comparison");

        let output_dir = self.output_dir()?;
        let real = self.scan.example(Category::Real).map(Path::to_path_buf);
        let fake = self.scan.example(Category::Fake).map(Path::to_path_buf);

        let metrics = &mut self.metrics;
        let figure = comparison::build(
            real.as_deref(),
            fake.as_deref(),
            &self.config.render,
            &mut |path: &Path| timed_load(metrics, path),
        );

        let path = self.write(&figure, &output_dir, comparison::FILE_STEM)?;
        tracing::info!("Waveform comparison saved: {}", path.display());
        Ok(path)
    }

    /// Render the resampled overlay, zoom and amplitude distribution figure.
    ///
    /// Returns `Ok(None)` when the dataset lacks a real or a fake example.
    pub fn create_detailed_waveform_analysis(&mut self) -> Result<Option<PathBuf>, AnalysisError> {
        tracing::info!("Creating detailed waveform analysis");

        let real = self.scan.example(Category::Real).map(Path::to_path_buf);
        let fake = self.scan.example(Category::Fake).map(Path::to_path_buf);

        let metrics = &mut self.metrics;
        let built = detailed::build(
            real.as_deref(),
            fake.as_deref(),
            &self.config.render,
            &mut |path: &Path| timed_load(metrics, path),
        );
        let figure = match built {
            Ok(figure) => figure,
            Err(AnalysisError::Render(RenderError::MissingCategory { category })) => {
                tracing::warn!(missing = %category, "Skipping detailed analysis (need both real & fake files)");
                self.metrics.record_skipped_figure();
                return Ok(None);
            }
            Err(e) => {
                self.metrics.record_render(Duration::ZERO, false);
                return Err(e);
            }
        };

        let output_dir = self.output_dir()?;
        let path = self.write(&figure, &output_dir, detailed::FILE_STEM)?;
        tracing::info!("Detailed analysis saved: {}", path.display());
        Ok(Some(path))
    }

    /// Scan, then render both figures.
    ///
    /// Only the scan is fatal; a failed figure is logged and the run moves on.
    pub fn run(&mut self) -> Result<RunReport, AnalysisError> {
        tracing::info!("Starting waveform analysis");

        self.find_audio_files()?;

        let mut report = RunReport {
            real_files: self.scan.files(Category::Real).len(),
            fake_files: self.scan.files(Category::Fake).len(),
            ..RunReport::default()
        };

        match self.create_waveform_comparison() {
            Ok(path) => report.comparison = Some(path),
            Err(e) => tracing::error!("Error creating waveform comparison: {}", e),
        }

        match self.create_detailed_waveform_analysis() {
            Ok(path) => report.detailed = path,
            Err(e) => tracing::error!("Error in detailed analysis: {}", e),
        }

        if self.metrics.is_enabled() {
            self.metrics.summary().log();
        }

        tracing::info!("Waveform analysis complete");
        Ok(report)
    }

    fn output_dir(&self) -> Result<PathBuf, AnalysisError> {
        let dir = self.config.dataset.output_path();
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    fn write(&mut self, figure: &Figure, dir: &Path, stem: &str) -> Result<PathBuf, AnalysisError> {
        let started = Instant::now();
        let written = render::write_figure(figure, dir, stem, &self.config.render);
        self.metrics.record_render(started.elapsed(), written.is_ok());
        Ok(written?)
    }
}

fn timed_load(metrics: &mut RunMetrics, path: &Path) -> Result<AudioClip, AudioError> {
    let started = Instant::now();
    let clip = AudioClip::load(path);
    let samples = clip.as_ref().map_or(0, AudioClip::len);
    metrics.record_decode(started.elapsed(), samples, clip.is_ok());
    clip
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use crate::test_fixtures::TestDataset;

    fn analyzer(dataset: &TestDataset) -> WaveformAnalyzer {
        let mut config = AppConfig::for_dataset(dataset.path());
        config.render.format = OutputFormat::Svg;
        WaveformAnalyzer::new(config).unwrap()
    }

    #[test]
    fn test_run_writes_both_figures() {
        let dataset = TestDataset::new()
            .wav("real/real_sample.wav", 16_000, 1.0)
            .wav("fake/fake_sample.wav", 8_000, 1.0);

        let report = analyzer(&dataset).run().unwrap();

        assert_eq!((report.real_files, report.fake_files), (1, 1));
        let plots = dataset.path().join("plots");
        assert_eq!(report.comparison, Some(plots.join("waveform_analysis.svg")));
        assert_eq!(report.detailed, Some(plots.join("detailed_waveform_analysis.svg")));
    }

    #[test]
    fn test_detailed_skipped_without_fake() {
        let dataset = TestDataset::new().wav("real_only.wav", 8_000, 0.5);

        let mut analyzer = analyzer(&dataset);
        let report = analyzer.run().unwrap();

        assert!(report.comparison.is_some());
        assert_eq!(report.detailed, None);

        let summary = analyzer.metrics().summary();
        assert_eq!(summary.figures_written, 1);
        assert_eq!(summary.figures_skipped, 1);
    }

    #[test]
    fn test_empty_dataset_is_fatal() {
        let dataset = TestDataset::new().raw("notes.txt", b"no audio here");

        let err = analyzer(&dataset).run().unwrap_err();

        assert!(matches!(err, AnalysisError::Scan(ScanError::NoAudioFiles { .. })));
        assert!(!dataset.path().join("plots").exists());
    }

    #[test]
    fn test_corrupt_fake_fails_only_detailed() {
        let dataset = TestDataset::new()
            .wav("real_voice.wav", 8_000, 0.5)
            .raw("fake_voice.wav", b"RIFF....not really a wav");

        let mut analyzer = analyzer(&dataset);
        let report = analyzer.run().unwrap();

        assert!(report.comparison.is_some());
        assert_eq!(report.detailed, None);

        let summary = analyzer.metrics().summary();
        assert!(summary.decodes_failed >= 1);
        assert_eq!(summary.figures_failed, 1);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = AppConfig::for_dataset("Dataset");
        config.render.dpi = 0.0;

        let err = WaveformAnalyzer::new(config).unwrap_err();

        assert!(matches!(err, AnalysisError::Config(_)));
    }

    #[test]
    fn test_rescan_replaces_previous_result() {
        let dataset = TestDataset::new().wav("genuine.wav", 8_000, 0.2);
        let mut analyzer = analyzer(&dataset);

        analyzer.find_audio_files().unwrap();
        analyzer.find_audio_files().unwrap();

        assert_eq!(analyzer.scan_result().len(), 1);
        assert_eq!(analyzer.metrics().summary().files_scanned, 2);
    }
}
