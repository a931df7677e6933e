//! Three stacked panels comparing both clips on a common sample rate.

use super::{Figure, HistogramTrace, Panel, PanelFailure, Trace, FAKE_COLOR, REAL_COLOR};
use crate::analysis::{density_histogram, time_series};
use crate::audio::AudioClip;
use crate::config::RenderConfig;
use crate::error::{AnalysisError, AudioError, RenderError};
use crate::resample::detail_rate;
use crate::scanner::Category;
use crate::utils::format_secs;
use std::path::Path;

/// Output file name, without extension.
pub const FILE_STEM: &str = "detailed_waveform_analysis";

const ALPHA: f64 = 0.7;

/// Decode both examples, bring them to a shared rate and lay out the figure.
///
/// Unlike the comparison figure there is no per-panel recovery: a missing
/// example, a decode failure or a resampler error fails the whole figure.
pub fn build<L>(
    real: Option<&Path>,
    fake: Option<&Path>,
    config: &RenderConfig,
    load: &mut L,
) -> Result<Figure, AnalysisError>
where
    L: FnMut(&Path) -> Result<AudioClip, AudioError>,
{
    let real = real.ok_or(RenderError::MissingCategory {
        category: Category::Real,
    })?;
    let fake = fake.ok_or(RenderError::MissingCategory {
        category: Category::Fake,
    })?;

    let real = load(real)?;
    let fake = load(fake)?;

    let target = detail_rate(real.sample_rate, fake.sample_rate, config.max_detail_rate);
    let real = to_rate(real, target)?;
    let fake = to_rate(fake, target)?;

    tracing::debug!(
        sample_rate = target,
        real_samples = real.len(),
        fake_samples = fake.len(),
        "Clips aligned for detailed analysis"
    );

    let max_points = config.max_plot_points;
    let traces = |real_samples: &[f32], fake_samples: &[f32]| {
        vec![
            Trace {
                label: Some("Real".to_string()),
                color: REAL_COLOR,
                alpha: ALPHA,
                width: 1,
                points: time_series(real_samples, target, max_points),
            },
            Trace {
                label: Some("Fake".to_string()),
                color: FAKE_COLOR,
                alpha: ALPHA,
                width: 1,
                points: time_series(fake_samples, target, max_points),
            },
        ]
    };

    let overlay = Panel::Waveform {
        title: "Waveform Overlay".to_string(),
        traces: traces(&real.samples, &fake.samples),
        legend: true,
    };

    let zoomed = Panel::Waveform {
        title: format!("Zoomed (First {} sec)", format_secs(config.zoom_secs)),
        traces: traces(real.head(config.zoom_secs), fake.head(config.zoom_secs)),
        legend: true,
    };

    let distribution = Panel::Histogram {
        title: "Amplitude Distribution".to_string(),
        traces: vec![
            HistogramTrace {
                label: "Real".to_string(),
                color: REAL_COLOR,
                alpha: ALPHA,
                bins: density_histogram(&real.samples, config.histogram_bins),
            },
            HistogramTrace {
                label: "Fake".to_string(),
                color: FAKE_COLOR,
                alpha: ALPHA,
                bins: density_histogram(&fake.samples, config.histogram_bins),
            },
        ],
    };

    Ok(Figure {
        size_in: config.detailed_size_in,
        grid: (3, 1),
        panels: vec![overlay, zoomed, distribution],
        on_panel_failure: PanelFailure::Abort,
    })
}

fn to_rate(clip: AudioClip, target: u32) -> Result<AudioClip, AudioError> {
    if clip.sample_rate == target {
        Ok(clip)
    } else {
        clip.resampled(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{generate_sine_wave, generate_voiced_tone};
    use std::path::PathBuf;

    fn rates(real_rate: u32, fake_rate: u32) -> impl FnMut(&Path) -> Result<AudioClip, AudioError> {
        move |path: &Path| {
            let rate = if path.ends_with("real.wav") {
                real_rate
            } else {
                fake_rate
            };
            Ok(AudioClip::new(generate_voiced_tone(3.0, rate), rate))
        }
    }

    fn last_time(panel: &Panel, trace: usize) -> f64 {
        let Panel::Waveform { traces, .. } = panel else {
            panic!("expected waveform panel");
        };
        traces[trace].points.last().unwrap().0
    }

    #[test]
    fn test_panel_layout() {
        let (real, fake) = (PathBuf::from("real.wav"), PathBuf::from("fake.wav"));
        let figure = build(
            Some(&real),
            Some(&fake),
            &RenderConfig::default(),
            &mut rates(16_000, 16_000),
        )
        .unwrap();

        let titles: Vec<_> = figure.panels.iter().map(Panel::title).collect();
        assert_eq!(
            titles,
            vec![
                Some("Waveform Overlay"),
                Some("Zoomed (First 2 sec)"),
                Some("Amplitude Distribution"),
            ]
        );
        assert_eq!(figure.grid, (3, 1));
        assert_eq!(figure.on_panel_failure, PanelFailure::Abort);
    }

    #[test]
    fn test_zoom_window_is_two_seconds() {
        let (real, fake) = (PathBuf::from("real.wav"), PathBuf::from("fake.wav"));
        let figure = build(
            Some(&real),
            Some(&fake),
            &RenderConfig::default(),
            &mut rates(44_100, 16_000),
        )
        .unwrap();

        for trace in 0..2 {
            let end = last_time(&figure.panels[1], trace);
            assert!(end < 2.0 && end > 1.99, "zoom ends at {end}s");
            let full = last_time(&figure.panels[0], trace);
            assert!(full > 2.9, "overlay ends at {full}s");
        }
    }

    #[test]
    fn test_histograms_use_configured_bins() {
        let (real, fake) = (PathBuf::from("real.wav"), PathBuf::from("fake.wav"));
        let figure = build(
            Some(&real),
            Some(&fake),
            &RenderConfig::default(),
            &mut rates(8_000, 8_000),
        )
        .unwrap();

        let Panel::Histogram { traces, .. } = &figure.panels[2] else {
            panic!("expected histogram panel");
        };
        assert_eq!(traces.len(), 2);
        assert!(traces.iter().all(|t| t.bins.len() == 50 && t.alpha == 0.7));
    }

    #[test]
    fn test_missing_fake_is_reported() {
        let real = PathBuf::from("real.wav");
        let err = build(Some(&real), None, &RenderConfig::default(), &mut rates(8_000, 8_000))
            .unwrap_err();

        assert!(matches!(
            err,
            AnalysisError::Render(RenderError::MissingCategory {
                category: Category::Fake
            })
        ));
        assert_eq!(err.to_string(), "Render error: No fake example available");
    }

    #[test]
    fn test_decode_failure_aborts_figure() {
        let (real, fake) = (PathBuf::from("real.wav"), PathBuf::from("fake.wav"));
        let mut load = |path: &Path| {
            if path.ends_with("fake.wav") {
                Err(AudioError::EmptyFile {
                    path: path.to_path_buf(),
                })
            } else {
                Ok(AudioClip::new(generate_sine_wave(440.0, 1.0, 8_000, 0.5), 8_000))
            }
        };

        let result = build(Some(&real), Some(&fake), &RenderConfig::default(), &mut load);
        assert!(matches!(
            result,
            Err(AnalysisError::Audio(AudioError::EmptyFile { .. }))
        ));
    }

    #[test]
    fn test_rates_above_cap_are_lowered() {
        let (real, fake) = (PathBuf::from("real.wav"), PathBuf::from("fake.wav"));
        let mut load = |path: &Path| {
            let _ = path;
            Ok::<_, AudioError>(AudioClip::new(vec![0.1; 48_000], 48_000))
        };

        let figure = build(Some(&real), Some(&fake), &RenderConfig::default(), &mut load).unwrap();
        let end = last_time(&figure.panels[0], 0);
        // 48000 samples at 22050 Hz still span one second.
        assert!((end - 1.0).abs() < 1e-3, "overlay ends at {end}s");
    }
}
