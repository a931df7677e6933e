//! Four-panel real-vs-fake comparison at native sample rates.
//!
//! Panels: A) full-length overlay, B) real preview, C) fake preview,
//! D) summary text. Every panel loads its own clips and a failure there only
//! blanks that panel.

use super::{Figure, Panel, PanelFailure, Trace, FAKE_COLOR, REAL_COLOR};
use crate::analysis::time_series;
use crate::audio::AudioClip;
use crate::config::RenderConfig;
use crate::error::AudioError;
use crate::utils::{file_label, format_secs};
use plotters::style::RGBColor;
use std::path::Path;

/// Output file name, without extension.
pub const FILE_STEM: &str = "waveform_analysis";

/// Stroke width shared by the overlay and preview panels.
const LINE_WIDTH: u32 = 2;

pub fn build<L>(
    real: Option<&Path>,
    fake: Option<&Path>,
    config: &RenderConfig,
    load: &mut L,
) -> Figure
where
    L: FnMut(&Path) -> Result<AudioClip, AudioError>,
{
    let max_points = config.max_plot_points;

    let overlay = match (real, fake) {
        (Some(real), Some(fake)) => guarded("combined waveform", || {
            let real = load(real)?;
            let fake = load(fake)?;
            Ok(Panel::Waveform {
                title: "A) Real vs Fake Waveform".to_string(),
                traces: vec![
                    Trace {
                        label: Some("Real Sound".to_string()),
                        color: REAL_COLOR,
                        alpha: 0.8,
                        width: LINE_WIDTH,
                        points: time_series(&real.samples, real.sample_rate, max_points),
                    },
                    Trace {
                        label: Some("Fake Sound".to_string()),
                        color: FAKE_COLOR,
                        alpha: 0.7,
                        width: LINE_WIDTH,
                        points: time_series(&fake.samples, fake.sample_rate, max_points),
                    },
                ],
                legend: true,
            })
        }),
        _ => Panel::Blank,
    };

    let preview = |path: Option<&Path>, letter: &str, name: &str, color: RGBColor, load: &mut L| {
        let Some(path) = path else {
            return Panel::Blank;
        };
        guarded(&format!("{} waveform", name.to_lowercase()), || {
            let clip = load(path)?;
            Ok(Panel::Waveform {
                title: format!(
                    "{}) {} Sound (First {} sec)",
                    letter,
                    name,
                    format_secs(config.preview_secs)
                ),
                traces: vec![Trace {
                    label: None,
                    color,
                    alpha: 1.0,
                    width: LINE_WIDTH,
                    points: time_series(clip.head(config.preview_secs), clip.sample_rate, max_points),
                }],
                legend: false,
            })
        })
    };

    let real_preview = preview(real, "B", "Real", REAL_COLOR, &mut *load);
    let fake_preview = preview(fake, "C", "Fake", FAKE_COLOR, &mut *load);

    Figure {
        size_in: config.comparison_size_in,
        grid: (2, 2),
        panels: vec![overlay, real_preview, fake_preview, summary(real, fake)],
        on_panel_failure: PanelFailure::Skip,
    }
}

fn summary(real: Option<&Path>, fake: Option<&Path>) -> Panel {
    let mut lines = vec!["Waveform analysis complete.".to_string(), String::new()];
    if let Some(real) = real {
        lines.push(format!("Real: {}", file_label(real)));
    }
    if let Some(fake) = fake {
        lines.push(format!("Fake: {}", file_label(fake)));
    }
    Panel::Summary { lines }
}

fn guarded<F>(what: &str, make: F) -> Panel
where
    F: FnOnce() -> Result<Panel, AudioError>,
{
    make().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Error plotting {}: {}", what, e.user_message());
        Panel::Blank
    })
}
