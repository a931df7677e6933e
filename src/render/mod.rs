//! Figure model and serialization.
//!
//! A [`Figure`] is a grid of backend-independent [`Panel`]s whose data was
//! prepared up front (decoded, sliced, decimated). Drawing goes through
//! plotters' SVG backend; PDF output converts that SVG with `svg2pdf`.

pub mod comparison;
pub mod detailed;

use crate::analysis::Bin;
use crate::config::{OutputFormat, RenderConfig};
use crate::error::RenderError;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use svg2pdf::usvg::{self, fontdb};

pub const REAL_COLOR: RGBColor = RGBColor(0x2E, 0x8B, 0x57);
pub const FAKE_COLOR: RGBColor = RGBColor(0xDC, 0x14, 0x3C);
const SUMMARY_FILL: RGBColor = RGBColor(0xAD, 0xD8, 0xE6);

/// SVG user units per inch; the PDF page ends up at the figure's size in inches.
pub const UNITS_PER_INCH: f32 = 72.0;

const FONT_FAMILY: &str = "sans-serif";

/// One line on a waveform panel.
#[derive(Debug, Clone)]
pub struct Trace {
    pub label: Option<String>,
    pub color: RGBColor,
    pub alpha: f64,
    pub width: u32,
    /// `(seconds, amplitude)` points, already decimated.
    pub points: Vec<(f64, f64)>,
}

/// One filled histogram on a distribution panel.
#[derive(Debug, Clone)]
pub struct HistogramTrace {
    pub label: String,
    pub color: RGBColor,
    pub alpha: f64,
    pub bins: Vec<Bin>,
}

#[derive(Debug, Clone)]
pub enum Panel {
    /// Left empty, e.g. because the clip for it failed to decode.
    Blank,
    Waveform {
        title: String,
        traces: Vec<Trace>,
        legend: bool,
    },
    Histogram {
        title: String,
        traces: Vec<HistogramTrace>,
    },
    /// Text on a shaded box, no axes.
    Summary { lines: Vec<String> },
}

/// What to do when a single panel fails to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelFailure {
    /// Log it and keep drawing the remaining panels.
    Skip,
    /// Abort the whole figure.
    Abort,
}

#[derive(Debug, Clone)]
pub struct Figure {
    /// Width and height in inches.
    pub size_in: (f32, f32),
    /// Rows and columns of the panel grid.
    pub grid: (usize, usize),
    /// Panels in row-major order.
    pub panels: Vec<Panel>,
    pub on_panel_failure: PanelFailure,
}

impl Panel {
    pub fn is_blank(&self) -> bool {
        matches!(self, Panel::Blank)
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            Panel::Waveform { title, .. } | Panel::Histogram { title, .. } => Some(title),
            Panel::Blank | Panel::Summary { .. } => None,
        }
    }

    fn draw<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> Result<(), RenderError> {
        match self {
            Panel::Blank => Ok(()),
            Panel::Waveform {
                title,
                traces,
                legend,
            } => draw_waveform(area, title, traces, *legend),
            Panel::Histogram { title, traces } => draw_histogram(area, title, traces),
            Panel::Summary { lines } => draw_summary(area, lines),
        }
    }
}

impl Figure {
    pub fn pixel_size(&self) -> (u32, u32) {
        let (w, h) = self.size_in;
        (
            (w * UNITS_PER_INCH).round().max(1.0) as u32,
            (h * UNITS_PER_INCH).round().max(1.0) as u32,
        )
    }

    pub fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> Result<(), RenderError> {
        root.fill(&WHITE).map_err(RenderError::draw)?;

        let areas = root.split_evenly(self.grid);
        for (index, (area, panel)) in areas.iter().zip(&self.panels).enumerate() {
            if let Err(e) = panel.draw(area) {
                match self.on_panel_failure {
                    PanelFailure::Skip => {
                        tracing::error!(panel = index, "Error drawing panel: {}", e)
                    }
                    PanelFailure::Abort => return Err(e),
                }
            }
        }

        Ok(())
    }

    pub fn to_svg(&self) -> Result<String, RenderError> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, self.pixel_size()).into_drawing_area();
            self.draw(&root)?;
            root.present().map_err(RenderError::draw)?;
        }
        Ok(svg)
    }

    pub fn to_pdf(&self, dpi: f32) -> Result<Vec<u8>, RenderError> {
        svg_to_pdf(&self.to_svg()?, dpi)
    }

    /// Serialize in the configured format.
    pub fn encode(&self, config: &RenderConfig) -> Result<Vec<u8>, RenderError> {
        match config.format {
            OutputFormat::Pdf => self.to_pdf(config.dpi),
            OutputFormat::Svg => Ok(self.to_svg()?.into_bytes()),
        }
    }
}

/// Families tried, in order, for the generic `sans-serif` that plotters writes.
const SANS_SERIF_FALLBACKS: [&str; 5] = [
    "DejaVu Sans",
    "Liberation Sans",
    "Arial",
    "Helvetica",
    "Noto Sans",
];

/// System font database shared by every PDF conversion in the process.
struct SystemFonts {
    db: Arc<fontdb::Database>,
    sans_serif: Option<String>,
}

fn system_fonts() -> &'static SystemFonts {
    static FONTS: OnceLock<SystemFonts> = OnceLock::new();

    FONTS.get_or_init(|| {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();

        // usvg maps `sans-serif` to "Arial" unless told otherwise, and text
        // whose family cannot be resolved is dropped from the PDF.
        let sans_serif = resolve_sans_serif(&db);
        match &sans_serif {
            Some(family) => {
                db.set_sans_serif_family(family.as_str());
                tracing::debug!(family = %family, faces = db.len(), "Figure font selected");
            }
            None => tracing::warn!("No system fonts found; PDF figures will have no text"),
        }

        SystemFonts {
            db: Arc::new(db),
            sans_serif,
        }
    })
}

/// First installed family from [`SANS_SERIF_FALLBACKS`], else any installed family.
fn resolve_sans_serif(db: &fontdb::Database) -> Option<String> {
    let installed = |name: &str| {
        db.faces()
            .any(|face| face.families.iter().any(|(family, _)| family == name))
    };

    SANS_SERIF_FALLBACKS
        .into_iter()
        .find(|&name| installed(name))
        .map(str::to_string)
        .or_else(|| {
            db.faces()
                .find_map(|face| face.families.first())
                .map(|(family, _)| family.clone())
        })
}

/// Family that figure text is set in when writing PDF, or `None` when the
/// system has no fonts at all.
pub fn text_font_family() -> Option<&'static str> {
    system_fonts().sans_serif.as_deref()
}

/// Convert an SVG document to a single-page PDF.
///
/// `dpi` sets the resolution of anything that has to be rasterized (filters,
/// embedded images); vector content stays vector.
pub fn svg_to_pdf(svg: &str, dpi: f32) -> Result<Vec<u8>, RenderError> {
    let fonts = system_fonts();

    let mut options = usvg::Options::default();
    options.fontdb = Arc::clone(&fonts.db);
    if let Some(family) = &fonts.sans_serif {
        options.font_family = family.clone();
    }

    let tree = usvg::Tree::from_str(svg, &options).map_err(|e| RenderError::Svg(e.to_string()))?;

    let mut conversion = svg2pdf::ConversionOptions::default();
    conversion.raster_scale = dpi / UNITS_PER_INCH;

    svg2pdf::to_pdf(&tree, conversion, svg2pdf::PageOptions::default())
        .map_err(|e| RenderError::Pdf(format!("{:?}", e)))
}

/// Render `figure` to `<dir>/<stem>.<ext>` and return the written path.
///
/// The file is written to a temporary sibling and renamed into place, so an
/// existing figure is only replaced by a complete one.
pub fn write_figure(
    figure: &Figure,
    dir: &Path,
    stem: &str,
    config: &RenderConfig,
) -> Result<PathBuf, RenderError> {
    let path = dir.join(format!("{}.{}", stem, config.format.extension()));
    let bytes = figure.encode(config)?;

    let write_err = |source: std::io::Error| RenderError::Write {
        path: path.clone(),
        source,
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(&bytes).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    tmp.persist(&path).map_err(|e| write_err(e.error))?;

    tracing::debug!(path = %path.display(), bytes = bytes.len(), "Figure written");

    Ok(path)
}

fn padded(lo: f64, hi: f64) -> std::ops::Range<f64> {
    let pad = ((hi - lo) * 0.05).max(1e-6);
    (lo - pad)..(hi + pad)
}

fn title_font(size: u32) -> FontDesc<'static> {
    (FONT_FAMILY, size).into_font().style(FontStyle::Bold)
}

fn draw_waveform<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    traces: &[Trace],
    legend: bool,
) -> Result<(), RenderError> {
    let points = || traces.iter().flat_map(|t| t.points.iter());
    let x_max = points().map(|p| p.0).fold(0.0, f64::max).max(1e-3);
    let (y_lo, y_hi) = points().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
        (lo.min(p.1), hi.max(p.1))
    });
    let (y_lo, y_hi) = if y_lo > y_hi { (-1.0, 1.0) } else { (y_lo, y_hi) };

    let mut chart = ChartBuilder::on(area)
        .caption(title, title_font(20))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..x_max, padded(y_lo, y_hi))
        .map_err(RenderError::draw)?;

    chart
        .configure_mesh()
        .x_desc("Time (s)")
        .y_desc("Amplitude")
        .bold_line_style(BLACK.mix(0.15))
        .light_line_style(BLACK.mix(0.05))
        .draw()
        .map_err(RenderError::draw)?;

    for trace in traces {
        let style = trace.color.mix(trace.alpha).stroke_width(trace.width);
        let series = chart
            .draw_series(LineSeries::new(trace.points.iter().copied(), style))
            .map_err(RenderError::draw)?;
        if let Some(label) = &trace.label {
            series
                .label(label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
        }
    }

    if legend {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK.mix(0.3))
            .draw()
            .map_err(RenderError::draw)?;
    }

    Ok(())
}

fn draw_histogram<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    traces: &[HistogramTrace],
) -> Result<(), RenderError> {
    let bins = || traces.iter().flat_map(|t| t.bins.iter());
    let x_lo = bins().map(|b| b.start).fold(f64::INFINITY, f64::min);
    let x_hi = bins().map(|b| b.end).fold(f64::NEG_INFINITY, f64::max);
    let (x_lo, x_hi) = if x_lo < x_hi { (x_lo, x_hi) } else { (-1.0, 1.0) };
    let y_hi = bins().map(|b| b.density).fold(0.0, f64::max).max(1e-6);

    let mut chart = ChartBuilder::on(area)
        .caption(title, title_font(20))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(padded(x_lo, x_hi), 0.0..y_hi * 1.05)
        .map_err(RenderError::draw)?;

    chart
        .configure_mesh()
        .x_desc("Amplitude")
        .y_desc("Density")
        .bold_line_style(BLACK.mix(0.15))
        .light_line_style(BLACK.mix(0.05))
        .draw()
        .map_err(RenderError::draw)?;

    for trace in traces {
        let fill = trace.color.mix(trace.alpha).filled();
        chart
            .draw_series(
                trace
                    .bins
                    .iter()
                    .map(|b| Rectangle::new([(b.start, 0.0), (b.end, b.density)], fill)),
            )
            .map_err(RenderError::draw)?
            .label(trace.label.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], fill));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK.mix(0.3))
        .draw()
        .map_err(RenderError::draw)?;

    Ok(())
}

fn draw_summary<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    lines: &[String],
) -> Result<(), RenderError> {
    let (width, height) = area.dim_in_pixel();
    let style: TextStyle = (FONT_FAMILY, 16).into_font().into();
    let line_height = 24;

    let text_width = lines
        .iter()
        .filter(|line| !line.is_empty())
        .map(|line| area.estimate_text_size(line, &style).map(|(w, _)| w))
        .collect::<Result<Vec<_>, _>>()
        .map_err(RenderError::draw)?
        .into_iter()
        .max()
        .unwrap_or(0);

    let x = (width as f64 * 0.05) as i32;
    let y = (height as f64 * 0.05) as i32;
    let padding = 10;
    let box_w = text_width as i32 + 2 * padding;
    let box_h = lines.len() as i32 * line_height + 2 * padding;

    area.draw(&Rectangle::new(
        [(x, y), (x + box_w, y + box_h)],
        SUMMARY_FILL.mix(0.5).filled(),
    ))
    .map_err(RenderError::draw)?;
    area.draw(&Rectangle::new(
        [(x, y), (x + box_w, y + box_h)],
        BLACK.mix(0.4).stroke_width(1),
    ))
    .map_err(RenderError::draw)?;

    for (i, line) in lines.iter().enumerate() {
        let baseline = y + padding + i as i32 * line_height;
        area.draw(&Text::new(line.as_str(), (x + padding, baseline), style.clone()))
            .map_err(RenderError::draw)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_figure() -> Figure {
        Figure {
            size_in: (4.0, 3.0),
            grid: (2, 1),
            panels: vec![
                Panel::Waveform {
                    title: "Tone".to_string(),
                    traces: vec![Trace {
                        label: Some("Real".to_string()),
                        color: REAL_COLOR,
                        alpha: 0.8,
                        width: 1,
                        points: vec![(0.0, 0.0), (0.5, 0.4), (1.0, -0.3)],
                    }],
                    legend: true,
                },
                Panel::Summary {
                    lines: vec!["Real: a.wav".to_string()],
                },
            ],
            on_panel_failure: PanelFailure::Abort,
        }
    }

    #[test]
    fn test_pixel_size_follows_inches() {
        assert_eq!(sample_figure().pixel_size(), (288, 216));
    }

    #[test]
    fn test_svg_contains_titles_and_labels() {
        let svg = sample_figure().to_svg().unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Tone"));
        assert!(svg.contains("Time (s)"));
        assert!(svg.contains("Real: a.wav"));
    }

    #[test]
    fn test_pdf_output_has_pdf_header() {
        let pdf = sample_figure().to_pdf(300.0).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn test_pdf_embeds_figure_text() {
        if text_font_family().is_none() {
            eprintln!("no system fonts installed, skipping PDF text check");
            return;
        }

        let summary = Figure {
            size_in: (3.0, 2.0),
            grid: (1, 1),
            panels: vec![Panel::Summary {
                lines: vec!["Real: a.wav".to_string()],
            }],
            on_panel_failure: PanelFailure::Abort,
        };
        let pdf = summary.to_pdf(300.0).unwrap();
        assert!(contains(&pdf, b"/Font"), "summary text was dropped from the PDF");

        let blank = Figure {
            panels: vec![Panel::Blank],
            ..summary
        };
        let pdf = blank.to_pdf(300.0).unwrap();
        assert!(!contains(&pdf, b"/Font"));
    }

    #[test]
    fn test_sans_serif_needs_an_installed_face() {
        assert_eq!(resolve_sans_serif(&fontdb::Database::new()), None);
    }

    #[test]
    fn test_blank_panels_draw_nothing() {
        let figure = Figure {
            size_in: (2.0, 2.0),
            grid: (1, 1),
            panels: vec![Panel::Blank],
            on_panel_failure: PanelFailure::Abort,
        };
        let svg = figure.to_svg().unwrap();
        assert!(!svg.contains("<text"));
    }

    #[test]
    fn test_write_figure_replaces_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let config = RenderConfig {
            format: OutputFormat::Svg,
            ..RenderConfig::default()
        };

        let path = write_figure(&sample_figure(), dir.path(), "figure", &config).unwrap();
        assert_eq!(path, dir.path().join("figure.svg"));

        let again = write_figure(&sample_figure(), dir.path(), "figure", &config).unwrap();
        assert_eq!(path, again);

        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
