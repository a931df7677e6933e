//! Per-run timing and outcome counters.
//!
//! Uses HDR histograms for latency percentiles, like a long-running service
//! would, so slow decodes in large datasets stand out in the run summary.

use crate::config::MetricsConfig;
use hdrhistogram::Histogram;
use std::time::{Duration, Instant};

/// Metrics collected over one analyzer run
#[derive(Debug)]
pub struct RunMetrics {
    enabled: bool,

    /// Audio decode latency histogram (milliseconds)
    decode_latency_ms: Option<Histogram<u64>>,

    /// Figure render+write latency histogram (milliseconds)
    render_latency_ms: Option<Histogram<u64>>,

    files_scanned: u64,
    decodes_ok: u64,
    decodes_failed: u64,
    samples_decoded: u64,
    figures_written: u64,
    figures_skipped: u64,
    figures_failed: u64,

    started: Instant,
}

/// Summary of key metrics for logging
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSummary {
    pub decode_p50_ms: f64,
    pub decode_max_ms: f64,
    pub render_p50_ms: f64,
    pub render_max_ms: f64,
    pub files_scanned: u64,
    pub decodes_ok: u64,
    pub decodes_failed: u64,
    pub samples_decoded: u64,
    pub figures_written: u64,
    pub figures_skipped: u64,
    pub figures_failed: u64,
    pub elapsed_secs: f64,
}

impl Default for RunMetrics {
    fn default() -> Self {
        Self::new(&MetricsConfig::default())
    }
}

impl RunMetrics {
    pub fn new(config: &MetricsConfig) -> Self {
        let histogram = || {
            if !config.enabled {
                return None;
            }
            Histogram::new_with_bounds(1, config.histogram_max_ms.max(2), config.histogram_precision)
                .map_err(|e| tracing::warn!("Metrics histogram disabled: {}", e))
                .ok()
        };

        Self {
            enabled: config.enabled,
            decode_latency_ms: histogram(),
            render_latency_ms: histogram(),
            files_scanned: 0,
            decodes_ok: 0,
            decodes_failed: 0,
            samples_decoded: 0,
            figures_written: 0,
            figures_skipped: 0,
            figures_failed: 0,
            started: Instant::now(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn record_scan(&mut self, files: usize) {
        self.files_scanned += files as u64;
    }

    /// Record one decode attempt
    pub fn record_decode(&mut self, duration: Duration, samples: usize, success: bool) {
        record_latency(&mut self.decode_latency_ms, duration, "decode");

        if success {
            self.decodes_ok += 1;
            self.samples_decoded += samples as u64;
        } else {
            self.decodes_failed += 1;
        }
    }

    /// Record one figure outcome
    pub fn record_render(&mut self, duration: Duration, success: bool) {
        record_latency(&mut self.render_latency_ms, duration, "render");

        if success {
            self.figures_written += 1;
        } else {
            self.figures_failed += 1;
        }
    }

    pub fn record_skipped_figure(&mut self) {
        self.figures_skipped += 1;
    }

    pub fn summary(&self) -> MetricsSummary {
        let quantile = |h: &Option<Histogram<u64>>, q: f64| {
            h.as_ref()
                .filter(|h| !h.is_empty())
                .map_or(0.0, |h| h.value_at_quantile(q) as f64)
        };

        MetricsSummary {
            decode_p50_ms: quantile(&self.decode_latency_ms, 0.5),
            decode_max_ms: quantile(&self.decode_latency_ms, 1.0),
            render_p50_ms: quantile(&self.render_latency_ms, 0.5),
            render_max_ms: quantile(&self.render_latency_ms, 1.0),
            files_scanned: self.files_scanned,
            decodes_ok: self.decodes_ok,
            decodes_failed: self.decodes_failed,
            samples_decoded: self.samples_decoded,
            figures_written: self.figures_written,
            figures_skipped: self.figures_skipped,
            figures_failed: self.figures_failed,
            elapsed_secs: self.started.elapsed().as_secs_f64(),
        }
    }
}

fn record_latency(histogram: &mut Option<Histogram<u64>>, duration: Duration, what: &str) {
    if let Some(h) = histogram {
        let ms = (duration.as_millis() as u64).max(1);
        if let Err(e) = h.record(ms) {
            tracing::warn!("Failed to record {} latency: {}", what, e);
        }
    }
}

impl MetricsSummary {
    /// Emit the summary as one structured log event
    pub fn log(&self) {
        tracing::info!(
            files = self.files_scanned,
            decodes_ok = self.decodes_ok,
            decodes_failed = self.decodes_failed,
            samples = self.samples_decoded,
            decode_p50_ms = self.decode_p50_ms,
            decode_max_ms = self.decode_max_ms,
            render_p50_ms = self.render_p50_ms,
            render_max_ms = self.render_max_ms,
            figures_written = self.figures_written,
            figures_skipped = self.figures_skipped,
            figures_failed = self.figures_failed,
            elapsed_secs = format!("{:.2}", self.elapsed_secs),
            "Run metrics"
        );
    }
}
