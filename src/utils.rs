//! Small formatting helpers for log lines and figure labels

use std::path::Path;

/// Format duration in seconds to MM:SS.SS format
pub fn format_duration(duration_secs: f32) -> String {
    let duration_secs = duration_secs.max(0.0);
    let minutes = (duration_secs / 60.0) as u32;
    let seconds = duration_secs % 60.0;
    format!("{:02}:{:05.2}", minutes, seconds)
}

/// Final path component for display, falling back to the whole path.
pub fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Render a number of seconds without a trailing `.0` ("5", "2.5").
pub fn format_secs(secs: f32) -> String {
    if secs.fract() == 0.0 {
        format!("{}", secs as i64)
    } else {
        format!("{}", secs)
    }
}
