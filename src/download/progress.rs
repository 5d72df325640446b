//! ffmpeg download progress tracking

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static DURATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Duration: (\d+):(\d+):(\d+\.\d+)").unwrap());

static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"time=(\d+):(\d+):(\d+\.\d+)").unwrap());

/// Download state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStatus {
    #[default]
    Downloading,
    Completed,
    Failed,
}

/// Snapshot of a running or finished download
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadProgress {
    /// Percentage, 0 to 100
    pub progress: u8,
    pub status: DownloadStatus,
    /// Total media duration in seconds, once ffmpeg reports it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Position reached in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DownloadProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark as finished successfully
    pub fn complete(&mut self) {
        self.status = DownloadStatus::Completed;
        self.progress = 100;
    }

    /// Mark as failed with a message
    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = DownloadStatus::Failed;
        self.error = Some(error.into());
    }

    pub fn is_finished(&self) -> bool {
        self.status != DownloadStatus::Downloading
    }
}

/// Folds ffmpeg stderr output into a [`DownloadProgress`]
#[derive(Debug, Clone, Default)]
pub struct ProgressParser {
    progress: DownloadProgress,
}

impl ProgressParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume a chunk of stderr output.
    ///
    /// The first `Duration:` seen sets the total. Each `time=` updates the
    /// position and percentage, but only after the total is known. Returns
    /// true when the snapshot changed.
    pub fn feed(&mut self, output: &str) -> bool {
        let mut changed = false;

        if self.progress.duration.is_none() {
            if let Some(duration) = DURATION_RE.captures(output).and_then(|c| timestamp(&c)) {
                self.progress.duration = Some(duration);
                changed = true;
            }
        }

        if let Some(current) = TIME_RE.captures(output).and_then(|c| timestamp(&c)) {
            if let Some(duration) = self.progress.duration.filter(|d| *d > 0.0) {
                let percent = (current / duration * 100.0).round().clamp(0.0, 100.0);
                self.progress.progress = percent as u8;
                self.progress.current_time = Some(current);
                changed = true;
            }
        }

        changed
    }

    pub fn progress(&self) -> &DownloadProgress {
        &self.progress
    }

    pub fn into_progress(self) -> DownloadProgress {
        self.progress
    }
}

fn timestamp(caps: &regex::Captures) -> Option<f64> {
    let hours: f64 = caps.get(1)?.as_str().parse().ok()?;
    let minutes: f64 = caps.get(2)?.as_str().parse().ok()?;
    let seconds: f64 = caps.get(3)?.as_str().parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}
