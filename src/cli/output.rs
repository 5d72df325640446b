//! Output formatting and progress display

use crate::cli::args::VerbosityLevel;
use crate::core::{DownloadResult, VideoInfo};
use crate::download::{DownloadProgress, DownloadStatus};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Output formatter for vscrape
pub struct OutputFormatter {
    verbosity: VerbosityLevel,
    progress_bar: Option<ProgressBar>,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            progress_bar: None,
        }
    }

    /// Create a percentage bar for an ffmpeg run
    pub fn create_progress_bar(&mut self) -> Option<ProgressBar> {
        if self.verbosity == VerbosityLevel::Quiet {
            return None;
        }

        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");

        let progress_bar = ProgressBar::new(100);
        progress_bar.set_style(style);
        progress_bar.set_message("Downloading...");

        self.progress_bar = Some(progress_bar.clone());
        Some(progress_bar)
    }

    /// Callback feeding download snapshots into the progress bar
    pub fn progress_callback(&self) -> impl Fn(&DownloadProgress) + Send + Sync + 'static {
        let progress_bar = self.progress_bar.clone();
        move |progress: &DownloadProgress| {
            if let Some(progress_bar) = &progress_bar {
                update_bar(progress_bar, progress);
            }
        }
    }

    /// Update progress bar
    pub fn update_progress(&self, progress: &DownloadProgress) {
        if let Some(progress_bar) = &self.progress_bar {
            update_bar(progress_bar, progress);
        }
    }

    /// Finish progress bar
    pub fn finish_progress(&self, message: &str) {
        if let Some(progress_bar) = &self.progress_bar {
            progress_bar.finish_with_message(message.to_string());
        }
    }

    /// Print info message
    pub fn info(&self, message: &str) {
        if self.verbosity != VerbosityLevel::Quiet {
            println!("{} {}", "info:".blue().bold(), message);
        }
    }

    /// Print success message
    pub fn success(&self, message: &str) {
        if self.verbosity != VerbosityLevel::Quiet {
            println!("{} {}", "done:".green().bold(), message);
        }
    }

    /// Print warning message
    pub fn warning(&self, message: &str) {
        if self.verbosity != VerbosityLevel::Quiet {
            eprintln!("{} {}", "warning:".yellow().bold(), message);
        }
    }

    /// Print error message
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "error:".red().bold(), message);
    }

    /// Print a summary of a scraped video to stderr, keeping stdout for JSON
    pub fn print_video_info(&self, info: &VideoInfo) {
        if self.verbosity == VerbosityLevel::Quiet {
            return;
        }

        let title = info.title.as_deref().unwrap_or("(untitled)");
        eprintln!("{} {}", "Title:".bold(), title);
        if let Some(thumbnail) = &info.thumbnail_url {
            eprintln!("{} {}", "Thumbnail:".bold(), thumbnail);
        }
        eprintln!("{} {}", "Sources:".bold(), info.sources.len());
        for (index, source) in info.sources.iter().enumerate() {
            let marker = if Some(source) == info.best_source() {
                "*".green().to_string()
            } else {
                " ".to_string()
            };
            eprintln!("  {} [{}] {:?} {}", marker, index, source.stream_type, source.file);
        }
        if !info.tracks.is_empty() {
            eprintln!("{} {}", "Tracks:".bold(), info.tracks.len());
            for track in &info.tracks {
                eprintln!("    {} ({}) {}", track.label, track.kind, track.file);
            }
        }
        eprintln!();
    }

    /// Print download start message
    pub fn print_download_start(&self, video_id: &str) {
        if self.verbosity == VerbosityLevel::Quiet {
            return;
        }

        println!("{} {}", "Starting download for".bold(), video_id.cyan());
    }

    /// Print download complete message
    pub fn print_download_complete(&self, result: &DownloadResult, duration: Duration) {
        if self.verbosity == VerbosityLevel::Quiet {
            return;
        }

        println!();
        println!("{}", "Download completed!".green().bold());
        println!("Saved to: {}", result.output_path.display());
        println!("Time: {}", format_duration(duration));
    }
}

fn update_bar(progress_bar: &ProgressBar, progress: &DownloadProgress) {
    progress_bar.set_position(u64::from(progress.progress));
    match progress.status {
        DownloadStatus::Downloading => {
            if let (Some(current), Some(total)) = (progress.current_time, progress.duration) {
                progress_bar.set_message(format!(
                    "{} / {}",
                    format_duration(Duration::from_secs_f64(current.max(0.0))),
                    format_duration(Duration::from_secs_f64(total.max(0.0)))
                ));
            }
        }
        DownloadStatus::Completed => progress_bar.set_message("Completed"),
        DownloadStatus::Failed => {
            progress_bar.abandon_with_message(progress.error.clone().unwrap_or_default())
        }
    }
}

/// Format duration as human-readable string
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    if total_seconds < 60 {
        format!("{}s", total_seconds)
    } else if total_seconds < 3600 {
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;
        if seconds == 0 {
            format!("{}m", minutes)
        } else {
            format!("{}m {}s", minutes, seconds)
        }
    } else {
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        if minutes == 0 {
            format!("{}h", hours)
        } else {
            format!("{}h {}m", hours, minutes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(progress: u8, status: DownloadStatus) -> DownloadProgress {
        DownloadProgress {
            progress,
            status,
            duration: Some(120.0),
            current_time: Some(60.0),
            error: None,
        }
    }

    #[test]
    fn test_output_formatter_creation() {
        let formatter = OutputFormatter::new(VerbosityLevel::Normal);
        assert_eq!(formatter.verbosity, VerbosityLevel::Normal);
        assert!(formatter.progress_bar.is_none());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(0)), "0s");
        assert_eq!(format_duration(Duration::from_secs(59)), "59s");
        assert_eq!(format_duration(Duration::from_secs(60)), "1m");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_duration(Duration::from_secs(3600)), "1h");
        assert_eq!(format_duration(Duration::from_secs(3661)), "1h 1m");
    }

    #[test]
    fn test_create_progress_bar_quiet_mode() {
        let mut formatter = OutputFormatter::new(VerbosityLevel::Quiet);
        assert!(formatter.create_progress_bar().is_none());
    }

    #[test]
    fn test_progress_bar_tracks_percentage() {
        let mut formatter = OutputFormatter::new(VerbosityLevel::Normal);
        let bar = formatter.create_progress_bar().unwrap();
        assert_eq!(bar.length(), Some(100));

        formatter.update_progress(&snapshot(50, DownloadStatus::Downloading));
        assert_eq!(bar.position(), 50);
        assert_eq!(bar.message(), "1m / 2m");

        let callback = formatter.progress_callback();
        callback(&snapshot(100, DownloadStatus::Completed));
        assert_eq!(bar.position(), 100);
        assert_eq!(bar.message(), "Completed");
    }

    #[test]
    fn test_failed_snapshot_abandons_bar() {
        let mut formatter = OutputFormatter::new(VerbosityLevel::Normal);
        let bar = formatter.create_progress_bar().unwrap();

        let mut failed = snapshot(10, DownloadStatus::Failed);
        failed.error = Some("FFmpeg process exited with code 1".to_string());
        formatter.update_progress(&failed);

        assert!(bar.is_finished());
        assert_eq!(bar.message(), "FFmpeg process exited with code 1");
    }

    #[test]
    fn test_callback_without_bar_is_noop() {
        let formatter = OutputFormatter::new(VerbosityLevel::Quiet);
        let callback = formatter.progress_callback();
        callback(&snapshot(10, DownloadStatus::Downloading));
        formatter.finish_progress("done");
    }
}
