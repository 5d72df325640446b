//! Stream download through an external ffmpeg process

use crate::config::Config;
use crate::download::progress::{DownloadProgress, DownloadStatus, ProgressParser};
use crate::error::ScrapeError;
use crate::platform::browser_headers;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, error, info};

/// Progress callback shared with the stderr reader task
pub type ProgressCallback = Arc<dyn Fn(&DownloadProgress) + Send + Sync>;

/// Profile headers left out of the block. ffmpeg derives the host from the
/// stream URL, and the cookie is passed per download.
const SKIPPED_HEADERS: &[&str] = &["Host", "Alt-Used", "Cookie"];

/// Remuxes HLS or MP4 streams to a local MP4 file with ffmpeg
#[derive(Debug, Clone)]
pub struct FfmpegDownloader {
    ffmpeg_path: PathBuf,
    headers: Vec<(String, String)>,
}

impl FfmpegDownloader {
    /// Downloader with no extra headers beyond the cookie
    pub fn new(ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            headers: Vec::new(),
        }
    }

    /// Downloader sending the same browser profile as the page fetch
    pub fn from_config(config: &Config) -> Self {
        let headers = browser_headers(config)
            .into_iter()
            .filter(|(name, _)| !SKIPPED_HEADERS.contains(name))
            .map(|(name, value)| (name.to_string(), value))
            .collect();

        Self {
            ffmpeg_path: config.ffmpeg_path.clone(),
            headers,
        }
    }

    /// CRLF-terminated header block for ffmpeg's `-headers` option
    pub fn header_block(&self, cookies: &str) -> String {
        let mut block = format!("Cookie: {}\r\n", cookies);
        for (name, value) in &self.headers {
            block.push_str(&format!("{}: {}\r\n", name, value));
        }
        block
    }

    /// Full ffmpeg argument list
    pub fn build_args(&self, url: &str, output: &Path, cookies: &str) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-headers".to_string(),
            self.header_block(cookies),
            "-i".to_string(),
            url.to_string(),
            "-c".to_string(),
            "copy".to_string(),
            "-bsf:a".to_string(),
            "aac_adtstoasc".to_string(),
            output.to_string_lossy().into_owned(),
        ]
    }

    /// Download `url` into `output`, reporting progress as ffmpeg runs.
    ///
    /// Resolves to the completed snapshot; a failed run is returned as
    /// [`ScrapeError::Download`] carrying the failed snapshot.
    pub async fn download(
        &self,
        url: &str,
        output: &Path,
        cookies: &str,
        on_progress: impl Fn(&DownloadProgress) + Send + Sync + 'static,
    ) -> Result<DownloadProgress, ScrapeError> {
        let on_progress: ProgressCallback = Arc::new(on_progress);

        info!("Starting download using FFmpeg");
        info!("URL: {}", url);
        info!("Output: {}", output.display());
        debug!("Using cookies: {}", if cookies.is_empty() { "No" } else { "Yes" });

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let spawned = Command::new(&self.ffmpeg_path)
            .args(self.build_args(url, output, cookies))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                error!("Failed to start {}: {}", self.ffmpeg_path.display(), e);
                let mut progress = DownloadProgress::new();
                progress.fail(e.to_string());
                on_progress(&progress);
                return Err(ScrapeError::Download(Box::new(progress)));
            }
        };

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| std::io::Error::other("ffmpeg stderr not captured"))?;
        let reader = tokio::spawn(read_progress(stderr, on_progress.clone()));

        let status = child.wait().await?;
        let mut progress = reader.await?;

        match status.code() {
            Some(0) => progress.complete(),
            Some(code) => progress.fail(format!("FFmpeg process exited with code {}", code)),
            None => progress.fail("FFmpeg process was terminated by a signal"),
        }
        on_progress(&progress);

        if progress.status == DownloadStatus::Completed {
            info!("Download completed: {}", output.display());
            Ok(progress)
        } else {
            error!("Download failed: {}", progress.error.as_deref().unwrap_or_default());
            Err(ScrapeError::Download(Box::new(progress)))
        }
    }
}

/// Read ffmpeg stderr to the end, splitting records on `\r` and `\n`
async fn read_progress<R>(mut stderr: R, on_progress: ProgressCallback) -> DownloadProgress
where
    R: AsyncRead + Unpin,
{
    let mut parser = ProgressParser::new();
    let mut pending: Vec<u8> = Vec::new();
    let mut buf = [0u8; 4096];

    loop {
        let n = match stderr.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        pending.extend_from_slice(&buf[..n]);

        while let Some(pos) = pending.iter().position(|b| *b == b'\r' || *b == b'\n') {
            let record: Vec<u8> = pending.drain(..=pos).collect();
            if parser.feed(&String::from_utf8_lossy(&record)) {
                on_progress(parser.progress());
            }
        }
    }

    if !pending.is_empty() && parser.feed(&String::from_utf8_lossy(&pending)) {
        on_progress(parser.progress());
    }

    parser.into_progress()
}
