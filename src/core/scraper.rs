//! Scrape pipeline: fetch, unpack, extract, persist

use crate::config::Config;
use crate::core::extractor::extract;
use crate::core::metadata::PlainSource;
use crate::core::unpacker::{unpack_with, Engine};
use crate::core::video_info::VideoInfo;
use crate::download::{DownloadProgress, FfmpegDownloader};
use crate::error::ScrapeError;
use crate::platform::{find_packed_script, parse_cookies, PageClient};
use crate::storage::OutputStore;
use crate::utils::{new_async_cache, to_safe_filename, validate_video_id, AsyncCache};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Options for a download run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DownloadRequest {
    /// Index into the scraped sources; the best source when absent
    pub source_index: Option<usize>,
    /// Output file name without extension; the title when absent
    pub file_name: Option<String>,
}

/// A finished download
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResult {
    pub video_id: String,
    pub file_name: String,
    pub download_url: String,
    pub output_path: PathBuf,
    #[serde(flatten)]
    pub progress: DownloadProgress,
}

/// Ties page fetching, deobfuscation, extraction and storage together
pub struct Scraper {
    config: Config,
    client: PageClient,
    store: OutputStore,
    ffmpeg: FfmpegDownloader,
    infos: AsyncCache<String, Arc<VideoInfo>>,
    unpacked: AsyncCache<String, PlainSource>,
}

impl Scraper {
    /// Create a scraper from configuration
    pub fn new(config: Config) -> Result<Self, ScrapeError> {
        let client = PageClient::new(&config)?;
        Ok(Self {
            store: OutputStore::new(config.output_dir.clone()),
            ffmpeg: FfmpegDownloader::from_config(&config),
            infos: new_async_cache(config.cache_ttl),
            unpacked: new_async_cache(config.cache_ttl),
            client,
            config,
        })
    }

    /// Replace the page client
    pub fn with_client(mut self, client: PageClient) -> Self {
        self.client = client;
        self
    }

    pub fn store(&self) -> &OutputStore {
        &self.store
    }

    /// Fetch and process a video page, persisting every intermediate artifact
    pub async fn scrape(&self, video_id: &str) -> Result<Arc<VideoInfo>, ScrapeError> {
        let video_id = validate_video_id(video_id)?.to_string();
        info!("Scraping video {}", video_id);

        let page = self.client.fetch_page(&video_id).await?;
        let parsed_cookies = parse_cookies(&page.set_cookies);

        let store = self.store.clone();
        let (id, saved_page, cookies) = (video_id.clone(), page.clone(), parsed_cookies.clone());
        blocking(move || store.save_page(&id, &saved_page, &cookies)).await?;

        let packed = find_packed_script(&page.html).ok_or(ScrapeError::PackedScriptNotFound)?;
        info!("Found packed code, unpacking...");

        let store = self.store.clone();
        let (id, text) = (video_id.clone(), packed.clone());
        blocking(move || store.save_packed(&id, &text)).await?;

        let unpacked = self.unpack(&packed).await?;

        let store = self.store.clone();
        let (id, text) = (video_id.clone(), unpacked.as_str().to_string());
        blocking(move || store.save_unpacked(&id, &text)).await?;

        let metadata = extract(&unpacked);
        debug!(
            "Extracted {} sources and {} tracks",
            metadata.sources.len(),
            metadata.tracks.len()
        );

        let info = Arc::new(VideoInfo::new(metadata, &page, parsed_cookies));

        let store = self.store.clone();
        let (id, saved) = (video_id.clone(), info.clone());
        blocking(move || store.save_info(&id, &saved)).await?;

        self.infos.insert(video_id.clone(), info.clone()).await;
        info!("Saved video info for {}", video_id);
        Ok(info)
    }

    /// Record for a video: cached, then stored, then freshly scraped
    pub async fn info(&self, video_id: &str) -> Result<Arc<VideoInfo>, ScrapeError> {
        let video_id = validate_video_id(video_id)?;
        if let Some(info) = self.infos.get(video_id).await {
            debug!("Using cached info for {}", video_id);
            return Ok(info);
        }

        let store = self.store.clone();
        let id = video_id.to_string();
        if let Some(info) = blocking(move || store.read_info(&id)).await? {
            debug!("Using stored info for {}", video_id);
            let info = Arc::new(info);
            self.infos.insert(video_id.to_string(), info.clone()).await;
            return Ok(info);
        }

        self.scrape(video_id).await
    }

    /// Drop the cached record for a video
    pub async fn forget(&self, video_id: &str) {
        self.infos.invalidate(video_id).await;
    }

    /// Unpack a packed script with the configured engine, memoized by script text
    pub async fn unpack(&self, packed: &str) -> Result<PlainSource, ScrapeError> {
        if let Some(source) = self.unpacked.get(packed).await {
            debug!("Using cached unpacked source");
            return Ok(source);
        }

        let source = unpack_blocking(self.config.engine, packed.to_string()).await?;
        self.unpacked
            .insert(packed.to_string(), source.clone())
            .await;
        Ok(source)
    }

    /// Download a source of a video into its output directory
    pub async fn download(
        &self,
        video_id: &str,
        request: &DownloadRequest,
        on_progress: impl Fn(&DownloadProgress) + Send + Sync + 'static,
    ) -> Result<DownloadResult, ScrapeError> {
        let info = self.info(video_id).await?;
        let video_id = validate_video_id(video_id)?;
        let source = match request.source_index {
            Some(index) if !info.sources.is_empty() => info.sources.get(index).ok_or_else(|| {
                ScrapeError::NotFound(format!("source {} of video {}", index, video_id))
            })?,
            _ => info
                .best_source()
                .ok_or_else(|| ScrapeError::NoSource(video_id.to_string()))?,
        };

        let name = request
            .file_name
            .as_deref()
            .or(info.title.as_deref())
            .unwrap_or(video_id);
        let file_name = to_safe_filename(name, "mp4");
        let output_path = self.store.video_dir(video_id)?.join(&file_name);

        info!("Downloading {} to {}", source.file, output_path.display());
        let progress = self
            .ffmpeg
            .download(&source.file, &output_path, &info.cookies, on_progress)
            .await?;

        Ok(DownloadResult {
            video_id: video_id.to_string(),
            download_url: format!("/downloads/{}/{}", video_id, file_name),
            file_name,
            output_path,
            progress,
        })
    }
}

/// Unpack on the blocking pool; the V8 runtime cannot cross threads
pub async fn unpack_blocking(engine: Engine, packed: String) -> Result<PlainSource, ScrapeError> {
    blocking(move || Ok(unpack_with(&*engine.evaluator(), &packed)?)).await
}

async fn blocking<T, F>(f: F) -> Result<T, ScrapeError>
where
    F: FnOnce() -> Result<T, ScrapeError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}
