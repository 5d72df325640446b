//! Directory-per-video output layout

use crate::core::VideoInfo;
use crate::error::ScrapeError;
use crate::platform::{FetchedPage, ParsedCookie};
use crate::utils::validate_video_id;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

pub const RAW_HTML_FILE: &str = "raw.html";
pub const HEADERS_FILE: &str = "headers.json";
pub const COOKIES_FILE: &str = "cookies.json";
pub const PACKED_FILE: &str = "packed.js";
pub const UNPACKED_FILE: &str = "unpacked.js";
pub const INFO_FILE: &str = "info.json";

/// A downloaded media file, as exposed under `/downloads`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadedFile {
    pub file_name: String,
    pub download_url: String,
}

/// Listing entry for one video directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VideoEntry {
    /// `info.json` present and readable
    #[serde(rename_all = "camelCase")]
    Complete {
        video_id: String,
        title: Option<String>,
        thumbnail_url: Option<String>,
        downloaded: bool,
        files: Vec<DownloadedFile>,
        has_cookies: bool,
        cookies_url: Option<String>,
        has_headers: bool,
        headers_url: Option<String>,
    },
    /// `info.json` could not be read or parsed
    #[serde(rename_all = "camelCase")]
    Unreadable { video_id: String, error: String },
    /// Scrape never finished
    #[serde(rename_all = "camelCase")]
    Incomplete { video_id: String, status: String },
}

#[cfg(test)]
impl VideoEntry {
    fn video_id(&self) -> &str {
        match self {
            VideoEntry::Complete { video_id, .. }
            | VideoEntry::Unreadable { video_id, .. }
            | VideoEntry::Incomplete { video_id, .. } => video_id,
        }
    }
}

/// Persists scrape artifacts under `{root}/{video_id}/`
#[derive(Debug, Clone)]
pub struct OutputStore {
    root: PathBuf,
}

impl OutputStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for a video; the id must be a plain path segment
    pub fn video_dir(&self, video_id: &str) -> Result<PathBuf, ScrapeError> {
        Ok(self.root.join(validate_video_id(video_id)?))
    }

    /// Save the raw page plus its request/response headers and cookies
    pub fn save_page(
        &self,
        video_id: &str,
        page: &FetchedPage,
        parsed_cookies: &[ParsedCookie],
    ) -> Result<(), ScrapeError> {
        let dir = self.ensure_dir(video_id)?;

        fs::write(dir.join(RAW_HTML_FILE), &page.html)?;
        write_json(
            &dir.join(HEADERS_FILE),
            &json!({
                "requestHeaders": page.request_headers,
                "responseHeaders": page.response_headers,
            }),
        )?;
        write_json(
            &dir.join(COOKIES_FILE),
            &json!({
                "rawCookies": page.set_cookies,
                "parsedCookies": parsed_cookies,
                "cookieHeader": page.cookie_header(),
            }),
        )?;

        debug!("Saved page artifacts to {}", dir.display());
        Ok(())
    }

    pub fn save_packed(&self, video_id: &str, packed: &str) -> Result<(), ScrapeError> {
        let dir = self.ensure_dir(video_id)?;
        fs::write(dir.join(PACKED_FILE), packed)?;
        Ok(())
    }

    pub fn save_unpacked(&self, video_id: &str, unpacked: &str) -> Result<(), ScrapeError> {
        let dir = self.ensure_dir(video_id)?;
        fs::write(dir.join(UNPACKED_FILE), unpacked)?;
        Ok(())
    }

    pub fn save_info(&self, video_id: &str, info: &VideoInfo) -> Result<(), ScrapeError> {
        let dir = self.ensure_dir(video_id)?;
        write_json(&dir.join(INFO_FILE), info)
    }

    /// Stored `info.json`, if any
    pub fn read_info(&self, video_id: &str) -> Result<Option<VideoInfo>, ScrapeError> {
        let path = self.video_dir(video_id)?.join(INFO_FILE);
        read_json(&path)
    }

    /// Stored `cookies.json`, if any
    pub fn read_cookies(&self, video_id: &str) -> Result<Option<Value>, ScrapeError> {
        read_json(&self.video_dir(video_id)?.join(COOKIES_FILE))
    }

    /// Stored `headers.json`, if any
    pub fn read_headers(&self, video_id: &str) -> Result<Option<Value>, ScrapeError> {
        read_json(&self.video_dir(video_id)?.join(HEADERS_FILE))
    }

    /// One entry per video directory, sorted by id.
    ///
    /// A missing root is an empty listing.
    pub fn list(&self) -> Result<Vec<VideoEntry>, ScrapeError> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_dir() {
                continue;
            }
            let video_id = entry.file_name().to_string_lossy().into_owned();
            entries.push(self.describe(&video_id, entry.path())?);
        }

        Ok(entries)
    }

    /// Remove a video directory; false when it does not exist
    pub fn delete(&self, video_id: &str) -> Result<bool, ScrapeError> {
        let dir = self.video_dir(video_id)?;
        if !dir.is_dir() {
            return Ok(false);
        }
        fs::remove_dir_all(&dir)?;
        debug!("Deleted {}", dir.display());
        Ok(true)
    }

    fn describe(&self, video_id: &str, dir: &Path) -> Result<VideoEntry, ScrapeError> {
        let info_path = dir.join(INFO_FILE);
        if !info_path.is_file() {
            return Ok(VideoEntry::Incomplete {
                video_id: video_id.to_string(),
                status: "incomplete".to_string(),
            });
        }

        let info = match fs::read_to_string(&info_path)
            .map_err(ScrapeError::from)
            .and_then(|text| serde_json::from_str::<Value>(&text).map_err(ScrapeError::from))
        {
            Ok(info) => info,
            Err(e) => {
                warn!("Unreadable {}: {}", info_path.display(), e);
                return Ok(VideoEntry::Unreadable {
                    video_id: video_id.to_string(),
                    error: e.to_string(),
                });
            }
        };

        let files = media_files(video_id, dir)?;
        let has_cookies = dir.join(COOKIES_FILE).is_file();
        let has_headers = dir.join(HEADERS_FILE).is_file();

        Ok(VideoEntry::Complete {
            video_id: video_id.to_string(),
            title: info["title"].as_str().map(str::to_string),
            thumbnail_url: info["thumbnailUrl"].as_str().map(str::to_string),
            downloaded: !files.is_empty(),
            files,
            has_cookies,
            cookies_url: has_cookies.then(|| format!("/api/videos/{}/cookies", video_id)),
            has_headers,
            headers_url: has_headers.then(|| format!("/api/videos/{}/headers", video_id)),
        })
    }

    fn ensure_dir(&self, video_id: &str) -> Result<PathBuf, ScrapeError> {
        let dir = self.video_dir(video_id)?;
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

/// Downloaded `.mp4` files of a video, sorted by name
fn media_files(video_id: &str, dir: &Path) -> Result<Vec<DownloadedFile>, ScrapeError> {
    let mut names: Vec<String> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".mp4"))
        .collect();
    names.sort();

    Ok(names
        .into_iter()
        .map(|name| DownloadedFile {
            download_url: format!("/downloads/{}/{}", video_id, name),
            file_name: name,
        })
        .collect())
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ScrapeError> {
    let text = serde_json::to_string_pretty(value)?;
    fs::write(path, text)?;
    Ok(())
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Option<T>, ScrapeError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
