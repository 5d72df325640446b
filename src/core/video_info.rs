//! Scraped video record

use crate::core::metadata::VideoMetadata;
use crate::platform::{FetchedPage, ParsedCookie};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Deref;

/// Extracted metadata enriched with the request context it was scraped under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfo {
    #[serde(flatten)]
    pub metadata: VideoMetadata,
    /// Headers sent with the page request
    pub request_headers: BTreeMap<String, String>,
    /// Cookie header sent with the page request
    pub cookies: String,
    /// `Set-Cookie` values received
    pub raw_cookies: Vec<String>,
    pub parsed_cookies: Vec<ParsedCookie>,
    pub scraped_at: DateTime<Utc>,
}

impl VideoInfo {
    /// Combine extracted metadata with the page it came from
    pub fn new(metadata: VideoMetadata, page: &FetchedPage, parsed_cookies: Vec<ParsedCookie>) -> Self {
        Self {
            metadata,
            request_headers: page.request_headers.clone(),
            cookies: page.cookie_header().to_string(),
            raw_cookies: page.set_cookies.clone(),
            parsed_cookies,
            scraped_at: Utc::now(),
        }
    }
}

impl Deref for VideoInfo {
    type Target = VideoMetadata;

    fn deref(&self) -> &Self::Target {
        &self.metadata
    }
}
