//! Video id validation and embed page URLs

use crate::error::ScrapeError;
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static VIDEO_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Check that a video id is safe to use as a URL segment and directory name
pub fn validate_video_id(video_id: &str) -> Result<&str, ScrapeError> {
    if VIDEO_ID_RE.is_match(video_id) {
        Ok(video_id)
    } else {
        Err(ScrapeError::InvalidVideoId(video_id.to_string()))
    }
}

/// Check if a string is a valid video id
pub fn is_video_id(video_id: &str) -> bool {
    VIDEO_ID_RE.is_match(video_id)
}

/// Accept a bare video id or an embed page URL and return the id.
///
/// For URLs the last non-empty path segment is taken.
pub fn extract_video_id(input: &str) -> Result<String, ScrapeError> {
    let input = input.trim();
    if is_video_id(input) {
        return Ok(input.to_string());
    }

    let parsed = Url::parse(input)?;
    let segment = parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .ok_or_else(|| ScrapeError::InvalidVideoId(input.to_string()))?;

    validate_video_id(segment).map(str::to_string)
}

/// Build `{base}/{video_id}?ref={referer}`
pub fn page_url(base: &str, video_id: &str, referer: &str) -> Result<Url, ScrapeError> {
    let video_id = validate_video_id(video_id)?;
    let mut url = Url::parse(&format!("{}/{}", base.trim_end_matches('/'), video_id))?;
    if !referer.is_empty() {
        url.query_pairs_mut().append_pair("ref", referer);
    }
    Ok(url)
}
