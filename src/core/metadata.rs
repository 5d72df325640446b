//! Video metadata structures

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Readable player source recovered from a packed script.
///
/// Lines are indented with one tab per open brace; the value is produced once
/// by [`crate::core::unpack`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainSource(String);

impl PlainSource {
    /// Wrap already formatted text
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Borrow the formatted text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PlainSource {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlainSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stream container inferred from a source URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamType {
    /// HLS playlist (`.m3u8`)
    Hls,
    /// Anything else
    Mp4,
}

impl StreamType {
    /// Infer the stream type from a media URL
    pub fn from_url(file: &str) -> Self {
        if file.contains(".m3u8") {
            StreamType::Hls
        } else {
            StreamType::Mp4
        }
    }
}

/// Media source entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Media URL
    pub file: String,
    /// Stream type
    #[serde(rename = "type")]
    pub stream_type: StreamType,
}

impl Source {
    /// Create a source, inferring its type from the URL
    pub fn new(file: impl Into<String>) -> Self {
        let file = file.into();
        let stream_type = StreamType::from_url(&file);
        Self { file, stream_type }
    }

    /// Check if the source is an HLS playlist
    pub fn is_hls(&self) -> bool {
        self.stream_type == StreamType::Hls
    }
}

/// Subtitle or thumbnail track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Track URL
    pub file: String,
    /// Display label
    pub label: String,
    /// Track kind (captions, thumbnails, ...)
    pub kind: String,
}

impl Track {
    pub const DEFAULT_LABEL: &'static str = "Unknown";
    pub const DEFAULT_KIND: &'static str = "captions";

    /// Create a track, filling in default label and kind
    pub fn new(file: impl Into<String>, label: Option<&str>, kind: Option<&str>) -> Self {
        Self {
            file: file.into(),
            label: label.unwrap_or(Self::DEFAULT_LABEL).to_string(),
            kind: kind.unwrap_or(Self::DEFAULT_KIND).to_string(),
        }
    }
}

/// Metadata mined from the player configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoMetadata {
    /// Identifier taken from the `b=` query parameter
    pub video_id: Option<String>,
    /// Media sources in order of discovery
    pub sources: Vec<Source>,
    /// Poster image URL
    pub thumbnail_url: Option<String>,
    /// Title (the file code in this player dialect)
    pub title: Option<String>,
    /// Subtitle tracks
    pub tracks: Vec<Track>,
    /// Quality label map (e.g. "1080" -> "HD")
    pub quality_labels: BTreeMap<String, String>,
    /// Playback rates, NaN for entries that failed to parse
    #[serde(deserialize_with = "rates_from_json")]
    pub playback_rates: Vec<f64>,
}

// NaN serializes as `null`; read it back the same way.
fn rates_from_json<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let rates = Vec::<Option<f64>>::deserialize(deserializer)?;
    Ok(rates.into_iter().map(|r| r.unwrap_or(f64::NAN)).collect())
}

impl VideoMetadata {
    /// Create empty metadata
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the preferred source: the first HLS playlist, else the first source
    pub fn best_source(&self) -> Option<&Source> {
        self.sources
            .iter()
            .find(|s| s.is_hls())
            .or_else(|| self.sources.first())
    }

    /// Check if nothing was extracted
    pub fn is_empty(&self) -> bool {
        self.video_id.is_none()
            && self.sources.is_empty()
            && self.thumbnail_url.is_none()
            && self.title.is_none()
            && self.tracks.is_empty()
            && self.quality_labels.is_empty()
            && self.playback_rates.is_empty()
    }
}
