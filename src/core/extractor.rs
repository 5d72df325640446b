//! Player configuration mining
//!
//! Each field has its own matcher over the whole source text and its own
//! default, so a miss in one never affects the others. Patterns are compiled
//! once and carry no per-call state.

use crate::core::metadata::{PlainSource, Source, Track, VideoMetadata};
use regex::{Captures, Regex};
use std::ops::RangeInclusive;
use std::sync::LazyLock;
use tracing::debug;

// Key names may be emitted quoted by the packer (`'qualityLabels':`), hence
// the optional closing quote after each key.

static VIDEO_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[?&]b=([^&"']+)"#).unwrap());

static SOURCES_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"sources["']?\s*:\s*\[\s*\{([^}]+)\}\s*\]"#).unwrap());

static SOURCES_SPAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)sources["']?\s*:\s*(\[.*?\])"#).unwrap());

static FILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"file["']?\s*:\s*["']([^"']+)["']"#).unwrap());

static IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"image["']?\s*:\s*["']([^"']+)["']"#).unwrap());

static FILE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"file_code["']?\s*:\s*["']([^"']+)["']"#).unwrap());

static TRACKS_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"tracks["']?\s*:\s*\[\s*\{([^}]+)\}\s*\]"#).unwrap());

static LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"label["']?\s*:\s*["']([^"']+)["']"#).unwrap());

static KIND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"kind["']?\s*:\s*["']([^"']+)["']"#).unwrap());

static QUALITY_LABELS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"qualityLabels["']?\s*:\s*\{([^}]+)\}"#).unwrap());

// Each side is double-quoted, single-quoted or bare; quoted text may hold
// spaces and commas.
static QUALITY_ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?:"([^"]*)"|'([^']*)'|([^"'\s:,{}]+))\s*:\s*(?:"([^"]*)"|'([^']*)'|([^"'\s,{}][^,}]*))"#,
    )
    .unwrap()
});

static PLAYBACK_RATES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"playbackRates["']?\s*:\s*\[([\d.,\s]+)\]"#).unwrap());

/// Extract video metadata from unpacked player source.
///
/// Never fails: fields whose pattern does not match keep their default.
pub fn extract(source: &PlainSource) -> VideoMetadata {
    extract_str(source.as_str())
}

/// Same as [`extract`], over raw text
pub fn extract_str(text: &str) -> VideoMetadata {
    let metadata = VideoMetadata {
        video_id: first_capture(&VIDEO_ID_RE, text),
        sources: extract_sources(text),
        thumbnail_url: first_capture(&IMAGE_RE, text),
        title: first_capture(&FILE_CODE_RE, text),
        tracks: extract_tracks(text),
        quality_labels: extract_quality_labels(text),
        playback_rates: extract_playback_rates(text),
    };

    debug!(
        "Extracted {} sources, {} tracks, {} quality labels, {} playback rates",
        metadata.sources.len(),
        metadata.tracks.len(),
        metadata.quality_labels.len(),
        metadata.playback_rates.len()
    );

    metadata
}

/// Sources from single-object `sources: [{...}]` blocks, falling back to every
/// `file:` inside the first `sources: [...]` span when no block matched.
pub fn extract_sources(text: &str) -> Vec<Source> {
    let primary: Vec<Source> = SOURCES_BLOCK_RE
        .captures_iter(text)
        .filter_map(|caps| first_capture(&FILE_RE, caps.get(1)?.as_str()))
        .map(Source::new)
        .collect();

    if !primary.is_empty() {
        return primary;
    }

    SOURCES_SPAN_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|span| {
            FILE_RE
                .captures_iter(span.as_str())
                .filter_map(|caps| caps.get(1))
                .map(|file| Source::new(file.as_str()))
                .collect()
        })
        .unwrap_or_default()
}

/// Subtitle tracks; blocks without a `file:` are skipped
pub fn extract_tracks(text: &str) -> Vec<Track> {
    TRACKS_BLOCK_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let block = caps.get(1)?.as_str();
            let file = first_capture(&FILE_RE, block)?;
            let label = first_capture(&LABEL_RE, block);
            let kind = first_capture(&KIND_RE, block);
            Some(Track::new(file, label.as_deref(), kind.as_deref()))
        })
        .collect()
}

/// Quality label map; later duplicate keys overwrite earlier ones
pub fn extract_quality_labels(text: &str) -> std::collections::BTreeMap<String, String> {
    let Some(block) = QUALITY_LABELS_RE.captures(text).and_then(|caps| caps.get(1)) else {
        return Default::default();
    };

    QUALITY_ENTRY_RE
        .captures_iter(block.as_str())
        .filter_map(|caps| {
            let key = first_group(&caps, 1..=3)?.trim();
            let value = first_group(&caps, 4..=6)?.trim();
            if key.is_empty() || value.is_empty() {
                return None;
            }
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

/// Playback rates in order; unparsable entries become NaN
pub fn extract_playback_rates(text: &str) -> Vec<f64> {
    PLAYBACK_RATES_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|list| {
            list.as_str()
                .split(',')
                .map(|rate| rate.trim().parse::<f64>().unwrap_or(f64::NAN))
                .collect()
        })
        .unwrap_or_default()
}

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn first_group<'h>(caps: &Captures<'h>, groups: RangeInclusive<usize>) -> Option<&'h str> {
    groups.filter_map(|i| caps.get(i)).map(|m| m.as_str()).next()
}
