//! Safe filename generation utilities

use regex::Regex;
use std::sync::LazyLock;

static INVALID_CHARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1f]"#).unwrap());

/// Convert a name to a safe filename by replacing invalid characters
pub fn to_safe_filename(name: &str, extension: &str) -> String {
    let mut safe_name = INVALID_CHARS_RE.replace_all(name, "_").to_string();

    // Leading dots would hide the file or walk up the tree
    safe_name = safe_name
        .trim_matches(|c: char| c == '.' || c == ' ')
        .to_string();

    if safe_name.len() > 200 {
        let mut cut = 200;
        while !safe_name.is_char_boundary(cut) {
            cut -= 1;
        }
        safe_name.truncate(cut);
        safe_name = safe_name.trim_end().to_string();
    }

    if safe_name.is_empty() {
        safe_name = "video".to_string();
    }

    if extension.is_empty() {
        return safe_name;
    }

    let ext = extension.trim_start_matches('.');
    let suffix = format!(".{}", ext);
    if safe_name.to_lowercase().ends_with(&suffix.to_lowercase()) {
        safe_name
    } else {
        format!("{}{}", safe_name, suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_safe_filename() {
        assert_eq!(
            to_safe_filename("Test Video: Title", "mp4"),
            "Test Video_ Title.mp4"
        );
        assert_eq!(
            to_safe_filename("Video with <invalid> chars", ".mp4"),
            "Video with _invalid_ chars.mp4"
        );
        assert_eq!(to_safe_filename("", "mp4"), "video.mp4");
        assert_eq!(to_safe_filename("9q4yh8ji5k4w", ""), "9q4yh8ji5k4w");
    }

    #[test]
    fn test_to_safe_filename_no_traversal() {
        assert_eq!(to_safe_filename("../../etc/passwd", "mp4"), "_.._etc_passwd.mp4");
        assert_eq!(to_safe_filename("..", "mp4"), "video.mp4");
    }

    #[test]
    fn test_to_safe_filename_keeps_existing_extension() {
        assert_eq!(to_safe_filename("episode.mp4", "mp4"), "episode.mp4");
        assert_eq!(to_safe_filename("episode.MP4", "mp4"), "episode.MP4");
    }

    #[test]
    fn test_to_safe_filename_truncates_on_char_boundary() {
        let long = "é".repeat(150);
        let safe = to_safe_filename(&long, "mp4");
        assert!(safe.len() <= 204);
        assert!(safe.ends_with(".mp4"));
    }
}
