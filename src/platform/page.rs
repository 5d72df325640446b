//! Locating the packed player script in an embed page

use crate::core::unpacker::detect;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use tracing::debug;

/// Marker identifying the player setup script
pub const PLAYER_MARKER: &str = "jwplayer";

static SCRIPT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("script").unwrap());

/// Text of the first `<script>` that is both packed and sets up the player
pub fn find_packed_script(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    let script = document
        .select(&SCRIPT_SELECTOR)
        .map(|el| el.text().collect::<String>())
        .find(|content| detect(content) && content.contains(PLAYER_MARKER));

    match &script {
        Some(content) => debug!("Found packed player script ({} chars)", content.len()),
        None => debug!("No packed player script in page"),
    }

    script
}
