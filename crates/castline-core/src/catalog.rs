//! Built-in sample streams a user can pick instead of typing a URL

use serde::Serialize;

/// A named sample stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreamPreset {
    pub id: &'static str,
    pub title: &'static str,
    pub url: &'static str,
    pub thumbnail_url: &'static str,
}

const PRESETS: &[StreamPreset] = &[
    StreamPreset {
        id: "1",
        title: "Sintel",
        url: "https://bitdash-a.akamaihd.net/content/sintel/hls/playlist.m3u8",
        thumbnail_url: "https://placehold.co/600x400",
    },
    StreamPreset {
        id: "2",
        title: "Big Buck Bunny",
        url: "https://test-streams.mux.dev/x36xhzz/x36xhzz.m3u8",
        thumbnail_url: "https://placehold.co/600x400",
    },
    StreamPreset {
        id: "3",
        title: "BTV Live",
        url: "https://moiptvhls-i.akamaihd.net/hls/live/652002/btv/index.m3u8",
        thumbnail_url: "https://placehold.co/600x400",
    },
];

/// All presets in display order
pub fn presets() -> &'static [StreamPreset] {
    PRESETS
}

/// Look up a preset by id
pub fn find(id: &str) -> Option<&'static StreamPreset> {
    PRESETS.iter().find(|p| p.id == id.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_urls_sanitize_to_themselves() {
        for preset in presets() {
            let url = crate::sanitize::extract(preset.url).expect("preset url should sanitize");
            assert_eq!(url.as_str(), preset.url);
        }
    }

    #[test]
    fn test_find() {
        assert_eq!(find("2").map(|p| p.title), Some("Big Buck Bunny"));
        assert_eq!(find(" 1 ").map(|p| p.id), Some("1"));
        assert!(find("99").is_none());
    }
}
