use regex::Regex;
use url::Url;

lazy_static::lazy_static! {
    static ref VIDEO_ID: Regex = Regex::new(r"^[a-zA-Z0-9_-]{11}$").unwrap();
    static ref FORMAT_ID: Regex = Regex::new(r"^[a-zA-Z0-9_-]{1,32}$").unwrap();
}

/// Hosts that carry the video id in the `v` query parameter.
const QUERY_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
    "gaming.youtube.com",
];

/// Hosts that carry the video id as a path segment.
const PATH_HOSTS: &[&str] = &[
    "youtu.be",
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "youtube-nocookie.com",
    "www.youtube-nocookie.com",
];

const ID_PATH_PREFIXES: &[&str] = &["embed", "v", "shorts", "live"];

/// Extracts the 11 character video id from a recognised YouTube link.
pub fn video_id(input: &str) -> Option<String> {
    let parsed = Url::parse(input.trim()).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    let host = parsed.host_str()?.to_ascii_lowercase();

    let from_query = parsed
        .query_pairs()
        .find(|(key, _)| key == "v")
        .map(|(_, value)| value.into_owned());

    let candidate = match from_query {
        Some(id) if QUERY_HOSTS.contains(&host.as_str()) => Some(id),
        _ if PATH_HOSTS.contains(&host.as_str()) => path_id(&parsed, &host),
        _ => None,
    }?;

    // Trailing junk after the id is tolerated the same way the extractor does.
    let id: String = candidate.chars().take(11).collect();
    VIDEO_ID.is_match(&id).then_some(id)
}

fn path_id(parsed: &Url, host: &str) -> Option<String> {
    let mut segments = parsed.path_segments()?;
    if host == "youtu.be" {
        return segments.next().filter(|s| !s.is_empty()).map(str::to_string);
    }
    let prefix = segments.next()?;
    if !ID_PATH_PREFIXES.contains(&prefix) {
        return None;
    }
    segments.next().filter(|s| !s.is_empty()).map(str::to_string)
}

pub fn is_video_url(input: &str) -> bool {
    video_id(input).is_some()
}

/// Format identifiers are forwarded to the extractor's selector, so only
/// short plain tokens are accepted.
pub fn is_format_id(input: &str) -> bool {
    FORMAT_ID.is_match(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_youtube_links() {
        let urls = [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtube.com/watch?v=dQw4w9WgXcQ&t=42s",
            "https://m.youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "https://music.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ?si=abcdef",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/v/dQw4w9WgXcQ",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "https://www.youtube.com/live/dQw4w9WgXcQ",
            "  https://www.youtube.com/watch?v=dQw4w9WgXcQ  ",
        ];

        for url in urls {
            assert_eq!(video_id(url).as_deref(), Some("dQw4w9WgXcQ"), "{url}");
        }
    }

    #[test]
    fn rejects_other_inputs() {
        let inputs = [
            "",
            "   ",
            "not a url",
            "youtube.com/watch?v=dQw4w9WgXcQ",
            "ftp://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://vimeo.com/123456",
            "https://www.youtube.com/watch?v=short",
            "https://www.youtube.com/channel/UC38IQsAvIsxxjztdMZQtwHA",
            "https://evil.example/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/",
        ];

        for input in inputs {
            assert!(!is_video_url(input), "{input:?} should be rejected");
        }
    }

    #[test]
    fn truncates_trailing_characters_after_id() {
        assert_eq!(
            video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQxyz").as_deref(),
            Some("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn format_ids_are_plain_tokens() {
        assert!(is_format_id("137"));
        assert!(is_format_id("hls-1080p"));
        assert!(!is_format_id(""));
        assert!(!is_format_id("bestvideo+bestaudio"));
        assert!(!is_format_id("18 --exec rm"));
    }
}
