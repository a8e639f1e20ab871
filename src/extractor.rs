use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use crate::validate;

/// Metadata as reported by the extractor, before any shaping.
#[derive(Clone, Debug, Default)]
pub struct RawVideoInfo {
    pub title: String,
    pub author: String,
    pub length_seconds: u64,
    /// Thumbnail URLs in the extractor's order, lowest resolution first.
    pub thumbnails: Vec<String>,
    pub formats: Vec<RawFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct RawFormat {
    pub itag: String,
    pub quality_label: Option<String>,
    pub container: Option<String>,
    pub codecs: Option<String>,
    pub has_video: bool,
    pub has_audio: bool,
    pub content_length: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormatChoice {
    Highest,
    Itag(String),
}

impl FormatChoice {
    pub fn from_query(itag: Option<&str>) -> Self {
        match itag.map(str::trim).filter(|value| !value.is_empty()) {
            Some(itag) => FormatChoice::Itag(itag.to_string()),
            None => FormatChoice::Highest,
        }
    }
}

impl fmt::Display for FormatChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatChoice::Highest => write!(f, "highest"),
            FormatChoice::Itag(itag) => write!(f, "{}", itag),
        }
    }
}

#[derive(Clone, Debug)]
pub struct StreamRequest {
    pub url: String,
    pub format: FormatChoice,
    pub headers: Vec<(String, String)>,
}

pub type ByteStream = BoxStream<'static, Result<Bytes, ExtractError>>;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("extractor I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Failed(String),
    #[error("invalid extractor output: {0}")]
    InvalidOutput(#[from] serde_json::Error),
    #[error("missing metadata: {0}")]
    MissingField(&'static str),
}

/// Narrow view of the video extraction capability the relay depends on.
#[async_trait]
pub trait Extractor: Send + Sync {
    fn validate_url(&self, url: &str) -> bool {
        validate::is_video_url(url)
    }

    async fn fetch_info(&self, url: &str) -> Result<RawVideoInfo, ExtractError>;

    /// Opens the media byte stream. Dropping the stream releases the upstream.
    async fn open_stream(&self, request: &StreamRequest) -> Result<ByteStream, ExtractError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_itag_selects_highest() {
        assert_eq!(FormatChoice::from_query(None), FormatChoice::Highest);
        assert_eq!(FormatChoice::from_query(Some("")), FormatChoice::Highest);
        assert_eq!(FormatChoice::from_query(Some("  ")), FormatChoice::Highest);
        assert_eq!(
            FormatChoice::from_query(Some("22")),
            FormatChoice::Itag("22".to_string())
        );
    }
}
