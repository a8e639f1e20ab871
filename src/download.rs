use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use futures::stream::{self, StreamExt};
use regex::Regex;
use tracing::{info, warn};

use crate::extractor::{ExtractError, Extractor, FormatChoice, StreamRequest};

lazy_static::lazy_static! {
    static ref NON_WORD: Regex = Regex::new(r"[^A-Za-z0-9_\s]").unwrap();
}

#[derive(Clone, Debug)]
pub struct DownloadRequest {
    pub url: String,
    pub format: FormatChoice,
}

/// Strips everything outside the ASCII word class and whitespace.
pub fn sanitize_title(title: &str) -> String {
    NON_WORD.replace_all(title, "").into_owned()
}

pub fn content_disposition(title: &str) -> String {
    format!("attachment; filename=\"{}.mp4\"", sanitize_title(title))
}

/// Resolves the title, opens the upstream stream and waits for its first
/// chunk. Errors before that point are returned to the caller; once the
/// first chunk exists the response is committed and later failures only
/// abort the body.
pub async fn stream_download(
    extractor: &dyn Extractor,
    request: DownloadRequest,
    user_agent: &str,
) -> Result<Response, ExtractError> {
    let raw = extractor.fetch_info(&request.url).await?;
    let disposition = content_disposition(&raw.title);

    let mut upstream = extractor
        .open_stream(&StreamRequest {
            url: request.url.clone(),
            format: request.format.clone(),
            headers: vec![("User-Agent".to_string(), user_agent.to_string())],
        })
        .await?;

    let first = upstream.next().await.transpose()?;

    info!(url = %request.url, format = %request.format, "streaming download");

    let url = request.url;
    let rest = upstream.map(move |chunk| {
        if let Err(err) = &chunk {
            warn!(url = %url, "download aborted after headers were sent: {}", err);
        }
        chunk
    });
    let body = Body::from_stream(stream::iter(first.map(Ok)).chain(rest));

    let mut response = Response::new(body);
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("video/mp4"));
    // whitespace survives sanitizing, and line breaks are not valid header bytes
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    } else {
        headers.insert(
            header::CONTENT_DISPOSITION,
            HeaderValue::from_static("attachment; filename=\"video.mp4\""),
        );
    }

    Ok(response)
}
