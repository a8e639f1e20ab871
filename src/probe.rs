use std::time::Instant;

use anyhow::{anyhow, Result};
use serde::Serialize;

use crate::config::AppConfig;
use crate::extractor::Extractor;
use crate::info::{self, VideoSummary};
use crate::ytdlp::YtDlp;

#[derive(Debug, Serialize)]
pub struct ProbeReport {
    pub url: String,
    pub lookup_ms: u128,
    pub format_count: usize,
    pub summary: VideoSummary,
}

pub async fn run(url: &str) -> Result<()> {
    let config = AppConfig::from_env()?;
    let extractor = YtDlp::new(&config.ytdlp_path);

    let url = url.trim();
    if url.is_empty() {
        return Err(anyhow!("URL parameter is required"));
    }
    if !extractor.validate_url(url) {
        return Err(anyhow!("Invalid YouTube URL: {}", url));
    }

    let start = Instant::now();
    let summary = info::video_info(&extractor, url)
        .await
        .map_err(|err| anyhow!("Failed to fetch video information: {}", err))?;

    let report = ProbeReport {
        url: url.to_string(),
        lookup_ms: start.elapsed().as_millis(),
        format_count: summary.formats.len(),
        summary,
    };

    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
