use std::collections::HashMap;

use serde::Serialize;

use crate::extractor::{ExtractError, Extractor, RawFormat, RawVideoInfo};

/// Quality tier that is never offered for download.
const LOWEST_TIER: &str = "tiny";

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatDescriptor {
    pub quality: String,
    pub itag: String,
    pub container: Option<String>,
    pub codecs: Option<String>,
    pub has_audio: bool,
    pub filesize: Option<u64>,
}

#[derive(Clone, Debug, Serialize)]
pub struct VideoSummary {
    pub title: String,
    pub thumbnail: String,
    pub duration: u64,
    pub author: String,
    pub formats: Vec<FormatDescriptor>,
}

pub async fn video_info(
    extractor: &dyn Extractor,
    url: &str,
) -> Result<VideoSummary, ExtractError> {
    let raw = extractor.fetch_info(url).await?;
    summarize(raw)
}

pub fn summarize(raw: RawVideoInfo) -> Result<VideoSummary, ExtractError> {
    let thumbnail = raw
        .thumbnails
        .last()
        .cloned()
        .ok_or(ExtractError::MissingField("thumbnails"))?;

    Ok(VideoSummary {
        title: raw.title,
        thumbnail,
        duration: raw.length_seconds,
        author: raw.author,
        formats: normalize_formats(raw.formats),
    })
}

/// Keeps video-bearing formats, orders them best first and leaves one
/// entry per quality label, preferring the one that also carries audio.
pub fn normalize_formats(formats: Vec<RawFormat>) -> Vec<FormatDescriptor> {
    let mut candidates: Vec<FormatDescriptor> = formats
        .into_iter()
        .filter(|format| format.has_video)
        .filter_map(|format| {
            let quality = format.quality_label.filter(|label| !label.is_empty())?;
            if quality == LOWEST_TIER {
                return None;
            }
            Some(FormatDescriptor {
                quality,
                itag: format.itag,
                container: format.container,
                codecs: format.codecs,
                has_audio: format.has_audio,
                filesize: format.content_length,
            })
        })
        .collect();

    // sort_by_key is stable, so equal ranks keep the extractor's order
    candidates.sort_by_key(|format| std::cmp::Reverse(quality_rank(&format.quality)));

    let mut unique: Vec<FormatDescriptor> = Vec::with_capacity(candidates.len());
    let mut positions: HashMap<String, usize> = HashMap::new();
    for format in candidates {
        match positions.get(&format.quality) {
            Some(&index) => {
                if format.has_audio && !unique[index].has_audio {
                    unique[index] = format;
                }
            }
            None => {
                positions.insert(format.quality.clone(), unique.len());
                unique.push(format);
            }
        }
    }

    unique
}

/// Leading integer of a quality label ("1080p60" -> 1080), 0 when absent.
pub fn quality_rank(label: &str) -> u32 {
    let digits: String = label
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}
