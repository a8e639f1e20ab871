use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use crate::extractor::{
    ByteStream, ExtractError, Extractor, FormatChoice, RawFormat, RawVideoInfo, StreamRequest,
};

/// Extractor backed by the `yt-dlp` executable.
#[derive(Clone, Debug)]
pub struct YtDlp {
    program: String,
}

impl YtDlp {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, args: &[String]) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl Extractor for YtDlp {
    async fn fetch_info(&self, url: &str) -> Result<RawVideoInfo, ExtractError> {
        let args = info_args(url);
        debug!(program = %self.program, ?args, "running metadata lookup");

        let output = self.command(&args).output().await?;
        if !output.status.success() {
            return Err(failure(output.status, &String::from_utf8_lossy(&output.stderr)));
        }

        parse_info(&output.stdout)
    }

    async fn open_stream(&self, request: &StreamRequest) -> Result<ByteStream, ExtractError> {
        let args = stream_args(request);
        debug!(program = %self.program, format = %request.format, "opening media stream");

        let mut child = self.command(&args).spawn()?;
        let stdout = child
            .stdout
            .take()
            .ok_or(ExtractError::MissingField("stdout"))?;
        let stderr = child.stderr.take().map(|mut pipe| {
            tokio::spawn(async move {
                let mut text = String::new();
                if let Err(err) = pipe.read_to_string(&mut text).await {
                    warn!("failed to read extractor stderr: {}", err);
                }
                text
            })
        });

        let upstream = Upstream {
            child,
            stdout: ReaderStream::new(stdout),
            stderr,
            done: false,
        };

        let chunks = stream::unfold(upstream, |mut upstream| async move {
            if upstream.done {
                return None;
            }
            match upstream.stdout.next().await {
                Some(Ok(chunk)) => Some((Ok(chunk), upstream)),
                Some(Err(err)) => {
                    upstream.done = true;
                    Some((Err(ExtractError::Io(err)), upstream))
                }
                None => {
                    upstream.done = true;
                    match upstream.finish().await {
                        Ok(()) => None,
                        Err(err) => Some((Err(err), upstream)),
                    }
                }
            }
        });

        Ok(chunks.boxed())
    }
}

/// Running download process. The child is killed when this is dropped.
struct Upstream {
    child: Child,
    stdout: ReaderStream<ChildStdout>,
    stderr: Option<JoinHandle<String>>,
    done: bool,
}

impl Upstream {
    async fn finish(&mut self) -> Result<(), ExtractError> {
        let status = self.child.wait().await?;
        if status.success() {
            return Ok(());
        }

        let stderr = match self.stderr.take() {
            Some(handle) => handle.await.unwrap_or_default(),
            None => String::new(),
        };
        Err(failure(status, &stderr))
    }
}

fn failure(status: ExitStatus, stderr: &str) -> ExtractError {
    let message = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .map(|line| line.strip_prefix("ERROR: ").unwrap_or(line).to_string())
        .unwrap_or_else(|| format!("yt-dlp exited with {}", status));
    ExtractError::Failed(message)
}

pub fn info_args(url: &str) -> Vec<String> {
    vec![
        "--dump-single-json".to_string(),
        "--no-playlist".to_string(),
        "--no-warnings".to_string(),
        "--".to_string(),
        url.to_string(),
    ]
}

pub fn stream_args(request: &StreamRequest) -> Vec<String> {
    let selector = match &request.format {
        FormatChoice::Highest => "best".to_string(),
        FormatChoice::Itag(itag) => itag.clone(),
    };

    let mut args = vec![
        "--no-playlist".to_string(),
        "--no-warnings".to_string(),
        "--quiet".to_string(),
        "--no-progress".to_string(),
        "--no-part".to_string(),
        "-f".to_string(),
        selector,
    ];

    for (name, value) in &request.headers {
        args.push("--add-header".to_string());
        args.push(format!("{}:{}", name, value));
    }

    args.extend([
        "-o".to_string(),
        "-".to_string(),
        "--".to_string(),
        request.url.clone(),
    ]);
    args
}

#[derive(Debug, Deserialize)]
struct InfoJson {
    title: Option<String>,
    uploader: Option<String>,
    channel: Option<String>,
    duration: Option<f64>,
    thumbnail: Option<String>,
    #[serde(default)]
    thumbnails: Vec<ThumbnailJson>,
    #[serde(default)]
    formats: Vec<FormatJson>,
}

#[derive(Debug, Deserialize)]
struct ThumbnailJson {
    url: String,
}

#[derive(Debug, Deserialize)]
struct FormatJson {
    format_id: String,
    ext: Option<String>,
    format_note: Option<String>,
    height: Option<f64>,
    vcodec: Option<String>,
    acodec: Option<String>,
    filesize: Option<f64>,
    filesize_approx: Option<f64>,
}

impl FormatJson {
    fn into_raw(self) -> RawFormat {
        let video_codec = present_codec(self.vcodec.as_deref());
        let audio_codec = present_codec(self.acodec.as_deref());

        let has_video = match self.vcodec.as_deref() {
            Some(_) => video_codec.is_some(),
            None => self.height.is_some(),
        };
        let has_audio = audio_codec.is_some();

        let codecs: Vec<&str> = video_codec.into_iter().chain(audio_codec).collect();
        let codecs = (!codecs.is_empty()).then(|| codecs.join(", "));

        let quality_label = self
            .format_note
            .as_deref()
            .map(str::trim)
            .filter(|note| !note.is_empty())
            .map(str::to_string)
            .or_else(|| self.height.map(|height| format!("{}p", height as u32)));

        RawFormat {
            itag: self.format_id,
            quality_label,
            container: self.ext,
            codecs,
            has_video,
            has_audio,
            content_length: self.filesize.or(self.filesize_approx).map(|size| size as u64),
        }
    }
}

fn present_codec(codec: Option<&str>) -> Option<&str> {
    codec.filter(|codec| !codec.is_empty() && *codec != "none")
}

pub fn parse_info(stdout: &[u8]) -> Result<RawVideoInfo, ExtractError> {
    let info: InfoJson = serde_json::from_slice(stdout)?;

    let title = info.title.ok_or(ExtractError::MissingField("title"))?;
    let author = info.uploader.or(info.channel).unwrap_or_default();

    let mut thumbnails: Vec<String> = info.thumbnails.into_iter().map(|t| t.url).collect();
    if thumbnails.is_empty() {
        thumbnails.extend(info.thumbnail);
    }

    Ok(RawVideoInfo {
        title,
        author,
        length_seconds: info.duration.map(|secs| secs.max(0.0) as u64).unwrap_or(0),
        thumbnails,
        formats: info.formats.into_iter().map(FormatJson::into_raw).collect(),
    })
}
