use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::download::{self, DownloadRequest};
use crate::extractor::{ExtractError, Extractor, FormatChoice};
use crate::info::{self, VideoSummary};
use crate::validate;

const INFO_FAILED: &str = "Failed to fetch video information";
const DOWNLOAD_FAILED: &str = "Failed to download video";

#[derive(Clone)]
pub struct AppState {
    extractor: Arc<dyn Extractor>,
    user_agent: String,
}

impl AppState {
    pub fn new(extractor: Arc<dyn Extractor>, user_agent: String) -> Self {
        Self {
            extractor,
            user_agent,
        }
    }

    fn require_url(&self, url: Option<String>) -> Result<String, ApiError> {
        let url = url
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or(ApiError::MissingUrl)?;

        if !self.extractor.validate_url(&url) {
            return Err(ApiError::InvalidUrl);
        }

        Ok(url)
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(index))
        .route("/script.js", get(script))
        .route("/style.css", get(stylesheet))
        .route("/health", get(health))
        .route("/api/info", get(video_info).options(preflight).layer(cors))
        .route("/api/download", get(download_video))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(include_str!("../public/index.html"))
}

async fn script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        include_str!("../public/script.js"),
    )
}

async fn stylesheet() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        include_str!("../public/style.css"),
    )
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now(),
    })
}

// Registers OPTIONS on the route; CorsLayer answers preflights before this runs.
async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn video_info(
    State(state): State<AppState>,
    Query(query): Query<InfoQuery>,
) -> Result<Json<InfoResponse>, ApiError> {
    let url = state.require_url(query.url)?;
    info!(url = %url, "fetching video info");

    let summary = info::video_info(state.extractor.as_ref(), &url)
        .await
        .map_err(|source| ApiError::Upstream {
            context: INFO_FAILED,
            source,
        })?;

    Ok(Json(InfoResponse {
        success: true,
        summary,
    }))
}

async fn download_video(
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, ApiError> {
    let url = state.require_url(query.url)?;
    let format = FormatChoice::from_query(query.itag.as_deref());
    if let FormatChoice::Itag(itag) = &format {
        if !validate::is_format_id(itag) {
            return Err(ApiError::InvalidFormat);
        }
    }

    download::stream_download(
        state.extractor.as_ref(),
        DownloadRequest { url, format },
        &state.user_agent,
    )
    .await
    .map_err(|source| ApiError::Upstream {
        context: DOWNLOAD_FAILED,
        source,
    })
}

#[derive(Debug, Deserialize)]
pub struct InfoQuery {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub url: Option<String>,
    pub itag: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub success: bool,
    #[serde(flatten)]
    pub summary: VideoSummary,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("URL parameter is required")]
    MissingUrl,
    #[error("Invalid YouTube URL")]
    InvalidUrl,
    #[error("Invalid format identifier")]
    InvalidFormat,
    #[error("{context}: {source}")]
    Upstream {
        context: &'static str,
        #[source]
        source: ExtractError,
    },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Upstream { context, source } => {
                error!("{}: {}", context, source);
                let body = serde_json::json!({
                    "error": context,
                    "message": source.to_string(),
                });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
            invalid => {
                let body = serde_json::json!({ "error": invalid.to_string() });
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
        }
    }
}
