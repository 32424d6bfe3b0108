/// oEmbed discovery endpoints
use crate::{
    api::pages::escape_html,
    context::AppContext,
    error::{GistError, GistResult},
    path::{parse_path, PathOutcome},
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Embed width when the embedded URL doesn't specify one
pub const DEFAULT_EMBED_WIDTH: u32 = 600;

/// Embed height when the embedded URL doesn't specify one
pub const DEFAULT_EMBED_HEIGHT: u32 = 300;

/// Embeds are always fetched fresh
pub const EMBED_CACHE_AGE: u32 = 0;

/// Build oEmbed routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/oembed", get(oembed))
        .route("/oembed/", get(oembed))
        .route("/oembed.xml", get(oembed))
        .route("/oembed.json", get(oembed_json))
}

/// oEmbed query parameters
#[derive(Debug, Deserialize)]
pub struct OEmbedParams {
    pub url: Option<String>,
    pub format: Option<String>,
}

/// oEmbed rich response
#[derive(Debug, Serialize, Deserialize)]
pub struct OEmbedResponse {
    pub version: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub html: String,
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub cache_age: u32,
    pub provider_name: String,
    pub provider_url: String,
}

/// Dispatch on the requested format. Only JSON is supported.
async fn oembed(ctx: State<AppContext>, params: Query<OEmbedParams>) -> GistResult<Response> {
    match params.format.as_deref() {
        Some("json") => oembed_json(ctx, params).await,
        other => {
            debug!("oembed: unsupported format {:?}", other);
            Err(GistError::NotImplemented(
                "only the json format is supported".to_string(),
            ))
        }
    }
}

/// Describe an embeddable gist as oEmbed JSON
async fn oembed_json(
    State(ctx): State<AppContext>,
    Query(params): Query<OEmbedParams>,
) -> GistResult<Response> {
    let raw = params
        .url
        .as_deref()
        .filter(|u| !u.is_empty())
        .ok_or_else(|| GistError::BadRequest("url parameter is required".to_string()))?;

    let mut url = Url::parse(raw).map_err(|e| {
        warn!("oembed: {}", e);
        GistError::BadRequest(format!("invalid url: {}", e))
    })?;

    let (width, height) = embed_size(&url);

    let gist_path = parse_path(url.path()).map_err(|e| {
        warn!("oembed: parse path: {}", e);
        GistError::NotFound(url.path().to_string())
    })?;
    if gist_path.outcome == PathOutcome::NonCanonical {
        let canonical = format!("{}/", url.path());
        url.set_path(&canonical);
    }

    let gist_id = gist_path.gist_id;
    let gist = ctx.db.view(|tx| tx.gist(&gist_id))?.ok_or_else(|| {
        warn!("oembed: not found: {}", gist_id);
        GistError::NotFound(format!("gist {}", gist_id))
    })?;

    url.set_query(None);
    url.set_fragment(None);

    let response = OEmbedResponse {
        version: "1.0".to_string(),
        kind: "rich".to_string(),
        html: embed_html(url.as_str(), height),
        width,
        height,
        title: gist.description,
        cache_age: EMBED_CACHE_AGE,
        provider_name: ctx.config.embed.provider_name.clone(),
        provider_url: ctx.public_url().to_string(),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Width and height requested on the embedded URL, falling back to defaults
fn embed_size(url: &Url) -> (u32, u32) {
    let mut width = DEFAULT_EMBED_WIDTH;
    let mut height = DEFAULT_EMBED_HEIGHT;

    for (key, value) in url.query_pairs() {
        let Ok(v) = value.parse::<u32>() else {
            continue;
        };
        if v == 0 {
            continue;
        }
        match key.as_ref() {
            "width" => width = v,
            "height" => height = v,
            _ => {}
        }
    }

    (width, height)
}

/// Responsive iframe wrapper for an embedded gist
fn embed_html(src: &str, height: u32) -> String {
    format!(
        r#"<div class="gist-exposed" style="position: relative; padding-bottom: {height}px; padding-top: 0px; height: 0; overflow: hidden;"><iframe style="position: absolute; top:0; left: 0; width: 100%; height: 100%; border: none;" src="{src}"></iframe></div>"#,
        height = height,
        src = escape_html(src),
    )
}
