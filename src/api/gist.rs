/// Gist file serving
///
/// Every path not claimed by another route is treated as a gist request.
/// Direct page loads by a logged-in user refresh the mirror first; all other
/// requests are served from the local cache.
use crate::{
    api::found,
    context::AppContext,
    error::{GistError, GistResult},
    path::{parse_path, PathOutcome},
    policy::{RefreshContext, DEFAULT_FILENAME},
    session::Session,
};
use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::SignedCookieJar;
use tokio_util::io::ReaderStream;
use tracing::{debug, error};

/// Serve a single file of a gist, refreshing the gist when appropriate
pub async fn serve_gist(
    State(ctx): State<AppContext>,
    jar: SignedCookieJar,
    uri: Uri,
    headers: HeaderMap,
) -> GistResult<Response> {
    let session = Session::load(&jar);

    let gist_path = parse_path(uri.path()).map_err(|e| {
        debug!("parse path: {}", e);
        e
    })?;
    if gist_path.outcome == PathOutcome::NonCanonical {
        let location = match uri.query() {
            Some(query) => format!("{}/?{}", uri.path(), query),
            None => format!("{}/", uri.path()),
        };
        return Ok(found(&location));
    }

    let filename = if gist_path.filename.is_empty() {
        DEFAULT_FILENAME
    } else {
        gist_path.filename.as_str()
    };

    let refresh = RefreshContext {
        authenticated: session.authenticated(),
        filename,
        referrer: header_str(&headers, header::REFERER),
        host: header_str(&headers, header::HOST).or_else(|| uri.authority().map(|a| a.as_str())),
    };

    if refresh.should_refresh() {
        ctx.mirror
            .refresh_gist(session.user_id(), &gist_path.gist_id)
            .await
            .map_err(|e| {
                error!("reload gist: {}", e);
                GistError::Internal("error loading gist".to_string())
            })?;
    }

    let file = ctx
        .mirror
        .cache()
        .open(&gist_path.gist_id, filename)
        .await
        .map_err(|e| {
            debug!("read gist: {}", e);
            GistError::NotFound(format!("{}/{}", gist_path.gist_id, filename))
        })?;

    let content_type = mime_guess::from_path(filename).first_or_octet_stream();

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type.to_string())],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response())
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
